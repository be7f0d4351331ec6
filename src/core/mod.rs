//! Core module - workflow engine, identity, configuration and persistence

pub mod config;
pub mod entity;
pub mod identity;
pub mod ledger;
pub mod policy;
pub mod project;
pub mod store;
pub mod team;
pub mod workflow;

pub use config::{Config, WorkflowConfig};
pub use entity::{EntityKind, WorkflowStatus};
pub use identity::{EntityId, IdParseError, RevisionId};
pub use ledger::RevisionLedger;
pub use policy::{is_transition_allowed, DenialReason, StageGate, StatusPolicy, TransitionRequest};
pub use project::{Project, ProjectError};
pub use store::{MemoryStore, Store, StoreError, YamlStore};
pub use team::{Capability, Role, Session, TeamMember, TeamRoster};
pub use workflow::{ErrorKind, WorkflowController, WorkflowError};

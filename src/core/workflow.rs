//! Workflow controller - the single mutation point for entity status
//!
//! Composes the [`StatusPolicy`] with the [`RevisionLedger`] over an injected
//! [`Store`]. Forward motion is one stage at a time for every caller, CLI or
//! not, because every status change goes through [`WorkflowController::apply_status_change`].

use chrono::Utc;
use std::collections::HashSet;
use thiserror::Error;

use crate::core::config::WorkflowConfig;
use crate::core::entity::{EntityKind, WorkflowStatus};
use crate::core::identity::{EntityId, RevisionId};
use crate::core::ledger::RevisionLedger;
use crate::core::policy::{DenialReason, StatusPolicy, TransitionRequest};
use crate::core::store::{Store, StoreError};
use crate::core::team::{Capability, Role, Session};
use crate::entities::{Entity, Revision, RevisionCode, RevisionCodeError, SignatureSlot, StatusChange};

/// Broad error categories callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input; re-prompt
    Validation,
    /// Signature chain violated; blocked action
    Precondition,
    /// Actor lacks the role or ownership
    Permission,
    /// Structural invariant would break; never overridable
    Invariant,
    /// Status transition refused (role, order, or freeze)
    PermissionDenied,
    NotFound,
    Storage,
}

/// Errors that can occur during workflow operations
#[derive(Debug, Error, miette::Diagnostic)]
pub enum WorkflowError {
    #[error("{message}")]
    #[diagnostic(code(psvt::validation))]
    Validation { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidRevisionCode(#[from] RevisionCodeError),

    #[error("revision {code} already exists for {entity}")]
    #[diagnostic(code(psvt::validation), help("use 'psvt rev next-code' to find a free code"))]
    DuplicateRevision { entity: EntityId, code: RevisionCode },

    #[error("cannot sign as {slot}: {} not signed yet", SlotList(.missing))]
    #[diagnostic(code(psvt::precondition), help("signatures go originator → checker → approver"))]
    SignatureChain {
        slot: SignatureSlot,
        missing: Vec<SignatureSlot>,
    },

    #[error("{slot} signature already placed by {by}")]
    #[diagnostic(code(psvt::precondition), help("revoke the existing signature first"))]
    SlotOccupied { slot: SignatureSlot, by: String },

    #[error("{message}")]
    #[diagnostic(code(psvt::precondition))]
    Precondition { message: String },

    #[error("{message}")]
    #[diagnostic(code(psvt::permission))]
    Permission { message: String },

    #[error("{entity}: {reason}")]
    #[diagnostic(code(psvt::permission), help("ask someone holding the required role"))]
    RoleDenied { entity: EntityId, reason: DenialReason },

    #[error("{entity}: {reason}")]
    #[diagnostic(code(psvt::permission_denied))]
    PermissionDenied { entity: EntityId, reason: DenialReason },

    #[error("{entity} has only one revision left; it cannot be deleted")]
    #[diagnostic(code(psvt::invariant))]
    LastRevision { entity: EntityId },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::Validation { .. }
            | WorkflowError::InvalidRevisionCode(_)
            | WorkflowError::DuplicateRevision { .. } => ErrorKind::Validation,
            WorkflowError::SignatureChain { .. }
            | WorkflowError::SlotOccupied { .. }
            | WorkflowError::Precondition { .. } => ErrorKind::Precondition,
            WorkflowError::Permission { .. } | WorkflowError::RoleDenied { .. } => {
                ErrorKind::Permission
            }
            WorkflowError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            WorkflowError::LastRevision { .. } => ErrorKind::Invariant,
            WorkflowError::Store(StoreError::NotFound { .. }) => ErrorKind::NotFound,
            WorkflowError::Store(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        WorkflowError::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn permission(message: impl Into<String>) -> Self {
        WorkflowError::Permission {
            message: message.into(),
        }
    }

    /// Map a policy denial: role problems are permission errors, the rest are transition denials
    fn denied(entity: EntityId, reason: DenialReason) -> Self {
        if reason.is_role_denial() {
            WorkflowError::RoleDenied { entity, reason }
        } else {
            WorkflowError::PermissionDenied { entity, reason }
        }
    }
}

struct SlotList<'a>(&'a [SignatureSlot]);

impl std::fmt::Display for SlotList<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        f.write_str(&names.join(" and "))
    }
}

/// Capability needed to place a signature in a slot
fn signing_capability(slot: SignatureSlot) -> Capability {
    match slot {
        SignatureSlot::Originator => Capability::Edit,
        SignatureSlot::Checker => Capability::Check,
        SignatureSlot::Approver => Capability::Approve,
    }
}

fn require(session: &Session, capability: Capability, action: &str) -> Result<(), WorkflowError> {
    if session.role.has(capability) {
        Ok(())
    } else {
        let roles: Vec<String> = Role::holders(capability)
            .iter()
            .map(|r| r.to_string())
            .collect();
        Err(WorkflowError::permission(format!(
            "{} ({}) may not {}; requires {}",
            session.user_id,
            session.role,
            action,
            roles.join(" or ")
        )))
    }
}

/// Orchestrates status changes and revision bookkeeping
pub struct WorkflowController<S> {
    ledger: RevisionLedger<S>,
    policy: StatusPolicy,
    config: WorkflowConfig,
}

impl<S: Store> WorkflowController<S> {
    pub fn new(store: S, config: WorkflowConfig) -> Self {
        Self {
            ledger: RevisionLedger::new(store),
            policy: config.policy(),
            config,
        }
    }

    pub fn policy(&self) -> &StatusPolicy {
        &self.policy
    }

    pub fn ledger(&self) -> &RevisionLedger<S> {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut RevisionLedger<S> {
        &mut self.ledger
    }

    pub fn store(&self) -> &S {
        self.ledger.store()
    }

    pub fn into_store(self) -> S {
        self.ledger.into_store()
    }

    pub fn load(&self, id: &EntityId) -> Result<Entity, WorkflowError> {
        Ok(self.store().load(id)?)
    }

    /// Create a record under `parent`, plus its first revision for workflow kinds
    pub fn create_entity(
        &mut self,
        kind: EntityKind,
        title: &str,
        parent: Option<EntityId>,
        session: &Session,
    ) -> Result<Entity, WorkflowError> {
        require(session, Capability::Edit, &format!("create a {}", kind))?;

        let title = title.trim();
        if title.is_empty() {
            return Err(WorkflowError::validation("title must not be empty"));
        }

        match (kind.parent_kind(), parent) {
            (None, Some(_)) => {
                return Err(WorkflowError::validation(format!(
                    "a {} sits at the top of the hierarchy and takes no parent",
                    kind
                )));
            }
            (Some(expected), None) => {
                return Err(WorkflowError::validation(format!(
                    "a {} needs a parent {}",
                    kind, expected
                )));
            }
            (Some(expected), Some(parent_id)) => {
                if parent_id.kind() != expected {
                    return Err(WorkflowError::validation(format!(
                        "a {} must sit under a {}, not a {}",
                        kind,
                        expected,
                        parent_id.kind()
                    )));
                }
                let parent = self.load(&parent_id)?;
                if !parent.is_active || !self.ancestors_active(&parent)? {
                    return Err(WorkflowError::Precondition {
                        message: format!("parent {} is inactive", parent_id),
                    });
                }
            }
            (None, None) => {}
        }

        let entity = Entity::new(kind, title, parent, session.user_id.clone());
        self.ledger.store_mut().save(&entity)?;
        tracing::info!(entity = %entity.id, kind = %kind, by = %session.user_id, "created entity");

        if kind.has_workflow() && self.config.initial_revision {
            self.ledger.create_revision(
                kind,
                &entity.id,
                &RevisionCode::ORIGINAL.to_string(),
                Some("Original issue".to_string()),
            )?;
        }
        Ok(entity)
    }

    /// Whether every ancestor of `entity` is active
    ///
    /// A missing parent ends the walk without freezing; a cycle is reported once.
    pub fn ancestors_active(&self, entity: &Entity) -> Result<bool, WorkflowError> {
        let mut seen = HashSet::from([entity.id]);
        let mut next = entity.parent;
        while let Some(parent_id) = next {
            if !seen.insert(parent_id) {
                tracing::warn!(entity = %entity.id, parent = %parent_id, "cycle in hierarchy");
                break;
            }
            let parent = match self.store().load(&parent_id) {
                Ok(parent) => parent,
                Err(StoreError::NotFound { .. }) => {
                    tracing::warn!(entity = %entity.id, parent = %parent_id, "missing parent");
                    break;
                }
                Err(e) => return Err(e.into()),
            };
            if !parent.is_active {
                return Ok(false);
            }
            next = parent.parent;
        }
        Ok(true)
    }

    /// Pure transition: validates against the policy and returns the updated entity
    pub fn apply_status_change(
        &self,
        entity: &Entity,
        target: WorkflowStatus,
        session: &Session,
        ancestors_active: bool,
    ) -> Result<Entity, WorkflowError> {
        let request = TransitionRequest {
            kind: entity.kind(),
            from: entity.status,
            to: target,
            role: session.role,
            entity_active: entity.is_active,
            ancestors_active,
        };

        if let Err(reason) = self.policy.check(&request) {
            tracing::debug!(
                entity = %entity.id,
                from = %entity.status,
                to = %target,
                role = %session.role,
                reason = %reason,
                "transition denied"
            );
            return Err(WorkflowError::denied(entity.id, reason));
        }

        let mut updated = entity.clone();
        if entity.status != target {
            updated.status = target;
            updated.status_history.push(StatusChange {
                from: entity.status,
                to: target,
                by: session.user_id.clone(),
                at: Utc::now(),
            });
        }
        Ok(updated)
    }

    /// Load, check, apply and save a status change
    pub fn request_status_change(
        &mut self,
        id: &EntityId,
        target: WorkflowStatus,
        session: &Session,
    ) -> Result<Entity, WorkflowError> {
        let entity = self.load(id)?;
        let ancestors_active = self.ancestors_active(&entity)?;
        let updated = self.apply_status_change(&entity, target, session, ancestors_active)?;

        if updated != entity {
            self.ledger.store_mut().save(&updated)?;
            tracing::info!(
                entity = %id,
                from = %entity.status,
                to = %target,
                by = %session.user_id,
                "status changed"
            );
        }
        Ok(updated)
    }

    /// Move to the next stage in the entity's sequence
    pub fn advance_one_step(
        &mut self,
        id: &EntityId,
        session: &Session,
    ) -> Result<Entity, WorkflowError> {
        let entity = self.load(id)?;
        self.ensure_unfrozen(&entity)?;

        let kind = entity.kind();
        let next = kind
            .stage_index(entity.status)
            .and_then(|i| kind.stages().get(i + 1).copied());

        match next {
            Some(target) => self.request_status_change(id, target, session),
            None => {
                let reason = if kind.has_workflow() {
                    DenialReason::AtFinalStage {
                        kind,
                        status: entity.status,
                    }
                } else {
                    DenialReason::NotInWorkflow {
                        kind,
                        status: entity.status,
                    }
                };
                Err(WorkflowError::PermissionDenied { entity: *id, reason })
            }
        }
    }

    /// Refuse lifecycle changes on an inactive entity or one under an inactive ancestor
    fn ensure_unfrozen(&self, entity: &Entity) -> Result<(), WorkflowError> {
        if !entity.is_active {
            return Err(WorkflowError::denied(entity.id, DenialReason::Inactive));
        }
        if !self.ancestors_active(entity)? {
            return Err(WorkflowError::denied(entity.id, DenialReason::AncestorInactive));
        }
        Ok(())
    }

    /// The entity a revision belongs to, refused if frozen
    fn unfrozen_owner(&self, revision_id: &RevisionId) -> Result<Entity, WorkflowError> {
        let revision = self.ledger.get(revision_id)?;
        let entity = self.load(&revision.entity_id)?;
        self.ensure_unfrozen(&entity)?;
        Ok(entity)
    }

    /// Statuses the session could move the entity to right now
    pub fn allowed_targets(
        &self,
        id: &EntityId,
        session: &Session,
    ) -> Result<Vec<WorkflowStatus>, WorkflowError> {
        let entity = self.load(id)?;
        let ancestors_active = self.ancestors_active(&entity)?;
        Ok(self.policy.allowed_targets(
            entity.kind(),
            entity.status,
            session.role,
            entity.is_active,
            ancestors_active,
        ))
    }

    /// Soft-delete: the entity and everything below it become frozen
    pub fn deactivate(&mut self, id: &EntityId, session: &Session) -> Result<Entity, WorkflowError> {
        self.set_active(id, false, session)
    }

    pub fn reactivate(&mut self, id: &EntityId, session: &Session) -> Result<Entity, WorkflowError> {
        self.set_active(id, true, session)
    }

    fn set_active(
        &mut self,
        id: &EntityId,
        active: bool,
        session: &Session,
    ) -> Result<Entity, WorkflowError> {
        let action = if active { "reactivate" } else { "deactivate" };
        require(session, Capability::Edit, &format!("{} {}", action, id))?;

        let mut entity = self.load(id)?;
        if entity.is_active != active {
            entity.is_active = active;
            self.ledger.store_mut().save(&entity)?;
            tracing::info!(entity = %id, active, by = %session.user_id, "{}d entity", action);
        }
        Ok(entity)
    }

    /// Start a new revision; suggests the next code when none is given
    pub fn new_revision(
        &mut self,
        id: &EntityId,
        code: Option<&str>,
        description: Option<String>,
        make_current: bool,
        session: &Session,
    ) -> Result<Revision, WorkflowError> {
        require(session, Capability::Edit, "create revisions")?;

        let entity = self.load(id)?;
        self.ensure_unfrozen(&entity)?;

        let code = match code {
            Some(code) => code.to_string(),
            None => self.ledger.suggest_for_entity(entity.kind(), id)?.to_string(),
        };
        let revision = self
            .ledger
            .create_revision(entity.kind(), id, &code, description)?;
        if make_current {
            self.ledger.set_current(&revision.id)?;
        }
        Ok(revision)
    }

    /// Make a revision its entity's current one
    pub fn set_current(
        &mut self,
        revision_id: &RevisionId,
        session: &Session,
    ) -> Result<Entity, WorkflowError> {
        require(session, Capability::Edit, "change the current revision")?;
        self.unfrozen_owner(revision_id)?;
        self.ledger.set_current(revision_id)
    }

    /// Sign a revision slot as the session user
    pub fn sign_revision(
        &mut self,
        revision_id: &RevisionId,
        slot: SignatureSlot,
        session: &Session,
    ) -> Result<Revision, WorkflowError> {
        require(session, signing_capability(slot), &format!("sign as {}", slot))?;
        self.unfrozen_owner(revision_id)?;
        self.ledger.sign_as(revision_id, slot, &session.user_id)
    }

    pub fn revoke_signature(
        &mut self,
        revision_id: &RevisionId,
        slot: SignatureSlot,
        session: &Session,
    ) -> Result<Revision, WorkflowError> {
        self.unfrozen_owner(revision_id)?;
        self.ledger.revoke_signature(revision_id, slot, session)
    }

    /// Privileged delete; the last revision of an entity is kept regardless of role
    pub fn delete_revision(
        &mut self,
        revision_id: &RevisionId,
        session: &Session,
    ) -> Result<(), WorkflowError> {
        let revision = self.ledger.get(revision_id)?;
        let siblings = self.ledger.list(revision.entity_type, &revision.entity_id)?;
        if siblings.len() <= 1 {
            return Err(WorkflowError::LastRevision {
                entity: revision.entity_id,
            });
        }

        require(session, Capability::Override, "delete revisions")?;
        self.unfrozen_owner(revision_id)?;
        self.ledger.delete_revision(revision_id)
    }
}

//! Entity record - a hierarchy node or workflow item as stored

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{EntityKind, WorkflowStatus};
use crate::core::identity::{EntityId, RevisionId};

/// One applied status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: WorkflowStatus,
    pub to: WorkflowStatus,
    pub by: String,
    pub at: DateTime<Utc>,
}

/// A tracked record
///
/// Hierarchy nodes (customer, plant, unit, area) keep `status` at its default
/// and never gain revisions; the policy refuses any transition on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityId>,

    #[serde(default)]
    pub status: WorkflowStatus,

    /// Revision considered authoritative; looked up by ID, may dangle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_revision_id: Option<RevisionId>,

    /// Soft-delete flag; inactive records are frozen and hidden from default views
    #[serde(default = "default_active")]
    pub is_active: bool,

    pub created: DateTime<Utc>,
    pub author: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_history: Vec<StatusChange>,
}

fn default_active() -> bool {
    true
}

impl Entity {
    /// A new active record at its kind's initial status
    pub fn new(
        kind: EntityKind,
        title: impl Into<String>,
        parent: Option<EntityId>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(kind),
            title: title.into(),
            parent,
            status: kind.initial_status().unwrap_or_default(),
            current_revision_id: None,
            is_active: true,
            created: Utc::now(),
            author: author.into(),
            status_history: Vec::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.id.kind()
    }
}

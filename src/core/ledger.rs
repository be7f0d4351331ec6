//! Revision ledger - revision history and signatures per entity
//!
//! Signature order is originator → checker → approver for forward signing.
//! Revoking a signature clears only that slot, so a later slot may stay signed
//! after an earlier one is revoked; re-signing the earlier slot is still possible.

use chrono::Utc;

use crate::core::entity::EntityKind;
use crate::core::identity::{EntityId, RevisionId};
use crate::core::store::{Store, StoreError};
use crate::core::team::{Capability, Session};
use crate::core::workflow::WorkflowError;
use crate::entities::{Entity, Revision, RevisionCode, Signature, SignatureSlot};

/// Number of distinct revision codes (26 tiers x 9 iterations)
const CODE_SPACE: usize = 26 * 9;

/// Revision bookkeeping over an injected store
#[derive(Debug)]
pub struct RevisionLedger<S> {
    store: S,
}

impl<S> RevisionLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Code to suggest after `current`; `O1` when there is none
    pub fn suggest_next_revision_code(current: Option<&str>) -> Result<RevisionCode, WorkflowError> {
        let current = current
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::parse::<RevisionCode>)
            .transpose()?;
        Ok(RevisionCode::suggest_next(current.as_ref()))
    }
}

impl<S: Store> RevisionLedger<S> {
    /// Revisions of an entity, sorted by code
    pub fn list(
        &self,
        entity_type: EntityKind,
        entity_id: &EntityId,
    ) -> Result<Vec<Revision>, WorkflowError> {
        let mut revisions = self.store.load_revisions(entity_type, entity_id)?;
        revisions.sort_by(|a, b| a.code.cmp(&b.code).then(a.created.cmp(&b.created)));
        Ok(revisions)
    }

    /// Next free code after the highest existing one
    pub fn suggest_for_entity(
        &self,
        entity_type: EntityKind,
        entity_id: &EntityId,
    ) -> Result<RevisionCode, WorkflowError> {
        let revisions = self.list(entity_type, entity_id)?;
        let mut code = RevisionCode::suggest_next(revisions.last().map(|r| &r.code));
        // Wrapping codes (O9, Z9 -> A1) may land on one already used
        for _ in 0..CODE_SPACE {
            if !revisions.iter().any(|r| r.code == code) {
                return Ok(code);
            }
            code = code.successor();
        }
        Err(WorkflowError::validation(format!(
            "{} has used every revision code",
            entity_id
        )))
    }

    pub fn get(&self, revision_id: &RevisionId) -> Result<Revision, WorkflowError> {
        Ok(self.store.load_revision(revision_id)?)
    }

    /// Append an unsigned revision to an entity's history
    pub fn create_revision(
        &mut self,
        entity_type: EntityKind,
        entity_id: &EntityId,
        code: &str,
        description: Option<String>,
    ) -> Result<Revision, WorkflowError> {
        let code: RevisionCode = code.parse()?;

        if entity_id.kind() != entity_type {
            return Err(WorkflowError::validation(format!(
                "{} is not a {}",
                entity_id, entity_type
            )));
        }
        if !entity_type.has_workflow() {
            return Err(WorkflowError::validation(format!(
                "{} records do not carry revisions",
                entity_type
            )));
        }
        // The owner must exist
        self.store.load(entity_id)?;

        let existing = self.store.load_revisions(entity_type, entity_id)?;
        if existing.iter().any(|r| r.code == code) {
            return Err(WorkflowError::DuplicateRevision {
                entity: *entity_id,
                code,
            });
        }

        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let revision = Revision::new(*entity_id, code, description);
        self.store.save_revision(&revision)?;
        tracing::info!(entity = %entity_id, revision = %revision.id, code = %code, "created revision");
        Ok(revision)
    }

    /// Sign `slot` as `user_id`, enforcing the signature chain
    pub fn sign_as(
        &mut self,
        revision_id: &RevisionId,
        slot: SignatureSlot,
        user_id: &str,
    ) -> Result<Revision, WorkflowError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(WorkflowError::validation("signer must not be empty"));
        }

        let mut revision = self.get(revision_id)?;

        let missing = revision.missing_prerequisites(slot);
        if !missing.is_empty() {
            return Err(WorkflowError::SignatureChain { slot, missing });
        }
        if let Some(by) = revision.slot(slot).signer() {
            return Err(WorkflowError::SlotOccupied {
                slot,
                by: by.to_string(),
            });
        }

        *revision.slot_mut(slot) = Signature::Signed {
            by: user_id.to_string(),
            at: Utc::now(),
        };
        self.store.save_revision(&revision)?;
        tracing::info!(revision = %revision_id, slot = %slot, by = user_id, "signed revision");
        Ok(revision)
    }

    /// Clear a signature; only the signer or an override-capable role may do so
    pub fn revoke_signature(
        &mut self,
        revision_id: &RevisionId,
        slot: SignatureSlot,
        actor: &Session,
    ) -> Result<Revision, WorkflowError> {
        let mut revision = self.get(revision_id)?;

        let Some(signer) = revision.slot(slot).signer() else {
            return Err(WorkflowError::Precondition {
                message: format!("{} slot of {} is not signed", slot, revision_id),
            });
        };

        let own_signature = signer == actor.user_id;
        if !own_signature && !actor.role.has(Capability::Override) {
            return Err(WorkflowError::permission(format!(
                "{} ({}) may not revoke the {} signature placed by {}",
                actor.user_id, actor.role, slot, signer
            )));
        }

        let signer = signer.to_string();
        *revision.slot_mut(slot) = Signature::Unsigned;
        self.store.save_revision(&revision)?;
        tracing::info!(
            revision = %revision_id,
            slot = %slot,
            signer = %signer,
            by = %actor.user_id,
            "revoked signature"
        );
        Ok(revision)
    }

    /// Remove a revision permanently; an entity's last revision is never removed
    pub fn delete_revision(&mut self, revision_id: &RevisionId) -> Result<(), WorkflowError> {
        let revision = self.get(revision_id)?;
        let siblings = self
            .store
            .load_revisions(revision.entity_type, &revision.entity_id)?;
        if siblings.len() <= 1 {
            return Err(WorkflowError::LastRevision {
                entity: revision.entity_id,
            });
        }

        self.store.delete_revision(revision_id)?;
        tracing::info!(entity = %revision.entity_id, revision = %revision_id, "deleted revision");

        // Drop a pointer that would now dangle
        match self.store.load(&revision.entity_id) {
            Ok(mut entity) if entity.current_revision_id == Some(*revision_id) => {
                entity.current_revision_id = None;
                self.store.save(&entity)?;
            }
            Ok(_) | Err(StoreError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// The authoritative revision of an entity
    ///
    /// `current_revision_id` when it resolves to one of the entity's revisions,
    /// otherwise the highest revision by code order, otherwise `None`.
    pub fn get_current(
        &self,
        entity_type: EntityKind,
        entity_id: &EntityId,
    ) -> Result<Option<Revision>, WorkflowError> {
        let entity = self.store.load(entity_id)?;
        let revisions = self.list(entity_type, entity_id)?;

        if let Some(current_id) = entity.current_revision_id {
            if let Some(current) = revisions.iter().find(|r| r.id == current_id) {
                return Ok(Some(current.clone()));
            }
            tracing::debug!(entity = %entity_id, revision = %current_id, "current revision missing, falling back");
        }
        Ok(revisions.into_iter().last())
    }

    /// Point the owning entity's `current_revision_id` at a revision
    pub fn set_current(&mut self, revision_id: &RevisionId) -> Result<Entity, WorkflowError> {
        let revision = self.get(revision_id)?;
        let mut entity = self.store.load(&revision.entity_id)?;
        entity.current_revision_id = Some(revision.id);
        self.store.save(&entity)?;
        tracing::info!(entity = %entity.id, revision = %revision_id, "set current revision");
        Ok(entity)
    }
}

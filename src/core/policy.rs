//! Status policy - decides whether a status transition is permitted
//!
//! Pure and total: every (kind, status, role) combination yields an answer, and
//! combinations that mean nothing (a status outside the kind's sequence, any
//! transition on a hierarchy node) are denied.
//!
//! Rules, in evaluation order:
//! 1. Inactive entities, and entities under an inactive ancestor, are frozen.
//! 2. Backward moves and no-ops need baseline edit permission only.
//! 3. Forward moves must advance exactly one stage.
//! 4. The actor's role must pass the target stage's gate.

use std::fmt;
use thiserror::Error;

use crate::core::entity::{EntityKind, WorkflowStatus};
use crate::core::team::{Capability, Role};

/// What an actor must hold to enter a stage moving forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageGate {
    Edit,
    Check,
    Approve,
    /// Check-capable, and the entity is currently approved
    Issue,
}

impl StageGate {
    /// The gate guarding `stage` for `kind`; `None` if the stage is not in the kind's sequence
    pub fn for_stage(kind: EntityKind, stage: WorkflowStatus) -> Option<StageGate> {
        use WorkflowStatus::*;
        kind.stage_index(stage)?;
        Some(match (kind, stage) {
            (_, Checked) | (_, Verified) => StageGate::Check,
            (_, Approved) => StageGate::Approve,
            (EntityKind::ProtectiveSystem, Issued) => StageGate::Issue,
            _ => StageGate::Edit,
        })
    }

    fn capability(&self) -> Capability {
        match self {
            StageGate::Edit => Capability::Edit,
            StageGate::Check | StageGate::Issue => Capability::Check,
            StageGate::Approve => Capability::Approve,
        }
    }

    /// Roles that pass this gate
    pub fn roles(&self) -> Vec<Role> {
        Role::holders(self.capability())
    }
}

/// A status transition to evaluate; never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRequest {
    pub kind: EntityKind,
    pub from: WorkflowStatus,
    pub to: WorkflowStatus,
    pub role: Role,
    pub entity_active: bool,
    /// False if any ancestor in the hierarchy is inactive
    pub ancestors_active: bool,
}

/// Why a transition was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenialReason {
    #[error("entity is inactive")]
    Inactive,

    #[error("a parent in the hierarchy is inactive")]
    AncestorInactive,

    #[error("'{status}' is not a workflow stage for {kind}")]
    NotInWorkflow {
        kind: EntityKind,
        status: WorkflowStatus,
    },

    #[error("role {role} has no edit permission")]
    BaselineEditRequired { role: Role },

    #[error("cannot move {from} → {to}: stages must be advanced one at a time")]
    OutOfOrder {
        from: WorkflowStatus,
        to: WorkflowStatus,
    },

    #[error("role {role} may not move to {stage} (requires {})", RoleList(.required))]
    WrongRole {
        role: Role,
        stage: WorkflowStatus,
        required: Vec<Role>,
    },

    #[error("{status} is terminal for {kind} and cannot be reopened")]
    TerminalLocked {
        kind: EntityKind,
        status: WorkflowStatus,
    },

    #[error("{status} is the final stage for {kind}; there is nothing to advance to")]
    AtFinalStage {
        kind: EntityKind,
        status: WorkflowStatus,
    },
}

impl DenialReason {
    /// Denied because of the actor's role rather than the transition itself
    pub fn is_role_denial(&self) -> bool {
        matches!(
            self,
            DenialReason::WrongRole { .. } | DenialReason::BaselineEditRequired { .. }
        )
    }
}

struct RoleList<'a>(&'a [Role]);

impl fmt::Display for RoleList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.0.iter().map(|r| r.to_string()).collect();
        f.write_str(&names.join(" or "))
    }
}

/// Status transition rules
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusPolicy {
    /// Refuse backward moves out of a kind's terminal stage
    lock_terminal: bool,
}

impl StatusPolicy {
    pub fn new(lock_terminal: bool) -> Self {
        Self { lock_terminal }
    }

    pub fn lock_terminal(&self) -> bool {
        self.lock_terminal
    }

    /// Evaluate a request, returning the first rule it breaks
    pub fn check(&self, req: &TransitionRequest) -> Result<(), DenialReason> {
        if !req.entity_active {
            return Err(DenialReason::Inactive);
        }
        if !req.ancestors_active {
            return Err(DenialReason::AncestorInactive);
        }

        let not_in_workflow = |status| DenialReason::NotInWorkflow {
            kind: req.kind,
            status,
        };
        let current = req
            .kind
            .stage_index(req.from)
            .ok_or_else(|| not_in_workflow(req.from))?;
        let target = req
            .kind
            .stage_index(req.to)
            .ok_or_else(|| not_in_workflow(req.to))?;

        if target <= current {
            if !req.role.has(Capability::Edit) {
                return Err(DenialReason::BaselineEditRequired { role: req.role });
            }
            if self.lock_terminal
                && target < current
                && Some(req.from) == req.kind.terminal_status()
            {
                return Err(DenialReason::TerminalLocked {
                    kind: req.kind,
                    status: req.from,
                });
            }
            return Ok(());
        }

        if target != current + 1 {
            return Err(DenialReason::OutOfOrder {
                from: req.from,
                to: req.to,
            });
        }

        let gate = StageGate::for_stage(req.kind, req.to).unwrap_or(StageGate::Edit);
        if !req.role.has(gate.capability()) {
            return Err(DenialReason::WrongRole {
                role: req.role,
                stage: req.to,
                required: gate.roles(),
            });
        }
        if gate == StageGate::Issue && req.from != WorkflowStatus::Approved {
            return Err(DenialReason::OutOfOrder {
                from: req.from,
                to: req.to,
            });
        }

        Ok(())
    }

    pub fn is_allowed(&self, req: &TransitionRequest) -> bool {
        self.check(req).is_ok()
    }

    /// Every status, other than the current one, that the request's actor may move to
    pub fn allowed_targets(
        &self,
        kind: EntityKind,
        current: WorkflowStatus,
        role: Role,
        entity_active: bool,
        ancestors_active: bool,
    ) -> Vec<WorkflowStatus> {
        kind.stages()
            .iter()
            .copied()
            .filter(|to| *to != current)
            .filter(|to| {
                self.is_allowed(&TransitionRequest {
                    kind,
                    from: current,
                    to: *to,
                    role,
                    entity_active,
                    ancestors_active,
                })
            })
            .collect()
    }
}

/// Default-policy check for an entity whose ancestors are all active
pub fn is_transition_allowed(
    kind: EntityKind,
    current: WorkflowStatus,
    target: WorkflowStatus,
    role: Role,
    entity_active: bool,
) -> bool {
    StatusPolicy::default().is_allowed(&TransitionRequest {
        kind,
        from: current,
        to: target,
        role,
        entity_active,
        ancestors_active: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use WorkflowStatus::*;

    const ALL_STATUSES: [WorkflowStatus; 7] =
        [Draft, InReview, Checked, Calculated, Verified, Approved, Issued];

    fn request(kind: EntityKind, from: WorkflowStatus, to: WorkflowStatus, role: Role) -> TransitionRequest {
        TransitionRequest {
            kind,
            from,
            to,
            role,
            entity_active: true,
            ancestors_active: true,
        }
    }

    #[test]
    fn test_psv_happy_path() {
        let psv = EntityKind::ProtectiveSystem;
        assert!(is_transition_allowed(psv, Draft, InReview, Role::Engineer, true));
        assert!(is_transition_allowed(psv, InReview, Checked, Role::Lead, true));
        assert!(is_transition_allowed(psv, Checked, Approved, Role::Approver, true));
        assert!(is_transition_allowed(psv, Approved, Issued, Role::Lead, true));
        assert!(is_transition_allowed(psv, Approved, Issued, Role::Admin, true));
    }

    #[test]
    fn test_psv_gates_by_role() {
        let psv = EntityKind::ProtectiveSystem;
        assert!(!is_transition_allowed(psv, InReview, Checked, Role::Engineer, true));
        assert!(!is_transition_allowed(psv, Checked, Approved, Role::Lead, true));
        assert!(!is_transition_allowed(psv, Approved, Issued, Role::Engineer, true));
        assert!(!is_transition_allowed(psv, Draft, InReview, Role::Viewer, true));
    }

    #[test]
    fn test_engineer_cannot_check_scenario() {
        let policy = StatusPolicy::default();
        let err = policy
            .check(&request(EntityKind::Scenario, Draft, Checked, Role::Engineer))
            .unwrap_err();
        assert!(matches!(err, DenialReason::WrongRole { stage: Checked, .. }));
        assert!(err.is_role_denial());
        assert!(err.to_string().contains("lead or approver or admin"));
    }

    #[test]
    fn test_lead_cannot_skip_to_approved() {
        let policy = StatusPolicy::default();
        let err = policy
            .check(&request(EntityKind::ProtectiveSystem, Draft, Approved, Role::Lead))
            .unwrap_err();
        assert_eq!(err, DenialReason::OutOfOrder { from: Draft, to: Approved });
        assert!(!err.is_role_denial());
    }

    #[test]
    fn test_no_skip_ahead_for_any_role() {
        let policy = StatusPolicy::default();
        for kind in EntityKind::ALL {
            let stages = kind.stages();
            for (ci, from) in stages.iter().enumerate() {
                for to in stages.iter().skip(ci + 2) {
                    for role in Role::ALL {
                        assert!(
                            !policy.is_allowed(&request(kind, *from, *to, role)),
                            "{kind}: {from} -> {to} allowed for {role}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_inactive_is_frozen_in_every_direction() {
        let policy = StatusPolicy::default();
        for kind in EntityKind::ALL {
            for from in kind.stages() {
                for to in ALL_STATUSES {
                    for role in Role::ALL {
                        let mut req = request(kind, *from, to, role);
                        req.entity_active = false;
                        assert_eq!(policy.check(&req), Err(DenialReason::Inactive));
                        req.entity_active = true;
                        req.ancestors_active = false;
                        assert_eq!(policy.check(&req), Err(DenialReason::AncestorInactive));
                    }
                }
            }
        }
    }

    #[test]
    fn test_backward_moves_need_edit_only() {
        let psv = EntityKind::ProtectiveSystem;
        assert!(is_transition_allowed(psv, Issued, Draft, Role::Engineer, true));
        assert!(is_transition_allowed(psv, Approved, Checked, Role::Engineer, true));
        assert!(is_transition_allowed(psv, Checked, Checked, Role::Engineer, true));
        assert!(!is_transition_allowed(psv, Approved, Draft, Role::Viewer, true));
    }

    #[test]
    fn test_lock_terminal() {
        let policy = StatusPolicy::new(true);
        let psv = EntityKind::ProtectiveSystem;
        assert_eq!(
            policy.check(&request(psv, Issued, Approved, Role::Admin)),
            Err(DenialReason::TerminalLocked { kind: psv, status: Issued })
        );
        // No-op on terminal and backward moves elsewhere stay allowed
        assert!(policy.is_allowed(&request(psv, Issued, Issued, Role::Engineer)));
        assert!(policy.is_allowed(&request(psv, Approved, Draft, Role::Engineer)));
    }

    #[test]
    fn test_undefined_combinations_are_denied() {
        let policy = StatusPolicy::default();
        for kind in EntityKind::ALL {
            for from in ALL_STATUSES {
                for to in ALL_STATUSES {
                    for role in Role::ALL {
                        let req = request(kind, from, to, role);
                        let defined = kind.stage_index(from).is_some() && kind.stage_index(to).is_some();
                        if !defined {
                            assert!(matches!(
                                policy.check(&req),
                                Err(DenialReason::NotInWorkflow { .. })
                            ));
                        }
                    }
                }
            }
        }
        assert!(!is_transition_allowed(EntityKind::SizingCase, Approved, Issued, Role::Admin, true));
        assert!(!is_transition_allowed(EntityKind::Area, Draft, Draft, Role::Admin, true));
    }

    #[test]
    fn test_sizing_case_sequence() {
        let szc = EntityKind::SizingCase;
        assert!(is_transition_allowed(szc, Draft, Calculated, Role::Engineer, true));
        assert!(!is_transition_allowed(szc, Calculated, Verified, Role::Engineer, true));
        assert!(is_transition_allowed(szc, Calculated, Verified, Role::Lead, true));
        assert!(is_transition_allowed(szc, Verified, Approved, Role::Approver, true));
    }

    #[test]
    fn test_allowed_targets() {
        let policy = StatusPolicy::default();
        assert_eq!(
            policy.allowed_targets(EntityKind::ProtectiveSystem, Checked, Role::Approver, true, true),
            vec![Draft, InReview, Approved]
        );
        assert_eq!(
            policy.allowed_targets(EntityKind::ProtectiveSystem, Checked, Role::Engineer, true, true),
            vec![Draft, InReview]
        );
        assert!(policy
            .allowed_targets(EntityKind::ProtectiveSystem, Checked, Role::Admin, false, true)
            .is_empty());
    }

    #[test]
    fn test_stage_gates() {
        assert_eq!(
            StageGate::for_stage(EntityKind::ProtectiveSystem, Issued),
            Some(StageGate::Issue)
        );
        assert_eq!(
            StageGate::for_stage(EntityKind::SizingCase, Calculated),
            Some(StageGate::Edit)
        );
        assert_eq!(StageGate::for_stage(EntityKind::SizingCase, Issued), None);
        assert_eq!(StageGate::Approve.roles(), vec![Role::Approver, Role::Admin]);
    }
}

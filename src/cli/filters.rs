//! Filter enums for list commands

use clap::ValueEnum;

use crate::core::entity::{EntityKind, WorkflowStatus};

/// Entity kind selector used by `new` and `list`
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum KindFilter {
    Customer,
    Plant,
    Unit,
    Area,
    /// Protective system (relief valve)
    Psv,
    Scenario,
    /// Sizing case
    Sizing,
}

impl KindFilter {
    pub fn kind(&self) -> EntityKind {
        match self {
            KindFilter::Customer => EntityKind::Customer,
            KindFilter::Plant => EntityKind::Plant,
            KindFilter::Unit => EntityKind::Unit,
            KindFilter::Area => EntityKind::Area,
            KindFilter::Psv => EntityKind::ProtectiveSystem,
            KindFilter::Scenario => EntityKind::Scenario,
            KindFilter::Sizing => EntityKind::SizingCase,
        }
    }
}

/// Status filter for list commands
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum StatusFilter {
    Draft,
    InReview,
    Checked,
    Calculated,
    Verified,
    Approved,
    Issued,
    /// Workflow records not yet at their terminal stage
    Open,
    /// Everything - default
    #[default]
    Any,
}

impl StatusFilter {
    /// Check if a record of `kind` at `status` matches this filter
    pub fn matches(&self, kind: EntityKind, status: WorkflowStatus) -> bool {
        match self {
            StatusFilter::Any => true,
            StatusFilter::Open => {
                kind.has_workflow() && kind.terminal_status() != Some(status)
            }
            exact => kind.has_workflow() && exact.status() == Some(status),
        }
    }

    fn status(&self) -> Option<WorkflowStatus> {
        match self {
            StatusFilter::Draft => Some(WorkflowStatus::Draft),
            StatusFilter::InReview => Some(WorkflowStatus::InReview),
            StatusFilter::Checked => Some(WorkflowStatus::Checked),
            StatusFilter::Calculated => Some(WorkflowStatus::Calculated),
            StatusFilter::Verified => Some(WorkflowStatus::Verified),
            StatusFilter::Approved => Some(WorkflowStatus::Approved),
            StatusFilter::Issued => Some(WorkflowStatus::Issued),
            StatusFilter::Open | StatusFilter::Any => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_status_filter() {
        assert!(StatusFilter::Draft.matches(EntityKind::ProtectiveSystem, WorkflowStatus::Draft));
        assert!(!StatusFilter::Draft.matches(EntityKind::ProtectiveSystem, WorkflowStatus::Checked));
        // Hierarchy nodes have no workflow status to match
        assert!(!StatusFilter::Draft.matches(EntityKind::Area, WorkflowStatus::Draft));
    }

    #[test]
    fn test_open_filter_excludes_terminal() {
        assert!(StatusFilter::Open.matches(EntityKind::ProtectiveSystem, WorkflowStatus::Approved));
        assert!(!StatusFilter::Open.matches(EntityKind::ProtectiveSystem, WorkflowStatus::Issued));
        assert!(!StatusFilter::Open.matches(EntityKind::SizingCase, WorkflowStatus::Approved));
        assert!(!StatusFilter::Open.matches(EntityKind::Plant, WorkflowStatus::Draft));
    }

    #[test]
    fn test_any_matches_everything() {
        for kind in EntityKind::ALL {
            assert!(StatusFilter::Any.matches(kind, WorkflowStatus::Draft));
        }
    }

    #[test]
    fn test_kind_filter_covers_every_kind() {
        let kinds: Vec<EntityKind> = KindFilter::value_variants().iter().map(|k| k.kind()).collect();
        assert_eq!(kinds, EntityKind::ALL.to_vec());
    }
}

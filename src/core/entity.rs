//! Entity kinds and workflow statuses shared by every record type

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kinds of record tracked in a project
///
/// The first four are plain hierarchy nodes (customer → plant → unit → area).
/// The last three carry a workflow status and revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Customer,
    Plant,
    Unit,
    Area,
    /// A pressure-relief valve or other protective device
    ProtectiveSystem,
    /// An overpressure scenario for a protective system
    Scenario,
    /// A sizing-case calculation for a scenario
    SizingCase,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Customer,
        EntityKind::Plant,
        EntityKind::Unit,
        EntityKind::Area,
        EntityKind::ProtectiveSystem,
        EntityKind::Scenario,
        EntityKind::SizingCase,
    ];

    /// ID prefix for this kind
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityKind::Customer => "CUS",
            EntityKind::Plant => "PLT",
            EntityKind::Unit => "UNT",
            EntityKind::Area => "AREA",
            EntityKind::ProtectiveSystem => "PSV",
            EntityKind::Scenario => "SCN",
            EntityKind::SizingCase => "SZC",
        }
    }

    /// Resolve a kind from its ID prefix (case-insensitive)
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.prefix().eq_ignore_ascii_case(prefix))
    }

    /// Directory name used by file-backed stores
    pub fn dir_name(&self) -> &'static str {
        match self {
            EntityKind::Customer => "customers",
            EntityKind::Plant => "plants",
            EntityKind::Unit => "units",
            EntityKind::Area => "areas",
            EntityKind::ProtectiveSystem => "psvs",
            EntityKind::Scenario => "scenarios",
            EntityKind::SizingCase => "sizing_cases",
        }
    }

    /// The kind a record of this kind must hang under, if any
    pub fn parent_kind(&self) -> Option<EntityKind> {
        match self {
            EntityKind::Customer => None,
            EntityKind::Plant => Some(EntityKind::Customer),
            EntityKind::Unit => Some(EntityKind::Plant),
            EntityKind::Area => Some(EntityKind::Unit),
            EntityKind::ProtectiveSystem => Some(EntityKind::Area),
            EntityKind::Scenario => Some(EntityKind::ProtectiveSystem),
            EntityKind::SizingCase => Some(EntityKind::Scenario),
        }
    }

    /// Ordered stage sequence; empty for hierarchy nodes
    pub fn stages(&self) -> &'static [WorkflowStatus] {
        use WorkflowStatus::*;
        match self {
            EntityKind::ProtectiveSystem => &[Draft, InReview, Checked, Approved, Issued],
            EntityKind::Scenario => &[Draft, Checked, Approved],
            EntityKind::SizingCase => &[Draft, Calculated, Verified, Approved],
            EntityKind::Customer | EntityKind::Plant | EntityKind::Unit | EntityKind::Area => &[],
        }
    }

    /// Whether records of this kind carry a status and revisions
    pub fn has_workflow(&self) -> bool {
        !self.stages().is_empty()
    }

    /// Position of `status` in this kind's sequence
    pub fn stage_index(&self, status: WorkflowStatus) -> Option<usize> {
        self.stages().iter().position(|s| *s == status)
    }

    pub fn initial_status(&self) -> Option<WorkflowStatus> {
        self.stages().first().copied()
    }

    pub fn terminal_status(&self) -> Option<WorkflowStatus> {
        self.stages().last().copied()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Customer => write!(f, "customer"),
            EntityKind::Plant => write!(f, "plant"),
            EntityKind::Unit => write!(f, "unit"),
            EntityKind::Area => write!(f, "area"),
            EntityKind::ProtectiveSystem => write!(f, "protective_system"),
            EntityKind::Scenario => write!(f, "scenario"),
            EntityKind::SizingCase => write!(f, "sizing_case"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "customer" | "cus" => Ok(EntityKind::Customer),
            "plant" | "plt" => Ok(EntityKind::Plant),
            "unit" | "unt" => Ok(EntityKind::Unit),
            "area" => Ok(EntityKind::Area),
            "protective_system" | "psv" | "valve" => Ok(EntityKind::ProtectiveSystem),
            "scenario" | "scn" => Ok(EntityKind::Scenario),
            "sizing_case" | "sizing" | "szc" => Ok(EntityKind::SizingCase),
            _ => Err(format!("Unknown entity kind: {}", s)),
        }
    }
}

/// Every workflow stage name used by any kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    InReview,
    Checked,
    Calculated,
    Verified,
    Approved,
    Issued,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Draft => "draft",
            WorkflowStatus::InReview => "in_review",
            WorkflowStatus::Checked => "checked",
            WorkflowStatus::Calculated => "calculated",
            WorkflowStatus::Verified => "verified",
            WorkflowStatus::Approved => "approved",
            WorkflowStatus::Issued => "issued",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "draft" => Ok(WorkflowStatus::Draft),
            "in_review" | "review" => Ok(WorkflowStatus::InReview),
            "checked" => Ok(WorkflowStatus::Checked),
            "calculated" => Ok(WorkflowStatus::Calculated),
            "verified" => Ok(WorkflowStatus::Verified),
            "approved" => Ok(WorkflowStatus::Approved),
            "issued" => Ok(WorkflowStatus::Issued),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_lookup() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_prefix(kind.prefix()), Some(kind));
        }
        assert_eq!(EntityKind::from_prefix("psv"), Some(EntityKind::ProtectiveSystem));
        assert_eq!(EntityKind::from_prefix("REV"), None);
    }

    #[test]
    fn test_stage_sequences() {
        use WorkflowStatus::*;
        assert_eq!(
            EntityKind::ProtectiveSystem.terminal_status(),
            Some(Issued)
        );
        assert_eq!(EntityKind::SizingCase.terminal_status(), Some(Approved));
        assert_eq!(EntityKind::Scenario.stage_index(Checked), Some(1));
        assert_eq!(EntityKind::SizingCase.stage_index(Issued), None);
        assert!(!EntityKind::Area.has_workflow());
        assert_eq!(EntityKind::Plant.initial_status(), None);
        for kind in EntityKind::ALL.iter().filter(|k| k.has_workflow()) {
            assert_eq!(kind.initial_status(), Some(Draft));
        }
    }

    #[test]
    fn test_hierarchy_chain() {
        let mut kind = EntityKind::SizingCase;
        let mut depth = 0;
        while let Some(parent) = kind.parent_kind() {
            kind = parent;
            depth += 1;
        }
        assert_eq!(kind, EntityKind::Customer);
        assert_eq!(depth, 6);
    }

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("in_review".parse::<WorkflowStatus>(), Ok(WorkflowStatus::InReview));
        assert_eq!("In-Review".parse::<WorkflowStatus>(), Ok(WorkflowStatus::InReview));
        assert_eq!(WorkflowStatus::InReview.to_string(), "in_review");
        assert!("obsolete".parse::<WorkflowStatus>().is_err());
    }

    #[test]
    fn test_kind_parse_aliases() {
        assert_eq!("psv".parse::<EntityKind>(), Ok(EntityKind::ProtectiveSystem));
        assert_eq!("sizing-case".parse::<EntityKind>(), Ok(EntityKind::SizingCase));
        assert!("valve-body".parse::<EntityKind>().is_err());
    }
}

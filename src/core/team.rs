//! Team roster and roles
//!
//! Roles form a closed set, each with a fixed capability set. Policy code asks
//! for a capability instead of comparing role names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::str::FromStr;

use crate::core::project::Project;
use crate::yaml::{parse_yaml_file, YamlError};

/// Roster file location within a project
pub const ROSTER_FILE: &str = ".psvt/team.yaml";

/// A team member's role
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Read-only access
    #[default]
    Viewer,
    /// Baseline edit permission
    Engineer,
    /// Engineering lead - may check work and override signatures
    Lead,
    /// May approve work
    Approver,
    /// Full access
    Admin,
}

/// Something a role may be permitted to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Create and edit records, move status backward, advance through ungated stages
    Edit,
    /// Enter a "checked"/"verified" stage
    Check,
    /// Enter an "approved" stage
    Approve,
    /// Revoke a signature placed by someone else
    Override,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Viewer,
        Role::Engineer,
        Role::Lead,
        Role::Approver,
        Role::Admin,
    ];

    /// Capabilities granted to this role
    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Role::Viewer => &[],
            Role::Engineer => &[Edit],
            Role::Lead => &[Edit, Check, Override],
            Role::Approver | Role::Admin => &[Edit, Check, Approve, Override],
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Roles that hold a capability, for error messages
    pub fn holders(capability: Capability) -> Vec<Role> {
        Self::ALL
            .into_iter()
            .filter(|r| r.has(capability))
            .collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Viewer => write!(f, "viewer"),
            Role::Engineer => write!(f, "engineer"),
            Role::Lead => write!(f, "lead"),
            Role::Approver => write!(f, "approver"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "viewer" | "read" | "readonly" => Ok(Role::Viewer),
            "engineer" | "engineering" => Ok(Role::Engineer),
            "lead" => Ok(Role::Lead),
            "approver" => Ok(Role::Approver),
            "admin" => Ok(Role::Admin),
            _ => Err(format!(
                "Unknown role: {}. Expected viewer, engineer, lead, approver, or admin",
                s
            )),
        }
    }
}

/// The acting user: who signs, and which role the policy evaluates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
}

impl Session {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }
}

/// A member of the project team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    /// Login name, matched against `PSVT_USER` / `$USER`
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    pub role: Role,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// The team roster stored in `.psvt/team.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamRoster {
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

impl TeamRoster {
    /// Load the roster from a project
    ///
    /// `Ok(None)` only when no roster file exists; a file that does not parse
    /// is an error so role checks never fall back to the no-roster defaults.
    pub fn load(project: &Project) -> Result<Option<Self>, YamlError> {
        let path = project.root().join(ROSTER_FILE);
        if !path.exists() {
            return Ok(None);
        }
        parse_yaml_file(&path).map(Some)
    }

    /// Save the roster to a project
    pub fn save(&self, project: &Project) -> std::io::Result<()> {
        let path = project.root().join(ROSTER_FILE);
        let content = serde_yml::to_string(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Find an active member by username (case-insensitive)
    pub fn find(&self, username: &str) -> Option<&TeamMember> {
        self.active_members()
            .find(|m| m.username.eq_ignore_ascii_case(username))
    }

    pub fn active_members(&self) -> impl Iterator<Item = &TeamMember> {
        self.members.iter().filter(|m| m.active)
    }

    pub fn members_with_role(&self, role: Role) -> impl Iterator<Item = &TeamMember> {
        self.active_members().filter(move |m| m.role == role)
    }

    /// Add a member, replacing any existing entry with the same username
    pub fn upsert(&mut self, member: TeamMember) {
        self.members
            .retain(|m| !m.username.eq_ignore_ascii_case(&member.username));
        self.members.push(member);
    }

    /// Remove a member by username; returns whether one was removed
    pub fn remove(&mut self, username: &str) -> bool {
        let before = self.members.len();
        self.members
            .retain(|m| !m.username.eq_ignore_ascii_case(username));
        self.members.len() != before
    }
}

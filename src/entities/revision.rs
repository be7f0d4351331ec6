//! Revision records and revision codes
//!
//! A revision marks an entity's state at a point in time and carries three
//! signatures: originator, checker, approver. Codes are `[A-Z][1-9]`: the letter
//! is the revision tier, the digit the iteration within that tier. Tier `O`
//! ("Original") sorts before every other letter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::core::entity::EntityKind;
use crate::core::identity::{EntityId, RevisionId};

/// Letter reserved for the original issue
pub const ORIGINAL_TIER: char = 'O';

/// Error for a malformed revision code
#[derive(Debug, Clone, PartialEq, Eq, Error, miette::Diagnostic)]
#[error("invalid revision code '{0}'")]
#[diagnostic(
    code(psvt::revision::invalid_code),
    help("a revision code is one upper-case letter followed by a digit 1-9, e.g. O1, A3, C9")
)]
pub struct RevisionCodeError(pub String);

/// A revision code such as `O1`, `A3`, `C9`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RevisionCode {
    tier: char,
    iteration: u8,
}

impl RevisionCode {
    /// The first code an entity receives
    pub const ORIGINAL: RevisionCode = RevisionCode {
        tier: ORIGINAL_TIER,
        iteration: 1,
    };

    pub fn new(tier: char, iteration: u8) -> Result<Self, RevisionCodeError> {
        if tier.is_ascii_uppercase() && (1..=9).contains(&iteration) {
            Ok(Self { tier, iteration })
        } else {
            Err(RevisionCodeError(format!("{}{}", tier, iteration)))
        }
    }

    pub fn tier(&self) -> char {
        self.tier
    }

    pub fn iteration(&self) -> u8 {
        self.iteration
    }

    /// Sort rank of the tier letter: `O` first, then `A..Z` without `O`
    fn tier_rank(&self) -> u8 {
        if self.tier == ORIGINAL_TIER {
            0
        } else {
            self.tier as u8 - b'A' + 1
        }
    }

    /// The code that follows this one
    ///
    /// Iterations count up to 9, then the tier advances with the iteration reset
    /// to 1. `O` and `Z` both roll over to `A1`. `N` skips the reserved `O` and
    /// moves on to `P`.
    pub fn successor(&self) -> RevisionCode {
        if self.iteration < 9 {
            return RevisionCode {
                tier: self.tier,
                iteration: self.iteration + 1,
            };
        }
        let tier = match self.tier {
            ORIGINAL_TIER | 'Z' => 'A',
            'N' => 'P',
            t => (t as u8 + 1) as char,
        };
        RevisionCode { tier, iteration: 1 }
    }

    /// Next code after `current`, or `O1` when there is none
    pub fn suggest_next(current: Option<&RevisionCode>) -> RevisionCode {
        current.map_or(RevisionCode::ORIGINAL, RevisionCode::successor)
    }
}

impl Ord for RevisionCode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tier_rank()
            .cmp(&other.tier_rank())
            .then(self.iteration.cmp(&other.iteration))
    }
}

impl PartialOrd for RevisionCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RevisionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.tier, self.iteration)
    }
}

impl FromStr for RevisionCode {
    type Err = RevisionCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(tier), Some(digit), None) => {
                let iteration = digit
                    .to_digit(10)
                    .ok_or_else(|| RevisionCodeError(s.to_string()))?;
                RevisionCode::new(tier, iteration as u8).map_err(|_| RevisionCodeError(s.to_string()))
            }
            _ => Err(RevisionCodeError(s.to_string())),
        }
    }
}

impl Serialize for RevisionCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RevisionCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One of the three attestation slots on a revision
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SignatureSlot {
    Originator,
    Checker,
    Approver,
}

impl SignatureSlot {
    pub const ALL: [SignatureSlot; 3] = [
        SignatureSlot::Originator,
        SignatureSlot::Checker,
        SignatureSlot::Approver,
    ];

    /// Slots that must already be signed before this one may be signed
    pub fn prerequisites(&self) -> &'static [SignatureSlot] {
        match self {
            SignatureSlot::Originator => &[],
            SignatureSlot::Checker => &[SignatureSlot::Originator],
            SignatureSlot::Approver => &[SignatureSlot::Originator, SignatureSlot::Checker],
        }
    }
}

impl fmt::Display for SignatureSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureSlot::Originator => write!(f, "originator"),
            SignatureSlot::Checker => write!(f, "checker"),
            SignatureSlot::Approver => write!(f, "approver"),
        }
    }
}

impl FromStr for SignatureSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "originator" | "originated" | "author" => Ok(SignatureSlot::Originator),
            "checker" | "checked" => Ok(SignatureSlot::Checker),
            "approver" | "approved" => Ok(SignatureSlot::Approver),
            _ => Err(format!("Unknown signature slot: {}", s)),
        }
    }
}

/// State of a signature slot; signer and time are set and cleared together
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Signature {
    #[default]
    Unsigned,
    Signed { by: String, at: DateTime<Utc> },
}

impl Signature {
    pub fn is_signed(&self) -> bool {
        matches!(self, Signature::Signed { .. })
    }

    pub fn signer(&self) -> Option<&str> {
        match self {
            Signature::Signed { by, .. } => Some(by),
            Signature::Unsigned => None,
        }
    }

    pub fn signed_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Signature::Signed { at, .. } => Some(*at),
            Signature::Unsigned => None,
        }
    }
}

/// A revision of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub id: RevisionId,
    pub entity_type: EntityKind,
    pub entity_id: EntityId,
    pub code: RevisionCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub originated: Signature,
    #[serde(default)]
    pub checked: Signature,
    #[serde(default)]
    pub approved: Signature,
}

impl Revision {
    /// A new, unsigned revision
    pub fn new(entity_id: EntityId, code: RevisionCode, description: Option<String>) -> Self {
        Self {
            id: RevisionId::new(),
            entity_type: entity_id.kind(),
            entity_id,
            code,
            description,
            created: Utc::now(),
            originated: Signature::Unsigned,
            checked: Signature::Unsigned,
            approved: Signature::Unsigned,
        }
    }

    pub fn slot(&self, slot: SignatureSlot) -> &Signature {
        match slot {
            SignatureSlot::Originator => &self.originated,
            SignatureSlot::Checker => &self.checked,
            SignatureSlot::Approver => &self.approved,
        }
    }

    pub fn slot_mut(&mut self, slot: SignatureSlot) -> &mut Signature {
        match slot {
            SignatureSlot::Originator => &mut self.originated,
            SignatureSlot::Checker => &mut self.checked,
            SignatureSlot::Approver => &mut self.approved,
        }
    }

    /// Prerequisite slots of `slot` that are still unsigned
    pub fn missing_prerequisites(&self, slot: SignatureSlot) -> Vec<SignatureSlot> {
        slot.prerequisites()
            .iter()
            .copied()
            .filter(|p| !self.slot(*p).is_signed())
            .collect()
    }

    /// Whether every slot is signed
    pub fn is_fully_signed(&self) -> bool {
        SignatureSlot::ALL.iter().all(|s| self.slot(*s).is_signed())
    }
}

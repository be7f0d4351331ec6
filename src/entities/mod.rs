//! Stored record types

pub mod record;
pub mod revision;

pub use record::{Entity, StatusChange};
pub use revision::{Revision, RevisionCode, RevisionCodeError, Signature, SignatureSlot};

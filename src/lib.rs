//! PSV Tracker: revision and approval workflow for pressure-relief-valve records
//!
//! Tracks protective systems, overpressure scenarios and sizing cases under a
//! customer → plant → unit → area hierarchy, with a role-gated status workflow
//! and signed revisions.

pub mod cli;
pub mod core;
pub mod entities;
pub mod yaml;

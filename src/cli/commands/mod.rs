//! CLI command implementations

pub mod completions;
pub mod entity;
pub mod init;
pub mod rev;
pub mod status;
pub mod team;

//! CLI command implementations

pub mod get;
pub mod ls;
pub mod put;
pub mod stat;

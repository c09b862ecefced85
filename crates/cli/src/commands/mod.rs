//! Subcommand implementations

pub mod companies;
pub mod estimate;

//! CLI subcommand implementations.

pub mod channels;
pub mod collect;

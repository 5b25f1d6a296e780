pub mod config;
pub mod core;
pub mod exchange;
pub mod stats;
pub mod students;

/// Literal phrase the operator must type before any destructive operation.
/// Checked here at the presentation boundary; the store itself does not ask.
pub const CONFIRM_PHRASE: &str = "SUPPRIMER";

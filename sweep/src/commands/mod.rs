/// Sweep command handlers and logic
pub mod clean;

// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "importer/mod.rs"]
pub mod importer;

#[path = "transcript/mod.rs"]
pub mod transcript;

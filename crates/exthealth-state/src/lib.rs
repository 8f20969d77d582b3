//! exthealth-state: settings persistence for exthealth
//!
//! This crate owns durable storage of the monitor's settings blob. The blob
//! is opaque here: callers hand in a `serde_json::Value` and get the same
//! value back on the next load.
//!
//! ## Layer 0 - Data/Persistence
//!
//! ## Key Components
//!
//! - `SettingsStore`: async load/save contract
//! - `JsonFileSettingsStore`: single JSON file, replaced atomically on save
//! - `fakes::MemorySettingsStore`: in-memory store with failure injection

mod error;
pub mod fakes;
mod json_file;
pub mod storage_traits;

pub use error::StoreError;
pub use json_file::JsonFileSettingsStore;
pub use storage_traits::{SettingsStore, StoreResult};

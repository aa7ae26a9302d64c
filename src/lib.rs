//! Cycle tracking with period, ovulation and fertile window prediction.
//!
//! The core (`cycles`, `stats`, `prediction`) is pure over an entry history
//! and talks to storage only through the traits in `storage`. `memory` and
//! `vault` are the two backends; `tracker` wires check-ins to recomputation.

pub mod config;
pub mod crypto;
pub mod cycles;
pub mod error;
pub mod logging;
pub mod memory;
pub mod models;
pub mod phase;
pub mod prediction;
pub mod stats;
pub mod storage;
pub mod tracker;
pub mod vault;

pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use storage::{EntryStore, InsightStore, PredictionStore, ProfileStore, StoreError};
pub use tracker::{CheckIn, Tracker};
pub use vault::VaultStore;

//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (monotonic clock for fuel tick deltas)
//! - Storage (LocalStorage on web, files on native, memory in tests)

pub mod storage;
pub mod time;

pub use storage::{MemoryStorage, Storage, StorageError};
pub use time::{Clock, ManualClock};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
#[cfg(not(target_arch = "wasm32"))]
pub use time::SystemClock;

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
#[cfg(target_arch = "wasm32")]
pub use time::PerformanceClock;

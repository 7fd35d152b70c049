//! Durable JSON-file stores for the PetFlix backend.
//!
//! Two small persistent maps back the orchestrator across restarts:
//! - [`ContentCache`]: content fingerprint → finished video reference
//! - [`BudgetTracker`]: accumulated API spend and the spend gate

pub mod budget;
pub mod cache;
pub mod error;

pub use budget::{BudgetTracker, BILLING_UNIT_SECONDS, DEFAULT_CAP_USD, DEFAULT_UNIT_PRICE_USD};
pub use cache::{fingerprint, CacheEntry, ContentCache};
pub use error::{StoreError, StoreResult};

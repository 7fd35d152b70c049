//! Persistent spend ledger and budget gate.
//!
//! Every billed generation call costs `ceil(duration / 6s)` units at a
//! fixed unit price. The gate must be consulted, and must deny, before any
//! billable remote call is issued; the ledger itself is best-effort
//! persistence (a crash between the call and the write can under-count).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::StoreResult;

/// Billing granularity of the generation API.
pub const BILLING_UNIT_SECONDS: f64 = 6.0;
/// Default monetary cap.
pub const DEFAULT_CAP_USD: f64 = 50.0;
/// Default price per billing unit.
pub const DEFAULT_UNIT_PRICE_USD: f64 = 0.43;

#[derive(Debug, Default, Serialize, Deserialize)]
struct BudgetLedger {
    accumulated_cost_usd: f64,
}

/// Spend accumulator persisted as a single JSON file.
#[derive(Debug, Clone)]
pub struct BudgetTracker {
    path: PathBuf,
    cap_usd: f64,
    unit_price_usd: f64,
}

impl BudgetTracker {
    pub fn new(path: impl Into<PathBuf>, cap_usd: f64, unit_price_usd: f64) -> Self {
        Self {
            path: path.into(),
            cap_usd,
            unit_price_usd,
        }
    }

    /// Tracker with the default cap and unit price.
    pub fn with_defaults(path: impl Into<PathBuf>) -> Self {
        Self::new(path, DEFAULT_CAP_USD, DEFAULT_UNIT_PRICE_USD)
    }

    pub fn cap_usd(&self) -> f64 {
        self.cap_usd
    }

    /// Cost of one generation call for a clip of the given duration.
    ///
    /// Every call bills at least one unit.
    pub fn call_cost(&self, duration_seconds: f64) -> f64 {
        let units = (duration_seconds / BILLING_UNIT_SECONDS).ceil().max(1.0);
        units * self.unit_price_usd
    }

    /// Total spend recorded so far. Missing or corrupt ledgers read as 0.
    pub async fn accumulated(&self) -> f64 {
        match self.read_ledger().await {
            Ok(ledger) => ledger.accumulated_cost_usd,
            Err(e) => {
                warn!("Failed to read budget ledger, assuming $0.00: {}", e);
                0.0
            }
        }
    }

    /// Whether spending `estimated_usd` more stays within the cap.
    pub async fn can_spend(&self, estimated_usd: f64) -> bool {
        let current = self.accumulated().await;
        let allowed = current + estimated_usd <= self.cap_usd;
        if !allowed {
            warn!(
                "Spend blocked: current ${:.2} + estimated ${:.2} exceeds cap ${:.2}",
                current, estimated_usd, self.cap_usd
            );
        }
        allowed
    }

    /// Add `amount_usd` to the ledger and persist it.
    pub async fn record_spend(&self, amount_usd: f64) -> StoreResult<()> {
        let current = self.accumulated().await;
        let total = current + amount_usd;
        self.write_ledger(&BudgetLedger {
            accumulated_cost_usd: total,
        })
        .await?;
        info!(
            "Recorded spend ${:.2}, total accumulated ${:.2}",
            amount_usd, total
        );
        Ok(())
    }

    /// Reset the ledger to zero (manual override / tests).
    pub async fn reset(&self) -> StoreResult<()> {
        self.write_ledger(&BudgetLedger::default()).await
    }

    async fn read_ledger(&self) -> StoreResult<BudgetLedger> {
        if !self.path.exists() {
            return Ok(BudgetLedger::default());
        }
        let raw = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&raw).unwrap_or_default())
    }

    async fn write_ledger(&self, ledger: &BudgetLedger) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let raw = serde_json::to_vec(ledger)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}

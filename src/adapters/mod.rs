//! Adapter interfaces for external systems.
//!
//! The only external collaborator of the report pipeline is the optional
//! language-model guidance call. It sits behind [`GuidanceProvider`] and
//! must never fail past its boundary: any problem yields `None`.

pub mod openrouter;
pub mod retry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    NEXT_ACTIONS_MAX_ITEMS, NEXT_ACTIONS_MIN_ITEMS, SUMMARY_MAX_ITEMS, SUMMARY_MIN_ITEMS,
};

pub use openrouter::OpenRouterProvider;
pub use retry::RetryPolicy;

/// Bullets a guidance provider may replace in the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guidance {
    pub summary: Vec<String>,
    pub next_actions: Vec<String>,
}

impl Guidance {
    /// Whether both lists fall inside the report bounds
    pub fn is_within_bounds(&self) -> bool {
        (SUMMARY_MIN_ITEMS..=SUMMARY_MAX_ITEMS).contains(&self.summary.len())
            && (NEXT_ACTIONS_MIN_ITEMS..=NEXT_ACTIONS_MAX_ITEMS).contains(&self.next_actions.len())
    }
}

/// Trait for guidance providers
#[async_trait]
pub trait GuidanceProvider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Produce guidance for a log, or `None` when unavailable
    ///
    /// Implementations handle their own timeouts and retries. Out-of-bounds
    /// guidance must be reported as `None`.
    async fn generate(
        &self,
        log_text: &str,
        fallback_summary: &[String],
        fallback_next_actions: &[String],
    ) -> Option<Guidance>;
}

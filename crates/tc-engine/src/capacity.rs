//! Token purchase recommendation from peak concurrency.

use serde::{Deserialize, Serialize};

use crate::resource::DEFAULT_UNITS_PER_RESOURCE;
use tc_common::{Error, Result};

/// Tokens owned unless configured otherwise.
pub const DEFAULT_TOKENS_AVAILABLE: u32 = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    BuyMore,
    WithinCapacity,
    ConsiderReducing,
}

impl Verdict {
    pub fn message(&self) -> &'static str {
        match self {
            Verdict::BuyMore => "Peak usage is above the purchase threshold; consider buying more tokens.",
            Verdict::WithinCapacity => "Peak usage is within the current token capacity.",
            Verdict::ConsiderReducing => {
                "Peak usage is well below capacity; the token count could be reduced."
            }
        }
    }
}

/// Thresholds for judging peak usage against owned capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityPolicy {
    pub tokens_available: u32,
    pub units_per_resource: u32,
    pub buy_above_pct: f64,
    pub reduce_below_pct: f64,
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        CapacityPolicy {
            tokens_available: DEFAULT_TOKENS_AVAILABLE,
            units_per_resource: DEFAULT_UNITS_PER_RESOURCE,
            buy_above_pct: 90.0,
            reduce_below_pct: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecommendation {
    pub peak_concurrency: usize,
    /// Simultaneous users the owned tokens cover.
    pub capacity: u64,
    pub usage_pct: f64,
    /// Tokens the peak would need on its own.
    pub tokens_needed: u64,
    pub verdict: Verdict,
}

impl CapacityPolicy {
    pub fn capacity(&self) -> u64 {
        u64::from(self.tokens_available) * u64::from(self.units_per_resource)
    }

    pub fn evaluate(&self, peak_concurrency: usize) -> Result<TokenRecommendation> {
        let capacity = self.capacity();
        if capacity == 0 {
            return Err(Error::invalid_parameter(
                "capacity",
                capacity,
                "tokens_available and units_per_resource must be positive",
            ));
        }
        let usage_pct = peak_concurrency as f64 / capacity as f64 * 100.0;
        let verdict = if usage_pct > self.buy_above_pct {
            Verdict::BuyMore
        } else if usage_pct < self.reduce_below_pct {
            Verdict::ConsiderReducing
        } else {
            Verdict::WithinCapacity
        };
        Ok(TokenRecommendation {
            peak_concurrency,
            capacity,
            usage_pct,
            tokens_needed: (peak_concurrency as u64).div_ceil(u64::from(self.units_per_resource)),
            verdict,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(CapacityPolicy::default().capacity(), 216);
    }

    #[test]
    fn test_verdict_bands() {
        let policy = CapacityPolicy::default();
        // 200 / 216 = 92.6%
        assert_eq!(policy.evaluate(200).unwrap().verdict, Verdict::BuyMore);
        // 150 / 216 = 69.4%
        assert_eq!(policy.evaluate(150).unwrap().verdict, Verdict::WithinCapacity);
        // 100 / 216 = 46.3%
        let low = policy.evaluate(100).unwrap();
        assert_eq!(low.verdict, Verdict::ConsiderReducing);
        assert_eq!(low.tokens_needed, 34);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let policy = CapacityPolicy {
            tokens_available: 0,
            ..CapacityPolicy::default()
        };
        assert_eq!(policy.evaluate(10).unwrap_err().code(), 30);
    }
}

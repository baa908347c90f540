//! Trust weight composition.
//!
//! Weights live in 0..=100. How they combine along a derivation chain is a
//! policy decision, so the rule is a search option rather than a constant.
//! Intersections always take the weaker of their two sides.

use serde::{Deserialize, Serialize};

use crate::credential::MAX_WEIGHT;
use crate::error::{DartError, Result};

/// How weights compose along inclusion chains and linked hops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightRule {
    /// `a * b / 100`, integer division, floored at 1 when both sides are
    /// positive.
    #[default]
    Multiplicative,
    /// `min(a, b)`.
    Minimum,
}

impl WeightRule {
    /// Compose an inherited weight with the next edge or hop weight.
    ///
    /// Zero only if one of the inputs is zero, so a chain of positive
    /// credentials never rounds its member away.
    pub fn chain(self, inherited: u8, next: u8) -> u8 {
        if inherited == 0 || next == 0 {
            return 0;
        }
        let combined = match self {
            Self::Multiplicative => {
                ((inherited as u32 * next as u32) / MAX_WEIGHT as u32).max(1)
            }
            Self::Minimum => inherited.min(next) as u32,
        };
        combined.min(MAX_WEIGHT as u32) as u8
    }

    /// Weight of a member found on both sides of an intersection.
    pub fn intersect(self, left: u8, right: u8) -> u8 {
        left.min(right)
    }
}

impl std::str::FromStr for WeightRule {
    type Err = DartError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "multiplicative" | "product" => Ok(Self::Multiplicative),
            "minimum" | "min" => Ok(Self::Minimum),
            other => Err(DartError::InvalidExpression(format!(
                "unknown weight rule '{other}' (expected multiplicative or minimum)"
            ))),
        }
    }
}

//! Per-tier generation parameters.

use crate::tier::Tier;
use serde::{Deserialize, Serialize};

/// Generation parameters bound to one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierParams {
    /// Model identifier at the configured provider. Empty means the tier is
    /// not configured; the factory rejects it at construction time.
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for TierParams {
    fn default() -> Self {
        Self {
            model: String::new(),
            max_tokens: 1000,
            temperature: 0.5,
        }
    }
}

/// The full tier table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierTable {
    pub basic: TierParams,
    pub standard: TierParams,
    pub premium: TierParams,
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            basic: TierParams {
                model: String::new(),
                max_tokens: 500,
                temperature: 0.3,
            },
            standard: TierParams {
                model: String::new(),
                max_tokens: 1000,
                temperature: 0.5,
            },
            premium: TierParams {
                model: String::new(),
                max_tokens: 4000,
                temperature: 0.7,
            },
        }
    }
}

impl TierTable {
    pub fn params(&self, tier: Tier) -> &TierParams {
        match tier {
            Tier::Basic => &self.basic,
            Tier::Standard => &self.standard,
            Tier::Premium => &self.premium,
        }
    }
}

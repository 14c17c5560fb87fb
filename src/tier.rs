//! Model tier resolution and tenant tier policy.
//!
//! Maps a semantic purpose string (e.g. "staff_qa") to a model tier, then
//! applies the tenant's tier policy on top. Both steps are pure functions so
//! they can be tested without network or storage access.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discrete quality/cost level for a model backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    Standard,
    Premium,
}

impl Tier {
    /// Stable lowercase label used in usage records and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Basic => "basic",
            Tier::Standard => "standard",
            Tier::Premium => "premium",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-tenant restriction on which tiers may be used.
///
/// A policy can only lower the tier resolved from a purpose, never raise it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierPolicy {
    /// No restriction.
    #[default]
    All,
    /// Premium requests are downgraded to Standard.
    StandardMax,
    /// Every request runs on Basic.
    BasicOnly,
}

impl FromStr for TierPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(TierPolicy::All),
            "standard_max" => Ok(TierPolicy::StandardMax),
            "basic_only" => Ok(TierPolicy::BasicOnly),
            _ => Err(()),
        }
    }
}

/// Purpose-to-tier table. Unknown purposes fall back to Standard.
const PURPOSE_TIERS: &[(&str, Tier)] = &[
    // Basic
    ("shift_planning", Tier::Basic),
    ("log_summary", Tier::Basic),
    ("simple_task", Tier::Basic),
    ("schedule", Tier::Basic),
    // Standard
    ("staff_qa", Tier::Standard),
    ("knowledge_search", Tier::Standard),
    ("customer_support", Tier::Standard),
    ("daily_report", Tier::Standard),
    ("default", Tier::Standard),
    // Premium
    ("management_decision", Tier::Premium),
    ("dx_report", Tier::Premium),
    ("strategic_planning", Tier::Premium),
    ("executive_summary", Tier::Premium),
    ("business_analysis", Tier::Premium),
];

/// Resolve the default tier for a purpose string.
///
/// Lookup is case-insensitive. Purposes not in the table resolve to
/// [`Tier::Standard`]; resolution never fails.
pub fn resolve_tier(purpose: &str) -> Tier {
    let purpose = purpose.to_ascii_lowercase();
    PURPOSE_TIERS
        .iter()
        .find(|(p, _)| *p == purpose)
        .map(|(_, t)| *t)
        .unwrap_or(Tier::Standard)
}

/// Apply a tenant tier policy to a resolved tier.
pub fn apply_policy(tier: Tier, policy: TierPolicy) -> Tier {
    match policy {
        TierPolicy::All => tier,
        TierPolicy::StandardMax => {
            if tier == Tier::Premium {
                Tier::Standard
            } else {
                tier
            }
        }
        TierPolicy::BasicOnly => Tier::Basic,
    }
}

/// Apply a policy supplied as a raw string, e.g. straight out of tenant
/// settings written by an older release.
///
/// Unrecognized policy values resolve to [`Tier::Standard`] with a warning;
/// the caller is never failed over a bad policy row.
pub fn apply_policy_str(tier: Tier, raw: &str) -> Tier {
    match raw.parse::<TierPolicy>() {
        Ok(policy) => apply_policy(tier, policy),
        Err(()) => {
            tracing::warn!(policy = raw, "unknown tier policy, defaulting to standard");
            Tier::Standard
        }
    }
}

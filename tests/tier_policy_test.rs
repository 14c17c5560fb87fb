//! Tier policy enforcement tests.
//!
//! Pure-function tests for purpose-to-tier mapping and tenant policy
//! application; no network or storage involved.

use atrium::tier::{apply_policy, apply_policy_str, resolve_tier, Tier, TierPolicy};
use proptest::prelude::*;

// Purpose-to-tier mapping

#[test]
fn basic_purposes() {
    assert_eq!(resolve_tier("shift_planning"), Tier::Basic);
    assert_eq!(resolve_tier("log_summary"), Tier::Basic);
    assert_eq!(resolve_tier("simple_task"), Tier::Basic);
    assert_eq!(resolve_tier("schedule"), Tier::Basic);
}

#[test]
fn standard_purposes() {
    assert_eq!(resolve_tier("staff_qa"), Tier::Standard);
    assert_eq!(resolve_tier("knowledge_search"), Tier::Standard);
    assert_eq!(resolve_tier("customer_support"), Tier::Standard);
    assert_eq!(resolve_tier("daily_report"), Tier::Standard);
    assert_eq!(resolve_tier("default"), Tier::Standard);
}

#[test]
fn premium_purposes() {
    assert_eq!(resolve_tier("management_decision"), Tier::Premium);
    assert_eq!(resolve_tier("dx_report"), Tier::Premium);
    assert_eq!(resolve_tier("strategic_planning"), Tier::Premium);
    assert_eq!(resolve_tier("executive_summary"), Tier::Premium);
    assert_eq!(resolve_tier("business_analysis"), Tier::Premium);
}

#[test]
fn unknown_and_empty_purposes_default_to_standard() {
    assert_eq!(resolve_tier("unknown_purpose"), Tier::Standard);
    assert_eq!(resolve_tier(""), Tier::Standard);
    assert_eq!(resolve_tier("STAFF_QA_V2"), Tier::Standard);
}

#[test]
fn purpose_lookup_ignores_case() {
    assert_eq!(resolve_tier("STAFF_QA"), Tier::Standard);
    assert_eq!(resolve_tier("Staff_Qa"), Tier::Standard);
}

// Policy application

#[test]
fn all_policy_passes_every_tier_through() {
    for tier in [Tier::Basic, Tier::Standard, Tier::Premium] {
        assert_eq!(apply_policy(tier, TierPolicy::All), tier);
    }
}

#[test]
fn standard_max_policy_matrix() {
    assert_eq!(
        apply_policy(Tier::Premium, TierPolicy::StandardMax),
        Tier::Standard
    );
    assert_eq!(
        apply_policy(Tier::Standard, TierPolicy::StandardMax),
        Tier::Standard
    );
    assert_eq!(apply_policy(Tier::Basic, TierPolicy::StandardMax), Tier::Basic);
}

#[test]
fn basic_only_policy_matrix() {
    assert_eq!(apply_policy(Tier::Premium, TierPolicy::BasicOnly), Tier::Basic);
    assert_eq!(apply_policy(Tier::Standard, TierPolicy::BasicOnly), Tier::Basic);
    assert_eq!(apply_policy(Tier::Basic, TierPolicy::BasicOnly), Tier::Basic);
}

// End-to-end purpose + policy flows

#[test]
fn staff_qa_flows() {
    let tier = resolve_tier("staff_qa");
    assert_eq!(apply_policy(tier, TierPolicy::All), Tier::Standard);
    assert_eq!(apply_policy(tier, TierPolicy::BasicOnly), Tier::Basic);
}

#[test]
fn management_decision_flows() {
    let tier = resolve_tier("management_decision");
    assert_eq!(apply_policy(tier, TierPolicy::All), Tier::Premium);
    assert_eq!(apply_policy(tier, TierPolicy::StandardMax), Tier::Standard);
    assert_eq!(apply_policy(tier, TierPolicy::BasicOnly), Tier::Basic);
}

#[test]
fn basic_purpose_is_unchanged_by_standard_max() {
    let tier = resolve_tier("shift_planning");
    assert_eq!(apply_policy(tier, TierPolicy::StandardMax), Tier::Basic);
}

// Raw policy strings from tenant settings

#[test]
fn raw_policy_strings_apply() {
    assert_eq!(apply_policy_str(Tier::Premium, "standard_max"), Tier::Standard);
    assert_eq!(apply_policy_str(Tier::Premium, "ALL"), Tier::Premium);
    assert_eq!(apply_policy_str(Tier::Standard, "basic_only"), Tier::Basic);
}

#[test]
fn unknown_raw_policy_degrades_to_standard() {
    assert_eq!(apply_policy_str(Tier::Premium, "unlimited"), Tier::Standard);
    assert_eq!(apply_policy_str(Tier::Basic, ""), Tier::Standard);
}

// Properties

fn rank(tier: Tier) -> u8 {
    match tier {
        Tier::Basic => 0,
        Tier::Standard => 1,
        Tier::Premium => 2,
    }
}

proptest! {
    /// Resolution is pure: the same input always yields the same tier.
    #[test]
    fn resolve_tier_is_deterministic(purpose in ".{0,40}") {
        prop_assert_eq!(resolve_tier(&purpose), resolve_tier(&purpose));
    }

    /// A policy can only lower a tier, never raise it.
    #[test]
    fn policies_never_upgrade(purpose in ".{0,40}") {
        let tier = resolve_tier(&purpose);
        for policy in [TierPolicy::All, TierPolicy::StandardMax, TierPolicy::BasicOnly] {
            prop_assert!(rank(apply_policy(tier, policy)) <= rank(tier));
        }
    }
}

//! Atrium - AI request orchestration and tiered model routing
//!
//! This library provides the AI core of the Atrium business portal:
//! purpose-based tier selection under tenant policy, pluggable model
//! backends behind one trait, bounded multi-source prompt assembly, and
//! heuristic issue/insight extraction from model output.

pub mod backend;
pub mod chat;
pub mod config;
pub mod context;
pub mod domain;
pub mod extract;
pub mod logging;
pub mod store;
pub mod tier;
pub mod usage;

// Assignment generation: intent validation, Bloom count distribution, template
// shaping, enrichment, student simulation and version history.
// The generator is deterministic and never fails on a validated intent.

pub mod distribution;
pub mod enrichment;
pub mod generator;
pub mod handlers;
pub mod simulation;
pub mod templates;
pub mod validation;
pub mod versioning;

// handlers/mod.rs - Two-tier handler architecture
//
// Public (no auth) → Protected (token auth)
pub mod public;    // Tier 1: No authentication required (/, /health)
pub mod protected; // Tier 2: Token authentication required (/recipes-list/*)

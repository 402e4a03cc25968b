// handlers/public/mod.rs - Public handlers (no authentication required)
//
// API root discovery and liveness checks. These never touch recipe data.

pub mod health;
pub mod root;

pub use health::health;
pub use root::root;

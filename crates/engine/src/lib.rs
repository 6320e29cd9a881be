// Domain-driven module structure for the Tracedeck engine.

// Core model
pub mod model;

// Pipeline stages
pub mod detect;
pub mod loader;
pub mod filter;

// Derived views
pub mod stats;
pub mod variants;
pub mod distribution;

// Re-export commonly used types
pub use model::{ColumnMap, EventTable, FilterSelection};

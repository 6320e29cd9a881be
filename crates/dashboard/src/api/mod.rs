//! API module — JSON endpoints over the engine (the rendering boundary).

pub mod map;
pub mod mining;
pub mod overview;
pub mod session;
pub mod upload;
pub mod variants;

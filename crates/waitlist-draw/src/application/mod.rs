//! Application layer: the lifecycle components and their command/query handlers.

pub mod capacity;
pub mod command_handlers;
pub mod draw;
pub mod query_handlers;
pub mod registry;
pub mod transition;

pub use capacity::CapacityTracker;
pub use draw::DrawEngine;
pub use registry::EntrantRegistry;
pub use transition::StatusTransition;

// Cross-layer event types and the broadcast channel they travel over.
pub mod emitter;
pub mod event;

pub use emitter::EventBus;
pub use event::{CoreEvent, FileDirection, ObjectMetadata};

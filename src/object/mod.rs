pub mod codec;
pub mod envelope;
pub mod inner;
pub mod object_layer;
pub mod registry;

pub use envelope::Envelope;
pub use inner::{FileMetadata, InnerObject};
pub use object_layer::ObjectLayer;
pub use registry::TypeRegistry;

pub mod file_layer;
pub mod receive_record;
pub mod transfer;

pub use file_layer::FileLayer;

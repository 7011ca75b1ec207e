// One file's open stream on the receiving side, tracked until its last part arrives.
use crate::object::FileMetadata;
use std::path::PathBuf;
use tokio::fs::File;

pub struct FileTransfer {
    pub metadata: FileMetadata,
    pub handle: File,
    pub final_path: PathBuf,
    pub bytes_processed: u64,
}

impl FileTransfer {
    pub fn new(metadata: FileMetadata, handle: File, final_path: PathBuf) -> Self {
        Self {
            metadata,
            handle,
            final_path,
            bytes_processed: 0,
        }
    }
}

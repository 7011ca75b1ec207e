// Chunked, ordered file transfer built on top of the object layer: handshake, streaming,
// progress reporting, and receive-side reassembly under `temp_dir`.
use crate::errors::CoreError;
use crate::events::{CoreEvent, EventBus, FileDirection};
use crate::file::receive_record::ReceiveRecord;
use crate::file::transfer::FileTransfer;
use crate::object::{FileMetadata, InnerObject, ObjectLayer};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn, Instrument};

/// Decides whether an incoming `FileSendMetadata` request is accepted. Given the sender's IP
/// and the files it wants to send; returning `false` rejects the whole request. The default
/// policy installed by `FileLayer::new` always accepts.
pub type AcceptPolicy = Box<dyn Fn(&str, &[FileMetadata]) -> bool + Send + Sync>;

struct Inner {
    object: ObjectLayer,
    temp_dir: PathBuf,
    events: EventBus,
    accept_policy: AcceptPolicy,
    active_sends: Mutex<HashSet<String>>,
    receives: Mutex<HashMap<String, ReceiveRecord>>,
    background: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Clone)]
pub struct FileLayer {
    inner: Arc<Inner>,
}

impl FileLayer {
    pub fn new(object: ObjectLayer, temp_dir: PathBuf) -> Self {
        Self::with_accept_policy(object, temp_dir, Box::new(|_, _| true))
    }

    pub fn with_accept_policy(object: ObjectLayer, temp_dir: PathBuf, accept_policy: AcceptPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                object,
                temp_dir,
                events: EventBus::new(),
                accept_policy,
                active_sends: Mutex::new(HashSet::new()),
                receives: Mutex::new(HashMap::new()),
                background: Mutex::new(None),
            }),
        }
    }

    pub fn events(&self) -> EventBus {
        self.inner.events.clone()
    }

    pub fn object(&self) -> &ObjectLayer {
        &self.inner.object
    }

    pub async fn start(&self) -> Result<(), CoreError> {
        self.inner.object.start().await?;

        let mut rx = self.inner.object.events().subscribe();
        let this = self.clone();
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => this.dispatch(event).await,
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "file layer dispatch lagged behind object events");
                    }
                }
            }
        });
        *self.inner.background.lock().await = Some(handle);
        Ok(())
    }

    pub async fn stop(&self) {
        if let Some(handle) = self.inner.background.lock().await.take() {
            handle.abort();
        }
        self.inner.object.stop().await;
        self.inner.receives.lock().await.clear();
        self.inner.active_sends.lock().await.clear();
    }

    /// Request-accept handshake followed by ordered part streaming. At most one concurrent
    /// send per target IP; a second call while one is active fails with `Busy`.
    pub async fn send_files(
        &self,
        target_ip: &str,
        file_paths: &[PathBuf],
        buffer_size: u32,
    ) -> Result<(), CoreError> {
        {
            let mut active = self.inner.active_sends.lock().await;
            if !active.insert(target_ip.to_string()) {
                return Err(CoreError::Busy {
                    target_ip: target_ip.to_string(),
                });
            }
        }

        let result = self.send_files_inner(target_ip, file_paths, buffer_size).await;
        self.inner.active_sends.lock().await.remove(target_ip);
        result
    }

    async fn send_files_inner(
        &self,
        target_ip: &str,
        file_paths: &[PathBuf],
        buffer_size: u32,
    ) -> Result<(), CoreError> {
        let mut metadatas = Vec::with_capacity(file_paths.len());
        let mut handles = Vec::with_capacity(file_paths.len());
        for path in file_paths {
            let file = fs::File::open(path)
                .await
                .map_err(|_| CoreError::FileNotFound {
                    path: path.display().to_string(),
                })?;
            let file_size = file.metadata().await?.len();
            let file_name = file_name_of(path)?;
            metadatas.push(FileMetadata {
                file_name,
                file_path: path.display().to_string(),
                file_size,
            });
            handles.push(file);
        }

        let local_ip = self.inner.object.transport().local_ip().await?;
        let mut ack_rx = self.inner.object.events().subscribe();

        let request = InnerObject::FileSendMetadata {
            files: metadatas.clone(),
            buffer_size,
            sender_ip: local_ip,
        };
        self.inner.object.send_tcp(target_ip, &request).await?;

        let accepted = Self::wait_for_ack(&mut ack_rx, target_ip).await?;
        if !accepted {
            info!(target_ip, "file send request was rejected by the peer");
            return Ok(());
        }

        let span = info_span!("file_transfer", direction = "sending", target_ip);
        self.stream_files(target_ip, metadatas, handles, buffer_size)
            .instrument(span)
            .await
    }

    async fn stream_files(
        &self,
        target_ip: &str,
        metadatas: Vec<FileMetadata>,
        handles: Vec<fs::File>,
        buffer_size: u32,
    ) -> Result<(), CoreError> {
        for (metadata, mut handle) in metadatas.into_iter().zip(handles.into_iter()) {
            let mut offset = 0u64;
            loop {
                let chunk = read_chunk(&mut handle, buffer_size as usize)
                    .await
                    .map_err(|e| transfer_failed(&metadata.file_name, e))?;
                let is_last = offset + chunk.len() as u64 >= metadata.file_size;

                let part = InnerObject::FilePartObj {
                    file_metadata: metadata.clone(),
                    offset,
                    data: chunk.clone(),
                    is_last,
                };
                self.inner
                    .object
                    .send_tcp(target_ip, &part)
                    .await
                    .map_err(|e| transfer_failed(&metadata.file_name, e))?;

                offset += chunk.len() as u64;
                self.inner.events.emit(CoreEvent::FileProgress {
                    direction: FileDirection::Sending,
                    peer_ip: target_ip.to_string(),
                    file_name: metadata.file_name.clone(),
                    file_length: metadata.file_size,
                    bytes_processed: offset,
                });

                if is_last {
                    break;
                }
            }
        }
        Ok(())
    }

    async fn wait_for_ack(
        rx: &mut broadcast::Receiver<CoreEvent>,
        target_ip: &str,
    ) -> Result<bool, CoreError> {
        loop {
            match rx.recv().await {
                Ok(CoreEvent::ObjectReceived {
                    metadata,
                    object: InnerObject::FileReqAck { accepted },
                }) if metadata.source_ip == target_ip => return Ok(accepted),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(CoreError::ConnectionLost {
                        peer: target_ip.to_string(),
                        message: "object layer stopped while awaiting FileReqAck".to_string(),
                    })
                }
            }
        }
    }

    async fn dispatch(&self, event: CoreEvent) {
        self.inner.events.emit(event.clone());

        match event {
            CoreEvent::ObjectReceived {
                metadata,
                object: InnerObject::FileSendMetadata { files, .. },
            } => {
                self.handle_incoming_request(metadata.source_ip, files).await;
            }
            CoreEvent::ObjectReceived {
                metadata,
                object:
                    InnerObject::FilePartObj {
                        file_metadata,
                        offset,
                        data,
                        is_last,
                    },
            } => {
                self.handle_incoming_part(metadata.source_ip, file_metadata, offset, data, is_last)
                    .await;
            }
            _ => {}
        }
    }

    async fn handle_incoming_request(&self, source_ip: String, files: Vec<FileMetadata>) {
        if !(self.inner.accept_policy)(&source_ip, &files) {
            info!(sender_ip = source_ip, "file send request rejected by accept policy");
            let _ = self
                .inner
                .object
                .send_tcp(&source_ip, &InnerObject::FileReqAck { accepted: false })
                .await;
            return;
        }

        match self.open_receive_files(&files).await {
            Ok(opened) => {
                let mut record = ReceiveRecord::new();
                for (metadata, handle, final_path) in opened {
                    record
                        .files
                        .insert(metadata.file_name.clone(), FileTransfer::new(metadata, handle, final_path));
                }

                if let Some(prev) = self.inner.receives.lock().await.insert(source_ip.clone(), record) {
                    info!(
                        sender_ip = source_ip,
                        dropped_files = prev.files.len(),
                        "replacing active receive record for this sender"
                    );
                }

                if let Err(e) = self
                    .inner
                    .object
                    .send_tcp(&source_ip, &InnerObject::FileReqAck { accepted: true })
                    .await
                {
                    warn!(sender_ip = source_ip, error = %e, "failed to send FileReqAck(accepted=true)");
                }
            }
            Err(e) => {
                warn!(sender_ip = source_ip, error = %e, "rejecting incoming file request");
                let _ = self
                    .inner
                    .object
                    .send_tcp(&source_ip, &InnerObject::FileReqAck { accepted: false })
                    .await;
            }
        }
    }

    async fn open_receive_files(
        &self,
        files: &[FileMetadata],
    ) -> Result<Vec<(FileMetadata, fs::File, PathBuf)>, CoreError> {
        fs::create_dir_all(&self.inner.temp_dir).await?;

        let mut opened = Vec::with_capacity(files.len());
        for metadata in files {
            let final_path = self.inner.temp_dir.join(&metadata.file_name);
            let handle = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&final_path)
                .await?;
            opened.push((metadata.clone(), handle, final_path));
        }
        Ok(opened)
    }

    async fn handle_incoming_part(
        &self,
        source_ip: String,
        file_metadata: FileMetadata,
        offset: u64,
        data: Vec<u8>,
        is_last: bool,
    ) {
        let mut receives = self.inner.receives.lock().await;

        let Some(record) = receives.get_mut(&source_ip) else {
            drop(receives);
            warn!(sender_ip = source_ip, file_name = file_metadata.file_name, "file part with no active receive record");
            self.inner.events.emit(CoreEvent::Diagnostic {
                source_ip: Some(source_ip),
                message: "file part received with no active receive record".to_string(),
            });
            return;
        };

        let Some(transfer) = record.files.get_mut(&file_metadata.file_name) else {
            drop(receives);
            warn!(sender_ip = source_ip, file_name = file_metadata.file_name, "file part for an unknown file in the active record");
            self.inner.events.emit(CoreEvent::Diagnostic {
                source_ip: Some(source_ip),
                message: format!("unknown file {} in active receive record", file_metadata.file_name),
            });
            return;
        };

        if transfer.metadata.file_size != file_metadata.file_size {
            drop(receives);
            warn!(sender_ip = source_ip, file_name = file_metadata.file_name, "file part size mismatch against the active record");
            self.inner.events.emit(CoreEvent::Diagnostic {
                source_ip: Some(source_ip),
                message: format!("unknown file {} in active receive record", file_metadata.file_name),
            });
            return;
        }

        if let Err(e) = write_at(&mut transfer.handle, offset, &data).await {
            let file_name = file_metadata.file_name.clone();
            record.files.remove(&file_name);
            drop(receives);
            let failure = transfer_failed(&file_name, e);
            warn!(sender_ip = source_ip, file_name, error = %failure, "write failed, dropping this file's receive state");
            self.inner.events.emit(CoreEvent::Diagnostic {
                source_ip: Some(source_ip),
                message: failure.to_string(),
            });
            return;
        }

        transfer.bytes_processed = offset + data.len() as u64;
        let bytes_processed = transfer.bytes_processed;
        let file_length = transfer.metadata.file_size;
        let file_name = transfer.metadata.file_name.clone();
        let final_path = transfer.final_path.clone();

        self.inner.events.emit(CoreEvent::FileProgress {
            direction: FileDirection::Receiving,
            peer_ip: source_ip.clone(),
            file_name: file_name.clone(),
            file_length,
            bytes_processed,
        });

        if is_last {
            record.files.remove(&file_name);
            let record_is_empty = record.files.is_empty();
            drop(receives);

            if record_is_empty {
                self.inner.receives.lock().await.remove(&source_ip);
            }

            self.inner.events.emit(CoreEvent::FileReceived {
                peer_ip: source_ip,
                file_name,
                final_path,
            });
        }
    }
}

fn transfer_failed(file_name: &str, cause: CoreError) -> CoreError {
    CoreError::TransferFailed {
        file_name: file_name.to_string(),
        message: cause.to_string(),
    }
}

fn file_name_of(path: &Path) -> Result<String, CoreError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| CoreError::FileNotFound {
            path: path.display().to_string(),
        })
}

async fn read_chunk(file: &mut fs::File, buffer_size: usize) -> Result<Vec<u8>, CoreError> {
    let mut buf = vec![0u8; buffer_size];
    let mut filled = 0;
    while filled < buffer_size {
        let n = file.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(buf)
}

async fn write_at(handle: &mut fs::File, offset: u64, data: &[u8]) -> Result<(), CoreError> {
    handle.seek(std::io::SeekFrom::Start(offset)).await?;
    handle.write_all(data).await?;
    Ok(())
}

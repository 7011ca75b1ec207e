// Connection lifecycle, peer tracking, and framed byte-stream I/O over TCP/UDP.
use crate::config::NodeConfig;
use crate::errors::{CoreError, RetryHandler};
use crate::events::{CoreEvent, EventBus};
use crate::transport::frame::{read_frame, write_frame};
use crate::transport::peer::ConnectionState;
use crate::transport::peer_table::PeerTable;
use crate::transport::{interfaces, tcp, udp};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::{mpsc, Mutex, OnceCell};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

const WRITER_QUEUE_DEPTH: usize = 64;

struct ConnectionHandle {
    writer_tx: mpsc::Sender<Vec<u8>>,
    cancel: CancellationToken,
}

struct Inner {
    config: NodeConfig,
    peers: PeerTable,
    connections: Mutex<HashMap<String, ConnectionHandle>>,
    events: EventBus,
    local_ip: OnceCell<String>,
    shutdown: CancellationToken,
    udp_socket: Mutex<Option<Arc<UdpSocket>>>,
    background: Mutex<Vec<JoinHandle<()>>>,
    retry: RetryHandler,
}

#[derive(Clone)]
pub struct TransportLayer {
    inner: Arc<Inner>,
}

impl TransportLayer {
    pub fn new(config: NodeConfig) -> Self {
        let retry = RetryHandler::new(config.retry.clone());
        Self {
            inner: Arc::new(Inner {
                config,
                peers: PeerTable::new(),
                connections: Mutex::new(HashMap::new()),
                events: EventBus::new(),
                local_ip: OnceCell::new(),
                shutdown: CancellationToken::new(),
                udp_socket: Mutex::new(None),
                background: Mutex::new(Vec::new()),
                retry,
            }),
        }
    }

    pub fn events(&self) -> EventBus {
        self.inner.events.clone()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.inner.config
    }

    pub fn peers(&self) -> &PeerTable {
        &self.inner.peers
    }

    pub async fn local_ip(&self) -> Result<String, CoreError> {
        self.inner
            .local_ip
            .get_or_try_init(interfaces::resolve_local_ip)
            .await
            .cloned()
    }

    pub async fn start(&self) -> Result<(), CoreError> {
        let local_ip = self.local_ip().await?;
        info!(local_ip, port = self.inner.config.port, "starting transport layer");

        let listener = tcp::listen(([0, 0, 0, 0], self.inner.config.port).into()).await?;
        let udp_socket = Arc::new(udp::bind(self.inner.config.port)?);
        *self.inner.udp_socket.lock().await = Some(udp_socket.clone());

        let accept_task = {
            let this = self.clone();
            let shutdown = self.inner.shutdown.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        accepted = listener.accept() => {
                            match accepted {
                                Ok((stream, addr)) => {
                                    this.register_connection(stream, addr.ip().to_string()).await;
                                }
                                Err(e) => warn!(error = %e, "tcp accept failed"),
                            }
                        }
                    }
                }
            })
        };

        let udp_task = {
            let this = self.clone();
            let shutdown = self.inner.shutdown.clone();
            let socket = udp_socket.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; udp::MAX_DATAGRAM_SIZE];
                loop {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        received = socket.recv_from(&mut buf) => {
                            match received {
                                Ok((len, addr)) => {
                                    let bytes = buf[..len].to_vec();
                                    this.handle_inbound(addr.ip().to_string(), bytes, true).await;
                                }
                                Err(e) => warn!(error = %e, "udp recv failed"),
                            }
                        }
                    }
                }
            })
        };

        self.inner.background.lock().await.extend([accept_task, udp_task]);

        Ok(())
    }

    pub async fn stop(&self) {
        info!("stopping transport layer");
        self.inner.shutdown.cancel();

        let mut conns = self.inner.connections.lock().await;
        for (_, handle) in conns.drain() {
            handle.cancel.cancel();
        }
        drop(conns);

        *self.inner.udp_socket.lock().await = None;
        self.inner.peers.clear().await;

        let mut background = self.inner.background.lock().await;
        for task in background.drain(..) {
            task.abort();
        }
    }

    /// Ensure a TCP connection to `target_ip` exists, retrying the connect step with jittered
    /// backoff, then frame and enqueue `bytes` on that connection's dedicated writer.
    pub async fn send_tcp(&self, target_ip: &str, bytes: Vec<u8>) -> Result<(), CoreError> {
        self.ensure_connection(target_ip).await?;

        let writer_tx = {
            let conns = self.inner.connections.lock().await;
            conns
                .get(target_ip)
                .map(|h| h.writer_tx.clone())
                .ok_or_else(|| CoreError::ConnectionLost {
                    peer: target_ip.to_string(),
                    message: "connection closed before send".to_string(),
                })?
        };

        writer_tx
            .send(bytes)
            .await
            .map_err(|_| CoreError::ConnectionLost {
                peer: target_ip.to_string(),
                message: "writer task is gone".to_string(),
            })
    }

    pub async fn send_udp(&self, target_ip: &str, bytes: Vec<u8>) -> Result<(), CoreError> {
        let socket = self.udp_socket_handle().await?;
        let addr: SocketAddr = format!("{}:{}", target_ip, self.inner.config.port)
            .parse()
            .map_err(|_| CoreError::ConfigError {
                message: format!("invalid target address: {target_ip}"),
                field: Some("target_ip".to_string()),
            })?;
        socket.send_to(&bytes, addr).await?;
        Ok(())
    }

    pub async fn send_broadcast(&self, bytes: Vec<u8>) -> Result<(), CoreError> {
        let socket = self.udp_socket_handle().await?;
        let addr: SocketAddr = ([255, 255, 255, 255], self.inner.config.port).into();
        socket.send_to(&bytes, addr).await?;
        Ok(())
    }

    pub async fn send_tcp_all(&self, bytes: Vec<u8>) {
        for ip in self.inner.peers.snapshot_addresses().await {
            if let Err(e) = self.send_tcp(&ip, bytes.clone()).await {
                warn!(peer = ip, error = %e, "send_tcp_all: failed for one peer");
            }
        }
    }

    pub async fn send_udp_all(&self, bytes: Vec<u8>) {
        for ip in self.inner.peers.snapshot_addresses().await {
            if let Err(e) = self.send_udp(&ip, bytes.clone()).await {
                warn!(peer = ip, error = %e, "send_udp_all: failed for one peer");
            }
        }
    }

    pub async fn direct_connect(&self, target_ip: &str) -> Result<(), CoreError> {
        self.ensure_connection(target_ip).await
    }

    async fn udp_socket_handle(&self) -> Result<Arc<UdpSocket>, CoreError> {
        self.inner
            .udp_socket
            .lock()
            .await
            .clone()
            .ok_or(CoreError::Cancelled)
    }

    async fn ensure_connection(&self, target_ip: &str) -> Result<(), CoreError> {
        if self.inner.connections.lock().await.contains_key(target_ip) {
            return Ok(());
        }

        self.inner
            .peers
            .set_connection_state(target_ip, ConnectionState::Connecting)
            .await;

        let addr: SocketAddr = format!("{}:{}", target_ip, self.inner.config.port)
            .parse()
            .map_err(|_| CoreError::ConfigError {
                message: format!("invalid target address: {target_ip}"),
                field: Some("target_ip".to_string()),
            })?;
        let connect_timeout = self.inner.config.tcp_connect_timeout;
        let retry = self.inner.retry.clone();

        let stream = retry
            .retry_with_backoff(|| tcp::connect(addr, connect_timeout))
            .await?;

        self.register_connection(stream, target_ip.to_string()).await;
        Ok(())
    }

    /// Register a connection (inbound or outbound), replacing any prior connection from the
    /// same IP, then spawn its dedicated reader and writer tasks.
    async fn register_connection(&self, stream: TcpStream, ip: String) {
        let (read_half, write_half) = stream.into_split();
        let (writer_tx, writer_rx) = mpsc::channel::<Vec<u8>>(WRITER_QUEUE_DEPTH);
        let cancel = CancellationToken::new();

        {
            let mut conns = self.inner.connections.lock().await;
            if let Some(prev) = conns.remove(&ip) {
                prev.cancel.cancel();
            }
            conns.insert(
                ip.clone(),
                ConnectionHandle {
                    writer_tx,
                    cancel: cancel.clone(),
                },
            );
        }

        self.inner
            .peers
            .set_connection_state(&ip, ConnectionState::Established)
            .await;
        self.emit_touch(&ip).await;

        self.spawn_writer(write_half, writer_rx, cancel.clone(), ip.clone());
        self.spawn_reader(read_half, cancel, ip);
    }

    fn spawn_writer(
        &self,
        mut write_half: OwnedWriteHalf,
        mut rx: mpsc::Receiver<Vec<u8>>,
        cancel: CancellationToken,
        ip: String,
    ) {
        tokio::spawn(
            async move {
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        msg = rx.recv() => {
                            match msg {
                                Some(payload) => {
                                    if let Err(e) = write_frame(&mut write_half, &payload).await {
                                        warn!(error = %e, "write failed, closing connection");
                                        cancel.cancel();
                                        break;
                                    }
                                }
                                None => break,
                            }
                        }
                    }
                }
            }
            .instrument(info_span!("tcp_writer", peer = %ip)),
        );
    }

    fn spawn_reader(&self, mut read_half: tokio::net::tcp::OwnedReadHalf, cancel: CancellationToken, ip: String) {
        let this = self.clone();
        let max_frame_bytes = self.inner.config.max_frame_bytes;
        let idle_timeout = self.inner.config.tcp_idle_timeout;
        let span = info_span!("tcp_reader", peer = %ip);

        tokio::spawn(
            async move {
                loop {
                    let read = async {
                        match idle_timeout {
                            Some(d) => match tokio::time::timeout(d, read_frame(&mut read_half, max_frame_bytes)).await {
                                Ok(result) => result,
                                Err(_) => Err(CoreError::ConnectionLost {
                                    peer: ip.clone(),
                                    message: "idle timeout".to_string(),
                                }),
                            },
                            None => read_frame(&mut read_half, max_frame_bytes).await,
                        }
                    };

                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        outcome = read => {
                            match outcome {
                                Ok(Some(bytes)) => this.handle_inbound(ip.clone(), bytes, false).await,
                                Ok(None) => {
                                    this.drop_connection(&ip).await;
                                    break;
                                }
                                Err(e) => {
                                    warn!(error = %e, "connection read failed");
                                    this.drop_connection(&ip).await;
                                    break;
                                }
                            }
                        }
                    }
                }
            }
            .instrument(span),
        );
    }

    async fn drop_connection(&self, ip: &str) {
        if let Some(handle) = self.inner.connections.lock().await.remove(ip) {
            handle.cancel.cancel();
        }
        if let Some(peer) = self.inner.peers.mark_inactive(ip).await {
            self.inner.events.emit(CoreEvent::PeerChange {
                peer,
                became_active: false,
            });
        }
    }

    async fn handle_inbound(&self, source_ip: String, bytes: Vec<u8>, was_udp: bool) {
        if was_udp && !self.inner.config.forward_all {
            if let Some(local) = self.inner.local_ip.get() {
                if *local == source_ip {
                    return;
                }
            }
        }

        self.emit_touch(&source_ip).await;
        self.inner.events.emit(CoreEvent::MessageReceived {
            source_ip,
            bytes,
            was_udp,
        });
    }

    async fn emit_touch(&self, ip: &str) {
        let (peer, became_active) = self.inner.peers.touch(ip).await;
        if became_active {
            self.inner.events.emit(CoreEvent::PeerChange {
                peer,
                became_active: true,
            });
        }
    }
}

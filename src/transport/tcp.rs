// Thin TCP socket helpers: connect/listen/accept with timeout handling. Connection lifecycle
// (reader/writer tasks, peer table updates) lives in `transport_layer`.
use crate::errors::CoreError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

pub async fn connect(addr: SocketAddr, connect_timeout: Duration) -> Result<TcpStream, CoreError> {
    match timeout(connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(CoreError::ConnectionLost {
            peer: addr.to_string(),
            message: "connect timed out".to_string(),
        }),
    }
}

pub async fn listen(addr: SocketAddr) -> Result<TcpListener, CoreError> {
    TcpListener::bind(addr).await.map_err(Into::into)
}

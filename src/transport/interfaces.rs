// Local interface discovery. No interface-enumeration crate in the stack, so local_ip is
// resolved the standard "connect a UDP socket and read back its local address" way: this
// never actually sends a packet, it just forces the OS to pick the outbound interface/route.
use crate::errors::CoreError;
use tokio::net::UdpSocket;

const ROUTE_PROBE_TARGET: &str = "203.0.113.1:80";

pub async fn resolve_local_ip() -> Result<String, CoreError> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .await
        .map_err(|_| CoreError::NoNetworkInterface)?;
    socket
        .connect(ROUTE_PROBE_TARGET)
        .await
        .map_err(|_| CoreError::NoNetworkInterface)?;
    let addr = socket.local_addr().map_err(|_| CoreError::NoNetworkInterface)?;

    if addr.ip().is_unspecified() || addr.ip().is_loopback() {
        return Err(CoreError::NoNetworkInterface);
    }

    Ok(addr.ip().to_string())
}

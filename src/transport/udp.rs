// Thin UDP socket helpers. Broadcast and address reuse are enabled via socket2 before the
// socket is handed to tokio, since `tokio::net::UdpSocket` has no setsockopt surface of its own.
use crate::errors::CoreError;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use tokio::net::UdpSocket;

pub fn bind(port: u16) -> Result<UdpSocket, CoreError> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_broadcast(true)?;
    socket.set_nonblocking(true)?;

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    socket.bind(&addr.into())?;

    UdpSocket::from_std(socket.into()).map_err(Into::into)
}

pub const MAX_DATAGRAM_SIZE: usize = 65536;

// A connection that sends a length prefix above max_frame_bytes should be dropped cleanly:
// the peer goes active on connect, then inactive on the bad frame, with no crash in between.
use p2p_node::config::NodeConfig;
use p2p_node::events::CoreEvent;
use p2p_node::transport::TransportLayer;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

#[tokio::test]
async fn oversized_length_prefix_drops_the_connection_without_crashing() {
    let mut config = NodeConfig::default();
    config.port = 19530;
    config.max_frame_bytes = 1024;
    let dir = tempfile::tempdir().unwrap();
    config.temp_dir = dir.path().to_path_buf();

    let transport = TransportLayer::new(config);
    transport.start().await.unwrap();
    let mut events = transport.events().subscribe();

    let mut stream = TcpStream::connect("127.0.0.1:19530").await.unwrap();

    let became_active = loop {
        match events.recv().await.unwrap() {
            CoreEvent::PeerChange { peer, became_active: true } if peer.address == "127.0.0.1" => break peer,
            _ => continue,
        }
    };
    assert_eq!(became_active.address, "127.0.0.1");

    stream.write_all(&u32::MAX.to_le_bytes()).await.unwrap();
    stream.flush().await.unwrap();

    let became_inactive = loop {
        match events.recv().await.unwrap() {
            CoreEvent::PeerChange { peer, became_active: false } if peer.address == "127.0.0.1" => break peer,
            _ => continue,
        }
    };
    assert_eq!(became_inactive.address, "127.0.0.1");

    // The transport is still alive and can tear down normally.
    transport.stop().await;
    drop(stream);
    tokio::time::sleep(Duration::from_millis(10)).await;
}

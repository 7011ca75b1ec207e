// A bare UDP datagram from an address the transport layer has never seen should create a peer
// and announce it as active, without needing the object or file layers running at all.
use p2p_node::config::NodeConfig;
use p2p_node::events::CoreEvent;
use p2p_node::transport::TransportLayer;
use tokio::net::UdpSocket;

#[tokio::test]
async fn unsolicited_datagram_registers_an_active_peer() {
    let mut config = NodeConfig::default();
    config.port = 19520;
    let dir = tempfile::tempdir().unwrap();
    config.temp_dir = dir.path().to_path_buf();

    let transport = TransportLayer::new(config);
    transport.start().await.unwrap();
    let mut events = transport.events().subscribe();

    let probe = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    probe.send_to(b"hello", "127.0.0.1:19520").await.unwrap();

    let peer = loop {
        match events.recv().await.unwrap() {
            CoreEvent::PeerChange { peer, became_active: true } if peer.address == "127.0.0.1" => break peer,
            _ => continue,
        }
    };
    assert_eq!(peer.address, "127.0.0.1");
    assert!(transport.peers().snapshot_addresses().await.contains(&"127.0.0.1".to_string()));

    transport.stop().await;
}

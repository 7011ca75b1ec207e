// Frame round-trip over a real loopback TCP connection (transport::frame is unit-tested against
// in-memory buffers already; this exercises the same code against actual socket short reads).
use p2p_node::transport::frame::{read_frame, write_frame};
use p2p_node::transport::tcp;
use std::time::Duration;

#[tokio::test]
async fn frames_survive_a_real_socket_round_trip() {
    let listener = tcp::listen("127.0.0.1:19490".parse().unwrap()).await.unwrap();

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let first = read_frame(&mut stream, 1024).await.unwrap().unwrap();
        let second = read_frame(&mut stream, 1024).await.unwrap().unwrap();
        (first, second)
    });

    let mut client = tcp::connect("127.0.0.1:19490".parse().unwrap(), Duration::from_secs(5))
        .await
        .unwrap();
    write_frame(&mut client, b"first frame").await.unwrap();
    write_frame(&mut client, &[9u8; 2048]).await.unwrap();

    let (first, second) = server.await.unwrap();
    assert_eq!(first, b"first frame");
    assert_eq!(second.len(), 2048);
}

#[tokio::test]
async fn connect_to_nothing_times_out_cleanly() {
    // 203.0.113.0/24 is documentation-only and never routable; the connect should fail rather
    // than hang past the configured timeout.
    let result = tcp::connect("203.0.113.5:9".parse().unwrap(), Duration::from_millis(200)).await;
    assert!(result.is_err());
}

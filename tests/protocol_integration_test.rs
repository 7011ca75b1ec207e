// These drive a real FileLayer (the only TCP listener in the test, avoiding any port-bind
// conflict) from a hand-rolled peer that speaks the wire protocol directly through the
// library's own public codec and framing primitives, the way an independent implementation
// of this protocol would.
use p2p_node::config::NodeConfig;
use p2p_node::events::{CoreEvent, FileDirection};
use p2p_node::file::FileLayer;
use p2p_node::object::{Envelope, FileMetadata, InnerObject, ObjectLayer, TypeRegistry};
use p2p_node::transport::frame::{read_frame, write_frame};
use p2p_node::transport::{tcp, TransportLayer};
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpStream;

const CLIENT_MAX_FRAME: u32 = 64 * 1024 * 1024;
const SENDER_IP: &str = "203.0.113.9";

async fn start_receiver(port: u16, temp_dir: PathBuf) -> FileLayer {
    let mut config = NodeConfig::default();
    config.port = port;
    config.temp_dir = temp_dir.clone();
    let transport = TransportLayer::new(config);
    let object = ObjectLayer::new(transport);
    let file = FileLayer::new(object, temp_dir);
    file.start().await.unwrap();
    file
}

async fn connect_peer(port: u16) -> TcpStream {
    tcp::connect(
        format!("127.0.0.1:{port}").parse().unwrap(),
        Duration::from_secs(5),
    )
    .await
    .unwrap()
}

async fn send_object(stream: &mut TcpStream, object: &InnerObject) {
    let envelope = Envelope::wrap(SENDER_IP, object);
    write_frame(stream, &envelope.encode()).await.unwrap();
}

async fn recv_object(stream: &mut TcpStream) -> InnerObject {
    let bytes = read_frame(stream, CLIENT_MAX_FRAME).await.unwrap().unwrap();
    let envelope = Envelope::decode(&bytes).unwrap();
    let registry = TypeRegistry::new();
    envelope.decode_payload(&registry).unwrap()
}

fn accepted(object: InnerObject) -> bool {
    match object {
        InnerObject::FileReqAck { accepted } => accepted,
        other => panic!("expected FileReqAck, got {other:?}"),
    }
}

async fn send_file_parts(stream: &mut TcpStream, metadata: &FileMetadata, content: &[u8], buffer_size: usize) {
    let mut offset = 0u64;
    for chunk in content.chunks(buffer_size) {
        let is_last = offset as usize + chunk.len() >= content.len();
        send_object(
            stream,
            &InnerObject::FilePartObj {
                file_metadata: metadata.clone(),
                offset,
                data: chunk.to_vec(),
                is_last,
            },
        )
        .await;
        offset += chunk.len() as u64;
    }
}

#[tokio::test]
async fn single_small_file_streams_and_reconstructs_exactly() {
    let temp = tempfile::tempdir().unwrap();
    let file = start_receiver(19540, temp.path().to_path_buf()).await;
    let mut events = file.events().subscribe();
    let mut peer = connect_peer(19540).await;

    let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    let metadata = FileMetadata {
        file_name: "a.bin".to_string(),
        file_path: "a.bin".to_string(),
        file_size: content.len() as u64,
    };

    send_object(
        &mut peer,
        &InnerObject::FileSendMetadata {
            files: vec![metadata.clone()],
            buffer_size: 4096,
            sender_ip: SENDER_IP.to_string(),
        },
    )
    .await;
    assert!(accepted(recv_object(&mut peer).await));

    send_file_parts(&mut peer, &metadata, &content, 4096).await;

    let mut progress = Vec::new();
    let (file_name, final_path) = loop {
        match events.recv().await.unwrap() {
            CoreEvent::FileProgress {
                direction: FileDirection::Receiving,
                bytes_processed,
                ..
            } => progress.push(bytes_processed),
            CoreEvent::FileReceived { file_name, final_path, .. } => break (file_name, final_path),
            _ => continue,
        }
    };

    assert_eq!(progress, vec![4096, 8192, 10_000]);
    assert_eq!(file_name, "a.bin");
    let written = tokio::fs::read(final_path).await.unwrap();
    assert_eq!(written, content);

    file.stop().await;
}

#[tokio::test]
async fn file_size_exactly_one_buffer_is_a_single_part() {
    let temp = tempfile::tempdir().unwrap();
    let file = start_receiver(19541, temp.path().to_path_buf()).await;
    let mut events = file.events().subscribe();
    let mut peer = connect_peer(19541).await;

    let content = vec![0xABu8; 4096];
    let metadata = FileMetadata {
        file_name: "boundary.bin".to_string(),
        file_path: "boundary.bin".to_string(),
        file_size: content.len() as u64,
    };

    send_object(
        &mut peer,
        &InnerObject::FileSendMetadata {
            files: vec![metadata.clone()],
            buffer_size: 4096,
            sender_ip: SENDER_IP.to_string(),
        },
    )
    .await;
    assert!(accepted(recv_object(&mut peer).await));

    send_file_parts(&mut peer, &metadata, &content, 4096).await;

    let mut progress = Vec::new();
    let final_path = loop {
        match events.recv().await.unwrap() {
            CoreEvent::FileProgress { bytes_processed, .. } => progress.push(bytes_processed),
            CoreEvent::FileReceived { final_path, .. } => break final_path,
            _ => continue,
        }
    };

    assert_eq!(progress, vec![4096]);
    let written = tokio::fs::read(final_path).await.unwrap();
    assert_eq!(written, content);

    file.stop().await;
}

#[tokio::test]
async fn two_files_stream_and_reassemble_in_the_order_sent() {
    let temp = tempfile::tempdir().unwrap();
    let file = start_receiver(19542, temp.path().to_path_buf()).await;
    let mut events = file.events().subscribe();
    let mut peer = connect_peer(19542).await;

    let x_content: Vec<u8> = (0..500u32).map(|i| i as u8).collect();
    let y_content: Vec<u8> = (0..1500u32).map(|i| (i * 3) as u8).collect();
    let x_meta = FileMetadata {
        file_name: "x".to_string(),
        file_path: "x".to_string(),
        file_size: x_content.len() as u64,
    };
    let y_meta = FileMetadata {
        file_name: "y".to_string(),
        file_path: "y".to_string(),
        file_size: y_content.len() as u64,
    };

    send_object(
        &mut peer,
        &InnerObject::FileSendMetadata {
            files: vec![x_meta.clone(), y_meta.clone()],
            buffer_size: 600,
            sender_ip: SENDER_IP.to_string(),
        },
    )
    .await;
    assert!(accepted(recv_object(&mut peer).await));

    send_file_parts(&mut peer, &x_meta, &x_content, 600).await;
    send_file_parts(&mut peer, &y_meta, &y_content, 600).await;

    let mut received_order = Vec::new();
    let mut progress_by_file: Vec<(String, u64)> = Vec::new();
    while received_order.len() < 2 {
        match events.recv().await.unwrap() {
            CoreEvent::FileProgress { file_name, bytes_processed, .. } => {
                progress_by_file.push((file_name, bytes_processed))
            }
            CoreEvent::FileReceived { file_name, final_path, .. } => received_order.push((file_name, final_path)),
            _ => continue,
        }
    }

    assert_eq!(received_order[0].0, "x");
    assert_eq!(received_order[1].0, "y");

    let x_progress: Vec<u64> = progress_by_file
        .iter()
        .filter(|(name, _)| name == "x")
        .map(|(_, n)| *n)
        .collect();
    let y_progress: Vec<u64> = progress_by_file
        .iter()
        .filter(|(name, _)| name == "y")
        .map(|(_, n)| *n)
        .collect();
    assert_eq!(x_progress, vec![500]);
    assert_eq!(y_progress, vec![600, 1200, 1500]);

    let x_written = tokio::fs::read(&received_order[0].1).await.unwrap();
    let y_written = tokio::fs::read(&received_order[1].1).await.unwrap();
    assert_eq!(x_written, x_content);
    assert_eq!(y_written, y_content);

    file.stop().await;
}

#[tokio::test]
async fn request_rejected_by_accept_policy_writes_nothing() {
    let temp = tempfile::tempdir().unwrap();

    let mut config = NodeConfig::default();
    config.port = 19543;
    config.temp_dir = temp.path().to_path_buf();
    let transport = TransportLayer::new(config);
    let object = ObjectLayer::new(transport);
    let file = FileLayer::with_accept_policy(object, temp.path().to_path_buf(), Box::new(|_, _| false));
    file.start().await.unwrap();

    let mut events = file.events().subscribe();
    let mut peer = connect_peer(19543).await;

    let metadata = FileMetadata {
        file_name: "denied.bin".to_string(),
        file_path: "denied.bin".to_string(),
        file_size: 10,
    };
    send_object(
        &mut peer,
        &InnerObject::FileSendMetadata {
            files: vec![metadata],
            buffer_size: 4096,
            sender_ip: SENDER_IP.to_string(),
        },
    )
    .await;

    assert!(!accepted(recv_object(&mut peer).await));

    let outcome = tokio::time::timeout(Duration::from_millis(200), async {
        loop {
            if let CoreEvent::FileProgress { .. } = events.recv().await.unwrap() {
                return;
            }
        }
    })
    .await;
    assert!(outcome.is_err(), "no progress event should follow a rejected request");
    assert!(!temp.path().join("denied.bin").exists());

    file.stop().await;
}

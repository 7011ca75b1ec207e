// Parses CLI flags, builds a validated NodeConfig, wires the three-layer stack, and drives the
// requested subcommand to completion.
use crate::cli::{log_config_for_flags, setup_logging, CliError, CommandLineInterface, Commands};
use crate::config::{NodeConfig, NodeConfigOverrides};
use crate::events::CoreEvent;
use crate::file::FileLayer;
use crate::object::ObjectLayer;
use crate::transport::TransportLayer;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub struct ApplicationRunner;

impl ApplicationRunner {
    pub async fn run() -> Result<i32, CliError> {
        let cli = CommandLineInterface::parse();
        setup_logging(&log_config_for_flags(cli.verbose, cli.debug));

        match cli.command {
            Commands::Start { port, forward_all } => Self::run_start(port, forward_all).await,
            Commands::Send {
                target,
                port,
                buffer_size,
                files,
            } => Self::run_send(target, port, buffer_size, files).await,
            Commands::Peers { port, window_secs } => Self::run_peers(port, window_secs).await,
        }
    }

    fn build_config(port: Option<u16>, forward_all: Option<bool>) -> Result<NodeConfig, CliError> {
        let overrides = NodeConfigOverrides {
            port,
            forward_all,
            temp_dir: None,
            default_buffer_size: None,
        };
        Ok(NodeConfig::load(overrides)?)
    }

    async fn run_start(port: Option<u16>, forward_all: bool) -> Result<i32, CliError> {
        let config = Self::build_config(port, Some(forward_all))?;
        let temp_dir = config.temp_dir.clone();
        let transport = TransportLayer::new(config);
        let object = ObjectLayer::new(transport);
        let file = FileLayer::new(object, temp_dir);
        file.start().await?;

        println!("node started on port {}", file.object().transport().config().port);
        let mut rx = file.events().subscribe();
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                event = rx.recv() => {
                    match event {
                        Ok(event) => print_event(&event),
                        Err(_) => break,
                    }
                }
            }
        }

        file.stop().await;
        Ok(0)
    }

    async fn run_send(
        target: String,
        port: Option<u16>,
        buffer_size: u32,
        files: Vec<PathBuf>,
    ) -> Result<i32, CliError> {
        if files.is_empty() {
            return Err(CliError::invalid_argument("files", "at least one file must be given"));
        }

        let config = Self::build_config(port, None)?;
        let temp_dir = config.temp_dir.clone();
        let transport = TransportLayer::new(config);
        let object = ObjectLayer::new(transport);
        let file = FileLayer::new(object, temp_dir);
        file.start().await?;

        let mut rx = file.events().subscribe();
        let printer = tokio::spawn(async move {
            while let Ok(event) = rx.recv().await {
                print_event(&event);
            }
        });

        let result = file.send_files(&target, &files, buffer_size).await;
        printer.abort();
        file.stop().await;

        result.map(|_| 0).map_err(CliError::from)
    }

    async fn run_peers(port: Option<u16>, window_secs: u64) -> Result<i32, CliError> {
        let config = Self::build_config(port, None)?;
        let transport = TransportLayer::new(config);
        transport.start().await?;

        let mut rx = transport.events().subscribe();
        let deadline = tokio::time::sleep(Duration::from_secs(window_secs));
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                event = rx.recv() => {
                    if let Ok(CoreEvent::PeerChange { peer, became_active: true }) = event {
                        println!("peer discovered: {}", peer.address);
                    }
                }
            }
        }

        println!("known peers:");
        for ip in transport.peers().snapshot_addresses().await {
            println!("  {ip}");
        }

        transport.stop().await;
        Ok(0)
    }
}

fn print_event(event: &CoreEvent) {
    match event {
        CoreEvent::PeerChange { peer, became_active } => {
            println!("peer-change: {} active={}", peer.address, became_active);
        }
        CoreEvent::FileProgress {
            direction,
            peer_ip,
            file_name,
            file_length,
            bytes_processed,
        } => {
            println!("file-progress: {direction:?} {peer_ip} {file_name} {bytes_processed}/{file_length}");
        }
        CoreEvent::FileReceived {
            peer_ip,
            file_name,
            final_path,
        } => {
            println!("file-received: {peer_ip} {file_name} -> {}", final_path.display());
        }
        CoreEvent::Diagnostic { source_ip, message } => {
            println!("diagnostic: {source_ip:?} {message}");
        }
        _ => {}
    }
}

// CLI entry point.
use p2p_node::cli::ApplicationRunner;

#[tokio::main]
async fn main() {
    match ApplicationRunner::run().await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

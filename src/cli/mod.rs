// CLI module: the `p2p-node` binary's outer surface over the transport/object/file stack.
pub mod cli_error;
pub mod command_line_interface;
pub mod logging_setup;
pub mod runner;

pub use cli_error::CliError;
pub use command_line_interface::{CommandLineInterface, Commands};
pub use logging_setup::{log_config_for_flags, setup_logging};
pub use runner::ApplicationRunner;

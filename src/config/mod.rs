// Configuration management module
pub mod log_config;
pub mod node_config;
pub mod validation;

pub use log_config::LogConfig;
pub use node_config::{NodeConfig, NodeConfigOverrides};

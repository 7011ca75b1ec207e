// Node configuration: compiled-in defaults -> optional TOML file -> env vars -> CLI flags.
use crate::errors::{CoreError, RetryConfiguration};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub port: u16,
    pub forward_all: bool,
    pub max_frame_bytes: u32,
    pub default_buffer_size: u32,
    pub temp_dir: PathBuf,
    pub tcp_connect_timeout: Duration,
    pub tcp_idle_timeout: Option<Duration>,
    pub retry: RetryConfiguration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            forward_all: false,
            max_frame_bytes: 64 * 1024 * 1024,
            default_buffer_size: 102_400,
            temp_dir: PathBuf::from("./temp"),
            tcp_connect_timeout: Duration::from_secs(10),
            tcp_idle_timeout: None,
            retry: RetryConfiguration::default(),
        }
    }
}

/// Raw shape deserialized from the TOML file / environment layer. Every field is optional so
/// a partial file only overrides what it names.
#[derive(Debug, Default, Deserialize)]
struct RawNodeConfig {
    port: Option<u16>,
    forward_all: Option<bool>,
    max_frame_bytes: Option<u32>,
    default_buffer_size: Option<u32>,
    temp_dir: Option<String>,
    tcp_connect_timeout_secs: Option<u64>,
    tcp_idle_timeout_secs: Option<u64>,
    retry_max_attempts: Option<u32>,
}

/// Explicit CLI overrides, applied last and so always win.
#[derive(Debug, Default, Clone)]
pub struct NodeConfigOverrides {
    pub port: Option<u16>,
    pub forward_all: Option<bool>,
    pub temp_dir: Option<PathBuf>,
    pub default_buffer_size: Option<u32>,
}

impl NodeConfig {
    /// Layer compiled-in defaults, an optional `<config_dir>/p2p-node/config.toml`, and
    /// `NODE__*` environment variables, then apply CLI overrides and validate the result.
    pub fn load(overrides: NodeConfigOverrides) -> Result<Self, CoreError> {
        let mut builder = config::Config::builder();

        if let Some(dir) = dirs::config_dir() {
            let path = dir.join("p2p-node").join("config.toml");
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("NODE").separator("__"),
        );

        let raw: RawNodeConfig = builder
            .build()
            .map_err(|e| CoreError::with_field(e.to_string(), "config_source"))?
            .try_deserialize()
            .map_err(|e| CoreError::with_field(e.to_string(), "config_shape"))?;

        let mut cfg = NodeConfig::default();
        if let Some(v) = raw.port {
            cfg.port = v;
        }
        if let Some(v) = raw.forward_all {
            cfg.forward_all = v;
        }
        if let Some(v) = raw.max_frame_bytes {
            cfg.max_frame_bytes = v;
        }
        if let Some(v) = raw.default_buffer_size {
            cfg.default_buffer_size = v;
        }
        if let Some(v) = raw.temp_dir {
            cfg.temp_dir = PathBuf::from(v);
        }
        if let Some(v) = raw.tcp_connect_timeout_secs {
            cfg.tcp_connect_timeout = Duration::from_secs(v);
        }
        cfg.tcp_idle_timeout = raw.tcp_idle_timeout_secs.map(Duration::from_secs);
        if let Some(v) = raw.retry_max_attempts {
            cfg.retry.max_attempts = v;
        }

        if let Some(v) = overrides.port {
            cfg.port = v;
        }
        if let Some(v) = overrides.forward_all {
            cfg.forward_all = v;
        }
        if let Some(v) = overrides.temp_dir {
            cfg.temp_dir = v;
        }
        if let Some(v) = overrides.default_buffer_size {
            cfg.default_buffer_size = v;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.port == 0 {
            return Err(CoreError::with_field(
                "port must be nonzero".to_string(),
                "port",
            ));
        }
        if self.max_frame_bytes == 0 {
            return Err(CoreError::with_field(
                "max_frame_bytes must be nonzero".to_string(),
                "max_frame_bytes",
            ));
        }
        if self.default_buffer_size == 0 {
            return Err(CoreError::with_field(
                "default_buffer_size must be nonzero".to_string(),
                "default_buffer_size",
            ));
        }
        if !crate::config::validation::is_creatable_dir(&self.temp_dir) {
            return Err(CoreError::with_field(
                format!("temp_dir {} cannot be created", self.temp_dir.display()),
                "temp_dir",
            ));
        }
        Ok(())
    }
}

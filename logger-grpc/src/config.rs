//! Configuration for [`crate::GrpcLogger`]

use crate::relay::DEFAULT_RELAY_CAPACITY;
use sparrow_core::proto::logger::logger_client::LoggerClient;
use sparrow_core::{Level, LoggerOptions};
use tonic::transport::Channel;

/// Record encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable single line
    Console,
}

impl Encoding {
    /// Parse `json` or `console`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "console" => Some(Self::Console),
            _ => None,
        }
    }
}

/// Where records go and how they are encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Encoding used by every output
    pub encoding: Encoding,
    /// Resolved through [`crate::SinkRegistry`]
    pub output_paths: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::Json,
            output_paths: vec!["stderr".to_string()],
        }
    }
}

/// Formatting switches applied to every output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Include the event target
    pub with_target: bool,
    /// Include the level
    pub with_level: bool,
    /// Colour console output
    pub with_ansi: bool,
    /// Include the emitting thread's id
    pub with_thread_ids: bool,
    /// Source file and line of the emitting call
    pub with_file_line: bool,
    /// JSON only: put event fields at the top level
    pub flatten_event: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            with_target: true,
            with_level: true,
            with_ansi: false,
            with_thread_ids: false,
            with_file_line: false,
            flatten_event: true,
        }
    }
}

/// Remote logging service records are relayed to
#[derive(Debug, Clone)]
pub struct RemoteSink {
    /// Sent with every record
    pub service_name: String,
    /// Client for the logging service
    pub client: LoggerClient<Channel>,
    /// Relay queue capacity
    pub capacity: usize,
}

/// Everything needed to build a [`crate::GrpcLogger`]
#[derive(Debug, Clone, Default)]
pub struct LoggerConfig {
    /// Level and static fields
    pub options: LoggerOptions,
    /// Relay target; `None` logs locally only
    pub remote: Option<RemoteSink>,
    /// Outputs and encoding
    pub log: LogConfig,
    /// Formatting switches
    pub encoder: EncoderConfig,
    /// Key the record fields are nested under
    pub namespace: Option<String>,
}

impl LoggerConfig {
    /// Local-only logger at info, writing JSON to stderr
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum level
    pub fn with_level(mut self, level: Level) -> Self {
        self.options.level = level;
        self
    }

    /// Add a static field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options = self.options.field(key, value);
        self
    }

    /// Replace level and static fields
    pub fn with_options(mut self, options: LoggerOptions) -> Self {
        self.options = options;
        self
    }

    /// Relay records to `client` tagged with `service_name`
    pub fn with_remote(mut self, service_name: impl Into<String>, client: LoggerClient<Channel>) -> Self {
        let capacity = self
            .remote
            .as_ref()
            .map_or(DEFAULT_RELAY_CAPACITY, |r| r.capacity);
        self.remote = Some(RemoteSink {
            service_name: service_name.into(),
            client,
            capacity,
        });
        self
    }

    /// Relay queue capacity; ignored without a remote
    pub fn with_relay_capacity(mut self, capacity: usize) -> Self {
        if let Some(remote) = self.remote.as_mut() {
            remote.capacity = capacity;
        }
        self
    }

    /// Replace encoding and output paths
    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Set the encoding
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.log.encoding = encoding;
        self
    }

    /// Replace the output paths
    pub fn with_output_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.log.output_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the formatting switches
    pub fn with_encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }

    /// Nest record fields under `namespace`
    ///
    /// Every field is nested, including the static fields from
    /// [`LoggerOptions`]; none stay at the top level of the record.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

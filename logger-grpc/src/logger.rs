//! Structured logger with an optional remote relay
//!
//! Records are rendered by `tracing_subscriber::fmt` layers, one per output
//! path, inside a private [`Dispatch`]. Nothing is installed globally; the
//! logger enters its dispatch only for the duration of each record.

use crate::config::{EncoderConfig, Encoding, LoggerConfig};
use crate::level::{level_filter, to_tracing_level};
use crate::relay::{RelayReport, RelayWriter};
use crate::sink::{REMOTE_SCHEME, RelaySink, SinkRegistry};
use sparrow_core::{Fields, Level, Logger, LoggerOptions, PluginError};
use std::fmt;
use std::sync::Arc;
use tracing::{Dispatch, debug};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

/// Name reported by [`Logger::name`]
pub const LOGGER_NAME: &str = "grpc";

/// Target of every record the logger emits
pub const RECORD_TARGET: &str = "sparrow";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// [`Logger`] writing to local outputs and, optionally, a remote service
pub struct GrpcLogger {
    config: LoggerConfig,
    dispatch: Dispatch,
    relay: Option<Arc<RelayWriter>>,
    /// Accumulated fields, pre-rendered once
    fields: Fields,
    rendered: Option<String>,
}

impl GrpcLogger {
    /// Build the outputs and start the relay, if a remote is configured
    ///
    /// Must run inside a Tokio runtime when a remote is configured.
    pub fn new(config: LoggerConfig) -> Result<Self, PluginError> {
        let relay = match &config.remote {
            Some(remote) => Some(Arc::new(RelayWriter::spawn(
                remote.client.clone(),
                remote.service_name.clone(),
                remote.capacity,
            )?)),
            None => None,
        };

        let dispatch = build_dispatch(&config, relay.as_ref())?;
        let fields = config.options.fields.clone();
        let rendered = render_fields(&fields, config.namespace.as_deref());

        debug!(
            level = %config.options.level,
            outputs = ?config.log.output_paths,
            remote = relay.is_some(),
            "Logger built"
        );
        Ok(Self {
            config,
            dispatch,
            relay,
            fields,
            rendered,
        })
    }

    /// The logger's private dispatch, for hosts that want to install it
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Relay feeding the remote service, if configured
    pub fn relay(&self) -> Option<&Arc<RelayWriter>> {
        self.relay.as_ref()
    }

    /// Fields attached to every record
    pub fn current_fields(&self) -> &Fields {
        &self.fields
    }

    /// Drain and close the relay
    ///
    /// The relay is shared with child loggers; after shutdown their remote
    /// output stops too. Without a relay this does nothing.
    pub async fn shutdown(&self) -> Result<Option<RelayReport>, PluginError> {
        match &self.relay {
            Some(relay) => relay.close().await.map(Some),
            None => Ok(None),
        }
    }

    fn child(&self, fields: Fields) -> Self {
        let rendered = render_fields(&fields, self.config.namespace.as_deref());
        Self {
            config: self.config.clone(),
            dispatch: self.dispatch.clone(),
            relay: self.relay.clone(),
            fields,
            rendered,
        }
    }
}

impl Logger for GrpcLogger {
    fn init(&mut self, options: LoggerOptions) -> Result<(), PluginError> {
        let mut config = self.config.clone();
        config.options = options;

        // The relay survives re-initialization
        self.dispatch = build_dispatch(&config, self.relay.as_ref())?;
        self.fields = config.options.fields.clone();
        self.rendered = render_fields(&self.fields, config.namespace.as_deref());
        self.config = config;
        Ok(())
    }

    fn options(&self) -> &LoggerOptions {
        &self.config.options
    }

    fn fields(&self, fields: Fields) -> Box<dyn Logger> {
        let mut merged = self.fields.clone();
        merged.extend(fields);
        Box::new(self.child(merged))
    }

    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        // The layer filter works on folded tracing levels; the exact check
        // is done here.
        if !self.config.options.level.enabled(level) {
            return;
        }

        let rendered = self.rendered.as_deref();
        tracing::dispatcher::with_default(&self.dispatch, || emit(level, args, rendered));
    }

    fn name(&self) -> &'static str {
        LOGGER_NAME
    }
}

impl fmt::Debug for GrpcLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrpcLogger")
            .field("level", &self.config.options.level)
            .field("fields", &self.fields)
            .field("outputs", &self.config.log.output_paths)
            .field("relay", &self.relay)
            .finish_non_exhaustive()
    }
}

fn emit(level: Level, message: fmt::Arguments<'_>, fields: Option<&str>) {
    let fields = fields.map(tracing::field::display);

    match to_tracing_level(level) {
        tracing::Level::DEBUG => tracing::debug!(target: RECORD_TARGET, fields, "{}", message),
        tracing::Level::INFO => tracing::info!(target: RECORD_TARGET, fields, "{}", message),
        tracing::Level::WARN => tracing::warn!(target: RECORD_TARGET, fields, "{}", message),
        _ => tracing::error!(target: RECORD_TARGET, fields, "{}", message),
    }
}

/// Render fields as a JSON object, nested under `namespace` if set
fn render_fields(fields: &Fields, namespace: Option<&str>) -> Option<String> {
    if fields.is_empty() {
        return None;
    }

    let object: serde_json::Map<String, serde_json::Value> = fields
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let value = match namespace {
        Some(ns) => {
            let mut outer = serde_json::Map::new();
            outer.insert(ns.to_string(), serde_json::Value::Object(object));
            serde_json::Value::Object(outer)
        }
        None => serde_json::Value::Object(object),
    };
    Some(value.to_string())
}

/// Targets never forwarded to the remote relay
///
/// Covers the transport carrying the relay stream and the relay's own
/// diagnostics. With the dispatch installed, their events would otherwise
/// be written back into the stream they describe.
pub const RELAY_EXCLUDED_TARGETS: [&str; 8] = [
    "h2",
    "hyper",
    "hyper_util",
    "tonic",
    "tower",
    "tokio_util",
    "sparrow_logger_grpc",
    "tokio",
];

fn relay_filter() -> Targets {
    RELAY_EXCLUDED_TARGETS
        .iter()
        .fold(Targets::new().with_default(LevelFilter::TRACE), |targets, target| {
            targets.with_target(*target, LevelFilter::OFF)
        })
}

fn build_dispatch(
    config: &LoggerConfig,
    relay: Option<&Arc<RelayWriter>>,
) -> Result<Dispatch, PluginError> {
    let mut sinks = SinkRegistry::new();
    if let Some(relay) = relay {
        let sink = RelaySink::new(Arc::clone(relay));
        sinks.register(REMOTE_SCHEME, move |_| Ok(BoxMakeWriter::new(sink.clone())))?;
    }

    let mut layers = config
        .log
        .output_paths
        .iter()
        .map(|path| {
            sinks
                .open(path)
                .map(|writer| fmt_layer(writer, config.log.encoding, &config.encoder, true))
        })
        .collect::<Result<Vec<BoxedLayer>, PluginError>>()?;

    if relay.is_some() {
        // Drops are counted by the relay; tracing must not report them
        let writer = sinks.open(&format!("{REMOTE_SCHEME}:"))?;
        layers.push(
            fmt_layer(writer, config.log.encoding, &config.encoder, false)
                .with_filter(relay_filter())
                .boxed(),
        );
    }

    let subscriber = tracing_subscriber::registry()
        .with(layers)
        .with(level_filter(config.options.level));
    Ok(Dispatch::new(subscriber))
}

fn fmt_layer(
    writer: BoxMakeWriter,
    encoding: Encoding,
    encoder: &EncoderConfig,
    log_internal_errors: bool,
) -> BoxedLayer {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .log_internal_errors(log_internal_errors)
        .with_ansi(encoder.with_ansi)
        .with_target(encoder.with_target)
        .with_level(encoder.with_level)
        .with_thread_ids(encoder.with_thread_ids)
        .with_file(encoder.with_file_line)
        .with_line_number(encoder.with_file_line);

    match encoding {
        Encoding::Json => layer
            .json()
            .flatten_event(encoder.flatten_event)
            .with_current_span(false)
            .with_span_list(false)
            .boxed(),
        Encoding::Console => layer.boxed(),
    }
}

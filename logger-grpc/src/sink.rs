//! Output path resolution
//!
//! An output path is `stderr`, `stdout`, a `scheme:` registered with a
//! [`SinkRegistry`], or a file path opened for append.

use crate::relay::RelayWriter;
use sparrow_core::PluginError;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Scheme the remote relay is registered under
pub const REMOTE_SCHEME: &str = "grpc";

/// Builds a writer for the part of the path after `scheme:`
pub type SinkFactory = Box<dyn Fn(&str) -> Result<BoxMakeWriter, PluginError> + Send + Sync>;

/// Maps output paths to writers
#[derive(Default)]
pub struct SinkRegistry {
    factories: HashMap<String, SinkFactory>,
}

impl SinkRegistry {
    /// Registry resolving only the built-in paths
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `scheme:` paths
    pub fn register<F>(&mut self, scheme: &str, factory: F) -> Result<(), PluginError>
    where
        F: Fn(&str) -> Result<BoxMakeWriter, PluginError> + Send + Sync + 'static,
    {
        if !is_scheme(scheme) {
            return Err(PluginError::Sink(format!("invalid scheme {scheme:?}")));
        }
        if self.factories.contains_key(scheme) {
            return Err(PluginError::Sink(format!(
                "sink already registered for scheme {scheme:?}"
            )));
        }
        self.factories.insert(scheme.to_string(), Box::new(factory));
        Ok(())
    }

    /// Resolve `path` to a writer
    pub fn open(&self, path: &str) -> Result<BoxMakeWriter, PluginError> {
        match path {
            "stderr" => return Ok(BoxMakeWriter::new(std::io::stderr)),
            "stdout" => return Ok(BoxMakeWriter::new(std::io::stdout)),
            "" => return Err(PluginError::Sink("empty output path".to_string())),
            _ => {}
        }

        if let Some((scheme, rest)) = path.split_once(':') {
            if let Some(factory) = self.factories.get(scheme) {
                return factory(rest);
            }
            // Single letters are drive prefixes, not schemes
            if scheme.len() > 1 && is_scheme(scheme) {
                return Err(PluginError::Sink(format!(
                    "no sink registered for scheme {scheme:?}"
                )));
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| PluginError::Sink(format!("cannot open {path}: {e}")))?;
        Ok(BoxMakeWriter::new(Mutex::new(file)))
    }
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// tracing writer factory backed by a shared [`RelayWriter`]
#[derive(Clone)]
pub struct RelaySink(Arc<RelayWriter>);

impl RelaySink {
    /// Sink feeding `relay`
    pub fn new(relay: Arc<RelayWriter>) -> Self {
        Self(relay)
    }
}

impl<'a> MakeWriter<'a> for RelaySink {
    type Writer = RelayRecordWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RelayRecordWriter(&self.0)
    }
}

/// Per-event writer handed out by [`RelaySink`]
///
/// Never fails: a record the relay cannot take is counted in
/// [`RelayWriter::dropped`] and otherwise discarded.
pub struct RelayRecordWriter<'a>(&'a RelayWriter);

impl io::Write for RelayRecordWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write_or_drop(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

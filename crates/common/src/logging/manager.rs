//! Logging initialization.

use std::io;

use tracing::*;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{
    filter::Directive,
    fmt::{layer, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use super::types::LoggerConfig;

/// Builds the filter from `RUST_LOG`, falling back to the configured level.
///
/// An unparsable configured level falls back to `INFO`.
pub fn build_filter(config: &LoggerConfig) -> EnvFilter {
    let default: Directive = config
        .level
        .parse()
        .unwrap_or_else(|_| Level::INFO.into());
    EnvFilter::builder()
        .with_default_directive(default)
        .from_env_lossy()
}

/// Initializes the logging subsystem with the provided config.
///
/// Must be called at most once per process, and only by binaries.
pub fn init(config: LoggerConfig) {
    let filt = build_filter(&config);

    let writer = if config.stdout_config.use_stderr {
        BoxMakeWriter::new(io::stderr)
    } else {
        BoxMakeWriter::new(io::stdout)
    };
    let stdout_sub = if config.stdout_config.json_format {
        layer()
            .json()
            .with_writer(writer)
            .with_filter(filt.clone())
            .boxed()
    } else {
        layer()
            .compact()
            .with_writer(writer)
            .with_filter(filt.clone())
            .boxed()
    };

    let file_layer = config.file_logging_config.as_ref().map(|file_config| {
        let file_appender = RollingFileAppender::new(
            file_config.rotation.into(),
            &file_config.directory,
            &file_config.file_name_prefix,
        );

        if file_config.json_format {
            layer()
                .json()
                .with_writer(file_appender)
                .with_ansi(false) // No color codes in files
                .with_filter(filt.clone())
                .boxed()
        } else {
            layer()
                .compact()
                .with_writer(file_appender)
                .with_ansi(false) // No color codes in files
                .with_filter(filt.clone())
                .boxed()
        }
    });

    tracing_subscriber::registry()
        .with(stdout_sub)
        .with(file_layer)
        .init();

    info!(service_name = %config.service_name, "logging initialized");
}

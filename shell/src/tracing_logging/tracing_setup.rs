// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::path::PathBuf;

use miette::IntoDiagnostic;
use tracing_core::LevelFilter;
use tracing_subscriber::{Layer, layer::SubscriberExt, registry::LookupSpan,
                         util::SubscriberInitExt};

use super::{DisplayPreference, TracingConfig, WriterConfig};

pub type DynLayer<S> = dyn Layer<S> + Send + Sync + 'static;

/// Avoid gnarly type annotations by using a macro to create the `fmt` layer.
#[macro_export]
macro_rules! create_fmt {
    () => {
        tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_thread_ids(true)
            .with_thread_names(false)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true)
    };
}

/// Initialize the global tracing subscriber with the provided [TracingConfig]. Does
/// nothing for [WriterConfig::None].
///
/// # Errors
///
/// If the log file can't be created, or a global subscriber is already set.
pub fn init(tracing_config: TracingConfig) -> miette::Result<()> {
    match try_create_layers(&tracing_config)? {
        Some(layers) => tracing_subscriber::registry()
            .with(layers)
            .try_init()
            .into_diagnostic(),
        None => Ok(()),
    }
}

/// Returns the layers. This does not initialize the tracing system.
///
/// For example, once you have the layers, you can run the following:
/// `try_create_layers(..).map(|layers| tracing_subscriber::registry().with(layers).init());`
///
/// # Errors
///
/// If the log file can't be created.
pub fn try_create_layers(
    tracing_config: &TracingConfig,
) -> miette::Result<Option<Vec<Box<DynLayer<tracing_subscriber::Registry>>>>> {
    let level_filter = tracing_config.get_level_filter();

    let (maybe_display, maybe_file) = match tracing_config.get_writer_config() {
        WriterConfig::None => return Ok(None),
        WriterConfig::Display(display) => (Some(display), None),
        WriterConfig::File(path) => (None, Some(path)),
        WriterConfig::DisplayAndFile(display, path) => (Some(display), Some(path)),
    };

    let mut layers: Vec<Box<DynLayer<tracing_subscriber::Registry>>> = vec![];

    // The level filter applies to every layer, including ones added later that don't
    // have their own filter.
    layers.push(Box::new(level_filter));

    if let Some(display) = maybe_display {
        layers.push(try_create_display_layer(level_filter, display));
    }

    if let Some(path) = maybe_file {
        layers.push(try_create_file_layer(level_filter, &path)?);
    }

    Ok(Some(layers))
}

/// This erases the concrete type of the writer, and returns a boxed layer. There's
/// more info in the docs
/// [here](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/index.html#runtime-configuration-with-layers).
pub fn try_create_display_layer<S>(
    level_filter: LevelFilter,
    preferred_display: DisplayPreference,
) -> Box<DynLayer<S>>
where
    S: tracing_core::Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    let fmt_layer = create_fmt!();

    match preferred_display {
        DisplayPreference::Stdout => Box::new(
            fmt_layer
                .with_writer(std::io::stdout)
                .with_filter(level_filter),
        ),
        DisplayPreference::Stderr => Box::new(
            fmt_layer
                .with_writer(std::io::stderr)
                .with_filter(level_filter),
        ),
        DisplayPreference::SharedWriter(shared_writer) => {
            let tracing_writer =
                move || -> Box<dyn std::io::Write> { Box::new(shared_writer.clone()) };
            Box::new(
                fmt_layer
                    .with_writer(tracing_writer)
                    .with_filter(level_filter),
            )
        }
    }
}

/// # Errors
///
/// If `path` has no file name.
pub fn try_create_file_layer<S>(
    level_filter: LevelFilter,
    path: &str,
) -> miette::Result<Box<DynLayer<S>>>
where
    S: tracing_core::Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    let file = rolling_file_appender_impl::try_create(path)?;
    Ok(Box::new(
        create_fmt!()
            .with_ansi(false)
            .with_writer(file)
            .with_filter(level_filter),
    ))
}

pub mod rolling_file_appender_impl {
    use super::PathBuf;

    /// A file that is never rolled over. Note that wrapping it in
    /// `tracing_appender::non_blocking` loses lines if the guard is dropped early.
    ///
    /// # Errors
    ///
    /// If `path_str` has no file name.
    pub fn try_create(
        path_str: &str,
    ) -> miette::Result<tracing_appender::rolling::RollingFileAppender> {
        let path = PathBuf::from(path_str);

        let parent = path.parent().map(PathBuf::from).unwrap_or_default();

        let file_name = path.file_name().ok_or_else(|| {
            miette::miette!(
                "Can't use {} as a log file, it has no file name.",
                path.display()
            )
        })?;

        Ok(tracing_appender::rolling::never(parent, file_name))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use super::*;
    use crate::{LogControlSignal, LogStats, SharedWriter};

    #[test]
    fn test_no_writer_no_layers() {
        let config = TracingConfig {
            writer_config: WriterConfig::None,
            level: tracing::Level::INFO,
        };
        assert!(try_create_layers(&config).unwrap().is_none());
    }

    #[test]
    fn test_file_without_name_is_an_error() {
        assert!(rolling_file_appender_impl::try_create("/").is_err());
    }

    #[test]
    fn test_file_layer_writes_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shell.log");
        let config = TracingConfig::new_file(Some(path.to_string_lossy().into_owned()));

        let layers = try_create_layers(&config).unwrap().unwrap();
        let subscriber = tracing_subscriber::registry().with(layers);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("written to file");
            tracing::trace!("filtered out");
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("written to file"), "{contents:?}");
        assert!(!contents.contains("filtered out"));
    }

    #[test]
    fn test_shared_writer_layer_sends_lines() {
        let (sender, mut receiver) = mpsc::channel(8);
        let shared_writer = SharedWriter::new(sender, Arc::new(LogStats::default()));
        let config = TracingConfig::new_display(DisplayPreference::SharedWriter(shared_writer));

        let layers = try_create_layers(&config).unwrap().unwrap();
        let subscriber = tracing_subscriber::registry().with(layers);
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("sensor offline");
        });

        match receiver.try_recv().unwrap() {
            LogControlSignal::Line(text) => {
                let text = String::from_utf8_lossy(&text);
                assert!(text.contains("sensor offline"), "{text:?}");
                assert!(text.ends_with('\n'));
            }
            LogControlSignal::Flush => panic!("expected a line"),
        }
    }
}

//! src/logging.rs
//!
//! File-only tracing setup. The terminal is in raw mode while the console
//! runs, so nothing is written to stderr.

use std::{
    fs,
    sync::atomic::{AtomicUsize, Ordering},
};

use tracing::Metadata;
use tracing_appender::{non_blocking::WorkerGuard, rolling::daily};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        self, FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    prelude::*,
};

use crate::{AppError, config::LoggingConfig};

pub struct Logger;

impl Logger {
    /// Call **once** near the start of `main`; keep the guard alive until exit.
    pub fn init_tracing(config: &LoggingConfig) -> Result<WorkerGuard, AppError> {
        // create the log dir if missing
        fs::create_dir_all(&config.log_dir).map_err(|source| AppError::ConfigIo {
            path: config.log_dir.clone(),
            source,
        })?;

        // daily rolling file appender → <log_dir>/vmconsole.YYYY-MM-DD
        let (writer, guard) = tracing_appender::non_blocking(daily(&config.log_dir, "vmconsole"));

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))
            .map_err(|e| AppError::InvalidConfig(format!("logging.level: {e}")))?;

        let file_layer = fmt::layer()
            .event_format(SeqFileMod) // compact formatter
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(file_layer)
            .try_init()
            .map_err(|e| AppError::Other(format!("tracing already initialised: {e}")))?;

        Ok(guard)
    }
}

static SEQ: AtomicUsize = AtomicUsize::new(1);

/// Custom formatter: `[SEQ] LEVEL [file:line mod::path] message`
struct SeqFileMod;

impl<S, N> FormatEvent<S, N> for SeqFileMod
where
    S: tracing::Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut w: Writer<'_>,
        ev: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        // monotonically‑increasing sequence number
        let seq: usize = SEQ.fetch_add(1, Ordering::Relaxed);

        let meta: &'static Metadata<'static> = ev.metadata();
        write!(
            w,
            "{seq:06} {:5} [{}:{} {}] ",
            meta.level(),
            meta.file().unwrap_or("??"),
            meta.line().unwrap_or(0),
            meta.module_path().unwrap_or("???"),
        )?;

        // span context, innermost last
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(w, "{}: ", span.name())?;
            }
        }

        // write all key‑value pairs for this event
        ctx.field_format().format_fields(w.by_ref(), ev)?;
        writeln!(w)
    }
}

// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Ambient logging infrastructure.
//!
//! The engine itself only ever calls the `log` façade macros; this module supplies the one-time
//! `log::Log` registration the embedding application is expected to call during system init, plus
//! a couple of small, allocator-free [`LogSink`] implementations in case the embedder doesn't
//! already have one of its own.

use core::fmt::{Arguments, Write};
use core::sync::atomic::{AtomicBool, Ordering};
use log::{Log, Metadata, Record, SetLoggerError};
use spin::{Once, mutex::SpinMutex};

static LOGGER: Once<Logger> = Once::new();

struct Logger {
    sink: &'static dyn LogSink,
}

impl Log for Logger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.sink
            .write_fmt(format_args!("{}: {}\n", record.level(), record.args()));
    }

    fn flush(&self) {}
}

/// Installs `sink` as the global `log` backend, with the level filter compiled in by this crate's
/// `max_log_*` Cargo feature (or [`log::LevelFilter::Info`] if none is set).
///
/// Returns an error if a logger has already been installed by this or another crate; safe to
/// call multiple times with the understanding that only the first call wins.
pub fn init(sink: &'static dyn LogSink) -> Result<(), SetLoggerError> {
    let logger = LOGGER.call_once(|| Logger { sink });
    log::set_logger(logger)?;
    log::set_max_level(log::STATIC_MAX_LEVEL);
    Ok(())
}

/// Something to which formatted log lines can be sent.
///
/// Unlike [`core::fmt::Write`], `write_fmt` takes `&self` rather than `&mut self`: implementers
/// are responsible for their own interior locking, or can be lock-free.
pub trait LogSink: Sync {
    /// Writes the given format arguments to the log sink.
    fn write_fmt(&self, args: Arguments);
}

/// A [`LogSink`] that serialises access to any [`core::fmt::Write`] implementation behind a spin
/// lock, so a single instance can be shared across cores and a complete log line is written
/// atomically rather than interleaved with another core's output.
pub struct LockedWriter<W: Write + Send> {
    writer: SpinMutex<W>,
}

impl<W: Write + Send> LockedWriter<W> {
    /// Creates a new `LockedWriter` wrapping `writer`.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: SpinMutex::new(writer),
        }
    }
}

impl<W: Write + Send> LogSink for LockedWriter<W> {
    fn write_fmt(&self, args: Arguments) {
        let _ = self.writer.lock().write_fmt(args);
    }
}

/// A logger that always writes to a primary sink, and optionally also to a secondary sink.
///
/// A typical configuration pairs a lock-free per-core memory buffer as the primary sink with a
/// shared UART as the secondary one, so logging stays lock-free when the secondary sink is
/// disabled.
pub struct HybridLogger<P: LogSink, S: LogSink> {
    primary: P,
    secondary: S,
    secondary_enabled: AtomicBool,
}

impl<P: LogSink, S: LogSink> HybridLogger<P, S> {
    /// Creates a new logger with the given primary and secondary sinks. Logging to the secondary
    /// sink is initially enabled.
    pub const fn new(primary: P, secondary: S) -> Self {
        Self {
            primary,
            secondary,
            secondary_enabled: AtomicBool::new(true),
        }
    }

    /// Enables or disables writing logs to the secondary sink.
    pub fn enable_secondary(&self, enable: bool) {
        self.secondary_enabled.store(enable, Ordering::Release);
    }
}

impl<P: LogSink, S: LogSink> LogSink for HybridLogger<P, S> {
    fn write_fmt(&self, args: Arguments) {
        self.primary.write_fmt(args);
        if self.secondary_enabled.load(Ordering::Acquire) {
            self.secondary.write_fmt(args);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt;

    struct RecordingWriter(std::sync::Mutex<std::string::String>);

    impl fmt::Write for RecordingWriter {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            self.0.lock().unwrap().push_str(s);
            Ok(())
        }
    }

    #[test]
    fn locked_writer_forwards_to_inner() {
        let sink = LockedWriter::new(RecordingWriter(std::sync::Mutex::new(std::string::String::new())));
        sink.write_fmt(format_args!("hello"));
        assert_eq!(sink.writer.lock().0.lock().unwrap().as_str(), "hello");
    }

    #[test]
    fn hybrid_logger_respects_secondary_toggle() {
        let primary = LockedWriter::new(RecordingWriter(std::sync::Mutex::new(std::string::String::new())));
        let secondary = LockedWriter::new(RecordingWriter(std::sync::Mutex::new(std::string::String::new())));
        let hybrid = HybridLogger::new(primary, secondary);

        hybrid.write_fmt(format_args!("a"));
        assert_eq!(hybrid.primary.writer.lock().0.lock().unwrap().as_str(), "a");
        assert_eq!(hybrid.secondary.writer.lock().0.lock().unwrap().as_str(), "a");

        hybrid.enable_secondary(false);
        hybrid.write_fmt(format_args!("b"));
        assert_eq!(hybrid.primary.writer.lock().0.lock().unwrap().as_str(), "ab");
        assert_eq!(hybrid.secondary.writer.lock().0.lock().unwrap().as_str(), "a");
    }
}

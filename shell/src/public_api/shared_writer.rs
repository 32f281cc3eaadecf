// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{io::{self, Write},
          sync::atomic::{AtomicUsize, Ordering}};

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::{SafeLogStats, Text};

/// Signals that can be sent to the log channel, which is monitored by the task spawned in
/// [crate::Shell::new].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogControlSignal {
    Line(Text),
    /// Sent when the last [SharedWriter] is flushed with nothing buffered. Nothing is
    /// printed.
    Flush,
}

/// Counters for log lines that could not be queued because the log channel was full.
#[derive(Debug, Default)]
pub struct LogStats {
    /// Dropped since the last line that got through. Reported (and reset) by the monitor
    /// task.
    dropped_since_delivery: AtomicUsize,
    /// Dropped since the shell was created (or since [Self::reset]).
    lost_total: AtomicUsize,
}

impl LogStats {
    pub fn record_dropped(&self) {
        self.dropped_since_delivery.fetch_add(1, Ordering::Relaxed);
        self.lost_total.fetch_add(1, Ordering::Relaxed);
    }

    /// How many lines were dropped since the last call, and start counting from zero.
    pub fn take_dropped(&self) -> usize { self.dropped_since_delivery.swap(0, Ordering::Relaxed) }

    pub fn lost_total(&self) -> usize { self.lost_total.load(Ordering::Relaxed) }

    pub fn reset(&self) {
        self.dropped_since_delivery.store(0, Ordering::Relaxed);
        self.lost_total.store(0, Ordering::Relaxed);
    }
}

/// Cloneable object that implements [`Write`] and allows other tasks to send log output to
/// the terminal without messing up the prompt and the line being edited.
///
/// # Create a new instance by creating a `Shell` instance
///
/// A [`SharedWriter`] is returned by [crate::Shell::new]. Give clones of it to log
/// producers, or use it as the writer of the tracing display layer with
/// [crate::DisplayPreference::SharedWriter].
///
/// # Nothing is output without terminating with a newline, unless you call [SharedWriter::flush()]
///
/// Data written is only sent to the log channel once a line feed (`'\n'`) has been
/// written. The monitor task then erases the prompt, prints the line and redraws the
/// prompt.
///
/// # Producers never block
///
/// If the log channel is full the line is dropped and counted in [LogStats]. The count is
/// printed as a warning in front of the next line that gets through.
#[derive(Debug)]
pub struct SharedWriter {
    /// Holds the data to be written to the terminal.
    pub buffer: Text,

    /// Sender end of the channel, the receiver end is in the monitor task, which does the
    /// actual printing.
    pub log_channel_sender: mpsc::Sender<LogControlSignal>,

    pub safe_log_stats: SafeLogStats,

    /// This is set to `true` when this struct is cloned. Only the first instance of this
    /// struct will report errors when [`std::io::Write::write()`] fails, due to the
    /// receiver end of the channel being closed.
    pub silent_error: bool,
}

impl SharedWriter {
    pub fn new(
        log_channel_sender: mpsc::Sender<LogControlSignal>,
        safe_log_stats: SafeLogStats,
    ) -> Self {
        Self {
            buffer: Default::default(),
            log_channel_sender,
            safe_log_stats,
            silent_error: false,
        }
    }

    fn send(&mut self, signal: LogControlSignal) -> io::Result<()> {
        match self.log_channel_sender.try_send(signal) {
            Ok(_) => {
                self.buffer.clear();
            }
            Err(TrySendError::Full(_)) => {
                self.buffer.clear();
                self.safe_log_stats.record_dropped();
            }
            Err(TrySendError::Closed(_)) => {
                if !self.silent_error {
                    return Err(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "SharedWriter Receiver has closed",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Custom [Clone] implementation for [`SharedWriter`]. This ensures that each new
/// instance gets its own buffer to write data into, while all of them send to the same
/// log channel and count into the same [LogStats].
impl Clone for SharedWriter {
    fn clone(&self) -> Self {
        Self {
            buffer: Default::default(),
            log_channel_sender: self.log_channel_sender.clone(),
            safe_log_stats: self.safe_log_stats.clone(),
            silent_error: true,
        }
    }
}

impl Write for SharedWriter {
    fn write(&mut self, payload: &[u8]) -> io::Result<usize> {
        // Append the payload to the buffer.
        self.buffer.extend_from_slice(payload);

        // If the buffer ends with a newline, send it to the monitor task.
        if self.buffer.ends_with(b"\n") {
            self.send(LogControlSignal::Line(self.buffer.clone()))?;
        }

        Ok(payload.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let signal = if self.buffer.is_empty() {
            LogControlSignal::Flush
        } else {
            LogControlSignal::Line(self.buffer.clone())
        };
        self.send(signal)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_write_sends_complete_lines() {
        let (sender, mut receiver) = mpsc::channel(10);
        let mut writer = SharedWriter::new(sender, Arc::new(LogStats::default()));

        writer.write_all(b"hello ").unwrap();
        assert!(receiver.try_recv().is_err());

        writer.write_all(b"world\n").unwrap();
        assert_eq!(
            receiver.recv().await.unwrap(),
            LogControlSignal::Line(b"hello world\n".to_vec())
        );
        assert!(writer.buffer.is_empty());
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_flush_sends_partial_line() {
        let (sender, mut receiver) = mpsc::channel(10);
        let mut writer = SharedWriter::new(sender, Arc::new(LogStats::default()));

        write!(writer, "no newline").unwrap();
        writer.flush().unwrap();
        assert_eq!(
            receiver.recv().await.unwrap(),
            LogControlSignal::Line(b"no newline".to_vec())
        );

        writer.flush().unwrap();
        assert_eq!(receiver.recv().await.unwrap(), LogControlSignal::Flush);
    }

    #[test]
    fn test_full_channel_drops_and_counts() {
        let (sender, _receiver) = mpsc::channel(1);
        let stats = Arc::new(LogStats::default());
        let mut writer = SharedWriter::new(sender, stats.clone());

        writeln!(writer, "one").unwrap();
        writeln!(writer, "two").unwrap();
        writeln!(writer, "three").unwrap();

        assert!(writer.buffer.is_empty());
        assert_eq!(stats.lost_total(), 2);
        assert_eq!(stats.take_dropped(), 2);
        assert_eq!(stats.take_dropped(), 0);
        assert_eq!(stats.lost_total(), 2);

        stats.reset();
        assert_eq!(stats.lost_total(), 0);
    }

    #[test]
    fn test_closed_channel_only_errors_on_original() {
        let (sender, receiver) = mpsc::channel(1);
        let mut writer = SharedWriter::new(sender, Arc::new(LogStats::default()));
        let mut clone = writer.clone();
        drop(receiver);

        assert!(writeln!(writer, "line").is_err());
        assert!(writeln!(clone, "line").is_ok());
    }
}

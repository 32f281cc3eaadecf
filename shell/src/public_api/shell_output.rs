// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{fmt::{Debug, Formatter},
          io::{self, Write},
          sync::Arc};

use tokio::sync::mpsc;

use crate::{LineState, LogControlSignal, SafeLineState, SafeLogStats, SafeTransport,
            ShellColor, StdMutex, Transport, TransportWriter};

/// The one write path to the terminal. Every unit of output (a keystroke echo, a handler
/// print, a log line with its erase and redraw) takes the line state lock and then the
/// transport lock, in that order, for its whole duration.
#[derive(Clone)]
pub struct ShellOutput {
    pub safe_line_state: SafeLineState,
    pub safe_transport: SafeTransport,
}

impl Debug for ShellOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellOutput")
            .field("line_state", &"Arc<StdMutex<LineState>>")
            .field("transport", &"Arc<StdMutex<dyn Transport>>")
            .finish()
    }
}

impl ShellOutput {
    pub fn new(line_state: LineState, transport: impl Transport + 'static) -> Self {
        Self {
            safe_line_state: Arc::new(StdMutex::new(line_state)),
            safe_transport: Arc::new(StdMutex::new(transport)),
        }
    }

    /// Run `f` with both locks held. Whatever `f` writes is flushed to the transport
    /// before the locks are released.
    pub fn with_term<R>(
        &self,
        f: impl FnOnce(&mut LineState, &mut dyn Write) -> io::Result<R>,
    ) -> io::Result<R> {
        let line_state = &mut *self.safe_line_state.lock().unwrap();
        let transport = &mut *self.safe_transport.lock().unwrap();
        let mut writer = TransportWriter::new(transport);
        let result = f(line_state, &mut writer)?;
        writer.flush()?;
        Ok(result)
    }

    /// Print `text` in `color`, restoring the previous color afterwards.
    pub fn print(&self, color: ShellColor, text: &str) -> io::Result<()> {
        self.with_term(|line_state, term| line_state.print_colored(term, color, text))
    }

    /// Erase the prompt, print a log line (after a warning about `lost` lines), and
    /// redraw the prompt.
    pub fn print_log(&self, data: &[u8], lost: usize) -> io::Result<()> {
        self.with_term(|line_state, term| line_state.print_log(term, data, lost))
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum ControlFlowLimited<E> {
    ReturnError(E),
    Continue,
}

pub mod log_channel_support {
    use super::*;

    /// Receiver end of the log channel, the sender end is in [crate::SharedWriter]. The
    /// task ends when every sender is dropped, or when the transport fails.
    pub fn spawn_task_to_monitor_log_channel(
        mut log_channel_receiver: mpsc::Receiver<LogControlSignal>, /* This is moved. */
        output: ShellOutput,
        safe_log_stats: SafeLogStats,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    // Branch: Poll log channel for lines.
                    // This branch is cancel safe because recv is cancel safe.
                    maybe_log_control_signal = log_channel_receiver.recv() => {
                        // Channel is open.
                        if let Some(log_control_signal) = maybe_log_control_signal {
                            let control_flow = process_log_control_signal(
                                log_control_signal,
                                &output,
                                &safe_log_stats,
                            );
                            match control_flow {
                                ControlFlowLimited::ReturnError(error) => {
                                    tracing::warn!(?error, "log monitor stopped");
                                    // Initiate shutdown.
                                    break;
                                }
                                ControlFlowLimited::Continue => {
                                    // continue.
                                }
                            }
                        }
                        // Channel is closed.
                        else {
                            // Initiate shutdown.
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Returns only the following:
    /// - [ControlFlowLimited::Continue]
    /// - [ControlFlowLimited::ReturnError]
    pub fn process_log_control_signal(
        log_control_signal: LogControlSignal,
        output: &ShellOutput,
        safe_log_stats: &SafeLogStats,
    ) -> ControlFlowLimited<io::Error> {
        match log_control_signal {
            LogControlSignal::Line(buf) => {
                let lost = safe_log_stats.take_dropped();
                if let Err(error) = output.print_log(&buf, lost) {
                    return ControlFlowLimited::ReturnError(error);
                }
            }
            LogControlSignal::Flush => {}
        }
        ControlFlowLimited::Continue
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use r3bl_test_fixtures::StdoutMock;

    use super::{log_channel_support::*, *};
    use crate::{LogStats, LoopbackTransport, ShellFlags, SharedWriter, Size};

    fn output_with_mock() -> (ShellOutput, StdoutMock) {
        let stdout_mock = StdoutMock::default();
        let (transport, _feeder) = LoopbackTransport::new(stdout_mock.clone());
        let flags = ShellFlags {
            use_colors: false,
            ..Default::default()
        };
        let line_state = LineState::new("$ ".into(), 64, Size::default(), flags);
        (ShellOutput::new(line_state, transport), stdout_mock)
    }

    #[test]
    fn test_print_translates_newlines() {
        let (output, stdout_mock) = output_with_mock();
        output.print(ShellColor::NORMAL, "a\nb\n").unwrap();
        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "a\r\nb\r\n");
    }

    #[test]
    fn test_log_line_redraws_prompt_and_line() {
        let (output, stdout_mock) = output_with_mock();
        output
            .with_term(|line_state, term| {
                line_state.new_prompt(term)?;
                line_state.insert_str(term, "abc")?;
                Ok(())
            })
            .unwrap();

        let stats: SafeLogStats = Arc::new(LogStats::default());
        let flow =
            process_log_control_signal(LogControlSignal::Line(b"log\n".to_vec()), &output, &stats);
        assert!(matches!(flow, ControlFlowLimited::Continue));

        let screen = stdout_mock.get_copy_of_buffer_as_string_strip_ansi();
        // Stripping also drops the `\r`s.
        assert!(screen.ends_with("log\n$ abc"), "{screen:?}");
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_monitor_reports_lost_lines() {
        let (output, stdout_mock) = output_with_mock();
        let stats: SafeLogStats = Arc::new(LogStats::default());
        let (sender, receiver) = mpsc::channel(1);
        let mut writer = SharedWriter::new(sender, stats.clone());

        // The task is not running yet, so the second line doesn't fit.
        writeln!(writer, "first").unwrap();
        writeln!(writer, "second").unwrap();
        assert_eq!(stats.lost_total(), 1);

        let handle = spawn_task_to_monitor_log_channel(receiver, output, stats.clone());
        drop(writer);
        handle.await.unwrap();

        let screen = stdout_mock.get_copy_of_buffer_as_string_strip_ansi();
        assert_eq!(
            screen,
            "Lost logs: 1 - increase log queue size.\nfirst\n$ "
        );
        assert_eq!(stats.lost_total(), 1);
        assert_eq!(stats.take_dropped(), 0);
    }
}

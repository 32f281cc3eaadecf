// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{io, sync::Arc};

use miette::{IntoDiagnostic, WrapErr};
use strum_macros::Display;
use tokio::{sync::{broadcast, mpsc},
            task::JoinHandle};

use crate::{CommandTree, History, HistoryDirection, KeyAction, LineState, LogControlSignal,
            LogStats, RX_CHUNK_SIZE, ReceiveStateMachine, RxReady, SafeLogStats,
            SharedWriter, ShellConfig, ShellContext, ShellError, ShellFlags, ShellOutput,
            Transport, completion, execute, ok,
            shell_output::log_channel_support::spawn_task_to_monitor_log_channel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ShellState {
    Initialized,
    Active,
}

/// # Mental model and overview
///
/// The [Shell] owns everything the user interacts with: the [CommandTree], the
/// [History], the [ReceiveStateMachine] that turns bytes into keys, and a [ShellOutput]
/// which holds the line editor ([LineState]) and the [Transport].
///
/// 1. [Shell::new] spawns a task that receives log lines from the [SharedWriter] it
///    returns and prints them above the prompt.
/// 2. [Shell::start] enables the transport and prints the first prompt.
/// 3. [Shell::run] waits for [RxReady] notifications and calls [Shell::process], which
///    drains the transport and feeds every byte through the editor. Enter runs a
///    command, to completion, on the caller's task.
/// 4. [Shell::stop] disables the transport. The shell can be started again.
///
/// There is no hidden thread: if you don't want [Shell::run], call [Shell::process]
/// whenever the transport has data.
pub struct Shell {
    pub config: ShellConfig,
    pub tree: CommandTree,
    pub output: ShellOutput,
    pub history: History,
    pub receive: ReceiveStateMachine,
    pub safe_log_stats: SafeLogStats,
    pub state: ShellState,
    pub last_retval: i32,
    /// Reused for every history step.
    history_scratch: String,
    rx_ready: RxReady,
    shutdown_sender: broadcast::Sender<()>,
    log_monitor_handle: JoinHandle<()>,
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("history", &self.history)
            .field("last_retval", &self.last_retval)
            .finish_non_exhaustive()
    }
}

impl Drop for Shell {
    fn drop(&mut self) {
        if self.state == ShellState::Active {
            _ = self.output.safe_transport.lock().unwrap().disable();
        }
    }
}

impl Shell {
    /// Create a new instance with an associated [SharedWriter]. Must be called from
    /// inside a tokio runtime, since it spawns the task that prints log lines.
    ///
    /// # Errors
    ///
    /// If there is no tokio runtime.
    pub fn new(
        config: ShellConfig,
        tree: CommandTree,
        transport: impl Transport + 'static,
    ) -> miette::Result<(Self, SharedWriter)> {
        tokio::runtime::Handle::try_current()
            .into_diagnostic()
            .wrap_err("Shell::new must be called from inside a tokio runtime")?;

        // Line state.
        let flags = ShellFlags {
            echo: config.echo,
            insert_mode: false,
            use_colors: config.use_colors,
        };
        let line_state = LineState::new(
            config.prompt.clone(),
            config.cmd_buffer_capacity,
            config.terminal_size,
            flags,
        );
        let output = ShellOutput::new(line_state, transport);

        // Log channel.
        let (log_channel_sender, log_channel_receiver) =
            mpsc::channel::<LogControlSignal>(config.log_queue_capacity.max(1));
        let safe_log_stats: SafeLogStats = Arc::new(LogStats::default());

        // Start task to process log_channel_receiver.
        let log_monitor_handle = spawn_task_to_monitor_log_channel(
            log_channel_receiver,
            output.clone(),
            safe_log_stats.clone(),
        );

        let shared_writer = SharedWriter::new(log_channel_sender, safe_log_stats.clone());
        let (shutdown_sender, _) = broadcast::channel::<()>(1);

        let shell = Self {
            history: History::new(config.history_capacity),
            config,
            tree,
            output,
            receive: ReceiveStateMachine::default(),
            safe_log_stats,
            state: ShellState::Initialized,
            last_retval: 0,
            history_scratch: String::new(),
            rx_ready: RxReady::default(),
            shutdown_sender,
            log_monitor_handle,
        };

        Ok((shell, shared_writer))
    }

    /// Enable the transport and print the first prompt.
    ///
    /// # Errors
    ///
    /// If the shell is already active, or the transport fails.
    pub fn start(&mut self) -> Result<(), ShellError> {
        self.expect_state(ShellState::Initialized)?;
        self.output.safe_transport.lock().unwrap().enable()?;
        self.output.with_term(|line_state, term| {
            if line_state.flags.use_colors {
                line_state.colors.reset(term)?;
            }
            term.write_all(b"\r\n")?;
            line_state.new_prompt(term)
        })?;
        self.state = ShellState::Active;
        tracing::debug!(prompt = %self.config.prompt, "shell started");
        ok!()
    }

    /// # Errors
    ///
    /// If the shell isn't active, or the transport fails.
    pub fn stop(&mut self) -> Result<(), ShellError> {
        self.expect_state(ShellState::Active)?;
        self.output.safe_transport.lock().unwrap().disable()?;
        self.state = ShellState::Initialized;
        tracing::debug!("shell stopped");
        ok!()
    }

    fn expect_state(&self, expected: ShellState) -> Result<(), ShellError> {
        if self.state == expected {
            ok!()
        } else {
            Err(ShellError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    /// Change the prompt. It is redrawn right away if it is on screen.
    ///
    /// # Errors
    ///
    /// If the transport fails.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) -> Result<(), ShellError> {
        let prompt = prompt.into();
        self.config.prompt.clone_from(&prompt);
        let redraw = self.state == ShellState::Active;
        self.output.with_term(|line_state, term| {
            if redraw {
                line_state.erase(term)?;
            }
            line_state.set_prompt(prompt);
            if redraw {
                line_state.render_with_prompt(term)?;
            }
            ok!()
        })?;
        ok!()
    }

    /// Read everything the transport has and feed it to the line editor. Does nothing
    /// unless the shell is active.
    ///
    /// # Errors
    ///
    /// If the transport fails. [io::ErrorKind::UnexpectedEof] means the input is closed.
    pub fn process(&mut self) -> Result<(), ShellError> {
        if self.state != ShellState::Active {
            return ok!();
        }
        let mut chunk = [0_u8; RX_CHUNK_SIZE];
        loop {
            let count = self.output.safe_transport.lock().unwrap().read(&mut chunk)?;
            if count == 0 {
                return ok!();
            }
            for byte in &chunk[..count] {
                self.handle_byte(*byte)?;
            }
        }
    }

    fn handle_byte(&mut self, byte: u8) -> Result<(), ShellError> {
        let action = self.receive.next(byte, self.config.metakeys);
        match action {
            KeyAction::None => {}
            KeyAction::Submit => self.submit()?,
            KeyAction::Tab => self.tab()?,
            KeyAction::Up => self.history_step(HistoryDirection::Up)?,
            KeyAction::Down => self.history_step(HistoryDirection::Down)?,
            KeyAction::Cancel => {
                self.history.mode_exit();
                self.output
                    .with_term(|line_state, term| line_state.cancel(term))?;
            }
            _ => {
                if action.edits_text() {
                    self.history.mode_exit();
                }
                self.output
                    .with_term(|line_state, term| line_state.apply_key(term, action))?;
            }
        }
        ok!()
    }

    /// Enter: save the line in history and run it. The prompt is printed again once the
    /// handler returns.
    fn submit(&mut self) -> Result<(), ShellError> {
        self.history.mode_exit();
        let line = self.output.with_term(|line_state, term| {
            line_state.finish_line(term)?;
            Ok(line_state.buffer.as_str().to_owned())
        })?;
        let line = line.trim();

        self.history.put(line);

        if !line.is_empty() {
            let mut ctx = ShellContext {
                output: &self.output,
                tree: &self.tree,
                history: &self.history,
                config: &self.config,
                log_stats: &self.safe_log_stats,
                last_retval: self.last_retval,
                current: None,
            };
            self.last_retval = match execute(line, &self.tree, &mut ctx) {
                Ok(retval) => retval,
                Err(error) => error.retval(),
            };
        }

        self.output
            .with_term(|line_state, term| line_state.new_prompt(term))?;
        ok!()
    }

    /// Tab: complete the word under the cursor, or list what it could be. Ignored while
    /// echo is off.
    fn tab(&mut self) -> Result<(), ShellError> {
        self.history.mode_exit();
        let buffer = {
            let line_state = self.output.safe_line_state.lock().unwrap();
            if !line_state.flags.echo {
                return ok!();
            }
            line_state.buffer.clone()
        };
        let completion = completion::complete(&self.tree, &buffer, self.config.max_argc);
        self.output
            .with_term(|line_state, term| completion::apply(line_state, term, completion))?;
        ok!()
    }

    fn history_step(&mut self, direction: HistoryDirection) -> Result<(), ShellError> {
        let history = &mut self.history;
        let line = &mut self.history_scratch;
        self.output.with_term(|line_state, term| {
            line.clear();
            line.push_str(line_state.buffer.as_str());
            match history.get(direction, line) {
                Some(_) => line_state.replace_line(term, line),
                None => ok!(),
            }
        })?;
        ok!()
    }

    /// Process input until the transport reports end of input, or a shutdown signal is
    /// received (see [Shell::shutdown_sender]). The transport (or whatever feeds it)
    /// calls [RxReady::notify] when bytes arrive.
    ///
    /// # Errors
    ///
    /// If the transport fails.
    pub async fn run(&mut self) -> Result<(), ShellError> {
        let mut shutdown_receiver = self.shutdown_sender.subscribe();
        let rx_ready = self.rx_ready.clone();
        loop {
            // Bytes may have arrived before the first notification.
            match self.process() {
                Ok(()) => {}
                Err(ShellError::IO(error)) if error.kind() == io::ErrorKind::UnexpectedEof => {
                    tracing::debug!("input closed, shell loop ends");
                    return ok!();
                }
                Err(error) => return Err(error),
            }

            tokio::select! {
                // Branch: Wait for input.
                // This branch is cancel safe because notified is cancel safe.
                () = rx_ready.notified() => {}

                // Branch: Shutdown.
                // This branch is cancel safe because recv is cancel safe.
                _ = shutdown_receiver.recv() => {
                    tracing::debug!("shutdown signal received, shell loop ends");
                    return ok!();
                }
            }
        }
    }

    /// Give this to whatever fills the transport, so [Shell::run] wakes up.
    pub fn rx_ready(&self) -> RxReady { self.rx_ready.clone() }

    /// Send `()` on this to end [Shell::run].
    pub fn shutdown_sender(&self) -> broadcast::Sender<()> { self.shutdown_sender.clone() }

    /// Finished once every [SharedWriter] is dropped.
    pub fn log_monitor_is_finished(&self) -> bool { self.log_monitor_handle.is_finished() }
}

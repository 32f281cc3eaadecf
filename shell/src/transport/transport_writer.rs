// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::io::{self, Write};

/// Attempts in a row that may make no progress before a flush gives up.
pub const WRITE_RETRY_MAX: usize = 1_000;

/// The byte channel the shell runs over. Implementations only move bytes, everything that
/// is drawn on the terminal is rendered by the shell.
///
/// - `read` must not block. `Ok(0)` means nothing is available right now, an
///   [io::ErrorKind::UnexpectedEof] error means the peer is gone.
/// - `write` may accept fewer bytes than it was given (backpressure). The caller retries
///   with the rest.
pub trait Transport: Send {
    fn enable(&mut self) -> io::Result<()>;

    fn disable(&mut self) -> io::Result<()>;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
}

/// [Write] over a [Transport]. Crossterm commands and text are collected in a buffer, and
/// [Write::flush] pushes all of it to the transport, retrying partial writes.
pub struct TransportWriter<'a> {
    transport: &'a mut dyn Transport,
    buffer: Vec<u8>,
}

impl<'a> TransportWriter<'a> {
    pub fn new(transport: &'a mut dyn Transport) -> Self {
        Self {
            transport,
            buffer: Vec::new(),
        }
    }

    fn write_buffer(&mut self) -> io::Result<()> {
        let mut written = 0;
        let mut stalled = 0;
        while written < self.buffer.len() {
            match self.transport.write(&self.buffer[written..]) {
                Ok(0) => stalled += 1,
                Ok(count) => {
                    written += count;
                    stalled = 0;
                    continue;
                }
                Err(error)
                    if matches!(
                        error.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                    ) =>
                {
                    stalled += 1
                }
                Err(error) => return Err(error),
            }

            if stalled > WRITE_RETRY_MAX {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "transport stopped accepting bytes",
                ));
            }
            std::thread::yield_now();
        }
        Ok(())
    }
}

impl Write for TransportWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let result = self.write_buffer();
        self.buffer.clear();
        result
    }
}

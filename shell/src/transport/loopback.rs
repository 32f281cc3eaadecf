// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{collections::VecDeque,
          io::{self, Write},
          sync::Arc};

use crate::{StdMutex, Transport};

#[derive(Debug, Default)]
struct InputQueue {
    bytes: VecDeque<u8>,
    closed: bool,
}

/// The sending end of a [LoopbackTransport]'s input. Cloneable, any thread may push.
#[derive(Debug, Clone, Default)]
pub struct InputFeeder {
    queue: Arc<StdMutex<InputQueue>>,
}

impl InputFeeder {
    pub fn push(&self, bytes: &[u8]) { self.queue.lock().unwrap().bytes.extend(bytes); }

    /// No more input. Once the queued bytes are read, the transport reports
    /// [io::ErrorKind::UnexpectedEof].
    pub fn close(&self) { self.queue.lock().unwrap().closed = true; }

    pub fn is_closed(&self) -> bool { self.queue.lock().unwrap().closed }

    fn pop_into(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut queue = self.queue.lock().unwrap();
        if queue.bytes.is_empty() && queue.closed {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        let count = buf.len().min(queue.bytes.len());
        for (slot, byte) in buf.iter_mut().zip(queue.bytes.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }
}

/// A [Transport] whose input is a byte queue filled through an [InputFeeder], and whose
/// output is any [Write] sink (eg: `stdout`, or a `StdoutMock` in tests).
pub struct LoopbackTransport<W: Write + Send> {
    input: InputFeeder,
    output: W,
    pub enabled: bool,
}

impl<W: Write + Send> LoopbackTransport<W> {
    pub fn new(output: W) -> (Self, InputFeeder) {
        let input = InputFeeder::default();
        let it = Self {
            input: input.clone(),
            output,
            enabled: false,
        };
        (it, input)
    }
}

impl<W: Write + Send> Transport for LoopbackTransport<W> {
    fn enable(&mut self) -> io::Result<()> {
        self.enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> io::Result<()> {
        self.enabled = false;
        self.output.flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> { self.input.pop_into(buf) }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let count = self.output.write(buf)?;
        self.output.flush()?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_read_drains_in_chunks_then_eof() {
        let (mut transport, feeder) = LoopbackTransport::new(Vec::<u8>::new());
        feeder.push(b"abcde");

        let mut buf = [0_u8; 3];
        assert_eq!(transport.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"abc");
        assert_eq!(transport.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"de");
        assert_eq!(transport.read(&mut buf).unwrap(), 0);

        feeder.close();
        let error = transport.read(&mut buf).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_write_goes_to_output() {
        let (mut transport, _feeder) = LoopbackTransport::new(Vec::<u8>::new());
        transport.write(b"hi").unwrap();
        assert_eq!(transport.output, b"hi");
    }
}

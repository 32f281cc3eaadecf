// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{io, pin::Pin, sync::Arc};

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use tokio::{io::AsyncReadExt, sync::Notify};

use crate::{InputFeeder, RX_CHUNK_SIZE, Text};

pub type PinnedInputStream = Pin<Box<dyn Stream<Item = io::Result<Text>> + Send>>;

/// Wakes the dispatch loop when the transport has bytes to read. Cloneable, and safe to
/// call from any thread. A notification sent while the loop is busy is not lost, the next
/// wait returns immediately.
#[derive(Debug, Clone, Default)]
pub struct RxReady {
    notify: Arc<Notify>,
}

impl RxReady {
    pub fn notify(&self) { self.notify.notify_one(); }

    pub async fn notified(&self) { self.notify.notified().await; }
}

/// Move every chunk from `stream` into `feeder`, waking the dispatch loop after each one.
/// When the stream ends (or fails) the feeder is closed, which ends the loop.
pub async fn pump_input_stream(
    mut stream: PinnedInputStream,
    feeder: InputFeeder,
    rx_ready: RxReady,
) {
    while let Some(item) = stream.next().await {
        match item {
            Ok(bytes) => {
                feeder.push(&bytes);
                rx_ready.notify();
            }
            Err(error) => {
                tracing::warn!(?error, "input stream failed");
                break;
            }
        }
    }
    feeder.close();
    rx_ready.notify();
}

/// Raw bytes from `stdin`, in chunks of at most [RX_CHUNK_SIZE]. Put the terminal in raw
/// mode first, otherwise nothing arrives until Enter is pressed.
pub fn stdin_input_stream() -> PinnedInputStream {
    let it = try_stream! {
        let mut stdin = tokio::io::stdin();
        let mut buf = [0_u8; RX_CHUNK_SIZE];
        loop {
            let count = stdin.read(&mut buf).await?;
            if count == 0 {
                break;
            }
            yield buf[..count].to_vec();
        }
    };
    Box::pin(it)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{LoopbackTransport, Transport};

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_pump_feeds_and_closes() {
        let (mut transport, feeder) = LoopbackTransport::new(Vec::<u8>::new());
        let rx_ready = RxReady::default();
        let chunks: Vec<io::Result<Text>> = vec![Ok(b"ab".to_vec()), Ok(b"c".to_vec())];
        let stream: PinnedInputStream = Box::pin(futures_util::stream::iter(chunks));

        pump_input_stream(stream, feeder.clone(), rx_ready.clone()).await;

        // A permit was stored, so this returns right away.
        rx_ready.notified().await;
        assert!(feeder.is_closed());

        let mut buf = [0_u8; 8];
        assert_eq!(transport.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
        assert!(transport.read(&mut buf).is_err());
    }
}

//! Bidirectional byte relay between the client and the destination.
//!
//! Both directions are driven from one future without splitting the
//! streams, so a stalled writer on one side never blocks the other.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::{Instant, Sleep};

/// Bytes moved by a finished relay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Client to destination.
    pub inbound: u64,
    /// Destination to client.
    pub outbound: u64,
}

impl RelayStats {
    /// Total bytes in both directions.
    #[inline]
    pub fn total(&self) -> u64 {
        self.inbound + self.outbound
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Read,
    Write,
    Flush,
    Shutdown,
    Done,
}

/// Outcome of one step of a direction.
enum Step {
    /// A chunk reached the writer.
    Moved,
    /// Reader hit EOF and the writer was shut down.
    Finished,
}

/// One direction: read into the buffer, write it all out, flush, repeat.
struct Half {
    buf: Box<[u8]>,
    pos: usize,
    len: usize,
    stage: Stage,
    transferred: u64,
}

impl Half {
    fn new(buffer_size: usize) -> Self {
        Self {
            buf: vec![0u8; buffer_size].into_boxed_slice(),
            pos: 0,
            len: 0,
            stage: Stage::Read,
            transferred: 0,
        }
    }

    #[inline]
    fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    fn poll_step<R, W>(
        &mut self,
        cx: &mut Context<'_>,
        reader: &mut R,
        writer: &mut W,
    ) -> Poll<io::Result<Step>>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            match self.stage {
                Stage::Read => {
                    let mut rb = ReadBuf::new(&mut self.buf);
                    ready!(Pin::new(&mut *reader).poll_read(cx, &mut rb))?;
                    self.len = rb.filled().len();
                    self.pos = 0;
                    self.stage = if self.len == 0 {
                        Stage::Shutdown
                    } else {
                        Stage::Write
                    };
                }
                Stage::Write => {
                    let n = ready!(
                        Pin::new(&mut *writer).poll_write(cx, &self.buf[self.pos..self.len])
                    )?;
                    if n == 0 {
                        return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
                    }
                    self.pos += n;
                    if self.pos == self.len {
                        self.stage = Stage::Flush;
                    }
                }
                Stage::Flush => {
                    ready!(Pin::new(&mut *writer).poll_flush(cx))?;
                    self.stage = Stage::Read;
                    self.transferred += self.len as u64;
                    return Poll::Ready(Ok(Step::Moved));
                }
                Stage::Shutdown => {
                    // The peer may already be gone; EOF is what matters here.
                    let _ = ready!(Pin::new(&mut *writer).poll_shutdown(cx));
                    self.stage = Stage::Done;
                    return Poll::Ready(Ok(Step::Finished));
                }
                Stage::Done => return Poll::Ready(Ok(Step::Finished)),
            }
        }
    }
}

struct Relay<'a, A, B> {
    client: &'a mut A,
    remote: &'a mut B,
    upload: Half,
    download: Half,
    idle: Pin<Box<Sleep>>,
    idle_timeout: Duration,
}

impl<A, B> Relay<'_, A, B> {
    fn stats(&self) -> RelayStats {
        RelayStats {
            inbound: self.upload.transferred,
            outbound: self.download.transferred,
        }
    }
}

impl<A, B> Future for Relay<'_, A, B>
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    type Output = io::Result<RelayStats>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        loop {
            let mut progressed = false;
            let mut moved = false;

            if !this.upload.is_done()
                && let Poll::Ready(step) = this.upload.poll_step(cx, this.client, this.remote)
            {
                progressed = true;
                moved |= matches!(step?, Step::Moved);
            }
            if !this.download.is_done()
                && let Poll::Ready(step) = this.download.poll_step(cx, this.remote, this.client)
            {
                progressed = true;
                moved |= matches!(step?, Step::Moved);
            }

            if this.upload.is_done() && this.download.is_done() {
                return Poll::Ready(Ok(this.stats()));
            }
            if moved {
                let deadline = Instant::now() + this.idle_timeout;
                this.idle.as_mut().reset(deadline);
            }
            if !progressed {
                break;
            }
        }

        if this.idle.as_mut().poll(cx).is_ready() {
            return Poll::Ready(Ok(this.stats()));
        }
        Poll::Pending
    }
}

/// Relay bytes between `inbound` and `outbound` until both sides finish.
///
/// EOF on one side becomes a write shutdown on the other; the relay keeps
/// going until the opposite direction reaches EOF too. When neither
/// direction moved data for `idle_timeout` the relay ends without an error.
pub async fn relay_bidirectional<A, B>(
    mut inbound: A,
    mut outbound: B,
    idle_timeout: Duration,
    buffer_size: usize,
) -> io::Result<RelayStats>
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    Relay {
        client: &mut inbound,
        remote: &mut outbound,
        upload: Half::new(buffer_size),
        download: Half::new(buffer_size),
        idle: Box::pin(tokio::time::sleep(idle_timeout)),
        idle_timeout,
    }
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

    #[tokio::test]
    async fn relays_both_directions_and_counts_bytes() {
        let (client, proxy_side) = duplex(1024);
        let (upstream_side, destination) = duplex(1024);

        let relay = tokio::spawn(async move {
            relay_bidirectional(proxy_side, upstream_side, Duration::from_secs(5), 1024).await
        });

        let (mut client_r, mut client_w) = tokio::io::split(client);
        let (mut dest_r, mut dest_w) = tokio::io::split(destination);

        client_w.write_all(b"hello").await.unwrap();
        client_w.shutdown().await.unwrap();

        let mut got = Vec::new();
        dest_r.read_to_end(&mut got).await.unwrap();
        assert_eq!(got, b"hello");

        dest_w.write_all(b"world!").await.unwrap();
        dest_w.shutdown().await.unwrap();

        let mut got = Vec::new();
        client_r.read_to_end(&mut got).await.unwrap();
        assert_eq!(got, b"world!");

        let stats = relay.await.unwrap().unwrap();
        assert_eq!(stats, RelayStats { inbound: 5, outbound: 6 });
        assert_eq!(stats.total(), 11);
    }

    #[tokio::test]
    async fn small_buffer_moves_large_payload() {
        let (mut client, proxy_side) = duplex(64);
        let (upstream_side, mut destination) = duplex(64);
        let relay = tokio::spawn(relay_bidirectional(
            proxy_side,
            upstream_side,
            Duration::from_secs(5),
            16,
        ));

        let payload: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        let expected = payload.clone();
        let writer = tokio::spawn(async move {
            client.write_all(&payload).await.unwrap();
            client.shutdown().await.unwrap();
            client
        });

        let mut got = vec![0u8; expected.len()];
        destination.read_exact(&mut got).await.unwrap();
        assert_eq!(got, expected);

        drop(destination);
        drop(writer.await.unwrap());
        let stats = relay.await.unwrap().unwrap();
        assert_eq!(stats.inbound, 4096);
    }

    #[tokio::test]
    async fn idle_relay_ends_after_timeout() {
        let (_client, proxy_side) = duplex(1024);
        let (upstream_side, _destination) = duplex(1024);

        let start = Instant::now();
        let stats = relay_bidirectional(proxy_side, upstream_side, Duration::from_millis(50), 1024)
            .await
            .unwrap();

        assert_eq!(stats.total(), 0);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}

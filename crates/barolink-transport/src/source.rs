use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Result, TransportError};

/// A blocking, ordered byte channel whose content is not trusted.
///
/// Implementations either fill `buf` completely or fail. Partial results are
/// never returned to the caller.
pub trait ByteSource {
    /// Block until exactly `buf.len()` bytes have been delivered.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read_exact(buf)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read_exact(buf)
    }
}

/// Adapts any [`Read`] into a [`ByteSource`].
///
/// - `Interrupted` is retried.
/// - `TimedOut` is treated as "nothing yet" and retried, unless an idle
///   timeout is configured and has elapsed since the last delivered byte.
/// - A zero-length read is end-of-stream and fails with
///   [`TransportError::Closed`].
/// - Once a cancel flag attached with [`StreamSource::with_cancel`] is set,
///   the next call, or the next `Interrupted`/`TimedOut` read inside a
///   blocked call, fails with [`TransportError::Cancelled`].
pub struct StreamSource<R> {
    inner: R,
    idle_timeout: Option<Duration>,
    cancel: Option<Arc<AtomicBool>>,
    last_progress: Instant,
    bytes_read: u64,
}

impl<R: Read> StreamSource<R> {
    /// Wrap a reader with no idle limit.
    pub fn new(inner: R) -> Self {
        Self::with_idle_timeout(inner, None)
    }

    /// Wrap a reader and fail after `idle_timeout` without any delivered byte.
    pub fn with_idle_timeout(inner: R, idle_timeout: Option<Duration>) -> Self {
        Self {
            inner,
            idle_timeout,
            cancel: None,
            last_progress: Instant::now(),
            bytes_read: 0,
        }
    }

    /// Abandon blocked reads once `cancel` becomes true.
    ///
    /// The flag is polled on entry to every read and whenever the reader
    /// reports `TimedOut` or `Interrupted`. A silent link is only abandoned
    /// if the reader has a finite read timeout.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Total bytes delivered through this source.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Configured idle limit.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    /// Borrow the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the source and return the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteSource for StreamSource<R> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        let requested = buf.len();
        let mut filled = 0;

        while filled < requested {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(TransportError::Closed {
                        requested,
                        missing: requested - filled,
                    });
                }
                Ok(n) => {
                    filled += n;
                    self.bytes_read += n as u64;
                    self.last_progress = Instant::now();
                }
                Err(err)
                    if matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::TimedOut)
                        && self.is_cancelled() =>
                {
                    return Err(TransportError::Cancelled);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::TimedOut => {
                    if let Some(idle) = self.idle_timeout {
                        if self.last_progress.elapsed() >= idle {
                            return Err(TransportError::Idle { idle });
                        }
                    }
                    tracing::trace!(filled, requested, "read timed out, waiting for more bytes");
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        Ok(())
    }
}

impl<R> std::fmt::Debug for StreamSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSource")
            .field("idle_timeout", &self.idle_timeout)
            .field("cancellable", &self.cancel.is_some())
            .field("bytes_read", &self.bytes_read)
            .finish()
    }
}

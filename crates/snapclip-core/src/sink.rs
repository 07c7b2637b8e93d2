//! Write-once destination for captured pixel bytes.

use crate::error::SinkError;
use std::sync::{Arc, Mutex, MutexGuard};

/// Accumulates encoded image bytes from the capture backend until the
/// session finalizes them for clipboard delivery.
///
/// The handle is cheap to clone so the session can keep ownership while
/// the backend writes. `finish` succeeds exactly once; any write after
/// that, or a second finish, is an error.
#[derive(Debug, Clone, Default)]
pub struct ImageSink {
    inner: Arc<Mutex<SinkInner>>,
}

#[derive(Debug, Default)]
struct SinkInner {
    buf: Vec<u8>,
    finished: bool,
}

impl ImageSink {
    /// Creates a new, empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends encoded bytes to the sink.
    ///
    /// # Errors
    ///
    /// - `SinkError::Finished` if the sink has already been finalized
    pub fn write(&self, bytes: &[u8]) -> Result<(), SinkError> {
        let mut inner = self.lock();
        if inner.finished {
            return Err(SinkError::Finished);
        }
        inner.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Number of bytes accumulated so far.
    pub fn len(&self) -> usize {
        self.lock().buf.len()
    }

    /// Returns true while nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().buf.is_empty()
    }

    /// Closes the sink and takes its accumulated bytes.
    ///
    /// # Errors
    ///
    /// - `SinkError::Finished` if the sink was already finalized
    /// - `SinkError::Empty` if nothing was ever written
    pub fn finish(&self) -> Result<Vec<u8>, SinkError> {
        let mut inner = self.lock();
        if inner.finished {
            return Err(SinkError::Finished);
        }
        if inner.buf.is_empty() {
            return Err(SinkError::Empty);
        }
        inner.finished = true;
        Ok(std::mem::take(&mut inner.buf))
    }

    /// Locks the inner state, recovering from poisoning (a writer that
    /// panicked mid-append leaves the buffer usable).
    fn lock(&self) -> MutexGuard<'_, SinkInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

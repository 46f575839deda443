use std::ops::Deref;

use crate::backend::BackendConnection;

/// A backend connection that is closed exactly once, however the call ends.
///
/// `release` covers the normal path. `Drop` covers early returns, panics and
/// a caller dropping the call future while a request is in flight. A failed
/// close is logged and never replaces the call's own result.
pub struct ScopedConnection {
    inner: Box<dyn BackendConnection>,
    released: bool,
}

impl ScopedConnection {
    pub fn new(inner: Box<dyn BackendConnection>) -> Self {
        Self {
            inner,
            released: false,
        }
    }

    pub fn release(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Err(e) = self.inner.close() {
            tracing::warn!(error = %e, "Failed to close backend connection");
        }
    }
}

impl Deref for ScopedConnection {
    type Target = dyn BackendConnection;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        self.close();
    }
}

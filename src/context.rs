//! Start-method policy for pool worker threads.
//!
//! How workers are started never changes what they compute, only the
//! mechanics of bringing them up. Callers can pin a method explicitly;
//! otherwise the runner asks for the preferred method and falls back silently
//! to the platform default when the preferred one is not offered on the host.

use std::thread::{Builder, Scope, ScopedJoinHandle};

/// Stack reservation for workers started with [`StartMethod::Fresh`].
const FRESH_STACK_BYTES: usize = 2 * 1024 * 1024;

/// Policy for how pool worker threads are started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMethod {
    /// Workers inherit the parent process's stack configuration
    /// (`RUST_MIN_STACK` or the platform's spawn default). Preferred, offered
    /// on Unix targets.
    Inherit,
    /// Workers get an explicit fresh stack reservation, independent of the
    /// parent's configuration. Always available; the platform default.
    Fresh,
}

impl StartMethod {
    /// The preferred start method, or `None` when the host does not offer it.
    #[must_use]
    pub fn preferred() -> Option<StartMethod> {
        cfg!(unix).then_some(StartMethod::Inherit)
    }

    /// The start method that is always available on the host platform.
    #[must_use]
    pub fn platform_default() -> StartMethod {
        StartMethod::Fresh
    }

    /// Resolve the method to use for a pool.
    ///
    /// An explicit method is honored verbatim. Otherwise the preferred method
    /// is attempted and, when unavailable, the platform default is used. The
    /// fallback never fails and has no effect beyond thread-start mechanics.
    #[must_use]
    pub fn resolve(explicit: Option<StartMethod>) -> StartMethod {
        explicit.unwrap_or_else(|| Self::preferred().unwrap_or_else(Self::platform_default))
    }

    /// Spawn a named worker thread inside `scope` under this policy.
    pub(crate) fn spawn_scoped<'scope, 'env, F, T>(
        self,
        scope: &'scope Scope<'scope, 'env>,
        worker_id: usize,
        f: F,
    ) -> std::io::Result<ScopedJoinHandle<'scope, T>>
    where
        F: FnOnce() -> T + Send + 'scope,
        T: Send + 'scope,
    {
        let mut builder = Builder::new().name(format!("fanout-worker-{worker_id}"));
        if self == StartMethod::Fresh {
            builder = builder.stack_size(FRESH_STACK_BYTES);
        }
        builder.spawn_scoped(scope, f)
    }
}

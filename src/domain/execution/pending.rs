//! Values that are either available now or settle later

use std::future::{Future, IntoFuture};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::runtime::Handle;

use crate::domain::ChainError;

/// A value that is either ready or still pending
///
/// Contexts carried by control requests, handler results and the outcome of
/// `Chain::invoke` all use this type. A pending value is what makes the
/// executor split the current stack frame into an independent continuation.
pub enum MaybeAsync<T> {
    Ready(T),
    Pending(PendingValue<T>),
}

/// The future behind a pending value
pub struct PendingValue<T> {
    inner: Deferred<T>,
}

enum Deferred<T> {
    /// Settles directly to the final outcome
    Settled(BoxFuture<'static, Result<T, ChainError>>),
    /// One executor step; may hand back the next pending step instead of a value
    Step(BoxFuture<'static, Result<MaybeAsync<T>, ChainError>>),
}

impl<T> MaybeAsync<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The value if it is already available
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending(_) => None,
        }
    }
}

impl<T: Send + 'static> MaybeAsync<T> {
    /// Wrap a future as a pending value
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, ChainError>> + Send + 'static,
    {
        Self::Pending(PendingValue {
            inner: Deferred::Settled(future.boxed()),
        })
    }

    /// Executor continuation; settling loops over steps instead of nesting them
    ///
    /// Inside a tokio runtime the continuation is spawned right away and runs
    /// to completion whether or not the returned value is ever awaited.
    /// Without a runtime it stays lazy and makes progress only while settled.
    pub(crate) fn continuation<F>(future: F) -> Self
    where
        F: Future<Output = Result<MaybeAsync<T>, ChainError>> + Send + 'static,
    {
        let steps = Self::Pending(PendingValue {
            inner: Deferred::Step(future.boxed()),
        });

        match Handle::try_current() {
            Ok(runtime) => {
                let task = runtime.spawn(steps.settle());
                Self::pending(async move {
                    task.await.map_err(|error| {
                        ChainError::internal(format!("Continuation task failed: {}", error))
                    })?
                })
            }
            Err(_) => steps,
        }
    }

    /// Pending value that settles successfully on first poll
    pub fn resolved(value: T) -> Self {
        Self::pending(async move { Ok(value) })
    }

    /// Pending value that settles with an error on first poll
    pub fn rejected(error: ChainError) -> Self {
        Self::pending(async move { Err(error) })
    }

    /// Wait for the value to settle
    pub async fn settle(self) -> Result<T, ChainError> {
        let mut current = self;
        loop {
            match current {
                Self::Ready(value) => return Ok(value),
                Self::Pending(PendingValue {
                    inner: Deferred::Settled(future),
                }) => return future.await,
                Self::Pending(PendingValue {
                    inner: Deferred::Step(future),
                }) => current = future.await?,
            }
        }
    }

    pub fn map<U, F>(self, f: F) -> MaybeAsync<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        match self {
            Self::Ready(value) => MaybeAsync::Ready(f(value)),
            pending => MaybeAsync::pending(async move { pending.settle().await.map(f) }),
        }
    }
}

impl<T> From<T> for MaybeAsync<T> {
    fn from(value: T) -> Self {
        Self::Ready(value)
    }
}

impl<T: Send + 'static> IntoFuture for MaybeAsync<T> {
    type Output = Result<T, ChainError>;
    type IntoFuture = BoxFuture<'static, Result<T, ChainError>>;

    fn into_future(self) -> Self::IntoFuture {
        self.settle().boxed()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for MaybeAsync<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

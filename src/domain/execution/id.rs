//! Execution identity shared by every invocation spawned from one top-level invoke

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_EXECUTION_ID: AtomicU64 = AtomicU64::new(0);

/// Opaque correlation token minted once per `Chain::invoke`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutionId(u64);

impl ExecutionId {
    /// Mint the next process-unique id
    pub fn next() -> Self {
        Self(NEXT_EXECUTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "exec-{}", self.0)
    }
}

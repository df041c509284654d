/// Registry of in-flight external calls so a newer query can abort older ones.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct Inner {
    next_id: AtomicU64,
    tokens: Mutex<HashMap<u64, CancellationToken>>,
}

/// Shared set of cancellation tokens. Cloning shares the same registry.
#[derive(Debug, Clone, Default)]
pub struct CancellationRegistry {
    inner: Arc<Inner>,
}

/// Token for one external call; deregisters itself when dropped.
#[derive(Debug)]
pub struct CallGuard {
    id: u64,
    token: CancellationToken,
    registry: CancellationRegistry,
}

impl CallGuard {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh token for a new call.
    pub fn issue(&self) -> CallGuard {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        if let Ok(mut tokens) = self.inner.tokens.lock() {
            tokens.insert(id, token.clone());
        }
        CallGuard {
            id,
            token,
            registry: self.clone(),
        }
    }

    /// Cancel and forget every registered call. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<CancellationToken> = match self.inner.tokens.lock() {
            Ok(mut tokens) => tokens.drain().map(|(_, t)| t).collect(),
            Err(_) => Vec::new(),
        };
        for token in &drained {
            token.cancel();
        }
        drained.len()
    }

    pub fn in_flight(&self) -> usize {
        self.inner.tokens.lock().map(|t| t.len()).unwrap_or(0)
    }

    fn remove(&self, id: u64) {
        if let Ok(mut tokens) = self.inner.tokens.lock() {
            tokens.remove(&id);
        }
    }
}

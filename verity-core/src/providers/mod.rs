//! Evidence providers and concurrent fan-out.
//!
//! Providers are external collaborators (encyclopedic reference, news search,
//! fact-check registry) behind one async contract. `ProviderSet` invokes all
//! of them concurrently with a per-provider timeout and waits for every call to
//! settle; a failed, timed-out or panicking provider contributes an empty list
//! and never aborts the group.

pub mod file;

pub use file::{EvidenceRecord, FileEvidenceProvider};

use crate::engine::panic_message;
use crate::error::ProviderError;
use crate::types::Evidence;
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Uniform contract for anything that can supply evidence for a claim.
#[async_trait]
pub trait EvidenceProvider: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &str;

    /// Return candidate evidence for the claim; empty when nothing was found.
    async fn provide(&self, claim: &str) -> Result<Vec<Evidence>, ProviderError>;
}

/// A group of providers invoked together for every claim.
pub struct ProviderSet {
    providers: Vec<Arc<dyn EvidenceProvider>>,
    timeout: Duration,
}

impl ProviderSet {
    pub fn new(timeout: Duration) -> Self {
        Self {
            providers: Vec::new(),
            timeout,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn EvidenceProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn push(&mut self, provider: Arc<dyn EvidenceProvider>) {
        self.providers.push(provider);
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Query every provider concurrently and collect whatever each one returned.
    ///
    /// The outer vector has one entry per provider, in registration order.
    pub async fn gather(&self, claim: &str) -> Vec<Vec<Evidence>> {
        let calls: Vec<_> = self
            .providers
            .iter()
            .map(|provider| {
                let provider = Arc::clone(provider);
                let timeout = self.timeout;
                async move {
                    let start = Instant::now();
                    let call = AssertUnwindSafe(provider.provide(claim)).catch_unwind();
                    let outcome = tokio::time::timeout(timeout, call).await;
                    let latency_ms = start.elapsed().as_millis() as u64;
                    let result = match outcome {
                        Ok(Ok(result)) => result,
                        Ok(Err(panic)) => Err(ProviderError::Unavailable {
                            provider: provider.name().to_string(),
                            message: format!("panic: {}", panic_message(&*panic)),
                        }),
                        Err(_) => Err(ProviderError::Timeout {
                            provider: provider.name().to_string(),
                            timeout_ms: timeout.as_millis() as u64,
                        }),
                    };
                    match result {
                        Ok(evidence) => {
                            debug!(
                                provider = provider.name(),
                                items = evidence.len(),
                                latency_ms,
                                "Provider responded"
                            );
                            evidence
                        }
                        Err(e) => {
                            warn!(
                                provider = provider.name(),
                                error = %e,
                                latency_ms,
                                "Provider failed; continuing without its evidence"
                            );
                            Vec::new()
                        }
                    }
                }
            })
            .collect();

        futures::future::join_all(calls).await
    }
}

/// Provider returning a fixed evidence list, optionally after a delay.
pub struct StaticProvider {
    name: String,
    evidence: Vec<Evidence>,
    delay: Option<Duration>,
}

impl StaticProvider {
    pub fn new(name: impl Into<String>, evidence: Vec<Evidence>) -> Self {
        Self {
            name: name.into(),
            evidence,
            delay: None,
        }
    }

    /// Respond only after sleeping for `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl EvidenceProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn provide(&self, _claim: &str) -> Result<Vec<Evidence>, ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.evidence.clone())
    }
}

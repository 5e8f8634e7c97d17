//! Identity resolution for bare order references
//!
//! An operator-typed reference may be a uuid, a zero-padded number or a plain
//! integer. [`ResolutionPolicy`] holds the ordered list of reference
//! transforms; each produced candidate is one round-trip to the source API
//! and the first non-empty result wins.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{IngestError, IngestResult};
use crate::upstream::UpstreamError;

/// Exact single-order lookup against a source API: match or empty
#[async_trait]
pub trait OrderLookup: Send + Sync {
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Value>, UpstreamError>;
}

/// Named reference rewrite; `None` means "not applicable"
#[derive(Clone, Copy)]
pub struct RefTransform {
    pub name: &'static str,
    pub apply: fn(&str) -> Option<String>,
}

impl std::fmt::Debug for RefTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

impl RefTransform {
    pub const IDENTITY: RefTransform = RefTransform {
        name: "identity",
        apply: identity,
    };
    pub const STRIP_LEADING_ZEROS: RefTransform = RefTransform {
        name: "strip_leading_zeros",
        apply: strip_leading_zeros,
    };
    pub const TO_PLAIN_INTEGER: RefTransform = RefTransform {
        name: "to_plain_integer",
        apply: to_plain_integer,
    };
}

fn identity(reference: &str) -> Option<String> {
    Some(reference.to_string())
}

fn strip_leading_zeros(reference: &str) -> Option<String> {
    if !reference.starts_with('0') {
        return None;
    }
    let stripped = reference.trim_start_matches('0');
    (!stripped.is_empty()).then(|| stripped.to_string())
}

fn to_plain_integer(reference: &str) -> Option<String> {
    if reference.is_empty() || !reference.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    reference.parse::<u64>().ok().map(|n| n.to_string())
}

/// Successful resolution
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Raw order document returned by the source
    pub record: Value,
    /// Candidate that matched
    pub matched: String,
    /// Transform that produced the matching candidate
    pub transform: &'static str,
    /// Round-trips made, the successful one included
    pub attempts: usize,
}

#[derive(Debug, Clone)]
pub struct ResolutionPolicy {
    transforms: Vec<RefTransform>,
    call_timeout: Option<Duration>,
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self::new(vec![
            RefTransform::IDENTITY,
            RefTransform::STRIP_LEADING_ZEROS,
            RefTransform::TO_PLAIN_INTEGER,
        ])
    }
}

impl ResolutionPolicy {
    pub fn new(transforms: Vec<RefTransform>) -> Self {
        Self {
            transforms,
            call_timeout: None,
        }
    }

    /// Bound every source round-trip
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn transforms(&self) -> &[RefTransform] {
        &self.transforms
    }

    /// Distinct candidates in attempt order, with the producing transform
    pub fn candidates(&self, reference: &str) -> Vec<(&'static str, String)> {
        let mut out: Vec<(&'static str, String)> = Vec::new();
        for t in &self.transforms {
            if let Some(candidate) = (t.apply)(reference)
                && !candidate.is_empty()
                && !out.iter().any(|(_, c)| *c == candidate)
            {
                out.push((t.name, candidate));
            }
        }
        out
    }

    /// Try each candidate through `fetch`, stopping at the first hit
    ///
    /// Upstream failures are logged and the next candidate is tried. When
    /// nothing matched and at least one attempt failed upstream, the last
    /// upstream error is returned instead of `ResolutionNotFound`.
    pub async fn resolve<F, Fut>(&self, reference: &str, mut fetch: F) -> IngestResult<Resolution>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<Option<Value>, UpstreamError>>,
    {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(IngestError::adapter("reference", "reference is empty"));
        }

        let mut attempts = 0;
        let mut last_upstream: Option<UpstreamError> = None;

        for (transform, candidate) in self.candidates(reference) {
            attempts += 1;
            let result = match self.call_timeout {
                Some(limit) => tokio::time::timeout(limit, fetch(candidate.clone()))
                    .await
                    .unwrap_or_else(|_| {
                        Err(UpstreamError::Timeout(
                            u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                        ))
                    }),
                None => fetch(candidate.clone()).await,
            };

            match result {
                Ok(Some(record)) => {
                    tracing::info!(
                        reference,
                        candidate = %candidate,
                        transform,
                        attempt = attempts,
                        "Order reference resolved"
                    );
                    return Ok(Resolution {
                        record,
                        matched: candidate,
                        transform,
                        attempts,
                    });
                }
                Ok(None) => {
                    tracing::debug!(
                        reference,
                        candidate = %candidate,
                        transform,
                        attempt = attempts,
                        "Lookup miss"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        reference,
                        candidate = %candidate,
                        transform,
                        attempt = attempts,
                        error = %e,
                        "Lookup failed"
                    );
                    last_upstream = Some(e);
                }
            }
        }

        match last_upstream {
            Some(e) => Err(IngestError::Upstream(e)),
            None => Err(IngestError::ResolutionNotFound {
                reference: reference.to_string(),
                attempts,
            }),
        }
    }

    /// [`resolve`](Self::resolve) against an [`OrderLookup`]
    pub async fn resolve_with(
        &self,
        reference: &str,
        lookup: &dyn OrderLookup,
    ) -> IngestResult<Resolution> {
        self.resolve(reference, move |id| async move { lookup.fetch_by_id(&id).await })
            .await
    }
}

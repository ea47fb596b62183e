// Batched fetcher.
//
// Splits a key list into contiguous chunks of `batch_size`. Lookups inside a chunk run
// concurrently; chunk N+1 is not issued until every lookup of chunk N has completed, so
// at most `batch_size` lookups are ever in flight.
//
// A failed lookup never aborts the batch: it is logged and reported for its key.
// `Unavailable` from a chunk in which some other lookup succeeded is a single refused
// request, not an outage, and is reported as `Transient`. Only a chunk with no successes
// and at least one `Unavailable` counts as an outage: the remaining chunks are not
// issued and their keys are reported `Unavailable` as well.

use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use tracing::{debug, warn};

use refnet_core::LookupError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchedFetcher {
    batch_size: NonZeroUsize,
}

impl BatchedFetcher {
    /// A `batch_size` of zero is treated as one.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: NonZeroUsize::new(batch_size).unwrap_or(NonZeroUsize::MIN),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    /// Runs `lookup` for every distinct key and returns one result per key.
    pub async fn fetch_all<K, V, F, Fut>(
        &self,
        keys: impl IntoIterator<Item = K>,
        lookup: F,
    ) -> HashMap<K, Result<V, LookupError>>
    where
        K: Eq + Hash + Clone + Display,
        F: Fn(K) -> Fut,
        Fut: Future<Output = Result<V, LookupError>>,
    {
        let mut seen = HashSet::new();
        let keys: Vec<K> = keys.into_iter().filter(|k| seen.insert(k.clone())).collect();

        let mut results = HashMap::with_capacity(keys.len());
        let mut outage: Option<LookupError> = None;

        for (index, chunk) in keys.chunks(self.batch_size.get()).enumerate() {
            if let Some(err) = &outage {
                for key in chunk {
                    results.insert(key.clone(), Err(err.clone()));
                }
                continue;
            }

            debug!("Issuing batch {} with {} lookups", index, chunk.len());
            let lookup = &lookup;
            let settled = join_all(chunk.iter().cloned().map(|key| async move {
                let outcome = lookup(key.clone()).await;
                (key, outcome)
            }))
            .await;

            let reachable = settled.iter().any(|(_, outcome)| outcome.is_ok());
            for (key, outcome) in settled {
                let outcome = match outcome {
                    Err(LookupError::Unavailable(reason)) if reachable => {
                        Err(LookupError::Transient(reason))
                    }
                    other => other,
                };
                if let Err(err) = &outcome {
                    warn!("Lookup for {} failed: {}", key, err);
                    if err.is_unavailable() && outage.is_none() {
                        outage = Some(err.clone());
                    }
                }
                results.insert(key, outcome);
            }
        }

        results
    }
}

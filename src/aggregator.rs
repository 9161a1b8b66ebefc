use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::{Config, Registry, SourceConfig};
use crate::fetcher::FeedSource;
use crate::normalize::{NewsItem, Normalizer};

/// Output caps applied during aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub per_source: usize,
    pub max_items: usize,
    pub max_concurrent_fetches: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            per_source: 3,
            max_items: 15,
            max_concurrent_fetches: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    /// `entries` were parsed, `kept` of them survived the per-source cap
    Fetched { entries: usize, kept: usize },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub source: String,
    pub status: SourceStatus,
}

/// Result of one aggregation pass. Always succeeds, possibly empty.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub items: Vec<NewsItem>,
    pub outcomes: Vec<SourceOutcome>,
}

impl Aggregation {
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, SourceStatus::Skipped { .. }))
            .count()
    }
}

pub struct Aggregator {
    registry: Registry,
    fetcher: Arc<dyn FeedSource>,
    normalizer: Normalizer,
    limits: Limits,
}

impl Aggregator {
    pub fn new(
        registry: Registry,
        fetcher: Arc<dyn FeedSource>,
        normalizer: Normalizer,
        limits: Limits,
    ) -> Self {
        Self {
            registry,
            fetcher,
            normalizer,
            limits,
        }
    }

    pub fn from_config(config: &Config, fetcher: Arc<dyn FeedSource>) -> Self {
        let normalizer = Normalizer::new(
            config.locale,
            config.utc_offset_minutes,
            config.description_length,
        );
        let limits = Limits {
            per_source: config.per_source_limit,
            max_items: config.max_items,
            max_concurrent_fetches: config.max_concurrent_fetches,
        };

        Self::new(config.registry(), fetcher, normalizer, limits)
    }

    pub fn sources(&self) -> &[SourceConfig] {
        &self.registry
    }

    /// Fetch every source and merge the results in registry order.
    ///
    /// Fetches run concurrently but are yielded in the order they were
    /// started, so completion order never affects the output.
    pub async fn aggregate(&self) -> Aggregation {
        let fetched: Vec<_> = stream::iter(self.registry.iter().cloned())
            .map(|source| {
                let fetcher = Arc::clone(&self.fetcher);
                async move {
                    let result = fetcher.fetch(&source.url).await;
                    (source, result)
                }
            })
            .buffered(self.limits.max_concurrent_fetches.max(1))
            .collect()
            .await;

        let mut aggregation = Aggregation::default();

        for (source, result) in fetched {
            let status = match result {
                Ok(entries) => {
                    let total = entries.len();
                    let before = aggregation.items.len();
                    aggregation.items.extend(
                        entries
                            .iter()
                            .take(self.limits.per_source)
                            .map(|entry| self.normalizer.normalize(entry, &source)),
                    );
                    let kept = aggregation.items.len() - before;
                    debug!("Source '{}': kept {} of {} entries", source.name, kept, total);
                    SourceStatus::Fetched {
                        entries: total,
                        kept,
                    }
                }
                Err(e) => {
                    warn!("Skipping source '{}': {}", source.name, e);
                    SourceStatus::Skipped {
                        reason: e.to_string(),
                    }
                }
            };

            aggregation.outcomes.push(SourceOutcome {
                source: source.name.clone(),
                status,
            });
        }

        aggregation.items.truncate(self.limits.max_items);

        info!(
            "Aggregated {} items from {} sources ({} skipped)",
            aggregation.items.len(),
            self.registry.len(),
            aggregation.skipped()
        );

        aggregation
    }
}

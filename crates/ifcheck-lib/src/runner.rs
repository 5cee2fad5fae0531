//! Check runner
//!
//! Evaluates many items of one poll concurrently. Each item works on its own
//! value store, taken out of the registry for the duration of the
//! evaluation, so items never contend for a lock.

use crate::check::{CheckParams, InterfaceCheck};
use crate::config::EngineConfig;
use crate::error::CheckError;
use crate::interface::Interface;
use crate::models::{Finding, State};
use crate::observability::{EngineMetrics, StructuredLogger};
use crate::store::InMemoryValueStore;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Value stores of all items, keyed by item
#[derive(Debug, Default)]
pub struct StoreRegistry {
    stores: DashMap<String, InMemoryValueStore>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a persisted snapshot
    pub fn from_snapshot(snapshot: BTreeMap<String, InMemoryValueStore>) -> Self {
        Self {
            stores: snapshot.into_iter().collect(),
        }
    }

    /// Take an item's store out of the registry; a new item starts empty
    pub fn take(&self, item: &str) -> InMemoryValueStore {
        self.stores
            .remove(item)
            .map(|(_, store)| store)
            .unwrap_or_default()
    }

    pub fn put(&self, item: impl Into<String>, store: InMemoryValueStore) {
        self.stores.insert(item.into(), store);
    }

    pub fn get(&self, item: &str) -> Option<InMemoryValueStore> {
        self.stores.get(item).map(|r| r.clone())
    }

    /// Drop stores of items that are no longer checked
    pub fn retain_items<'a>(&self, items: impl IntoIterator<Item = &'a str>) {
        let keep: std::collections::HashSet<&str> = items.into_iter().collect();
        self.stores.retain(|item, _| keep.contains(item.as_str()));
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Ordered copy suitable for persisting
    pub fn snapshot(&self) -> BTreeMap<String, InMemoryValueStore> {
        self.stores
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }
}

/// One item to evaluate
#[derive(Debug, Clone)]
pub struct CheckTask {
    pub item: String,
    pub params: CheckParams,
}

impl CheckTask {
    pub fn new(item: impl Into<String>, params: CheckParams) -> Self {
        Self {
            item: item.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "lowercase")]
pub enum ItemOutcome {
    Finding(Finding),
    /// Counters were initialized; no finding this cycle
    Pending(String),
    /// The item could not be evaluated
    Failed(String),
}

impl ItemOutcome {
    /// Monitoring state; pending items report none, failed ones UNKNOWN
    pub fn state(&self) -> Option<State> {
        match self {
            ItemOutcome::Finding(finding) => Some(finding.state()),
            ItemOutcome::Pending(_) => None,
            ItemOutcome::Failed(_) => Some(State::Unknown),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemReport {
    pub item: String,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

/// Runs check tasks on tokio, bounded by a semaphore
pub struct CheckRunner {
    check: Arc<InterfaceCheck>,
    stores: Arc<StoreRegistry>,
    limit: Arc<Semaphore>,
    metrics: EngineMetrics,
    logger: StructuredLogger,
}

impl CheckRunner {
    pub fn new(config: &EngineConfig, stores: Arc<StoreRegistry>) -> Self {
        Self {
            check: Arc::new(InterfaceCheck::new().with_fallback_speed(config.fallback_speed)),
            stores,
            limit: Arc::new(Semaphore::new(config.max_concurrent_checks.max(1))),
            metrics: EngineMetrics::new(),
            logger: StructuredLogger::new(config.host_name.clone()),
        }
    }

    /// Evaluate every task against the same poll. Reports come back in task
    /// order; a failing item never affects the others.
    pub async fn run_cycle(
        &self,
        tasks: Vec<CheckTask>,
        interfaces: Arc<Vec<Interface>>,
        timestamp: f64,
    ) -> Vec<ItemReport> {
        let items: Vec<String> = tasks.iter().map(|t| t.item.clone()).collect();
        let mut join_set = JoinSet::new();

        for (position, task) in tasks.into_iter().enumerate() {
            let check = Arc::clone(&self.check);
            let stores = Arc::clone(&self.stores);
            let limit = Arc::clone(&self.limit);
            let interfaces = Arc::clone(&interfaces);
            let metrics = self.metrics.clone();

            join_set.spawn(async move {
                let _permit = limit.acquire_owned().await;
                let start = Instant::now();

                let mut store = stores.take(&task.item);
                let result = catch_unwind(AssertUnwindSafe(|| {
                    check.check_multiple_interfaces(
                        &task.item,
                        &task.params,
                        &interfaces,
                        timestamp,
                        &mut store,
                    )
                }));
                stores.put(task.item.clone(), store);
                metrics.observe_evaluation_latency(start.elapsed().as_secs_f64());

                let outcome = match result {
                    Ok(Ok(finding)) => ItemOutcome::Finding(finding),
                    Ok(Err(CheckError::NoBaselineYet(key))) => ItemOutcome::Pending(key),
                    Ok(Err(err)) => ItemOutcome::Failed(err.to_string()),
                    Err(_) => ItemOutcome::Failed("evaluation panicked".to_string()),
                };
                (position, outcome)
            });
        }

        let mut outcomes: Vec<Option<ItemOutcome>> = vec![None; items.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((position, outcome)) => outcomes[position] = Some(outcome),
                Err(e) => warn!(error = %e, "Check task did not complete"),
            }
        }

        let reports: Vec<ItemReport> = items
            .into_iter()
            .zip(outcomes)
            .map(|(item, outcome)| {
                let outcome =
                    outcome.unwrap_or_else(|| ItemOutcome::Failed("task aborted".to_string()));
                self.record(&item, &outcome);
                ItemReport { item, outcome }
            })
            .collect();

        debug!(items = reports.len(), "Check cycle complete");
        reports
    }

    fn record(&self, item: &str, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Finding(finding) => {
                self.metrics.record_finding(finding.state());
                self.logger
                    .log_finding(item, finding.state(), &finding.summary());
            }
            ItemOutcome::Pending(reason) => {
                self.metrics.inc_items_pending();
                self.logger.log_pending(item, reason);
            }
            ItemOutcome::Failed(error) => {
                self.metrics.inc_items_failed();
                self.logger.log_failure(item, error);
            }
        }
    }
}

//! Per-company model registry
//!
//! Each company owns a slot behind its own mutex. The map itself is only
//! touched to look up or create a slot, so work on unrelated companies
//! never contends, while ingestion and prediction for one company are
//! serialized.

use crate::dataset::HistoricalDataset;
use crate::error::Result;
use crate::models::{CompanyAnalysis, CompanySummary};
use crate::predictor::TrainedModel;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Everything known about one company, replaced as a unit on re-ingestion
#[derive(Debug, Clone)]
pub struct CompanyState {
    pub dataset: Arc<HistoricalDataset>,
    pub analysis: CompanyAnalysis,
    pub model: Arc<TrainedModel>,
}

#[derive(Debug, Default)]
struct CompanySlot {
    state: Option<CompanyState>,
    /// Set when a failed first ingestion drops the slot from the map
    retired: bool,
}

type SharedSlot = Arc<Mutex<CompanySlot>>;

/// Registry of company datasets, analyses and trained models
#[derive(Debug, Default)]
pub struct ModelRegistry {
    companies: DashMap<String, SharedSlot>,
    committed: AtomicUsize,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, company: &str) -> SharedSlot {
        self.companies
            .entry(company.to_string())
            .or_default()
            .value()
            .clone()
    }

    fn existing_slot(&self, company: &str) -> Option<SharedSlot> {
        self.companies.get(company).map(|r| r.value().clone())
    }

    // Slots are only ever replaced whole, so a poisoned lock still guards
    // a consistent state.
    fn lock(slot: &SharedSlot) -> MutexGuard<'_, CompanySlot> {
        slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Build a new state for `company` while holding its lock and commit it
    /// only if `build` succeeds
    ///
    /// On failure the previous state, if any, is left untouched. A company
    /// whose first ingestion fails is dropped from the map again.
    pub fn replace_with<F>(&self, company: &str, build: F) -> Result<CompanyState>
    where
        F: FnOnce() -> Result<CompanyState>,
    {
        loop {
            let slot = self.slot(company);
            let mut guard = Self::lock(&slot);
            // Lost a race with a failed first ingestion; take the fresh slot
            if guard.retired {
                continue;
            }

            let state = match build() {
                Ok(state) => state,
                Err(e) => {
                    if guard.state.is_none() {
                        guard.retired = true;
                        self.companies
                            .remove_if(company, |_, current| Arc::ptr_eq(current, &slot));
                        debug!(company = %company, "Dropped company after failed first ingestion");
                    }
                    return Err(e);
                }
            };

            let replaced = guard.state.replace(state.clone()).is_some();
            if !replaced {
                self.committed.fetch_add(1, Ordering::SeqCst);
            }
            debug!(company = %company, replaced = replaced, "Company state committed");
            return Ok(state);
        }
    }

    /// Run `f` against the company's state while holding its lock
    ///
    /// `f` receives `None` for unknown companies and for companies whose
    /// ingestion never succeeded.
    pub fn with_company<T>(&self, company: &str, f: impl FnOnce(Option<&CompanyState>) -> T) -> T {
        match self.existing_slot(company) {
            Some(slot) => {
                let guard = Self::lock(&slot);
                f(guard.state.as_ref())
            }
            None => f(None),
        }
    }

    pub fn get(&self, company: &str) -> Option<CompanyState> {
        self.with_company(company, |state| state.cloned())
    }

    pub fn contains(&self, company: &str) -> bool {
        self.with_company(company, |state| state.is_some())
    }

    /// Companies with a committed state, sorted by name
    pub fn companies(&self) -> Vec<String> {
        self.summaries().into_keys().collect()
    }

    pub fn summaries(&self) -> BTreeMap<String, CompanySummary> {
        let slots: Vec<(String, SharedSlot)> = self
            .companies
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();

        slots
            .into_iter()
            .filter_map(|(name, slot)| {
                let summary = Self::lock(&slot).state.as_ref()?.analysis.summary();
                Some((name, summary))
            })
            .collect()
    }

    /// Number of companies with a committed state; takes no company lock
    pub fn len(&self) -> usize {
        self.committed.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

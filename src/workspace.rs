//! One account's datasets, kept in step with the store.
//!
//! Every mutation is computed off to the side, persisted, and only then
//! swapped into memory. A failed store call therefore leaves the workspace
//! exactly as it was.

use std::{borrow::Cow, collections::HashSet, fmt, str::FromStr, sync::Arc};

use log::{debug, info, warn};

use crate::{
    adapters::{AdapterRegistry, SourceAdapter, fingerprint},
    consolidate::consolidate,
    data::RawRecord,
    dataset::{AccountDatasets, AccountId, Dataset, DeleteCriteria},
    error::WorkspaceError,
    ingest::normalize_batch,
    mapping::ColumnMapping,
    store::DatasetStore,
};

/// Which dataset a dashboard reads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewSelection {
    #[default]
    AllDomains,
    Domain(String),
}

impl FromStr for ViewSelection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("View name cannot be empty".to_string());
        }
        if trimmed.eq_ignore_ascii_case("all") || trimmed.eq_ignore_ascii_case("all domains") {
            Ok(ViewSelection::AllDomains)
        } else {
            Ok(ViewSelection::Domain(trimmed.to_string()))
        }
    }
}

impl fmt::Display for ViewSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewSelection::AllDomains => f.write_str("All Domains"),
            ViewSelection::Domain(domain) => f.write_str(domain),
        }
    }
}

/// What an upload did to its domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub domain: String,
    pub received: usize,
    pub added: usize,
    pub duplicates: usize,
    pub total: usize,
}

pub struct AccountWorkspace<'s> {
    store: &'s dyn DatasetStore,
    account: AccountId,
    adapters: AdapterRegistry,
    datasets: AccountDatasets,
}

impl<'s> AccountWorkspace<'s> {
    pub fn open(store: &'s dyn DatasetStore, account: AccountId) -> Result<Self, WorkspaceError> {
        let datasets = store.load_all(&account)?;
        debug!(
            "Opened workspace for '{account}' with {} domain(s)",
            datasets.len()
        );
        Ok(Self {
            store,
            account,
            adapters: AdapterRegistry::default(),
            datasets,
        })
    }

    pub fn with_adapters(mut self, adapters: AdapterRegistry) -> Self {
        self.adapters = adapters;
        self
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    pub fn datasets(&self) -> &AccountDatasets {
        &self.datasets
    }

    pub fn adapter_for(&self, domain: &str) -> Arc<dyn SourceAdapter> {
        self.adapters.adapter_for(domain)
    }

    /// Domains that currently hold rows, sorted by name.
    pub fn domains(&self) -> Vec<&str> {
        self.datasets
            .iter()
            .filter(|(_, dataset)| !dataset.is_empty())
            .map(|(domain, _)| domain.as_str())
            .collect()
    }

    /// Stored key for `domain`: an existing entry matched case-insensitively,
    /// else the adapter's own spelling.
    fn resolve_domain(&self, domain: &str) -> String {
        let domain = domain.trim();
        self.datasets
            .keys()
            .find(|existing| existing.eq_ignore_ascii_case(domain))
            .cloned()
            .unwrap_or_else(|| self.adapters.adapter_for(domain).domain().to_string())
    }

    /// Sanitizes `rows`, merges them into `domain` skipping natural-key
    /// duplicates and persists the result under the new `mapping`.
    pub fn ingest(
        &mut self,
        domain: &str,
        rows: Vec<RawRecord>,
        mapping: ColumnMapping,
    ) -> Result<IngestOutcome, WorkspaceError> {
        let received = rows.len();
        let rows = normalize_batch(rows, &mapping)?;
        let domain = self.resolve_domain(domain);
        let adapter = self.adapters.adapter_for(&domain);

        let (mut merged, mut seen) = match self.datasets.get(&domain) {
            Some(existing) => {
                let seen = existing
                    .rows
                    .iter()
                    .filter_map(|row| adapter.natural_key(row, &existing.mapping))
                    .map(|key| fingerprint(&key))
                    .collect::<HashSet<_>>();
                (existing.rows.clone(), seen)
            }
            None => (Vec::new(), HashSet::new()),
        };

        let (mut duplicates, mut unkeyed) = (0usize, 0usize);
        for row in rows {
            match adapter.natural_key(&row, &mapping) {
                Some(key) if !seen.insert(fingerprint(&key)) => {
                    debug!("Skipping duplicate order line {key}");
                    duplicates += 1;
                }
                Some(_) => merged.push(row),
                None => {
                    unkeyed += 1;
                    merged.push(row);
                }
            }
        }
        if unkeyed > 0 {
            warn!("{unkeyed} row(s) for '{domain}' carry no order id and were kept without dedupe");
        }

        let dataset = Dataset::new(merged, mapping);
        self.store.save(&self.account, &domain, &dataset)?;
        let outcome = IngestOutcome {
            domain: domain.clone(),
            received,
            added: received - duplicates,
            duplicates,
            total: dataset.len(),
        };
        self.datasets.insert(domain, dataset);
        info!(
            "Ingested {} new row(s) into '{}' ({} duplicate(s) skipped, {} total)",
            outcome.added, outcome.domain, outcome.duplicates, outcome.total
        );
        Ok(outcome)
    }

    /// Deletes rows matching `criteria` from one domain, or from every domain
    /// when `domain` is `None`. Returns how many rows were removed.
    ///
    /// Domains are persisted one at a time; on failure the domains already
    /// written stay applied and the failing one is untouched.
    pub fn delete(
        &mut self,
        domain: Option<&str>,
        criteria: DeleteCriteria,
    ) -> Result<usize, WorkspaceError> {
        let targets = match domain {
            Some(domain) => {
                let resolved = self.resolve_domain(domain);
                if !self.datasets.contains_key(&resolved) {
                    return Err(WorkspaceError::UnknownDomain(domain.trim().to_string()));
                }
                vec![resolved]
            }
            None => self.datasets.keys().cloned().collect(),
        };

        let mut removed = 0usize;
        for target in targets {
            let before = self.datasets.get(&target).map_or(0, Dataset::len);
            let remaining = self.store.delete(&self.account, &target, criteria)?;
            let after = remaining.as_ref().map_or(0, Dataset::len);
            match remaining {
                Some(dataset) => {
                    self.datasets.insert(target.clone(), dataset);
                }
                None => {
                    self.datasets.remove(&target);
                }
            }
            removed += before.saturating_sub(after);
            debug!("Removed {} row(s) from '{target}'", before.saturating_sub(after));
        }
        info!("Deleted {removed} row(s) for account '{}'", self.account);
        Ok(removed)
    }

    /// Dataset behind `selection`. The all-domains view is consolidated on
    /// the fly and is empty, with the identity mapping, when nothing is stored.
    pub fn view(&self, selection: &ViewSelection) -> Result<Cow<'_, Dataset>, WorkspaceError> {
        match selection {
            ViewSelection::Domain(domain) => {
                let resolved = self.resolve_domain(domain);
                self.datasets
                    .get(&resolved)
                    .map(Cow::Borrowed)
                    .ok_or_else(|| WorkspaceError::UnknownDomain(domain.clone()))
            }
            ViewSelection::AllDomains => Ok(Cow::Owned(consolidate(&self.datasets).unwrap_or_else(
                || Dataset::new(Vec::new(), ColumnMapping::identity()),
            ))),
        }
    }
}

//! Debounced remote search.
//!
//! Keystrokes go in through [`SearchBox::input`]; only the query that is left
//! once typing pauses for the configured delay reaches the lesson service.

use std::time::Duration;

use tokio::sync::mpsc;

use storefront_catalog::CatalogItem;

use crate::config::ClientConfig;
use crate::debounce::Debouncer;
use crate::error::StoreError;
use crate::reconciler::Reconciler;
use crate::service::LessonService;

/// Lessons found for a settled query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    pub query: String,
    pub items: Vec<CatalogItem>,
}

pub struct SearchBox<'a, S> {
    reconciler: &'a Reconciler<S>,
    debouncer: Debouncer<String>,
    settled: mpsc::UnboundedReceiver<String>,
}

impl<'a, S: LessonService> SearchBox<'a, S> {
    pub fn new(reconciler: &'a Reconciler<S>, delay: Duration) -> Self {
        let (debouncer, settled) = Debouncer::new(delay);
        Self {
            reconciler,
            debouncer,
            settled,
        }
    }

    /// Search box using `STOREFRONT_SEARCH_DEBOUNCE_MS`.
    pub fn from_config(reconciler: &'a Reconciler<S>, config: &ClientConfig) -> Self {
        Self::new(reconciler, config.search_debounce)
    }

    pub fn delay(&self) -> Duration {
        self.debouncer.delay()
    }

    /// Replace the pending query.
    pub fn input(&mut self, query: impl Into<String>) {
        self.debouncer.schedule(query.into());
    }

    /// Drop the pending query. Returns `true` if one was still waiting.
    pub fn cancel(&mut self) -> bool {
        self.debouncer.cancel()
    }

    /// Wait for the input to settle, then search for the latest query.
    ///
    /// Returns `None` when no query is pending or waiting to be searched.
    pub async fn results(&mut self) -> Option<Result<SearchResults, StoreError>> {
        // Checked before draining: a trigger that fires in between has already
        // queued its value.
        let pending = self.debouncer.is_pending();
        let mut query = match self.settled.try_recv() {
            Ok(query) => query,
            Err(_) if pending => self.settled.recv().await?,
            Err(_) => return None,
        };
        while let Ok(newer) = self.settled.try_recv() {
            query = newer;
        }

        tracing::debug!(query, "search input settled");
        let result = self.reconciler.search(&query).await;
        Some(result.map(|items| SearchResults { query, items }))
    }
}

use std::sync::Arc;

use crate::{
    orchestrator::MetadataOrchestrator,
    traits::{HistoryStore, MetadataFetcher, Notifier, TracingNotifier},
};

/// Assembles a [`MetadataOrchestrator`] from its collaborators. The notifier
/// defaults to [`TracingNotifier`].
pub struct OrchestratorBuilder {
    fetcher: Option<Arc<dyn MetadataFetcher>>,
    history: Option<Arc<dyn HistoryStore>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            fetcher: None,
            history: None,
            notifier: None,
        }
    }

    pub fn fetcher(mut self, fetcher: impl MetadataFetcher + 'static) -> Self {
        tracing::debug!("Using metadata fetcher {} ({})", fetcher.name(), fetcher.id());
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    pub fn history(mut self, history: impl HistoryStore + 'static) -> Self {
        self.history = Some(Arc::new(history));
        self
    }

    /// Shares a history store that the caller keeps using, e.g. for listing.
    pub fn shared_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    pub fn build(self) -> Result<MetadataOrchestrator, &'static str> {
        let fetcher = self.fetcher.ok_or("a metadata fetcher is required")?;
        let history = self.history.ok_or("a history store is required")?;
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotifier));

        Ok(MetadataOrchestrator::new(fetcher, history, notifier))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

use async_trait::async_trait;
use shared::{history::HistoryEntry, metadata::MetadataResult};
use std::time::Duration;

use crate::error::{HistoryError, ServiceError};

/// Per-request knobs passed to a [`MetadataFetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    pub high_fidelity: bool,
    pub quality_factor: f32,
    /// `None` leaves the timeout to the fetcher's own default.
    pub timeout: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            high_fidelity: true,
            quality_factor: 1.0,
            timeout: None,
        }
    }
}

#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;

    async fn fetch_metadata(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<MetadataResult, ServiceError>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warning,
    Error,
    Success,
}

/// User-facing notification sink. Fire and forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NotifyLevel, message: &str);
}

/// Notifier that only forwards to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NotifyLevel, message: &str) {
        match level {
            NotifyLevel::Info | NotifyLevel::Success => tracing::info!("{}", message),
            NotifyLevel::Warning => tracing::warn!("{}", message),
            NotifyLevel::Error => tracing::error!("{}", message),
        }
    }
}

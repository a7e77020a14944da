pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod services;
pub mod traits;
pub mod urls;

pub use api::{SpotFetchClient, SpotFetchClientBuilder};
pub use config::AppConfig;
pub use error::{FetchError, HistoryError, ServiceError};
pub use history::SqliteHistoryStore;
pub use orchestrator::{FetchState, MetadataOrchestrator};
pub use services::OrchestratorBuilder;
pub use traits::{
    FetchOptions, HistoryStore, MetadataFetcher, Notifier, NotifyLevel, TracingNotifier,
};

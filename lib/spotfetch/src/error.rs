use shared::metadata::{EntityType, PayloadError};
use thiserror::Error;

/// Failures reported by a metadata fetch service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Failed to decode metadata response: {0}")]
    Decoding(String),
    #[error("Metadata API error: HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Invalid Spotify URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid metadata API base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("Metadata API base URL not configured")]
    NotConfigured,
}

/// Failures of the fetch history store. Never surfaced by the orchestrator.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("History migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Errors returned by the orchestrator operations. Each of these is also
/// reported to the notifier before it is returned.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Please enter a Spotify URL")]
    InvalidInput,
    #[error("{} not found or may be private", entity_label(.0))]
    NotFoundOrPrivate(EntityType),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("Failed to load from cache: {0}")]
    Parse(#[from] PayloadError),
}

fn entity_label(kind: &EntityType) -> &'static str {
    match kind {
        EntityType::Track => "Track",
        EntityType::Album => "Album",
        EntityType::Playlist => "Playlist",
        EntityType::Artist => "Artist",
        EntityType::Unknown => "Item",
    }
}

pub type Result<T, E = FetchError> = std::result::Result<T, E>;

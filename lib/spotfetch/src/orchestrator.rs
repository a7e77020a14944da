use shared::metadata::{AlbumRef, ArtistRef, EntityType, MetadataResult};
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, time::Instant};
use tracing::{debug, error, info, warn};

use crate::{
    error::{FetchError, Result},
    history,
    traits::{FetchOptions, HistoryStore, MetadataFetcher, Notifier, NotifyLevel},
    urls::{classify_url, discography_url, normalize_url},
};

/// Timeout for artist discography listings (seconds)
const ARTIST_TIMEOUT_SECS: u64 = 60;

/// Timeout for every other direct fetch (seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Snapshot of the orchestrator. Every transition replaces the whole record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchState {
    pub loading: bool,
    pub current: Option<MetadataResult>,
    pub pending_album_selection: Option<AlbumRef>,
    pub album_dialog_visible: bool,
    pub pending_artist_name: Option<String>,
}

/// Owns the fetch, cache-load and history lifecycle of a single "current"
/// metadata result.
///
/// Calls are not serialized: a second fetch started while one is in flight
/// proceeds, and whichever completes last sets `current`.
pub struct MetadataOrchestrator {
    fetcher: Arc<dyn MetadataFetcher>,
    history: Arc<dyn HistoryStore>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<FetchState>,
}

/// Resets `loading` (and optionally the pending album selection) when the
/// fetch that created it returns, whichever path it returns through.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<FetchState>,
    clear_album_selection: bool,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let clear_album_selection = self.clear_album_selection;
        self.state.send_modify(|state| {
            *state = FetchState {
                loading: false,
                pending_album_selection: if clear_album_selection {
                    None
                } else {
                    state.pending_album_selection.clone()
                },
                ..state.clone()
            }
        });
    }
}

/// Timeout used for a direct fetch of the given kind.
pub fn timeout_for(kind: EntityType) -> Duration {
    match kind {
        EntityType::Artist => Duration::from_secs(ARTIST_TIMEOUT_SECS),
        EntityType::Track | EntityType::Album | EntityType::Playlist | EntityType::Unknown => {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        }
    }
}

/// True for album and playlist payloads that carry nothing at all, which is
/// how the service answers for missing or private entities.
pub fn is_empty_payload(data: &MetadataResult) -> bool {
    match data {
        MetadataResult::Playlist {
            playlist_info,
            track_list,
        } => {
            playlist_info.owner.name.is_empty()
                && playlist_info.tracks.total == 0
                && track_list.is_empty()
        }
        MetadataResult::Album {
            album_info,
            track_list,
        } => album_info.name.is_empty() && album_info.total_tracks == 0 && track_list.is_empty(),
        MetadataResult::Track { .. } | MetadataResult::Artist { .. } => false,
    }
}

fn log_fetched(data: &MetadataResult) {
    match data {
        MetadataResult::Track { track } => {
            info!("fetched track: {} - {}", track.name, track.artists);
            debug!("isrc: {}, duration: {}ms", track.isrc, track.duration_ms);
        }
        MetadataResult::Album {
            album_info,
            track_list,
        } => {
            info!("fetched album: {}", album_info.name);
            debug!(
                "{} tracks, released: {}",
                track_list.len(),
                album_info.release_date
            );
        }
        MetadataResult::Playlist {
            playlist_info,
            track_list,
        } => {
            info!("fetched playlist: {} tracks", track_list.len());
            let owner = &playlist_info.owner;
            debug!("by {}", owner.display_name.as_deref().unwrap_or(&owner.name));
        }
        MetadataResult::Artist {
            artist_info,
            album_list,
            track_list,
        } => {
            info!("fetched artist: {}", artist_info.name);
            debug!("{} albums, {} tracks", album_list.len(), track_list.len());
        }
    }
}

impl MetadataOrchestrator {
    pub fn new(
        fetcher: Arc<dyn MetadataFetcher>,
        history: Arc<dyn HistoryStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (state, _) = watch::channel(FetchState::default());
        Self {
            fetcher,
            history,
            notifier,
            state,
        }
    }

    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state transition.
    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn current(&self) -> Option<MetadataResult> {
        self.state.borrow().current.clone()
    }

    fn transition(&self, f: impl FnOnce(&FetchState) -> FetchState) {
        self.state.send_modify(|state| *state = f(state));
    }

    fn begin_loading(&self, from_album_dialog: bool) -> LoadingGuard<'_> {
        self.transition(|s| FetchState {
            loading: true,
            current: None,
            album_dialog_visible: if from_album_dialog {
                false
            } else {
                s.album_dialog_visible
            },
            ..s.clone()
        });
        LoadingGuard {
            state: &self.state,
            clear_album_selection: from_album_dialog,
        }
    }

    /// Logs and notifies an error, then hands it back for returning.
    fn report(&self, err: FetchError) -> FetchError {
        match &err {
            FetchError::InvalidInput => {
                warn!("empty url provided");
                self.notifier.notify(NotifyLevel::Error, &err.to_string());
            }
            FetchError::NotFoundOrPrivate(kind) => {
                warn!("{} appears to be empty or private", kind);
                self.notifier.notify(NotifyLevel::Warning, &err.to_string());
            }
            FetchError::Service(e) => {
                error!("fetch failed: {}", e);
                self.notifier.notify(NotifyLevel::Error, &e.to_string());
            }
            FetchError::Parse(e) => {
                error!("Failed to load from cache: {}", e);
                self.notifier
                    .notify(NotifyLevel::Error, "Failed to load from cache");
            }
        }
        err
    }

    /// Fetches a URL entered by the user. Artist root URLs are redirected to
    /// their discography listing first.
    pub async fn fetch_direct(&self, url: &str) -> Result<MetadataResult> {
        let url = url.trim();
        if url.is_empty() {
            return Err(self.report(FetchError::InvalidInput));
        }

        let target = normalize_url(url);
        if target != url {
            debug!("converted to discography url");
        }
        if classify_url(&target) == EntityType::Artist {
            info!("artist url detected");
        }

        self.transition(|s| FetchState {
            pending_artist_name: None,
            ..s.clone()
        });
        self.fetch_and_apply(&target).await
    }

    /// Fetches the discography of an artist picked from a listing.
    pub async fn expand_artist(&self, artist: &ArtistRef) -> Result<MetadataResult> {
        debug!("artist clicked: {}", artist.name);
        let url = discography_url(artist.external_urls.trim());
        self.transition(|s| FetchState {
            pending_artist_name: Some(artist.name.clone()),
            ..s.clone()
        });
        self.fetch_and_apply(&url).await
    }

    async fn fetch_and_apply(&self, url: &str) -> Result<MetadataResult> {
        let kind = classify_url(url);
        info!("fetching {} metadata...", kind);
        debug!("url: {}", url);

        let _loading = self.begin_loading(false);
        let options = FetchOptions {
            timeout: Some(timeout_for(kind)),
            ..FetchOptions::default()
        };
        let started = Instant::now();

        let data = match self.fetcher.fetch_metadata(url, &options).await {
            Ok(data) => data,
            Err(e) => return Err(self.report(e.into())),
        };

        if is_empty_payload(&data) {
            return Err(self.report(FetchError::NotFoundOrPrivate(data.entity_type())));
        }

        self.accept(url, data, started, "Metadata fetched successfully")
            .await
    }

    /// Replaces the current result with a payload from fetch history. Nothing
    /// is written back to history.
    pub fn load_from_cache(&self, serialized_payload: &str) -> Result<()> {
        let data = MetadataResult::from_json(serialized_payload)
            .map_err(|e| self.report(e.into()))?;
        self.transition(|s| FetchState {
            current: Some(data),
            ..s.clone()
        });
        self.notifier.notify(NotifyLevel::Success, "Loaded from cache");
        Ok(())
    }

    /// Records an album pick and shows the confirmation dialog.
    pub fn select_album(&self, album: AlbumRef) {
        debug!("album clicked: {}", album.name);
        self.transition(|s| FetchState {
            pending_album_selection: Some(album),
            album_dialog_visible: true,
            ..s.clone()
        });
    }

    /// Closes the confirmation dialog without fetching.
    pub fn dismiss_album_dialog(&self) {
        self.transition(|s| FetchState {
            pending_album_selection: None,
            album_dialog_visible: false,
            ..s.clone()
        });
    }

    /// Fetches the album recorded by [`select_album`](Self::select_album).
    /// Returns `Ok(None)` without doing anything when no album is pending.
    pub async fn confirm_album_fetch(&self) -> Result<Option<MetadataResult>> {
        let pending = self.state.borrow().pending_album_selection.clone();
        let Some(album) = pending else {
            return Ok(None);
        };

        let url = album.external_urls;
        info!("fetching album: {}...", album.name);
        debug!("url: {}", url);

        let _loading = self.begin_loading(true);
        let started = Instant::now();

        let data = match self
            .fetcher
            .fetch_metadata(&url, &FetchOptions::default())
            .await
        {
            Ok(data) => data,
            Err(e) => return Err(self.report(e.into())),
        };

        if matches!(data, MetadataResult::Album { .. }) && is_empty_payload(&data) {
            return Err(self.report(FetchError::NotFoundOrPrivate(EntityType::Album)));
        }

        self.accept(&url, data, started, "Album metadata fetched successfully")
            .await
            .map(Some)
    }

    /// Clears the current result.
    pub fn reset(&self) {
        self.transition(|s| FetchState {
            current: None,
            ..s.clone()
        });
    }

    async fn accept(
        &self,
        url: &str,
        data: MetadataResult,
        started: Instant,
        message: &str,
    ) -> Result<MetadataResult> {
        self.transition(|s| FetchState {
            current: Some(data.clone()),
            ..s.clone()
        });
        self.record_history(url, &data).await;

        log_fetched(&data);
        info!(
            "fetch completed in {:.2}s",
            started.elapsed().as_secs_f64()
        );
        self.notifier.notify(NotifyLevel::Success, message);
        Ok(data)
    }

    /// Appends to history. Failures are logged and never reach the caller.
    async fn record_history(&self, url: &str, data: &MetadataResult) {
        let entry = match history::project(url, data) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to serialize fetch history payload: {}", e);
                return;
            }
        };
        if let Err(e) = self.history.append(entry).await {
            warn!("Failed to save fetch history: {}", e);
        }
    }
}

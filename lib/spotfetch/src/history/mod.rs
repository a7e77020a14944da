mod sqlite;

pub use sqlite::{SqliteHistoryStore, DEFAULT_MAX_ENTRIES};

use shared::{history::HistoryEntry, metadata::MetadataResult};

/// Builds the history entry recorded after a successful fetch of `url`.
pub fn project(url: &str, data: &MetadataResult) -> Result<HistoryEntry, serde_json::Error> {
    let (display_name, summary_info, thumbnail_url) = match data {
        MetadataResult::Track { track } => (
            track.name.clone(),
            track.artists.clone(),
            track
                .images
                .clone()
                .filter(|image| !image.is_empty())
                .unwrap_or_default(),
        ),
        MetadataResult::Album {
            album_info,
            track_list,
        } => (
            album_info.name.clone(),
            format!("{} tracks", track_list.len()),
            album_info.images.clone(),
        ),
        MetadataResult::Playlist { playlist_info, .. } => (
            playlist_info
                .name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| playlist_info.owner.name.clone()),
            format!("{} tracks", playlist_info.tracks.total),
            playlist_info.cover.clone().unwrap_or_default(),
        ),
        MetadataResult::Artist {
            artist_info,
            album_list,
            ..
        } => {
            // zero counts as unknown and falls back to the listing length
            let albums = artist_info
                .total_albums
                .filter(|total| *total > 0)
                .map_or(album_list.len(), |total| total as usize);
            (
                artist_info.name.clone(),
                format!("{albums} albums"),
                artist_info.images.clone(),
            )
        }
    };

    Ok(HistoryEntry::new(
        url,
        data.entity_type(),
        display_name,
        summary_info,
        thumbnail_url,
        data.to_json()?,
    ))
}

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Top-level keys that identify a payload variant. Exactly one must be present.
const VARIANT_KEYS: [&str; 4] = ["track", "album_info", "playlist_info", "artist_info"];

/// Logical kind of entity a URL or payload refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Track,
    Album,
    Playlist,
    Artist,
    Unknown,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Track => "track",
            EntityType::Album => "album",
            EntityType::Playlist => "playlist",
            EntityType::Artist => "artist",
            EntityType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "track" => EntityType::Track,
            "album" => EntityType::Album,
            "playlist" => EntityType::Playlist,
            "artist" => EntityType::Artist,
            _ => EntityType::Unknown,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Comma separated artist names, as delivered by the service.
    #[serde(default)]
    pub artists: String,
    /// Cover image URL. The service sends an empty string when there is none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<String>,
    #[serde(default)]
    pub is_explicit: bool,
    #[serde(default)]
    pub isrc: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub album_name: String,
    #[serde(default)]
    pub external_urls: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlbumInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub total_tracks: u32,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub images: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistOwner {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistTracks {
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub owner: PlaylistOwner,
    #[serde(default)]
    pub tracks: PlaylistTracks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtistInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_albums: Option<u32>,
    #[serde(default)]
    pub images: String,
}

/// An album as listed in an artist's discography.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlbumSummary {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub total_tracks: u32,
    #[serde(default)]
    pub images: String,
    #[serde(default)]
    pub album_type: String,
    #[serde(default)]
    pub external_urls: String,
}

/// Reference to an album the user picked from a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRef {
    pub id: String,
    pub name: String,
    pub external_urls: String,
}

impl From<&AlbumSummary> for AlbumRef {
    fn from(album: &AlbumSummary) -> Self {
        Self {
            id: album.id.clone(),
            name: album.name.clone(),
            external_urls: album.external_urls.clone(),
        }
    }
}

/// Reference to an artist the user picked from a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
    pub external_urls: String,
}

/// A fetched metadata payload. The variant is determined by which of
/// `track`, `album_info`, `playlist_info` or `artist_info` is present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataResult {
    Track {
        track: Track,
    },
    Album {
        album_info: AlbumInfo,
        track_list: Vec<Track>,
    },
    Playlist {
        playlist_info: PlaylistInfo,
        track_list: Vec<Track>,
    },
    Artist {
        artist_info: ArtistInfo,
        album_list: Vec<AlbumSummary>,
        track_list: Vec<Track>,
    },
}

/// Error raised when a payload does not decode into a [`MetadataResult`].
#[derive(Debug)]
pub enum PayloadError {
    /// Text was not valid JSON, or a field had the wrong type.
    Invalid(serde_json::Error),
    /// Top-level value was not a JSON object.
    NotAnObject,
    /// None, or more than one, of the variant keys was present.
    UnrecognizedShape(Vec<&'static str>),
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::Invalid(e) => write!(f, "invalid metadata payload: {}", e),
            PayloadError::NotAnObject => write!(f, "metadata payload is not an object"),
            PayloadError::UnrecognizedShape(keys) if keys.is_empty() => {
                write!(f, "unrecognized metadata shape: no variant key present")
            }
            PayloadError::UnrecognizedShape(keys) => write!(
                f,
                "unrecognized metadata shape: conflicting keys {}",
                keys.join(", ")
            ),
        }
    }
}

impl std::error::Error for PayloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PayloadError::Invalid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PayloadError {
    fn from(e: serde_json::Error) -> Self {
        PayloadError::Invalid(e)
    }
}

#[derive(Deserialize)]
struct TrackPayload {
    track: Track,
}

#[derive(Deserialize)]
struct AlbumPayload {
    album_info: AlbumInfo,
    #[serde(default)]
    track_list: Vec<Track>,
}

#[derive(Deserialize)]
struct PlaylistPayload {
    playlist_info: PlaylistInfo,
    #[serde(default)]
    track_list: Vec<Track>,
}

#[derive(Deserialize)]
struct ArtistPayload {
    artist_info: ArtistInfo,
    #[serde(default)]
    album_list: Vec<AlbumSummary>,
    #[serde(default)]
    track_list: Vec<Track>,
}

impl MetadataResult {
    /// Classifies a decoded JSON value by its variant key and decodes it.
    pub fn from_value(value: Value) -> Result<Self, PayloadError> {
        let object = value.as_object().ok_or(PayloadError::NotAnObject)?;
        let present: Vec<&'static str> = VARIANT_KEYS
            .iter()
            .copied()
            .filter(|key| object.contains_key(*key))
            .collect();

        let result = match present.as_slice() {
            ["track"] => {
                let p: TrackPayload = serde_json::from_value(value)?;
                MetadataResult::Track { track: p.track }
            }
            ["album_info"] => {
                let p: AlbumPayload = serde_json::from_value(value)?;
                MetadataResult::Album {
                    album_info: p.album_info,
                    track_list: p.track_list,
                }
            }
            ["playlist_info"] => {
                let p: PlaylistPayload = serde_json::from_value(value)?;
                MetadataResult::Playlist {
                    playlist_info: p.playlist_info,
                    track_list: p.track_list,
                }
            }
            ["artist_info"] => {
                let p: ArtistPayload = serde_json::from_value(value)?;
                MetadataResult::Artist {
                    artist_info: p.artist_info,
                    album_list: p.album_list,
                    track_list: p.track_list,
                }
            }
            _ => return Err(PayloadError::UnrecognizedShape(present)),
        };
        Ok(result)
    }

    /// Parses serialized payload text, as stored in fetch history.
    pub fn from_json(text: &str) -> Result<Self, PayloadError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            MetadataResult::Track { .. } => EntityType::Track,
            MetadataResult::Album { .. } => EntityType::Album,
            MetadataResult::Playlist { .. } => EntityType::Playlist,
            MetadataResult::Artist { .. } => EntityType::Artist,
        }
    }

    /// Track listing carried by the payload. A single track payload yields one entry.
    pub fn tracks(&self) -> &[Track] {
        match self {
            MetadataResult::Track { track } => std::slice::from_ref(track),
            MetadataResult::Album { track_list, .. }
            | MetadataResult::Playlist { track_list, .. }
            | MetadataResult::Artist { track_list, .. } => track_list,
        }
    }
}

impl<'de> Deserialize<'de> for MetadataResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        MetadataResult::from_value(value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_each_variant_by_key() {
        let track = MetadataResult::from_value(json!({
            "track": { "name": "Song", "artists": "A, B", "isrc": "X1", "duration_ms": 1000 }
        }))
        .unwrap();
        assert_eq!(track.entity_type(), EntityType::Track);

        let album = MetadataResult::from_value(json!({
            "album_info": { "name": "LP", "total_tracks": 2, "release_date": "2020", "images": "" },
            "track_list": [{ "name": "one" }, { "name": "two" }]
        }))
        .unwrap();
        assert_eq!(album.entity_type(), EntityType::Album);
        assert_eq!(album.tracks().len(), 2);

        let playlist = MetadataResult::from_value(json!({
            "playlist_info": { "owner": { "name": "me" }, "tracks": { "total": 0 } },
            "track_list": []
        }))
        .unwrap();
        assert_eq!(playlist.entity_type(), EntityType::Playlist);

        let artist = MetadataResult::from_value(json!({
            "artist_info": { "name": "Band", "images": "" },
            "album_list": [],
            "track_list": []
        }))
        .unwrap();
        assert_eq!(artist.entity_type(), EntityType::Artist);
    }

    #[test]
    fn rejects_payload_without_variant_key() {
        let err = MetadataResult::from_value(json!({ "track_list": [] })).unwrap_err();
        assert!(matches!(err, PayloadError::UnrecognizedShape(ref keys) if keys.is_empty()));
    }

    #[test]
    fn rejects_payload_with_two_variant_keys() {
        let err = MetadataResult::from_value(json!({
            "track": { "name": "x" },
            "album_info": { "name": "y" }
        }))
        .unwrap_err();
        match err {
            PayloadError::UnrecognizedShape(keys) => assert_eq!(keys, vec!["track", "album_info"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_non_object_and_bad_json() {
        assert!(matches!(
            MetadataResult::from_json("[1, 2]"),
            Err(PayloadError::NotAnObject)
        ));
        assert!(matches!(
            MetadataResult::from_json("{not json"),
            Err(PayloadError::Invalid(_))
        ));
    }

    #[test]
    fn serialized_payload_reads_back() {
        let result = MetadataResult::Playlist {
            playlist_info: PlaylistInfo {
                name: Some("Mix".into()),
                owner: PlaylistOwner {
                    name: "dj".into(),
                    display_name: None,
                },
                tracks: PlaylistTracks { total: 1 },
                cover: None,
            },
            track_list: vec![Track {
                name: "t".into(),
                ..Default::default()
            }],
        };
        let text = result.to_json().unwrap();
        assert!(text.contains("\"playlist_info\""));
        assert_eq!(MetadataResult::from_json(&text).unwrap(), result);
    }

    #[test]
    fn entity_type_parses_unknown_strings() {
        assert_eq!("artist".parse::<EntityType>().unwrap(), EntityType::Artist);
        assert_eq!("podcast".parse::<EntityType>().unwrap(), EntityType::Unknown);
        assert_eq!(EntityType::Playlist.to_string(), "playlist");
    }

    #[test]
    fn album_ref_from_listing_entry() {
        let summary: AlbumSummary = serde_json::from_value(json!({
            "id": "a1", "name": "LP", "release_date": "2020", "total_tracks": 9,
            "external_urls": "https://open.spotify.com/album/a1"
        }))
        .unwrap();
        assert_eq!(
            AlbumRef::from(&summary),
            AlbumRef {
                id: "a1".into(),
                name: "LP".into(),
                external_urls: "https://open.spotify.com/album/a1".into(),
            }
        );
    }
}

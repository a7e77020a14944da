//! Spotify URL helpers used to pick timeouts and discography redirects.

use shared::metadata::EntityType;

const DISCOGRAPHY_SEGMENT: &str = "/discography";
const DISCOGRAPHY_SUFFIX: &str = "/discography/all";

/// Classifies a URL by path segment. First match wins, in the order
/// track, album, playlist, artist.
pub fn classify_url(url: &str) -> EntityType {
    if url.contains("/track/") {
        EntityType::Track
    } else if url.contains("/album/") {
        EntityType::Album
    } else if url.contains("/playlist/") {
        EntityType::Playlist
    } else if url.contains("/artist/") {
        EntityType::Artist
    } else {
        EntityType::Unknown
    }
}

/// Appends `/discography/all` after stripping a single trailing slash.
pub fn discography_url(artist_url: &str) -> String {
    let base = artist_url.strip_suffix('/').unwrap_or(artist_url);
    format!("{base}{DISCOGRAPHY_SUFFIX}")
}

/// Rewrites artist root URLs to their discography listing. Other URLs, and
/// artist URLs already pointing at a discography, are returned unchanged.
pub fn normalize_url(url: &str) -> String {
    if classify_url(url) == EntityType::Artist && !url.contains(DISCOGRAPHY_SEGMENT) {
        discography_url(url)
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_first_matching_segment() {
        assert_eq!(classify_url("https://open.spotify.com/track/abc"), EntityType::Track);
        assert_eq!(classify_url("https://open.spotify.com/album/abc"), EntityType::Album);
        assert_eq!(classify_url("https://open.spotify.com/playlist/abc"), EntityType::Playlist);
        assert_eq!(classify_url("https://open.spotify.com/artist/abc"), EntityType::Artist);
        assert_eq!(classify_url("https://example.com/show/abc"), EntityType::Unknown);
        // track is checked before artist
        assert_eq!(classify_url("https://x/artist/1/track/2"), EntityType::Track);
    }

    #[test]
    fn artist_urls_get_discography_suffix() {
        assert_eq!(normalize_url("https://x/artist/123"), "https://x/artist/123/discography/all");
        assert_eq!(normalize_url("https://x/artist/123/"), "https://x/artist/123/discography/all");
        assert_eq!(
            normalize_url("https://x/artist/123/discography/all"),
            "https://x/artist/123/discography/all"
        );
        assert_eq!(
            normalize_url("https://x/artist/123/discography/album"),
            "https://x/artist/123/discography/album"
        );
    }

    #[test]
    fn non_artist_urls_are_untouched() {
        assert_eq!(normalize_url("https://x/album/9/"), "https://x/album/9/");
    }

    #[test]
    fn only_one_trailing_slash_is_stripped() {
        assert_eq!(
            discography_url("https://x/artist/1//"),
            "https://x/artist/1//discography/all"
        );
    }
}

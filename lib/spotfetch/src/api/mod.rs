mod client;

pub use client::{parse_spotify_url, SpotFetchClient, SpotFetchClientBuilder};

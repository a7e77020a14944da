use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use shared::{
    history::HistoryEntry,
    metadata::{AlbumRef, ArtistRef, EntityType, MetadataResult},
};
use spotfetch::{
    AppConfig, HistoryStore, MetadataOrchestrator, Notifier, NotifyLevel, OrchestratorBuilder,
    SpotFetchClientBuilder, SqliteHistoryStore,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "spotfetch", version, about = "Fetch Spotify metadata and keep a fetch history")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch metadata for a track, album, playlist or artist URL
    Fetch {
        url: String,
        /// Print the raw payload as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch an album picked from a listing
    Album {
        url: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// Fetch the full discography of an artist
    Artist {
        url: String,
        #[arg(long, default_value = "")]
        name: String,
        /// Then fetch the Nth album of the listing (1-based)
        #[arg(long)]
        album: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Inspect or prune the fetch history
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// List entries, newest first
    List {
        /// Only entries of this type
        #[arg(long = "type", value_enum)]
        entity_type: Option<TypeArg>,
    },
    /// Reload an entry from its stored payload without fetching
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete one entry
    Delete { id: String },
    /// Delete all entries, or only those of one type
    Clear {
        #[arg(long = "type", value_enum)]
        entity_type: Option<TypeArg>,
    },
}

/// Entity types accepted on the command line. Unlike `EntityType`, which
/// reads anything unrecognized back as `Unknown`, a typo here is rejected.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum TypeArg {
    Track,
    Album,
    Playlist,
    Artist,
}

impl From<TypeArg> for EntityType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Track => EntityType::Track,
            TypeArg::Album => EntityType::Album,
            TypeArg::Playlist => EntityType::Playlist,
            TypeArg::Artist => EntityType::Artist,
        }
    }
}

/// Writes notifications to stderr, keeping stdout for results.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: NotifyLevel, message: &str) {
        let prefix = match level {
            NotifyLevel::Info => "info",
            NotifyLevel::Warning => "warning",
            NotifyLevel::Error => "error",
            NotifyLevel::Success => "ok",
        };
        eprintln!("[{prefix}] {message}");
    }
}

fn print_result(data: &MetadataResult, json: bool) -> Result<()> {
    if json {
        println!("{}", data.to_json()?);
        return Ok(());
    }
    match data {
        MetadataResult::Track { track } => {
            println!("{} - {}", track.name, track.artists);
        }
        MetadataResult::Album {
            album_info,
            track_list,
        } => {
            println!(
                "{} ({}, {} tracks)",
                album_info.name,
                album_info.release_date,
                track_list.len()
            );
        }
        MetadataResult::Playlist {
            playlist_info,
            track_list,
        } => {
            let owner = &playlist_info.owner;
            println!(
                "{} by {} ({} tracks)",
                playlist_info.name.as_deref().unwrap_or("Untitled playlist"),
                owner.display_name.as_deref().unwrap_or(&owner.name),
                track_list.len()
            );
        }
        MetadataResult::Artist {
            artist_info,
            album_list,
            ..
        } => {
            println!("{} ({} albums)", artist_info.name, album_list.len());
            for (index, album) in album_list.iter().enumerate() {
                println!(
                    "  {:>3}. {} [{}] {}",
                    index + 1,
                    album.name,
                    album.release_date,
                    album.external_urls
                );
            }
            return Ok(());
        }
    }
    for (index, track) in data.tracks().iter().enumerate() {
        println!("  {:>3}. {} - {}", index + 1, track.name, track.artists);
    }
    Ok(())
}

fn print_entry(entry: &HistoryEntry) {
    let when = chrono::DateTime::from_timestamp(entry.timestamp_secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    println!(
        "{}  {:<8} {}  {}  ({})  {}",
        when, entry.entity_type, entry.display_name, entry.summary_info, entry.id, entry.url
    );
}

/// Picks the `index`th (1-based) album of an artist listing.
fn pick_album(data: &MetadataResult, index: usize) -> Result<AlbumRef> {
    let MetadataResult::Artist { album_list, .. } = data else {
        return Err(anyhow!("not an artist listing"));
    };
    index
        .checked_sub(1)
        .and_then(|i| album_list.get(i))
        .map(AlbumRef::from)
        .ok_or_else(|| anyhow!("album {index} not in listing of {} albums", album_list.len()))
}

fn orchestrator(config: &AppConfig, store: &SqliteHistoryStore) -> Result<MetadataOrchestrator> {
    let mut client = SpotFetchClientBuilder::new()
        .base_url(config.api_url())
        .default_timeout(config.request_timeout);
    if let Some(key) = &config.api_key {
        client = client.api_key(key);
    }
    let store: Arc<dyn HistoryStore> = Arc::new(store.clone());

    OrchestratorBuilder::new()
        .fetcher(client.build()?)
        .shared_history(store)
        .notifier(ConsoleNotifier)
        .build()
        .map_err(|e| anyhow!(e))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let store =
        SqliteHistoryStore::connect(config.history_database_url(), config.history_max_entries)
            .await?;

    match cli.command {
        Commands::Fetch { url, json } => {
            let data = orchestrator(&config, &store)?.fetch_direct(&url).await?;
            print_result(&data, json)?;
        }
        Commands::Album { url, name, json } => {
            let orchestrator = orchestrator(&config, &store)?;
            orchestrator.select_album(AlbumRef {
                id: String::new(),
                name,
                external_urls: url,
            });
            if let Some(data) = orchestrator.confirm_album_fetch().await? {
                print_result(&data, json)?;
            }
        }
        Commands::Artist {
            url,
            name,
            album,
            json,
        } => {
            let artist = ArtistRef {
                id: String::new(),
                name,
                external_urls: url,
            };
            let orchestrator = orchestrator(&config, &store)?;
            let data = orchestrator.expand_artist(&artist).await?;
            match album {
                Some(index) => {
                    orchestrator.select_album(pick_album(&data, index)?);
                    if let Some(data) = orchestrator.confirm_album_fetch().await? {
                        print_result(&data, json)?;
                    }
                }
                None => print_result(&data, json)?,
            }
        }
        Commands::History { command } => match command {
            HistoryCommand::List { entity_type } => {
                let entries = store.list().await?;
                for entry in entries
                    .iter()
                    .filter(|e| entity_type.map_or(true, |t| e.entity_type == t.into()))
                {
                    print_entry(entry);
                }
            }
            HistoryCommand::Show { id, json } => {
                let entry = store
                    .get(&id)
                    .await?
                    .ok_or_else(|| anyhow!("no history entry with id {id}"))?;
                let orchestrator = orchestrator(&config, &store)?;
                orchestrator.load_from_cache(&entry.serialized_payload)?;
                if let Some(data) = orchestrator.current() {
                    print_result(&data, json)?;
                }
            }
            HistoryCommand::Delete { id } => {
                store.delete(&id).await?;
                info!("Deleted history entry {}", id);
            }
            HistoryCommand::Clear { entity_type } => match entity_type {
                Some(t) => store.clear_by_type(t.into()).await?,
                None => store.clear().await?,
            },
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::metadata::{AlbumSummary, ArtistInfo};

    fn history_type(args: &[&str]) -> Result<Option<TypeArg>, clap::Error> {
        let cli = Cli::try_parse_from(args)?;
        match cli.command {
            Commands::History {
                command: HistoryCommand::Clear { entity_type } | HistoryCommand::List { entity_type },
            } => Ok(entity_type),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn type_flag_accepts_known_types() {
        let parsed = history_type(&["spotfetch", "history", "clear", "--type", "album"]).unwrap();
        assert_eq!(parsed.map(EntityType::from), Some(EntityType::Album));
        let parsed = history_type(&["spotfetch", "history", "list", "--type", "artist"]).unwrap();
        assert_eq!(parsed.map(EntityType::from), Some(EntityType::Artist));
        assert_eq!(history_type(&["spotfetch", "history", "clear"]).unwrap(), None);
    }

    #[test]
    fn type_flag_rejects_typos_and_unknown() {
        for value in ["albums", "unknown", ""] {
            assert!(
                history_type(&["spotfetch", "history", "clear", "--type", value]).is_err(),
                "{value:?} should be rejected"
            );
        }
        assert!(history_type(&["spotfetch", "history", "list", "--type", "Tracks"]).is_err());
    }

    fn artist_listing() -> MetadataResult {
        let album = |id: &str| AlbumSummary {
            id: id.into(),
            name: format!("Album {id}"),
            external_urls: format!("https://open.spotify.com/album/{id}"),
            ..Default::default()
        };
        MetadataResult::Artist {
            artist_info: ArtistInfo {
                name: "Band".into(),
                ..Default::default()
            },
            album_list: vec![album("a1"), album("a2")],
            track_list: vec![],
        }
    }

    #[test]
    fn pick_album_uses_listing_entry() {
        let picked = pick_album(&artist_listing(), 2).unwrap();
        assert_eq!(
            picked,
            AlbumRef {
                id: "a2".into(),
                name: "Album a2".into(),
                external_urls: "https://open.spotify.com/album/a2".into(),
            }
        );
    }

    #[test]
    fn pick_album_rejects_out_of_range() {
        assert!(pick_album(&artist_listing(), 0).is_err());
        assert!(pick_album(&artist_listing(), 3).is_err());
        let track = MetadataResult::Track {
            track: Default::default(),
        };
        assert!(pick_album(&track, 1).is_err());
    }
}

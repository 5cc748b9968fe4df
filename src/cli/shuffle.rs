use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tabled::Table;

use crate::{
    Res, ShuffleError,
    config::Settings,
    info,
    management::{TokenManager, TokenStore},
    shuffle::{self, ShuffleOptions},
    spotify::SpotifyClient,
    success,
    types::{Track, TrackTableRow},
    warning,
};

const PREVIEW_LEN: usize = 5;

/// Result of one shuffle run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffleReport {
    pub track_count: usize,
    /// Track URIs in their new order.
    pub order: Vec<String>,
    /// Snapshot id of the written playlist; `None` when nothing was written.
    pub snapshot_id: Option<String>,
}

/// Entry point of the default command: make sure a valid token exists, then
/// fetch, reorder and write back the playlist.
///
/// `playlist` wins over `SHUFFLE_PLAYLIST_ID`.
pub async fn shuffle(
    playlist: Option<String>,
    options: ShuffleOptions,
    dry_run: bool,
) -> Res<()> {
    let settings = Settings::from_env()?;
    let playlist_id = resolve_playlist(playlist, &settings)?;

    let http = Client::new();
    let store = TokenStore::new(settings.token_path.clone());
    let api_url = settings.api_url.clone();
    let tokens = TokenManager::ensure(http.clone(), settings, store).await?;
    let mut client = SpotifyClient::new(http, api_url, tokens);

    let report = shuffle_playlist(&mut client, &playlist_id, &options, dry_run).await?;
    match report.snapshot_id {
        Some(_) => success!(
            "Playlist {} reshuffled ({} tracks).",
            playlist_id,
            report.track_count
        ),
        None if dry_run && report.track_count > 1 => {
            info!("Dry run, playlist {} left unchanged.", playlist_id)
        }
        None => info!("Nothing to reorder in playlist {}.", playlist_id),
    }

    Ok(())
}

/// Picks the playlist to shuffle: the `--playlist` flag, else
/// `SHUFFLE_PLAYLIST_ID`.
pub fn resolve_playlist(flag: Option<String>, settings: &Settings) -> Res<String> {
    flag.filter(|id| !id.trim().is_empty())
        .or_else(|| settings.playlist_id.clone())
        .ok_or_else(|| {
            ShuffleError::Config(
                "no playlist given; pass --playlist or set SHUFFLE_PLAYLIST_ID".to_string(),
            )
        })
}

/// Fetches the playlist, reorders it per `options` and, unless `dry_run`,
/// writes the new order back.
///
/// Playlists with fewer than two tracks are left alone. The Web API cannot
/// write local files back, so a playlist holding any is only ever previewed:
/// the write is refused with [`ShuffleError::Config`] before anything changes.
pub async fn shuffle_playlist(
    client: &mut SpotifyClient,
    playlist_id: &str,
    options: &ShuffleOptions,
    dry_run: bool,
) -> Res<ShuffleReport> {
    let pb = spinner(format!("Fetching tracks of playlist {}...", playlist_id));
    let tracks = client.get_playlist_tracks(playlist_id).await;
    pb.finish_and_clear();
    let tracks = tracks?;

    if tracks.is_empty() {
        warning!("Playlist {} is empty.", playlist_id);
    } else {
        info!("Loaded {} tracks.", tracks.len());
    }

    if tracks.len() <= 1 {
        return Ok(ShuffleReport {
            track_count: tracks.len(),
            order: tracks.into_iter().map(|t| t.uri).collect(),
            snapshot_id: None,
        });
    }

    let arranged = shuffle::arrange(&tracks, options);
    print_preview(&arranged);

    let order: Vec<String> = arranged.into_iter().map(|t| t.uri).collect();
    if dry_run {
        return Ok(ShuffleReport {
            track_count: order.len(),
            order,
            snapshot_id: None,
        });
    }

    let local = tracks.iter().filter(|t| t.is_local).count();
    if local > 0 {
        return Err(ShuffleError::Config(format!(
            "playlist {} contains {} local file(s), which cannot be written back through \
             the Web API; nothing was changed (use --dry-run to preview)",
            playlist_id, local
        )));
    }

    let pb = spinner(format!("Writing {} tracks in their new order...", order.len()));
    let snapshot = client.replace_playlist_tracks(playlist_id, &order).await;
    pb.finish_and_clear();

    Ok(ShuffleReport {
        track_count: order.len(),
        snapshot_id: Some(snapshot?),
        order,
    })
}

fn print_preview(tracks: &[Track]) {
    let rows: Vec<TrackTableRow> = tracks
        .iter()
        .take(PREVIEW_LEN)
        .enumerate()
        .map(|(i, t)| TrackTableRow {
            position: i + 1,
            name: t.name.clone(),
            artists: t.artist_names(),
        })
        .collect();

    info!("First {} tracks after shuffle:", rows.len());
    println!("{}", Table::new(rows));
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

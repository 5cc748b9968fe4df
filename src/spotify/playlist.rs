use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use tokio::time::sleep;

use crate::{
    Res, ShuffleError,
    management::TokenManager,
    types::{PlaylistTracksPage, ReplaceTracksRequest, SnapshotResponse, Track},
    warning,
};

/// Items requested per page when reading a playlist.
pub const PAGE_SIZE: usize = 100;
/// Items per write call; the Web API rejects larger batches.
pub const WRITE_BATCH_SIZE: usize = 100;

const TRACK_FIELDS: &str = "items(track(id,uri,name,popularity,is_local,artists(id,name))),next";
const MAX_RETRIES: u32 = 3;
const MAX_RETRY_AFTER_SECS: u64 = 120;
const BAD_GATEWAY_DELAY: Duration = Duration::from_secs(10);

/// Authenticated client for the playlist endpoints of the Web API.
///
/// Every call first asks the [`TokenManager`] for a valid access token and
/// sends it as a bearer credential.
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    tokens: TokenManager,
}

impl SpotifyClient {
    pub fn new(http: Client, api_url: impl Into<String>, tokens: TokenManager) -> Self {
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Fetches every track of the playlist, in playlist order.
    ///
    /// The first page is requested with `limit=100` and a `fields` filter;
    /// later pages follow the `next` URL exactly as the server returns it.
    /// Items whose `track` is null (unavailable content) are skipped.
    ///
    /// # Errors
    ///
    /// [`ShuffleError::Api`] on any non-2xx response.
    pub async fn get_playlist_tracks(&mut self, playlist_id: &str) -> Res<Vec<Track>> {
        let first = Url::parse_with_params(
            &format!("{}/playlists/{}/tracks", self.api_url, playlist_id),
            &[
                ("limit", PAGE_SIZE.to_string().as_str()),
                ("fields", TRACK_FIELDS),
            ],
        )
        .map_err(|e| ShuffleError::Config(format!("invalid API URL {}: {}", self.api_url, e)))?;

        let mut tracks = Vec::new();
        let mut next = Some(first.to_string());

        while let Some(url) = next {
            let res = self
                .send(true, |http, token| http.get(&url).bearer_auth(token))
                .await?;
            let page: PlaylistTracksPage = res.json().await?;

            tracks.extend(page.items.into_iter().filter_map(|item| item.track));
            next = page.next;
        }

        Ok(tracks)
    }

    /// Overwrites the playlist with `uris`, keeping their exact order.
    ///
    /// The first batch replaces the playlist contents (`PUT`), following
    /// batches are appended (`POST`) in order. An empty `uris` clears the
    /// playlist. Returns the snapshot id of the last write.
    ///
    /// # Errors
    ///
    /// [`ShuffleError::Api`] when the replacing call fails, in which case the
    /// playlist is untouched. If an append fails afterwards the playlist is
    /// left holding only the batches written so far, and the error is
    /// wrapped in [`ShuffleError::PartialWrite`]. The same applies when a
    /// write succeeded but its response body could not be read while batches
    /// are still outstanding. Nothing is rolled back.
    pub async fn replace_playlist_tracks(
        &mut self,
        playlist_id: &str,
        uris: &[String],
    ) -> Res<String> {
        let url = format!("{}/playlists/{}/tracks", self.api_url, playlist_id);
        let mut batches = uris.chunks(WRITE_BATCH_SIZE);

        let first = ReplaceTracksRequest {
            uris: batches.next().map(<[String]>::to_vec).unwrap_or_default(),
        };
        let res = self
            .send(false, |http, token| {
                http.put(&url).bearer_auth(token).json(&first)
            })
            .await?;
        let mut written = first.uris.len();
        let mut snapshot = snapshot_id(res)
            .await
            .map_err(|e| partial(written, uris.len(), e))?;

        for batch in batches {
            let body = ReplaceTracksRequest {
                uris: batch.to_vec(),
            };
            let res = self
                .send(false, |http, token| {
                    http.post(&url).bearer_auth(token).json(&body)
                })
                .await
                .map_err(|e| partial(written, uris.len(), e))?;

            // the batch is committed even if its response cannot be read
            written += body.uris.len();
            snapshot = snapshot_id(res)
                .await
                .map_err(|e| partial(written, uris.len(), e))?;
        }

        Ok(snapshot)
    }

    /// Sends the request built by `build`, handling the cases every endpoint
    /// shares:
    ///
    /// - 401: refresh the token once and retry
    /// - 429: wait for `Retry-After` (up to 120 s) and retry
    /// - 502/503 on idempotent requests: wait 10 s and retry
    ///
    /// Retries stop after three attempts; any other non-2xx status becomes
    /// [`ShuffleError::Api`].
    async fn send<F>(&mut self, idempotent: bool, build: F) -> Res<Response>
    where
        F: Fn(&Client, &str) -> RequestBuilder,
    {
        let mut refreshed = false;
        let mut retries = 0;

        loop {
            let token = self.tokens.get_valid_token().await?;
            let res = build(&self.http, &token).send().await?;
            let status = res.status();

            if status.is_success() {
                return Ok(res);
            }

            if status == StatusCode::UNAUTHORIZED && !refreshed {
                refreshed = true;
                self.tokens.refresh().await?;
                continue;
            }

            if retries < MAX_RETRIES {
                if status == StatusCode::TOO_MANY_REQUESTS {
                    let wait = retry_after_secs(&res);
                    if wait <= MAX_RETRY_AFTER_SECS {
                        retries += 1;
                        sleep(Duration::from_secs(wait)).await;
                        continue;
                    }
                    warning!(
                        "Spotify asked to wait {} seconds before retrying. Try again later.",
                        wait
                    );
                } else if idempotent
                    && (status == StatusCode::BAD_GATEWAY
                        || status == StatusCode::SERVICE_UNAVAILABLE)
                {
                    retries += 1;
                    sleep(BAD_GATEWAY_DELAY).await;
                    continue;
                }
            }

            let body = res.text().await.unwrap_or_default();
            return Err(ShuffleError::Api {
                status: status.as_u16(),
                body,
            });
        }
    }
}

async fn snapshot_id(res: Response) -> Res<String> {
    Ok(res.json::<SnapshotResponse>().await?.snapshot_id)
}

/// Reports a failure after `written` of `total` tracks were committed. Once
/// everything is written there is nothing partial to report.
fn partial(written: usize, total: usize, e: ShuffleError) -> ShuffleError {
    if written >= total {
        return e;
    }

    ShuffleError::PartialWrite {
        written,
        total,
        source: Box::new(e),
    }
}

fn retry_after_secs(res: &Response) -> u64 {
    res.headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(1)
}

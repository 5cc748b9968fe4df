#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
};

use axum::{
    Form, Json, Router,
    extract::{Path as UrlPath, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use reqwest::Client;
use serde_json::{Value, json};
use shufflecli::{
    config::Settings,
    management::{TokenManager, TokenStore},
    spotify::SpotifyClient,
    types::{Token, Track, TrackArtist},
};

/// Serves `app` on an ephemeral localhost port and returns its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A localhost port that was free a moment ago.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// HTTP client that never goes through a proxy from the environment.
pub fn http() -> Client {
    Client::builder().no_proxy().build().unwrap()
}

pub fn settings(token_url: &str, api_url: &str, redirect_uri: &str, token_path: &Path) -> Settings {
    let mut settings = Settings::new("test-client-id", redirect_uri);
    settings.token_url = token_url.to_string();
    settings.api_url = api_url.to_string();
    settings.token_path = token_path.to_path_buf();
    settings
}

pub fn token(access: &str, refresh: &str, expires_in_secs: i64) -> Token {
    Token {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_at: chrono::Utc::now().timestamp() + expires_in_secs,
    }
}

pub fn spotify_client(settings: &Settings, store: &TokenStore, token: Token) -> SpotifyClient {
    let tokens = TokenManager::new(http(), settings.clone(), store.clone(), token);
    SpotifyClient::new(http(), settings.api_url.clone(), tokens)
}

pub fn track(uri: &str, artist: Option<&str>) -> Track {
    Track {
        id: Some(uri.rsplit(':').next().unwrap_or(uri).to_string()),
        uri: uri.to_string(),
        name: format!("Song {}", uri),
        artists: artist
            .map(|a| {
                vec![TrackArtist {
                    id: Some(a.to_string()),
                    name: a.to_uppercase(),
                }]
            })
            .unwrap_or_default(),
        popularity: None,
        is_local: false,
    }
}

pub fn track_json(uri: &str) -> Value {
    json!({
        "id": uri.rsplit(':').next().unwrap(),
        "uri": uri,
        "name": format!("Song {}", uri),
        "popularity": 50,
        "is_local": false,
        "artists": [{ "id": "artist", "name": "Artist" }],
    })
}

// --- token endpoint -------------------------------------------------------

#[derive(Clone)]
pub struct TokenMock {
    pub status: StatusCode,
    pub body: Value,
    /// Answer for `grant_type=refresh_token` when it should differ from the
    /// code exchange.
    pub refresh: Option<(StatusCode, Value)>,
    pub requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl TokenMock {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            refresh: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<HashMap<String, String>> {
        self.requests.lock().unwrap().clone()
    }

    /// Starts the mock and returns the token endpoint URL.
    pub async fn start(&self) -> String {
        let app = Router::new()
            .route("/api/token", post(token_handler))
            .with_state(self.clone());
        format!("{}/api/token", serve(app).await)
    }
}

async fn token_handler(
    State(mock): State<TokenMock>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let is_refresh = form.get("grant_type").map(String::as_str) == Some("refresh_token");
    mock.requests.lock().unwrap().push(form);
    match (&mock.refresh, is_refresh) {
        (Some((status, body)), true) => (*status, Json(body.clone())),
        _ => (mock.status, Json(mock.body.clone())),
    }
}

// --- playlist API ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Write {
    pub method: String,
    pub uris: Vec<String>,
}

#[derive(Clone)]
pub struct Injected {
    pub status: StatusCode,
    pub retry_after: Option<String>,
    pub remaining: Arc<Mutex<usize>>,
}

impl Injected {
    pub fn new(status: StatusCode, times: usize, retry_after: Option<&str>) -> Self {
        Self {
            status,
            retry_after: retry_after.map(str::to_string),
            remaining: Arc::new(Mutex::new(times)),
        }
    }
}

#[derive(Clone)]
pub struct PlaylistMock {
    /// Playlist items' `track` objects; `Value::Null` for unavailable items.
    pub tracks: Arc<Vec<Value>>,
    pub page_size: usize,
    /// When set, requests with any other bearer token get a 401.
    pub accepted_token: Option<String>,
    /// Appends (POST) answer with a 500.
    pub fail_append: bool,
    /// Appends (POST) succeed but answer with a body that is not JSON.
    pub garble_append: bool,
    /// The next `failures` requests of any kind answer with this status and
    /// optional `Retry-After` header.
    pub injected: Option<Injected>,
    /// Every request that reached a handler, failed or not.
    pub requests: Arc<Mutex<usize>>,
    pub writes: Arc<Mutex<Vec<Write>>>,
    pub reads: Arc<Mutex<usize>>,
}

impl PlaylistMock {
    pub fn new(tracks: Vec<Value>) -> Self {
        Self {
            tracks: Arc::new(tracks),
            page_size: 100,
            accepted_token: None,
            fail_append: false,
            garble_append: false,
            injected: None,
            requests: Arc::new(Mutex::new(0)),
            writes: Arc::new(Mutex::new(Vec::new())),
            reads: Arc::new(Mutex::new(0)),
        }
    }

    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }

    /// Starts the mock and returns the API base URL.
    pub async fn start(&self) -> String {
        let app = Router::new()
            .route(
                "/v1/playlists/{id}/tracks",
                get(list_tracks).put(replace_tracks).post(append_tracks),
            )
            .with_state(self.clone());
        format!("{}/v1", serve(app).await)
    }

    pub fn request_count(&self) -> usize {
        *self.requests.lock().unwrap()
    }

    /// Counts the request and answers with the injected failure while any is
    /// left.
    fn intercept(&self) -> Option<Response> {
        *self.requests.lock().unwrap() += 1;

        let injected = self.injected.as_ref()?;
        let mut remaining = injected.remaining.lock().unwrap();
        if *remaining == 0 {
            return None;
        }
        *remaining -= 1;

        let body = Json(json!({
            "error": { "status": injected.status.as_u16(), "message": "injected" }
        }));
        Some(match &injected.retry_after {
            Some(secs) => {
                (injected.status, [(header::RETRY_AFTER, secs.clone())], body).into_response()
            }
            None => (injected.status, body).into_response(),
        })
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = &self.accepted_token else {
            return true;
        };
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            == Some(format!("Bearer {}", expected).as_str())
    }
}

async fn list_tracks(
    State(mock): State<PlaylistMock>,
    UrlPath(id): UrlPath<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Some(res) = mock.intercept() {
        return res;
    }
    if !mock.authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "status": 401, "message": "The access token expired" } })),
        )
            .into_response();
    }
    if id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "status": 404, "message": "Resource not found" } })),
        )
            .into_response();
    }

    *mock.reads.lock().unwrap() += 1;

    let offset: usize = query
        .get("offset")
        .and_then(|o| o.parse().ok())
        .unwrap_or(0);
    let end = (offset + mock.page_size).min(mock.tracks.len());
    let items: Vec<Value> = mock.tracks[offset..end]
        .iter()
        .map(|t| json!({ "track": t }))
        .collect();

    let next = if end < mock.tracks.len() {
        let host = headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("127.0.0.1");
        json!(format!(
            "http://{}/v1/playlists/{}/tracks?offset={}&limit={}",
            host, id, end, mock.page_size
        ))
    } else {
        Value::Null
    };

    (
        StatusCode::OK,
        Json(json!({ "items": items, "next": next, "total": mock.tracks.len() })),
    )
        .into_response()
}

async fn replace_tracks(
    State(mock): State<PlaylistMock>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(res) = mock.intercept() {
        return res;
    }
    record_write(&mock, "PUT", &headers, body, false).into_response()
}

async fn append_tracks(
    State(mock): State<PlaylistMock>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(res) = mock.intercept() {
        return res;
    }
    let fail = mock.fail_append;
    let (status, json) = record_write(&mock, "POST", &headers, body, fail);
    if mock.garble_append && status.is_success() {
        return (status, "<html>ok</html>").into_response();
    }
    (status, json).into_response()
}

fn record_write(
    mock: &PlaylistMock,
    method: &str,
    headers: &HeaderMap,
    body: Value,
    fail: bool,
) -> (StatusCode, Json<Value>) {
    if !mock.authorized(headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "status": 401, "message": "The access token expired" } })),
        );
    }
    if fail {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": { "status": 500, "message": "Server error" } })),
        );
    }

    let uris: Vec<String> = body["uris"]
        .as_array()
        .map(|a| {
            a.iter()
                .filter_map(|u| u.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let mut writes = mock.writes.lock().unwrap();
    writes.push(Write {
        method: method.to_string(),
        uris,
    });

    (
        StatusCode::CREATED,
        Json(json!({ "snapshot_id": format!("snapshot-{}", writes.len()) })),
    )
}

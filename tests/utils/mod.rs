#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};

use auction_browser::api::API_KEY_HEADER;

pub const API_KEY: &str = "test-key";

#[derive(Debug, Clone)]
pub struct Seen {
    pub method: &'static str,
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    pub api_key: Option<String>,
    pub body: Option<Value>,
}

/// A stand-in for the auction REST API serving `total` generated listings.
#[derive(Clone)]
pub struct MockApi {
    pub total: usize,
    pub seen: Arc<Mutex<Vec<Seen>>>,
}

impl MockApi {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn seen_path(&self, method: &str, path: &str) -> Vec<Seen> {
        self.seen()
            .into_iter()
            .filter(|s| s.method == method && s.path == path)
            .collect()
    }

    fn record(
        &self,
        method: &'static str,
        path: String,
        query: HashMap<String, String>,
        headers: &HeaderMap,
        body: Option<Value>,
    ) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };

        self.seen.lock().unwrap().push(Seen {
            method,
            path,
            query,
            authorization: header("authorization"),
            api_key: header(API_KEY_HEADER),
            body,
        });
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/auction/listings", get(list_listings).post(create_listing))
            .route("/auction/listings/:id", get(get_listing).delete(delete_listing))
            .route("/auction/listings/:id/bids", post(place_bid))
            .route("/auction/profiles/:name", get(get_profile))
            .with_state(self.clone())
    }
}

pub fn listing_json(i: usize) -> Value {
    let base = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

    json!({
        "id": format!("l{i}"),
        "title": format!("Listing {i}"),
        "description": "Something old",
        "tags": [],
        "media": [{"url": format!("https://img.example/{i}.png"), "alt": ""}],
        "created": "2029-12-01T00:00:00.000Z",
        "updated": "2029-12-01T00:00:00.000Z",
        "endsAt": (base + Duration::hours(i as i64)).to_rfc3339(),
        "_count": {"bids": 1},
        "seller": {"name": "seller"},
        "bids": [{"id": format!("b{i}"), "amount": 10 + i, "bidder": {"name": "ola"}, "created": "2029-12-02T00:00:00.000Z"}]
    })
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"errors": [{"message": "No listing with such ID"}], "statusCode": 404})),
    )
        .into_response()
}

async fn list_listings(
    State(api): State<MockApi>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    api.record("GET", "/auction/listings".to_string(), query.clone(), &headers, None);

    let limit: usize = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(100);
    let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);

    let data: Vec<Value> = (0..api.total)
        .skip((page - 1) * limit)
        .take(limit)
        .map(listing_json)
        .collect();

    Json(json!({
        "data": data,
        "meta": {
            "isFirstPage": page == 1,
            "currentPage": page,
            "pageCount": (api.total + limit - 1) / limit,
            "totalCount": api.total
        }
    }))
    .into_response()
}

async fn get_listing(
    State(api): State<MockApi>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    api.record("GET", format!("/auction/listings/{id}"), query, &headers, None);

    if id == "broken" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "<html>upstream died</html>").into_response();
    }

    match id
        .strip_prefix('l')
        .and_then(|i| i.parse::<usize>().ok())
        .filter(|i| *i < api.total)
    {
        Some(i) => Json(json!({"data": listing_json(i)})).into_response(),
        None => not_found(),
    }
}

async fn place_bid(
    State(api): State<MockApi>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    api.record(
        "POST",
        format!("/auction/listings/{id}/bids"),
        HashMap::new(),
        &headers,
        Some(body.clone()),
    );

    if headers.get("authorization").is_none() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"errors": [{"message": "Missing authorization header"}]})),
        )
            .into_response();
    }

    if id == "mine" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"errors": [{"message": "You cannot bid on your own listing"}]})),
        )
            .into_response();
    }

    if body["amount"].as_u64().unwrap_or(0) > 1000 {
        return (StatusCode::FORBIDDEN, "").into_response();
    }

    (StatusCode::CREATED, Json(json!({"data": {"id": id}}))).into_response()
}

async fn create_listing(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    api.record(
        "POST",
        "/auction/listings".to_string(),
        HashMap::new(),
        &headers,
        Some(body),
    );

    (StatusCode::CREATED, Json(json!({"data": listing_json(0)}))).into_response()
}

async fn delete_listing(
    State(api): State<MockApi>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    api.record("DELETE", format!("/auction/listings/{id}"), HashMap::new(), &headers, None);

    StatusCode::NO_CONTENT.into_response()
}

async fn get_profile(
    State(api): State<MockApi>,
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    api.record("GET", format!("/auction/profiles/{name}"), query, &headers, None);

    Json(json!({
        "data": {
            "name": name,
            "email": format!("{name}@stud.noroff.no"),
            "bio": null,
            "avatar": {"url": "https://img.example/avatar.png", "alt": "me"},
            "banner": null,
            "credits": 1000,
            "listings": [listing_json(0)]
        }
    }))
    .into_response()
}

/// Polls `check` until it holds, giving up after five seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..500 {
        if check() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    check()
}

/// Serves `app` on an ephemeral localhost port.
pub async fn spawn(app: Router) -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::Server::from_tcp(listener)
            .unwrap()
            .serve(app.into_make_service())
            .await
            .unwrap();
    });

    addr
}

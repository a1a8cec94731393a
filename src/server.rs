use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;

use crate::api::ProfileUpdate;
use crate::session::{DetailView, ListingForm, Outcome, Session};

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Session>,
    pub registry: prometheus::Registry,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/listings", get(listings).post(create_listing))
        .route("/listings/:id", get(listing_detail).delete(delete_listing))
        .route("/listings/:id/bids", post(place_bid))
        .route("/refresh", post(refresh))
        .route("/profile", get(profile).put(update_profile))
        .route("/metrics", get(metrics))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub q: Option<String>,
}

/// The amount field as typed; forms send text, scripts send numbers.
#[derive(Debug, Default, Deserialize)]
pub struct BidForm {
    #[serde(default)]
    pub amount: Option<Value>,
}

impl BidForm {
    fn amount_text(&self) -> String {
        match &self.amount {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }
}

fn respond(outcome: Outcome, done: StatusCode, rejected: StatusCode) -> Response {
    let status = match &outcome {
        Outcome::Done(_) => done,
        Outcome::Rejected(_) => rejected,
        Outcome::Failed(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(outcome)).into_response()
}

#[tracing::instrument(skip(state))]
async fn listings(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    Json(state.session.page(query.page, query.q.as_deref())).into_response()
}

#[tracing::instrument(skip(state))]
async fn listing_detail(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let detail = state.session.detail(&id).await;
    let status = match detail {
        DetailView::Ready(_) => StatusCode::OK,
        DetailView::Error { .. } => StatusCode::BAD_GATEWAY,
    };
    (status, Json(detail)).into_response()
}

#[tracing::instrument(skip(state, form))]
async fn place_bid(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<BidForm>,
) -> Response {
    let outcome = state.session.place_bid(&id, &form.amount_text()).await;
    respond(outcome, StatusCode::CREATED, StatusCode::UNPROCESSABLE_ENTITY)
}

#[tracing::instrument(skip(state, form))]
async fn create_listing(State(state): State<AppState>, Json(form): Json<ListingForm>) -> Response {
    let outcome = state.session.create_listing(form).await;
    respond(outcome, StatusCode::CREATED, StatusCode::UNPROCESSABLE_ENTITY)
}

#[tracing::instrument(skip(state))]
async fn delete_listing(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let outcome = state.session.delete_listing(&id).await;
    respond(outcome, StatusCode::OK, StatusCode::UNPROCESSABLE_ENTITY)
}

#[tracing::instrument(skip(state))]
async fn refresh(State(state): State<AppState>) -> Response {
    state.session.refresh().await;
    Json(state.session.page(None, None)).into_response()
}

#[tracing::instrument(skip(state))]
async fn profile(State(state): State<AppState>) -> Response {
    match state.session.profile().await {
        Ok(view) => Json(view).into_response(),
        Err(outcome) => respond(outcome, StatusCode::OK, StatusCode::UNAUTHORIZED),
    }
}

#[tracing::instrument(skip(state))]
async fn update_profile(State(state): State<AppState>, Json(update): Json<ProfileUpdate>) -> Response {
    let outcome = state.session.update_profile(update).await;
    respond(outcome, StatusCode::OK, StatusCode::UNAUTHORIZED)
}

#[tracing::instrument(skip(state))]
async fn metrics(State(state): State<AppState>) -> String {
    tracing::trace!("Getting metrics");

    match crate::metrics::encode(&state.registry) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Encoding Metrics {:?}", e);

            String::new()
        }
    }
}

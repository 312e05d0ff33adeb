use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    routing::{get, post},
    Extension, Json, Router,
};
use lumina_directory::{
    center, decode_draft, decode_patch, redact_for, resolve_venues, DirectoryError, Facets,
    MapFilter, Marker, OwnerView, Removal, SearchFilter,
};
use lumina_shared::constants::GENRES;
use lumina_shared::{photo, Actor, ActorId, Record, RecordId, RecordKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::state::Directories;

const ACTOR_ID_HEADER: &str = "x-actor-id";
const ACTOR_EMAIL_HEADER: &str = "x-actor-email";
const ACTOR_NAME_HEADER: &str = "x-actor-name";

#[derive(Clone)]
pub struct AppState {
    pub directories: Directories,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let artists = collection_routes(RecordKind::Artist)
        .route("/:id/venues", get(artist_venues))
        .route("/:id/venues/:venue_id", post(link_venue));
    let venues = collection_routes(RecordKind::Venue).route("/map", get(venue_map));

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/genres", get(genres))
        .nest("/artists", artists)
        .nest("/venues", venues)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Routes shared by both collections. Handlers learn which one they serve
/// from the `RecordKind` extension.
fn collection_routes(kind: RecordKind) -> Router<AppState> {
    Router::new()
        .route("/", get(list_records).post(create_record))
        .route("/mine", get(my_records))
        .route("/facets", get(record_facets))
        .route(
            "/:id",
            get(get_record).patch(update_record).delete(remove_record),
        )
        .route("/:id/photo", post(upload_photo))
        .layer(Extension(kind))
}

/// The acting user, as asserted by the upstream identity layer.
fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let id = header(ACTOR_ID_HEADER);
    let email = header(ACTOR_EMAIL_HEADER);
    if id.is_none() && email.is_none() {
        return None;
    }

    Some(Actor {
        id: ActorId::new(id.unwrap_or_default()),
        email,
        name: header(ACTOR_NAME_HEADER),
    })
}

/// Mutations need an actor id; an email alone only identifies a viewer.
fn require_actor(headers: &HeaderMap) -> Result<Actor, ServerError> {
    actor_from_headers(headers)
        .filter(|actor| !actor.id.as_str().is_empty())
        .ok_or(ServerError::Unauthenticated)
}

/// JSON body, with malformed input answered in the API's own error shape.
fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ServerError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ServerError::BadRequest(rejection.body_text()))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    store_backend: &'static str,
    validation_policy: lumina_directory::ValidationPolicy,
    max_photo_dimension: u32,
}

#[derive(Serialize)]
struct RemovalResponse {
    result: Removal,
}

#[derive(Serialize)]
struct MapResponse {
    center: [f64; 2],
    markers: Vec<Marker>,
}

#[derive(Deserialize)]
struct RemoveParams {
    #[serde(default)]
    confirm: bool,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        store_backend: state.config.store_backend.as_str(),
        validation_policy: state.config.validation_policy,
        max_photo_dimension: state.config.max_photo_dimension,
    })
}

async fn genres() -> Json<&'static [&'static str]> {
    Json(GENRES)
}

async fn list_records(
    State(state): State<AppState>,
    Extension(kind): Extension<RecordKind>,
    headers: HeaderMap,
    Query(filter): Query<SearchFilter>,
) -> Result<Json<Vec<Record>>, ServerError> {
    let viewer = actor_from_headers(&headers);
    let records = state.directories.get(kind).lock().await.search(&filter)?;
    Ok(Json(
        records
            .into_iter()
            .map(|r| redact_for(r, viewer.as_ref()))
            .collect(),
    ))
}

async fn my_records(
    State(state): State<AppState>,
    Extension(kind): Extension<RecordKind>,
    headers: HeaderMap,
) -> Result<Json<OwnerView>, ServerError> {
    let actor = actor_from_headers(&headers);
    let view = state
        .directories
        .get(kind)
        .lock()
        .await
        .view_for(actor.as_ref())?;
    Ok(Json(view))
}

async fn record_facets(
    State(state): State<AppState>,
    Extension(kind): Extension<RecordKind>,
) -> Result<Json<Facets>, ServerError> {
    Ok(Json(state.directories.get(kind).lock().await.facets()?))
}

async fn create_record(
    State(state): State<AppState>,
    Extension(kind): Extension<RecordKind>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>), ServerError> {
    let actor = require_actor(&headers)?;
    let draft = decode_draft(json_body(payload)?).map_err(DirectoryError::from)?;
    let record = state.directories.get(kind).lock().await.create(&actor, draft)?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_record(
    State(state): State<AppState>,
    Extension(kind): Extension<RecordKind>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Record>, ServerError> {
    let id = RecordId::from(id);
    let viewer = actor_from_headers(&headers);
    let record = state.directories.get(kind).lock().await.get(&id)?;
    Ok(Json(redact_for(record, viewer.as_ref())))
}

async fn update_record(
    State(state): State<AppState>,
    Extension(kind): Extension<RecordKind>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Record>, ServerError> {
    let id = RecordId::from(id);
    let actor = require_actor(&headers)?;
    let patch = decode_patch(json_body(payload)?).map_err(DirectoryError::from)?;
    let record = state
        .directories
        .get(kind)
        .lock()
        .await
        .update(&actor, &id, &patch)?;
    Ok(Json(record))
}

async fn remove_record(
    State(state): State<AppState>,
    Extension(kind): Extension<RecordKind>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<RemoveParams>,
) -> Result<Json<RemovalResponse>, ServerError> {
    let id = RecordId::from(id);
    let actor = require_actor(&headers)?;
    let result = state
        .directories
        .get(kind)
        .lock()
        .await
        .remove(&actor, &id, params.confirm.into())?;
    Ok(Json(RemovalResponse { result }))
}

/// Multipart upload with a `file` field. Ownership is checked first; encoding
/// then runs on the blocking pool without holding the collection lock.
async fn upload_photo(
    State(state): State<AppState>,
    Extension(kind): Extension<RecordKind>,
    headers: HeaderMap,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Record>, ServerError> {
    let id = RecordId::from(id);
    let actor = require_actor(&headers)?;
    state.directories.get(kind).lock().await.ensure_owner(&actor, &id)?;

    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {e}")))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Failed to read field: {e}")))?;
            data = Some(bytes);
            break;
        }
    }
    let data = data.ok_or_else(|| {
        ServerError::BadRequest("Missing 'file' field in multipart form".to_string())
    })?;

    let max_dimension = state.config.max_photo_dimension;
    let size = data.len();
    let image = tokio::task::spawn_blocking(move || photo::encode(&data, max_dimension))
        .await
        .map_err(|e| ServerError::Internal(format!("Image task failed: {e}")))?
        .map_err(DirectoryError::from)?;

    let record = state
        .directories
        .get(kind)
        .lock()
        .await
        .set_photo(&actor, &id, &image)?;

    info!(%kind, id = %id, size, width = image.width, height = image.height, "photo updated");
    Ok(Json(record))
}

async fn venue_map(
    State(state): State<AppState>,
    Query(filter): Query<MapFilter>,
) -> Result<Json<MapResponse>, ServerError> {
    let markers = state.directories.venues.lock().await.map_markers(&filter)?;
    let (lat, lng) = center(&markers);
    Ok(Json(MapResponse {
        center: [lat, lng],
        markers,
    }))
}

async fn artist_venues(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Record>>, ServerError> {
    let id = RecordId::from(id);
    let artist = state.directories.artists.lock().await.get(&id)?;
    let venues = state.directories.venues.lock().await.browse()?;
    let played = resolve_venues(&artist, &venues)
        .into_iter()
        .map(|v| redact_for(v.clone(), None))
        .collect();
    Ok(Json(played))
}

async fn link_venue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, venue_id)): Path<(String, String)>,
) -> Result<Json<Record>, ServerError> {
    let (id, venue_id) = (RecordId::from(id), RecordId::from(venue_id));
    let actor = require_actor(&headers)?;
    let record = state
        .directories
        .artists
        .lock()
        .await
        .link_venue(&actor, &id, venue_id)?;
    Ok(Json(record))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Read-only HTTP query service over a graphs file.
//!
//! Run with: cargo run -p timecentric-cli --release -- serve graphs.json

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use timecentric_core::{DocId, Timestamp};
use timecentric_engine::config::ServerConfig;
use timecentric_engine::{DocumentEntry, DocumentIndex, GraphCatalog, GraphRecord, TimelineItem};
use tower_http::cors::CorsLayer;

/// Longest phrase accepted by the suggestion endpoint.
pub const MAX_PHRASE_LEN: usize = 40;

/// Application state shared across handlers
pub struct AppState {
    pub catalog: GraphCatalog,
    /// Source documents behind the evidence `doc_id`s; empty when none were given
    pub documents: DocumentIndex,
    /// Nodes returned by `/graphs/{timestamp}` without a `limit`
    pub default_limit: usize,
    /// Labels returned by `/query/suggest/{phrase}` without a `limit`
    pub suggest_limit: usize,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(catalog: GraphCatalog, config: &ServerConfig) -> Self {
        Self {
            catalog,
            documents: DocumentIndex::default(),
            default_limit: config.default_limit,
            suggest_limit: config.suggest_limit,
            start_time: Instant::now(),
        }
    }

    pub fn with_documents(mut self, documents: DocumentIndex) -> Self {
        self.documents = documents;
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub graphs: usize,
    pub documents: usize,
    pub uptime_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

/// Creates the Axum router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/timeline", get(handle_timeline))
        .route("/graphs/{timestamp}", get(handle_graph))
        .route("/query/query_graph_nodes", get(handle_query_graph_nodes))
        .route("/query/query_graph_nodes/", get(handle_query_graph_nodes))
        .route("/query/suggest/{phrase}", get(handle_suggest))
        .route("/text/{doc_id}", get(handle_text))
        .route("/text_title/{doc_id}", get(handle_text_title))
        .route("/text_link/{doc_id}", get(handle_text_link))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        graphs: state.catalog.len(),
        documents: state.documents.len(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// Timeline entries in vis.js item format.
async fn handle_timeline(State(state): State<Arc<AppState>>) -> Json<Vec<TimelineItem>> {
    Json(state.catalog.timeline())
}

/// The heaviest nodes of one graph. Unknown or malformed timestamps yield
/// an empty graph.
async fn handle_graph(
    State(state): State<Arc<AppState>>,
    Path(timestamp): Path<String>,
    Query(params): Query<LimitParams>,
) -> Json<GraphRecord> {
    let limit = params.limit.unwrap_or(state.default_limit);
    let graph = match timestamp.parse::<Timestamp>() {
        Ok(ts) => state.catalog.graph(&ts, limit),
        Err(e) => {
            tracing::debug!(timestamp = %timestamp, error = %e, "unparseable timestamp requested");
            GraphRecord::default()
        }
    };
    Json(graph)
}

/// Timestamps whose graph contains every `query_terms` value.
async fn handle_query_graph_nodes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<Vec<String>> {
    let terms: Vec<&str> = params
        .iter()
        .filter(|(key, _)| key == "query_terms")
        .map(|(_, value)| value.as_str())
        .collect();

    let timestamps = state
        .catalog
        .query_graph_nodes(&terms)
        .iter()
        .map(ToString::to_string)
        .collect();
    Json(timestamps)
}

async fn handle_suggest(
    State(state): State<Arc<AppState>>,
    Path(phrase): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    if phrase.chars().count() > MAX_PHRASE_LEN {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("phrase longer than {} characters", MAX_PHRASE_LEN),
        ));
    }
    let limit = params.limit.unwrap_or(state.suggest_limit);
    Ok(Json(state.catalog.suggest(&phrase, limit)))
}

fn document_entry(state: &AppState, doc_id: u64) -> Result<&DocumentEntry, (StatusCode, String)> {
    state
        .documents
        .get(DocId::new(doc_id))
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("document {} not found", doc_id)))
}

/// The indexed document an evidence record points to.
async fn handle_text(
    State(state): State<Arc<AppState>>,
    Path(doc_id): Path<u64>,
) -> Result<Json<DocumentEntry>, (StatusCode, String)> {
    document_entry(&state, doc_id).map(|entry| Json(entry.clone()))
}

async fn handle_text_title(
    State(state): State<Arc<AppState>>,
    Path(doc_id): Path<u64>,
) -> Result<Json<String>, (StatusCode, String)> {
    document_entry(&state, doc_id)?
        .display_title()
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("document {} has no title", doc_id)))
}

async fn handle_text_link(
    State(state): State<Arc<AppState>>,
    Path(doc_id): Path<u64>,
) -> Result<Json<String>, (StatusCode, String)> {
    document_entry(&state, doc_id)?
        .url
        .clone()
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("document {} has no link", doc_id)))
}

/// Starts the query service and serves until Ctrl+C.
pub async fn run_server(
    catalog: GraphCatalog,
    documents: DocumentIndex,
    config: &ServerConfig,
) -> std::io::Result<()> {
    let graphs = catalog.len();
    let state = Arc::new(AppState::new(catalog, config).with_documents(documents));
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, graphs, "query service listening");
    println!("\nServing {} graphs at http://localhost:{}", graphs, config.port);
    println!("   Press Ctrl+C to stop\n");

    let shutdown_signal = async {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("shutdown signal received");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    println!("Server stopped gracefully");
    Ok(())
}

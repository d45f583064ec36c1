use {
    crate::{Keyspace, protocol::CONTENT_TYPE},
    axum::{
        Router,
        extract::{Query, State},
        http::header,
        response::{IntoResponse, Response},
        routing::get,
    },
    serde::Deserialize,
    std::sync::Arc,
};

#[derive(Debug, Deserialize)]
struct ApiQuery {
    #[serde(default)]
    key: String,
}

/// Client-facing endpoint: `GET /api?key=K` returns the raw value bytes.
pub fn api_router(keyspace: Arc<Keyspace>) -> Router {
    Router::new()
        .route("/api", get(handle_api_get))
        .with_state(keyspace)
}

async fn handle_api_get(
    State(keyspace): State<Arc<Keyspace>>,
    Query(query): Query<ApiQuery>,
) -> Response {
    match keyspace.get(&query.key).await {
        Ok(value) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], value.to_vec()).into_response(),
        Err(err) => err.into_response(),
    }
}

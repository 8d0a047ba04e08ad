//! Embedded single-page UI

use axum::{Router, response::Html, routing::get};

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Build page router
pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

//! Static documentation pages.

use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../static/index.html");
const HELP_HTML: &str = include_str!("../../static/help.html");

/// GET / - landing page
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /help - API reference
pub async fn help_handler() -> Html<&'static str> {
    Html(HELP_HTML)
}

use askama::Template;
use axum::{http::header, response::IntoResponse};

use crate::template::render;

#[derive(Template)]
#[template(path = "sw.js", escape = "none")]
pub struct ServiceWorkerTemplate {
    pub version: &'static str,
}

/// Serve service worker at /sw.js (must be at root for scope: '/')
pub async fn sw() -> impl IntoResponse {
    let template = ServiceWorkerTemplate {
        version: env!("CARGO_PKG_VERSION"),
    };

    (
        [
            (
                header::CONTENT_TYPE.as_str(),
                "application/javascript; charset=utf-8",
            ),
            (
                header::CACHE_CONTROL.as_str(),
                "no-cache, no-store, must-revalidate",
            ),
            ("Service-Worker-Allowed", "/"),
        ],
        render(template.render()),
    )
}

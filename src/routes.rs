use std::sync::Arc;

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::aggregator::Aggregator;
use crate::config::SourceConfig;
use crate::normalize::NewsItem;

pub struct AppState {
    pub aggregator: Arc<Aggregator>,
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub sources: &'a [SourceConfig],
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/news", get(news))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Route handlers
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    HtmlTemplate(IndexTemplate {
        sources: state.aggregator.sources(),
    })
    .into_response()
}

/// Runs a fresh aggregation on every call. Upstream failures only shrink the list.
pub async fn news(State(state): State<Arc<AppState>>) -> Json<Vec<NewsItem>> {
    Json(state.aggregator.aggregate().await.items)
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Limits;
    use crate::error::FetchError;
    use crate::fetcher::{FeedSource, RawEntry};
    use crate::normalize::Normalizer;
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    /// Every URL yields the same five entries, or always fails.
    struct StaticSource {
        healthy: bool,
    }

    #[async_trait]
    impl FeedSource for StaticSource {
        async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>, FetchError> {
            if !self.healthy {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: StatusCode::BAD_GATEWAY,
                });
            }
            Ok((1..=5)
                .map(|i| RawEntry {
                    title: Some(format!("Story {}", i)),
                    link: Some(format!("{}/{}", url, i)),
                    published: None,
                    summary: Some("<p>Summary</p>".to_string()),
                })
                .collect())
        }
    }

    fn test_sources() -> Vec<SourceConfig> {
        vec![
            SourceConfig {
                name: "UN".to_string(),
                url: "https://un.example/rss".to_string(),
                color: "#009688".to_string(),
            },
            SourceConfig {
                name: "NATO".to_string(),
                url: "https://nato.example/rss".to_string(),
                color: "#3b82f6".to_string(),
            },
        ]
    }

    fn create_test_app(healthy: bool) -> Router {
        let aggregator = Aggregator::new(
            test_sources().into(),
            Arc::new(StaticSource { healthy }),
            Normalizer::default(),
            Limits::default(),
        );
        app(Arc::new(AppState {
            aggregator: Arc::new(aggregator),
        }))
    }

    async fn body_string(response: Response) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    mod health_tests {
        use super::*;

        #[tokio::test]
        async fn test_health_endpoint() {
            let app = create_test_app(true);

            let response = app
                .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_string(response).await, "OK");
        }
    }

    mod static_tests {
        use super::*;

        #[tokio::test]
        async fn test_stylesheet_served() {
            let app = create_test_app(true);

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/static/style.css")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert!(response
                .headers()
                .get("content-type")
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/css"));

            let body = body_string(response).await;
            assert!(body.contains(".card"));
        }

        #[tokio::test]
        async fn test_missing_static_file_is_404() {
            let app = create_test_app(true);

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/static/missing.css")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
    }

    mod index_tests {
        use super::*;

        #[tokio::test]
        async fn test_index_renders_shell() {
            let app = create_test_app(true);

            let response = app
                .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);

            let body = body_string(response).await;
            assert!(body.starts_with("<!DOCTYPE html>"));
            assert!(body.contains("fetch('/api/news')"));
        }

        #[tokio::test]
        async fn test_index_lists_sources() {
            let app = create_test_app(false);

            let response = app
                .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
                .await
                .unwrap();

            let body = body_string(response).await;
            assert!(body.contains("UN"));
            assert!(body.contains("NATO"));
            assert!(body.contains("#3b82f6"));
        }
    }

    mod news_tests {
        use super::*;

        #[tokio::test]
        async fn test_news_returns_capped_json() {
            let app = create_test_app(true);

            let response = app
                .oneshot(Request::builder().uri("/api/news").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers().get("content-type").unwrap(),
                "application/json"
            );

            let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
            let items = json.as_array().unwrap();
            assert_eq!(items.len(), 6);

            assert_eq!(items[0]["title"], "Story 1");
            assert_eq!(items[0]["description"], "Summary...");
            assert_eq!(items[0]["link"], "https://un.example/rss/1");
            assert_eq!(items[0]["pubDate"], "Денес");
            assert_eq!(items[0]["source"], "UN");
            assert_eq!(items[0]["color"], "#009688");
            assert_eq!(items[3]["source"], "NATO");
        }

        #[tokio::test]
        async fn test_news_all_sources_failing_is_empty_array() {
            let app = create_test_app(false);

            let response = app
                .oneshot(Request::builder().uri("/api/news").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_string(response).await, "[]");
        }

        #[tokio::test]
        async fn test_news_allows_cross_origin() {
            let app = create_test_app(true);

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/api/news")
                        .header("origin", "https://elsewhere.example")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(
                response
                    .headers()
                    .get("access-control-allow-origin")
                    .unwrap(),
                "*"
            );
        }
    }
}

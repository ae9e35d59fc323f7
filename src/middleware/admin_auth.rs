/// Middleware de autenticação para as rotas /api
///
/// Valida que a requisição contém o header `X-Admin-Key` correto.
///
/// - Em desenvolvimento: sem `ADMIN_API_KEY` configurado, permite acesso (warning no log)
/// - Em produção (`RUST_ENV=production`): sem key configurado, bloqueia (503)
/// - Key errado ou ausente: 401

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

#[derive(Debug, Clone, Default)]
pub struct AdminAuth {
    expected_key: Option<String>,
    production: bool,
}

impl AdminAuth {
    pub fn new(expected_key: Option<String>, production: bool) -> Self {
        Self {
            expected_key: expected_key.filter(|k| !k.trim().is_empty()),
            production,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.expected_key.is_some()
    }
}

pub async fn require_admin_key(
    State(auth): State<AdminAuth>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let provided_key = headers.get(ADMIN_KEY_HEADER).and_then(|v| v.to_str().ok());

    match (auth.expected_key.as_deref(), provided_key, auth.production) {
        (Some(expected), Some(provided), _) if expected == provided => {
            tracing::debug!("✅ Admin access granted");
            Ok(next.run(request).await)
        }

        (Some(_), provided, _) => {
            tracing::warn!(
                "❌ Admin access denied - Invalid or missing X-Admin-Key: {:?}",
                provided.map(|_| "<redacted>")
            );
            Err(unauthorized_response())
        }

        (None, _, false) => {
            tracing::warn!(
                "⚠️  ADMIN_API_KEY not configured - Allowing access in development mode. \
                 Configure ADMIN_API_KEY in production!"
            );
            Ok(next.run(request).await)
        }

        (None, _, true) => {
            tracing::error!("🚨 ADMIN_API_KEY not configured in production! Blocking API access.");
            Err(service_unavailable_response())
        }
    }
}

fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "Unauthorized",
            "message": "Missing or invalid X-Admin-Key header",
            "status": 401
        })),
    )
        .into_response()
}

fn service_unavailable_response() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "error": "Service Unavailable",
            "message": "ADMIN_API_KEY not configured on server",
            "status": 503
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware::from_fn_with_state, routing::get, Router};
    use tower::ServiceExt;

    fn app(auth: AdminAuth) -> Router {
        Router::new()
            .route("/api/ping", get(|| async { "pong" }))
            .layer(from_fn_with_state(auth, require_admin_key))
    }

    async fn status(auth: AdminAuth, key: Option<&str>) -> StatusCode {
        let mut builder = Request::builder().uri("/api/ping");
        if let Some(key) = key {
            builder = builder.header(ADMIN_KEY_HEADER, key);
        }
        app(auth)
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_valid_key() {
        let auth = AdminAuth::new(Some("secret".into()), true);
        assert_eq!(status(auth, Some("secret")).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_wrong_or_missing_key() {
        let auth = AdminAuth::new(Some("secret".into()), false);
        assert_eq!(status(auth.clone(), Some("nope")).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status(auth, None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unconfigured_key() {
        assert_eq!(status(AdminAuth::new(None, false), None).await, StatusCode::OK);
        assert_eq!(
            status(AdminAuth::new(Some("  ".into()), true), Some("x")).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}

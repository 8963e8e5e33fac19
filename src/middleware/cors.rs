//! CORS policy for browser clients calling the protected API.
//!
//! - Development: any origin.
//! - Production: exact-match allowlist from `CORS_ALLOWED_ORIGINS`; an empty
//!   list emits no CORS headers at all.
//! - Credentials are never allowed: the token travels in `Authorization`.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::{AppEnv, Config};

pub fn apply(router: Router, config: &Config) -> Router {
    router.layer(layer(config.app_env, &config.cors_allowed_origins))
}

fn layer(app_env: AppEnv, origins: &[String]) -> CorsLayer {
    let request_id = HeaderName::from_static("x-request-id");

    let base = if app_env.is_production() {
        let allowed = allowed_origins(origins);
        CorsLayer::new().allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _req| allowed.iter().any(|v| v == origin),
        ))
    } else {
        CorsLayer::new().allow_origin(Any)
    };

    base.allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::ACCEPT, request_id.clone()])
        .expose_headers([request_id])
        .max_age(Duration::from_secs(600))
}

// Origins that are not valid header values are dropped silently.
fn allowed_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect()
}

//! Bearer token verification → `Principal` in request extensions.
//!
//! - Token source: `Authorization: Bearer <token>`, falling back to the query
//!   parameter named by `KEYCLOAK_TOKEN_INPUT_KEY` when configured.
//! - Verification itself lives in `TokenVerifier`; this layer only extracts the
//!   token, logs failures and maps them to HTTP errors.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, Uri, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Protect every route of `router` with bearer-token verification.
///
/// 例：
/// ```ignore
/// let protected = Router::new().route("/me", get(me));
/// let protected = middleware::auth::access::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let input_key = state.verifier.config().token_input_key.as_deref();

    let token = extract_token(req.headers(), req.uri(), input_key).ok_or_else(|| {
        tracing::debug!("request without bearer token");
        AppError::unauthorized("MISSING_TOKEN")
    })?;

    let principal = match state.verifier.verify(&token).await {
        Ok(principal) => principal,
        Err(err) => {
            tracing::warn!(
                error = ?err,
                code = err.code(),
                "access token verification failed"
            );
            return Err(err.into());
        }
    };

    tracing::debug!(principal = %principal.id, "access token verified");

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Bearer token from the `Authorization` header (scheme is case-insensitive),
/// else from the `input_key` query parameter.
pub fn extract_token(headers: &HeaderMap, uri: &Uri, input_key: Option<&str>) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    if from_header.is_some() {
        return from_header;
    }

    let key = input_key?;
    url::form_urlencoded::parse(uri.query()?.as_bytes())
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health は公開、/me 以下は bearer token 必須
 */
use axum::{Router, routing::get};

use crate::middleware;
use crate::state::AppState;

use crate::api::v1::handlers::{
    health::health,
    me::{me, me_roles},
};

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(me))
        .route("/me/roles/{resource}", get(me_roles));
    let protected = middleware::auth::access::apply(protected, state);

    Router::new().route("/health", get(health)).merge(protected)
}

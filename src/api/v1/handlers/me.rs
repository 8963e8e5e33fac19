/*
 * Responsibility
 * - GET /me: 検証済み Principal をそのまま返す
 * - GET /me/roles/{resource}: クライアント単位のロール一覧
 */
use axum::{Json, extract::Path};
use serde::Serialize;

use crate::api::v1::extractors::AuthCtx;
use crate::services::auth::Principal;

pub async fn me(AuthCtx(principal): AuthCtx) -> Json<Principal> {
    Json(principal)
}

#[derive(Debug, Serialize)]
pub struct RolesResponse {
    pub resource: String,
    pub roles: Vec<String>,
}

pub async fn me_roles(
    AuthCtx(principal): AuthCtx,
    Path(resource): Path<String>,
) -> Json<RolesResponse> {
    let roles = principal.roles(&resource).to_vec();
    Json(RolesResponse { resource, roles })
}

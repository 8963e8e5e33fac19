use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::Principal;
use crate::state::AppState;

/// Handler で検証済み `Principal` を受け取るための extractor。
/// middleware が request.extensions() に insert 済みである前提。
/// 見つからない場合は 401 (ミドルウェア未設定のルート)。
pub struct AuthCtx(pub Principal);

impl FromRequestParts<AppState> for AuthCtx {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(AuthCtx)
            .ok_or(AppError::unauthorized("MISSING_TOKEN"))
    }
}

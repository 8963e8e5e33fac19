/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - verifier: 起動時に一度だけ組み立てた TokenVerifier
 * - Clone 前提で持つ (内部は Arc なので Clone は cheap)
 */
use std::sync::Arc;

use crate::services::auth::TokenVerifier;

#[derive(Clone, Debug)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self { verifier }
    }
}

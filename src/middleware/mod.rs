/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: bearer token 検証 → Principal を extensions に載せる
 * - cors / http: 全ルート共通の横断的関心事
 */
pub mod auth;
pub mod cors;
pub mod http;

/*
 * Responsibility
 * - users テーブル向け SQLx 操作 (トークン検証後のユーザー解決)
 * - PgPool を受け取り、任意のカラムでの 1 件検索を提供
 * - DB エラーは RepoError → UserStoreError に変換して返す
 */
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::RepoError;
use crate::services::auth::{UserProvider, UserRecord, UserStoreError};

#[derive(Debug, FromRow)]
pub struct UserRow {
    #[sqlx(rename = "userId")]
    pub id: Uuid,
    #[sqlx(rename = "userName")]
    pub user_name: String,
    pub email: Option<String>,
    #[sqlx(rename = "imageUrl")]
    pub image_url: Option<String>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            user_name: row.user_name,
            email: row.email,
            image_url: row.image_url,
        }
    }
}

/// Quote `field` as a Postgres identifier.
///
/// The credential field comes from configuration, not from the request, but it
/// still ends up in SQL text, so only plain identifiers are allowed.
pub fn quoted_column(field: &str) -> Result<String, RepoError> {
    let mut chars = field.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid {
        return Err(RepoError::InvalidColumn(field.to_string()));
    }
    Ok(format!("\"{}\"", field))
}

pub async fn find_by_field(
    db: &PgPool,
    field: &str,
    value: &str,
) -> Result<Option<UserRow>, RepoError> {
    let column = quoted_column(field)?;

    // Compare as text so uuid/integer columns can be used as the credential too.
    let sql = format!(
        r#"
        SELECT "userId", "userName", "email", "imageUrl"
        FROM users
        WHERE {column}::text = $1
        LIMIT 1
        "#
    );

    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(value)
        .fetch_optional(db)
        .await?;

    Ok(row)
}

/// `UserProvider` backed by the `users` table.
#[derive(Clone, Debug)]
pub struct PgUserProvider {
    db: PgPool,
}

impl PgUserProvider {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserProvider for PgUserProvider {
    async fn find_by_field(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Option<UserRecord>, UserStoreError> {
        match find_by_field(&self.db, field, value).await {
            Ok(row) => Ok(row.map(UserRecord::from)),
            Err(RepoError::InvalidColumn(name)) => Err(UserStoreError::InvalidField(name)),
            Err(RepoError::Db(e)) => Err(UserStoreError::Backend(Box::new(e))),
        }
    }
}

/*
 * Responsibility
 * - 環境変数の読み込み (PORT, DATABASE_URL, CORS 許可, KEYCLOAK_* など)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 * - 読み込んだ値は起動後に変更しない (immutable)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

pub const DEFAULT_ALLOWED_RESOURCE: &str = "account";
pub const DEFAULT_CREDENTIAL: &str = "email";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(std::env::var("APP_ENV").ok().as_deref())
    }

    fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Keycloak realm settings that drive bearer-token verification.
///
/// Built once at startup; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeycloakConfig {
    /// Realm public key: either the bare base64 body shown in the Keycloak admin
    /// console or a full PEM document. `None` makes every verification fail.
    pub realm_public_key: Option<String>,
    pub load_user_from_database: bool,
    /// Local user field matched against the principal claim.
    pub user_provider_credential: String,
    /// Token claim used as the principal identifier.
    pub token_principal_attribute: String,
    pub append_decoded_token: bool,
    /// Ordered, de-duplicated and never empty.
    pub allowed_resources: Vec<String>,
    pub ignore_resources_validation: bool,
    pub leeway_seconds: u64,
    /// Query parameter consulted when no `Authorization` header is present.
    pub token_input_key: Option<String>,
}

impl Default for KeycloakConfig {
    fn default() -> Self {
        Self {
            realm_public_key: None,
            load_user_from_database: true,
            user_provider_credential: DEFAULT_CREDENTIAL.to_string(),
            token_principal_attribute: DEFAULT_CREDENTIAL.to_string(),
            append_decoded_token: false,
            allowed_resources: vec![DEFAULT_ALLOWED_RESOURCE.to_string()],
            ignore_resources_validation: false,
            leeway_seconds: 0,
            token_input_key: None,
        }
    }
}

impl KeycloakConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in production,
    /// a map in tests). Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let realm_public_key = get("KEYCLOAK_REALM_PUBLIC_KEY").map(|v| v.replace("\\n", "\n"));

        let flag = |key: &'static str, default: bool| match get(key) {
            Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid(key)),
            None => Ok(default),
        };

        let load_user_from_database = flag(
            "KEYCLOAK_LOAD_USER_FROM_DATABASE",
            defaults.load_user_from_database,
        )?;
        let append_decoded_token =
            flag("KEYCLOAK_APPEND_DECODED_TOKEN", defaults.append_decoded_token)?;
        let ignore_resources_validation = flag(
            "KEYCLOAK_IGNORE_RESOURCES_VALIDATION",
            defaults.ignore_resources_validation,
        )?;

        let leeway_seconds = match get("KEYCLOAK_LEEWAY") {
            Some(v) => v
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("KEYCLOAK_LEEWAY"))?,
            None => defaults.leeway_seconds,
        };

        Ok(Self {
            realm_public_key,
            load_user_from_database,
            user_provider_credential: get("KEYCLOAK_USER_PROVIDER_CREDENTIAL")
                .unwrap_or(defaults.user_provider_credential),
            token_principal_attribute: get("KEYCLOAK_TOKEN_PRINCIPAL_ATTRIBUTE")
                .unwrap_or(defaults.token_principal_attribute),
            append_decoded_token,
            allowed_resources: parse_allowed_resources(
                get("KEYCLOAK_ALLOWED_RESOURCES").as_deref(),
            ),
            ignore_resources_validation,
            leeway_seconds,
            token_input_key: get("KEYCLOAK_TOKEN_INPUT_KEY"),
        })
    }
}

/// Split a comma-separated allow-list, keeping first occurrences in order.
/// Falls back to `["account"]` when nothing usable remains.
pub fn parse_allowed_resources(raw: Option<&str>) -> Vec<String> {
    let mut resources: Vec<String> = Vec::new();
    for entry in raw.unwrap_or_default().split(',').map(str::trim) {
        if !entry.is_empty() && !resources.iter().any(|r| r == entry) {
            resources.push(entry.to_string());
        }
    }

    if resources.is_empty() {
        resources.push(DEFAULT_ALLOWED_RESOURCE.to_string());
    }
    resources
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    // Only needed when users are loaded from the database.
    pub database_url: Option<String>,

    pub keycloak: KeycloakConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let keycloak = KeycloakConfig::from_env()?;

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());
        if keycloak.load_user_from_database && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            database_url,
            keycloak,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<KeycloakConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        KeycloakConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn unset_environment_yields_defaults() {
        let config = from_pairs(&[]).unwrap();

        assert_eq!(config, KeycloakConfig::default());
        assert_eq!(config.realm_public_key, None);
        assert!(config.load_user_from_database);
        assert_eq!(config.user_provider_credential, "email");
        assert_eq!(config.token_principal_attribute, "email");
        assert!(!config.append_decoded_token);
        assert_eq!(config.allowed_resources, vec!["account".to_string()]);
    }

    #[test]
    fn allowed_resources_are_trimmed_and_deduplicated() {
        let config =
            from_pairs(&[("KEYCLOAK_ALLOWED_RESOURCES", " web-app, account ,,web-app")]).unwrap();

        assert_eq!(config.allowed_resources, vec!["web-app", "account"]);
    }

    #[test]
    fn blank_allowed_resources_fall_back_to_account() {
        assert_eq!(parse_allowed_resources(Some(" , ,")), vec!["account"]);
        assert_eq!(parse_allowed_resources(Some("")), vec!["account"]);
        assert_eq!(parse_allowed_resources(None), vec!["account"]);
    }

    #[test]
    fn booleans_accept_common_spellings() {
        let config = from_pairs(&[
            ("KEYCLOAK_LOAD_USER_FROM_DATABASE", "0"),
            ("KEYCLOAK_APPEND_DECODED_TOKEN", "TRUE"),
            ("KEYCLOAK_IGNORE_RESOURCES_VALIDATION", "on"),
        ])
        .unwrap();

        assert!(!config.load_user_from_database);
        assert!(config.append_decoded_token);
        assert!(config.ignore_resources_validation);
    }

    #[test]
    fn unparsable_boolean_is_rejected() {
        let err = from_pairs(&[("KEYCLOAK_APPEND_DECODED_TOKEN", "maybe")]).unwrap_err();
        assert_eq!(err, ConfigError::Invalid("KEYCLOAK_APPEND_DECODED_TOKEN"));
    }

    #[test]
    fn unparsable_leeway_is_rejected() {
        let err = from_pairs(&[("KEYCLOAK_LEEWAY", "-5")]).unwrap_err();
        assert_eq!(err, ConfigError::Invalid("KEYCLOAK_LEEWAY"));
    }

    #[test]
    fn empty_public_key_counts_as_unset() {
        let config = from_pairs(&[("KEYCLOAK_REALM_PUBLIC_KEY", "   ")]).unwrap();
        assert_eq!(config.realm_public_key, None);
    }

    #[test]
    fn escaped_newlines_in_public_key_are_expanded() {
        let config = from_pairs(&[(
            "KEYCLOAK_REALM_PUBLIC_KEY",
            "-----BEGIN PUBLIC KEY-----\\nAAAA\\n-----END PUBLIC KEY-----",
        )])
        .unwrap();

        assert_eq!(
            config.realm_public_key.as_deref(),
            Some("-----BEGIN PUBLIC KEY-----\nAAAA\n-----END PUBLIC KEY-----")
        );
    }

    #[test]
    fn app_env_recognizes_production_aliases() {
        assert!(AppEnv::parse(Some("PROD")).is_production());
        assert!(AppEnv::parse(Some("production")).is_production());
        assert!(!AppEnv::parse(Some("staging")).is_production());
        assert!(!AppEnv::parse(None).is_production());
    }
}

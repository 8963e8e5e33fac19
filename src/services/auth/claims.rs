//! Decoded token payload with typed accessors.
//!
//! Keycloak tokens carry many realm-specific claims, so the payload is kept as
//! a JSON object instead of a fixed struct. Accessors return `None` for absent
//! or wrongly-typed values; the verifier turns that into a classified error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// `exp` as epoch seconds. Integral floats are accepted, anything else is not.
    pub fn exp(&self) -> Option<i64> {
        match self.0.get("exp")? {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            }),
            _ => None,
        }
    }

    pub fn resource_access(&self) -> Option<&Map<String, Value>> {
        self.0.get("resource_access")?.as_object()
    }

    /// Client ids the token grants roles for (`resource_access` keys).
    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resource_access()
            .into_iter()
            .flat_map(|access| access.keys().map(String::as_str))
    }

    /// `resource_access.<resource>.roles`, skipping non-string entries.
    pub fn resource_roles(&self, resource: &str) -> Vec<String> {
        self.resource_access()
            .and_then(|access| access.get(resource))
            .and_then(|entry| entry.get("roles"))
            .and_then(Value::as_array)
            .map(|roles| {
                roles
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A claim as an identifier string: strings verbatim, numbers and booleans
    /// rendered. Null, arrays and objects yield `None`.
    pub fn scalar(&self, name: &str) -> Option<String> {
        match self.0.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Space-separated `scope` claim.
    pub fn scopes(&self) -> Vec<String> {
        self.0
            .get("scope")
            .and_then(Value::as_str)
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn claims(value: Value) -> Claims {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn exp_accepts_integers_and_integral_floats() {
        assert_eq!(claims(json!({"exp": 1700000000})).exp(), Some(1700000000));
        assert_eq!(claims(json!({"exp": 1700000000.0})).exp(), Some(1700000000));
        assert_eq!(claims(json!({"exp": 1700000000.5})).exp(), None);
        assert_eq!(claims(json!({"exp": "1700000000"})).exp(), None);
        assert_eq!(claims(json!({})).exp(), None);
    }

    #[test]
    fn resource_names_lists_resource_access_keys() {
        let c = claims(json!({
            "resource_access": {
                "account": {"roles": ["view-profile"]},
                "web-app": {"roles": []}
            }
        }));

        let mut names: Vec<&str> = c.resource_names().collect();
        names.sort();
        assert_eq!(names, vec!["account", "web-app"]);
    }

    #[test]
    fn resource_names_is_empty_when_claim_is_not_an_object() {
        assert_eq!(claims(json!({"resource_access": ["account"]})).resource_names().count(), 0);
        assert_eq!(claims(json!({})).resource_names().count(), 0);
    }

    #[test]
    fn resource_roles_skips_non_string_entries() {
        let c = claims(json!({
            "resource_access": {"account": {"roles": ["manage-account", 7, null, "view-profile"]}}
        }));

        assert_eq!(c.resource_roles("account"), vec!["manage-account", "view-profile"]);
        assert!(c.resource_roles("missing").is_empty());
    }

    #[test]
    fn scalar_renders_strings_numbers_and_booleans() {
        let c = claims(json!({
            "email": "a@b.com",
            "uid": 42,
            "verified": true,
            "nothing": null,
            "groups": ["x"],
            "address": {"country": "JP"}
        }));

        assert_eq!(c.scalar("email").as_deref(), Some("a@b.com"));
        assert_eq!(c.scalar("uid").as_deref(), Some("42"));
        assert_eq!(c.scalar("verified").as_deref(), Some("true"));
        assert_eq!(c.scalar("nothing"), None);
        assert_eq!(c.scalar("groups"), None);
        assert_eq!(c.scalar("address"), None);
        assert_eq!(c.scalar("absent"), None);
    }

    #[test]
    fn scopes_split_on_whitespace() {
        let c = claims(json!({"scope": "openid  profile email"}));
        assert_eq!(c.scopes(), vec!["openid", "profile", "email"]);
        assert!(claims(json!({})).scopes().is_empty());
    }
}

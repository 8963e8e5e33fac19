//! Realm public key normalization.
//!
//! Keycloak shows the realm key as a bare base64 SubjectPublicKeyInfo body
//! (no PEM armor). Operators paste either that body or a full PEM document, so
//! both forms are accepted here and turned into an RSA `DecodingKey`.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use jsonwebtoken::DecodingKey;

const PEM_HEADER: &str = "-----BEGIN PUBLIC KEY-----";
const PEM_FOOTER: &str = "-----END PUBLIC KEY-----";
const PEM_LINE_WIDTH: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum RealmKeyError {
    #[error("realm public key is not valid base64")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("realm public key is not an RSA public key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),
}

/// Parse the configured realm key into an RSA decoding key.
pub fn decoding_key(raw: &str) -> Result<DecodingKey, RealmKeyError> {
    let pem = to_pem(raw)?;
    Ok(DecodingKey::from_rsa_pem(pem.as_bytes())?)
}

/// Wrap a bare base64 body into PEM armor. PEM input passes through untouched.
pub fn to_pem(raw: &str) -> Result<String, RealmKeyError> {
    let raw = raw.trim();
    if raw.starts_with("-----BEGIN") {
        return Ok(raw.to_string());
    }

    let body: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    // Reject garbage early so the error names the real problem.
    STANDARD.decode(&body)?;

    let mut pem = String::with_capacity(body.len() + 64);
    pem.push_str(PEM_HEADER);
    pem.push('\n');
    for line in body.as_bytes().chunks(PEM_LINE_WIDTH) {
        // body is ASCII after the base64 check
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str(PEM_FOOTER);
    Ok(pem)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REALM_PUBLIC_PEM: &str = include_str!("../../../tests/fixtures/realm_public.pem");

    fn bare_body(pem: &str) -> String {
        pem.lines()
            .filter(|l| !l.starts_with("-----"))
            .collect::<Vec<_>>()
            .concat()
    }

    #[test]
    fn bare_body_is_wrapped_in_pem_armor() {
        let pem = to_pem(&bare_body(REALM_PUBLIC_PEM)).unwrap();

        assert!(pem.starts_with(PEM_HEADER));
        assert!(pem.ends_with(PEM_FOOTER));
        assert!(pem.lines().all(|l| l.len() <= PEM_LINE_WIDTH));
        assert_eq!(pem.trim(), REALM_PUBLIC_PEM.trim());
    }

    #[test]
    fn pem_input_is_passed_through() {
        assert_eq!(to_pem(REALM_PUBLIC_PEM).unwrap(), REALM_PUBLIC_PEM.trim());
    }

    #[test]
    fn both_forms_produce_a_key() {
        assert!(decoding_key(REALM_PUBLIC_PEM).is_ok());
        assert!(decoding_key(&bare_body(REALM_PUBLIC_PEM)).is_ok());
    }

    #[test]
    fn non_base64_body_is_rejected() {
        assert!(matches!(
            decoding_key("not a key!"),
            Err(RealmKeyError::InvalidBase64(_))
        ));
    }

    #[test]
    fn base64_that_is_not_a_key_is_rejected() {
        assert!(matches!(
            decoding_key("aGVsbG8gd29ybGQ="),
            Err(RealmKeyError::InvalidKey(_))
        ));
    }
}

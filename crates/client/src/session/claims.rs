//! Bearer token claims and best-effort decoding.

use std::collections::HashSet;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use shopfront_core::{Locale, Role};

/// Claims this client reads out of the bearer token.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// Subject: the account login.
    pub sub: String,
    /// Roles granted to the account.
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Expiry as epoch seconds.
    pub exp: i64,
    /// Display locale the account was issued the token with.
    #[serde(default)]
    pub lang: Option<Locale>,
}

/// Decode the claims of a bearer token, best effort.
///
/// The backend signs and verifies tokens; this client only reads claims,
/// so signature validation is disabled. Expiry validation is disabled
/// too: session state is recomputed from `exp` at every check, which
/// requires expired tokens to still decode. Anything undecodable is
/// `None`: callers treat that as "no session".
pub(crate) fn decode(token: &str) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use jsonwebtoken::{EncodingKey, Header};

    use super::*;

    /// Mint a token the way the backend would; the signing key is
    /// irrelevant because decoding ignores the signature.
    pub(crate) fn mint_token(sub: &str, exp: i64) -> String {
        let claims = serde_json::json!({
            "sub": sub,
            "roles": ["CLIENT"],
            "exp": exp,
            "lang": "en",
        });
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-only"),
        )
        .unwrap()
    }

    #[test]
    fn decodes_claims_without_verifying_the_signature() {
        let token = mint_token("client1", 1_900_000_000);
        let claims = decode(&token).expect("claims");
        assert_eq!(claims.sub, "client1");
        assert_eq!(claims.exp, 1_900_000_000);
        assert_eq!(claims.roles, vec![Role::Client]);
        assert_eq!(claims.lang, Some(Locale::En));
    }

    #[test]
    fn decodes_tokens_that_are_already_expired() {
        let token = mint_token("client1", 1_000);
        assert!(decode(&token).is_some());
    }

    #[test]
    fn garbage_decodes_to_none() {
        assert!(decode("").is_none());
        assert!(decode("not-a-jwt").is_none());
        assert!(decode("a.b.c").is_none());
    }

    #[test]
    fn missing_optional_claims_default() {
        let claims_json = serde_json::json!({ "sub": "client1", "exp": 1_900_000_000 });
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims_json,
            &EncodingKey::from_secret(b"test-only"),
        )
        .unwrap();

        let claims = decode(&token).expect("claims");
        assert!(claims.roles.is_empty());
        assert!(claims.lang.is_none());
    }
}

//! # token-verify
//!
//! Bearer-token validation against a remote OIDC issuer.
//!
//! ## Components
//!
//! - **JwksClient:** fetches and caches the issuer's signing keys.
//! - **Verifier:** validates RS256 access tokens (signature, `exp`, `iss`,
//!   `aud`) and hands back the claims for scope checks.
//!
//! The crate only consumes tokens; issuance stays with the identity server.

pub mod claims;
pub mod error;
pub mod jwks;

pub use claims::{Audience, VerifiedClaims};
pub use error::VerifyError;
pub use jwks::JwksClient;

use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use std::time::Duration;

/// Static configuration for a [`Verifier`].
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Issuer base URL; JWKS discovery and the `iss` claim check both use it.
    pub issuer: String,
    /// Expected `aud` claim value.
    pub audience: String,
    /// How long fetched signing keys stay cached.
    pub jwks_ttl: Duration,
}

/// Validates bearer tokens issued by a single trusted issuer.
pub struct Verifier {
    jwks: JwksClient,
    validation: Validation,
}

impl Verifier {
    pub fn new(config: VerifierConfig) -> Result<Self, VerifyError> {
        let jwks = JwksClient::new(&config.issuer, config.jwks_ttl)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[config.issuer.trim_end_matches('/')]);
        validation.set_audience(&[&config.audience]);

        Ok(Self { jwks, validation })
    }

    /// Validates a compact JWT and returns its claims.
    ///
    /// Checks, in order: header algorithm, key id resolution against the
    /// issuer's JWKS, signature, `exp` (with the library's default leeway),
    /// `iss` and `aud`.
    pub async fn verify(&self, token: &str) -> Result<VerifiedClaims, VerifyError> {
        let header = decode_header(token)?;
        if header.alg != Algorithm::RS256 {
            return Err(VerifyError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }
        let kid = header.kid.ok_or(VerifyError::MissingKeyId)?;

        let key = self.jwks.decoding_key(&kid).await?;
        let data = decode::<VerifiedClaims>(token, &key, &self.validation)?;
        Ok(data.claims)
    }
}

use crate::error::VerifyError;
use jsonwebtoken::jwk::{AlgorithmParameters, JwkSet};
use jsonwebtoken::DecodingKey;
use log::{debug, warn};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Path under the issuer where Duende IdentityServer publishes its key set.
const JWKS_PATH: &str = "/.well-known/openid-configuration/jwks";

/// Client for the issuer's JWKS endpoint.
///
/// Decoding keys are cached by `kid` with a TTL so that routine requests do
/// not hit the issuer. A token carrying an unknown `kid` triggers a refetch,
/// which is how key rotation is picked up before the TTL expires.
pub struct JwksClient {
    http: reqwest::Client,
    jwks_url: Url,
    keys: Cache<String, Arc<DecodingKey>>,
}

impl JwksClient {
    pub fn new(issuer: &str, ttl: Duration) -> Result<Self, VerifyError> {
        let jwks_url = Url::parse(&format!("{}{}", issuer.trim_end_matches('/'), JWKS_PATH))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(VerifyError::JwksFetch)?;

        Ok(Self {
            http,
            jwks_url,
            keys: Cache::builder().time_to_live(ttl).build(),
        })
    }

    /// Returns the decoding key for `kid`, refetching the key set once if
    /// the id is not cached.
    pub async fn decoding_key(&self, kid: &str) -> Result<Arc<DecodingKey>, VerifyError> {
        if let Some(key) = self.keys.get(kid).await {
            return Ok(key);
        }

        self.refresh().await?;

        self.keys
            .get(kid)
            .await
            .ok_or_else(|| VerifyError::UnknownKeyId(kid.to_string()))
    }

    async fn refresh(&self) -> Result<(), VerifyError> {
        debug!("fetching JWKS from {}", self.jwks_url);
        let jwk_set: JwkSet = self
            .http
            .get(self.jwks_url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut loaded = 0usize;
        for jwk in &jwk_set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                warn!("skipping JWK without a kid");
                continue;
            };
            if !matches!(jwk.algorithm, AlgorithmParameters::RSA(_)) {
                warn!("skipping non-RSA JWK {kid}");
                continue;
            }
            let key = DecodingKey::from_jwk(jwk)
                .map_err(|e| VerifyError::InvalidKeySet(e.to_string()))?;
            self.keys.insert(kid, Arc::new(key)).await;
            loaded += 1;
        }

        if loaded == 0 {
            return Err(VerifyError::InvalidKeySet(
                "key set contains no usable RSA keys".to_string(),
            ));
        }
        Ok(())
    }
}

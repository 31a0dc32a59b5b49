use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("token header carries no key id")]
    MissingKeyId,

    #[error("no key with id {0:?} in the issuer key set")]
    UnknownKeyId(String),

    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("JWKS document is invalid: {0}")]
    InvalidKeySet(String),

    #[error("failed to fetch JWKS: {0}")]
    JwksFetch(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("token rejected: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl VerifyError {
    /// True when the failure came from the issuer side (network, bad key
    /// material) rather than from the presented token itself.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            VerifyError::JwksFetch(_) | VerifyError::InvalidKeySet(_) | VerifyError::UrlParse(_)
        )
    }
}

use crate::error::IssuerError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::EncodingKey;
use rand::rngs::OsRng;
use rand::Rng;
use rsa::pkcs8::EncodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde::Serialize;

const RSA_BITS: usize = 2048;

/// Public half of the signing key in JWK form.
#[derive(Debug, Serialize, Clone)]
pub struct Jwk {
    pub kty: String,
    pub kid: String,
    pub n: String,
    pub e: String,
    pub alg: String,
    pub r#use: String,
}

/// RSA signing key for the issuer, generated fresh per process.
///
/// Tokens reference the key by `kid` so relying parties can pick it out of
/// the published JWKS.
pub struct SigningKey {
    pub kid: String,
    encoding: EncodingKey,
    jwk: Jwk,
}

impl SigningKey {
    pub fn generate() -> Result<Self, IssuerError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, RSA_BITS)
            .map_err(|e| IssuerError::KeyGeneration(e.to_string()))?;

        let pem = private_key
            .to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
            .map_err(|e| IssuerError::KeyEncoding(e.to_string()))?;
        let encoding = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| IssuerError::KeyEncoding(e.to_string()))?;

        let kid: String = {
            let bytes: [u8; 8] = OsRng.gen();
            bytes.iter().map(|b| format!("{b:02x}")).collect()
        };

        let public_key = private_key.to_public_key();
        let jwk = Jwk {
            kty: "RSA".to_string(),
            kid: kid.clone(),
            n: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
            alg: "RS256".to_string(),
            r#use: "sig".to_string(),
        };

        Ok(Self { kid, encoding, jwk })
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    /// The JWKS document served at the discovery endpoint.
    pub fn jwks_document(&self) -> serde_json::Value {
        serde_json::json!({ "keys": [self.jwk] })
    }
}

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rand::rngs::OsRng;
use rsa::pkcs8::EncodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use token_verify::{Verifier, VerifierConfig, VerifyError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JWKS_PATH: &str = "/.well-known/openid-configuration/jwks";

/// An RSA signing key with the matching public JWK.
struct TestKey {
    kid: String,
    encoding: EncodingKey,
    jwk: serde_json::Value,
}

impl TestKey {
    fn generate(kid: &str) -> Self {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).expect("failed to generate key");
        let pem = private_key
            .to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
            .expect("failed to encode key");
        let encoding = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("invalid PEM");

        let public_key = private_key.to_public_key();
        let jwk = serde_json::json!({
            "kty": "RSA",
            "kid": kid,
            "use": "sig",
            "alg": "RS256",
            "n": URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            "e": URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        });

        Self {
            kid: kid.to_string(),
            encoding,
            jwk,
        }
    }

    fn sign(&self, claims: &serde_json::Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.kid.clone());
        encode(&header, claims, &self.encoding).expect("failed to sign token")
    }
}

fn jwks_body(keys: &[&TestKey]) -> serde_json::Value {
    serde_json::json!({
        "keys": keys.iter().map(|k| k.jwk.clone()).collect::<Vec<_>>(),
    })
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs()
}

fn claims(issuer: &str, audience: &str, exp: u64) -> serde_json::Value {
    serde_json::json!({
        "iss": issuer,
        "aud": audience,
        "sub": "alice",
        "scope": "openid profile api weatherget",
        "exp": exp,
        "iat": unix_now(),
    })
}

async fn verifier_for(mock: &MockServer) -> Verifier {
    Verifier::new(VerifierConfig {
        issuer: mock.uri(),
        audience: "api".to_string(),
        jwks_ttl: Duration::from_secs(300),
    })
    .expect("failed to build verifier")
}

#[tokio::test]
async fn test_valid_token_is_accepted() {
    let mock = MockServer::start().await;
    let key = TestKey::generate("key-1");

    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body(&[&key])))
        .mount(&mock)
        .await;

    let verifier = verifier_for(&mock).await;
    let token = key.sign(&claims(&mock.uri(), "api", unix_now() + 600));

    let verified = verifier.verify(&token).await.expect("token should verify");
    assert_eq!(verified.principal(), Some("alice"));
    assert!(verified.has_scope("weatherget"));
    assert!(verified.aud.contains("api"));
}

#[tokio::test]
async fn test_wrong_audience_is_rejected() {
    let mock = MockServer::start().await;
    let key = TestKey::generate("key-1");

    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body(&[&key])))
        .mount(&mock)
        .await;

    let verifier = verifier_for(&mock).await;
    let token = key.sign(&claims(&mock.uri(), "not-the-api", unix_now() + 600));

    let err = verifier.verify(&token).await.expect_err("must reject aud");
    assert!(matches!(err, VerifyError::Jwt(_)));
    assert!(!err.is_upstream());
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let mock = MockServer::start().await;
    let key = TestKey::generate("key-1");

    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body(&[&key])))
        .mount(&mock)
        .await;

    let verifier = verifier_for(&mock).await;
    // Well past the default validation leeway.
    let token = key.sign(&claims(&mock.uri(), "api", unix_now() - 3600));

    let err = verifier.verify(&token).await.expect_err("must reject exp");
    assert!(matches!(err, VerifyError::Jwt(_)));
}

#[tokio::test]
async fn test_wrong_issuer_is_rejected() {
    let mock = MockServer::start().await;
    let key = TestKey::generate("key-1");

    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body(&[&key])))
        .mount(&mock)
        .await;

    let verifier = verifier_for(&mock).await;
    let token = key.sign(&claims("http://some-other-issuer", "api", unix_now() + 600));

    let err = verifier.verify(&token).await.expect_err("must reject iss");
    assert!(matches!(err, VerifyError::Jwt(_)));
}

#[tokio::test]
async fn test_unknown_kid_triggers_refetch() {
    let mock = MockServer::start().await;
    let old_key = TestKey::generate("key-old");
    let new_key = TestKey::generate("key-new");

    // First fetch sees only the old key; after rotation the set has both.
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body(&[&old_key])))
        .up_to_n_times(1)
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(jwks_body(&[&old_key, &new_key])),
        )
        .mount(&mock)
        .await;

    let verifier = verifier_for(&mock).await;

    let old_token = old_key.sign(&claims(&mock.uri(), "api", unix_now() + 600));
    verifier
        .verify(&old_token)
        .await
        .expect("old key should verify");

    let new_token = new_key.sign(&claims(&mock.uri(), "api", unix_now() + 600));
    verifier
        .verify(&new_token)
        .await
        .expect("rotated key should verify after refetch");
}

#[tokio::test]
async fn test_kid_missing_from_key_set() {
    let mock = MockServer::start().await;
    let served = TestKey::generate("key-1");
    let rogue = TestKey::generate("key-rogue");

    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body(&[&served])))
        .mount(&mock)
        .await;

    let verifier = verifier_for(&mock).await;
    let token = rogue.sign(&claims(&mock.uri(), "api", unix_now() + 600));

    let err = verifier.verify(&token).await.expect_err("must reject kid");
    assert!(matches!(err, VerifyError::UnknownKeyId(kid) if kid == "key-rogue"));
}

#[tokio::test]
async fn test_symmetric_algorithm_is_rejected() {
    let mock = MockServer::start().await;
    let verifier = verifier_for(&mock).await;

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims(&mock.uri(), "api", unix_now() + 600),
        &EncodingKey::from_secret(b"shared-secret"),
    )
    .unwrap();

    let err = verifier.verify(&token).await.expect_err("must reject alg");
    assert!(matches!(err, VerifyError::UnsupportedAlgorithm(_)));
}

#[tokio::test]
async fn test_unreachable_issuer_is_an_upstream_error() {
    // Nothing listens on this port.
    let verifier = Verifier::new(VerifierConfig {
        issuer: "http://127.0.0.1:1".to_string(),
        audience: "api".to_string(),
        jwks_ttl: Duration::from_secs(300),
    })
    .unwrap();

    let key = TestKey::generate("key-1");
    let token = key.sign(&claims("http://127.0.0.1:1", "api", unix_now() + 600));

    let err = verifier.verify(&token).await.expect_err("must fail fetch");
    assert!(err.is_upstream());
}

#[tokio::test]
async fn test_malformed_token_is_rejected() {
    let mock = MockServer::start().await;
    let verifier = verifier_for(&mock).await;

    let err = verifier
        .verify("not-a-jwt")
        .await
        .expect_err("must reject junk");
    assert!(matches!(err, VerifyError::Jwt(_)));
}

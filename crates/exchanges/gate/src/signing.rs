use gatebridge_core::{Credentials, ExchangeError};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha512};

type HmacSha512 = Hmac<Sha512>;

/// Authentication headers of one APIv4 request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub key: String,
    pub timestamp: String,
    pub sign: String,
}

/// Sign a request the way APIv4 expects:
/// `HMAC-SHA512(secret, "METHOD\nPATH\nQUERY\nhex(SHA512(body))\nTIMESTAMP")`.
///
/// `path` includes the `/api/v4` prefix; `query` is the raw query string
/// without the leading `?`.
pub fn sign_request(
    credentials: &Credentials,
    method: &str,
    path: &str,
    query: &str,
    body: &str,
    timestamp: i64,
) -> Result<SignedHeaders, ExchangeError> {
    let body_hash = hex::encode(Sha512::digest(body.as_bytes()));
    let payload = format!(
        "{}\n{}\n{}\n{}\n{}",
        method, path, query, body_hash, timestamp
    );

    let mut mac = HmacSha512::new_from_slice(credentials.secret.as_bytes())
        .map_err(|e| ExchangeError::Config(format!("Unusable API secret: {}", e)))?;
    mac.update(payload.as_bytes());

    Ok(SignedHeaders {
        key: credentials.key.clone(),
        timestamp: timestamp.to_string(),
        sign: hex::encode(mac.finalize().into_bytes()),
    })
}

//! Signed, expiring URLs for stored images.
//!
//! A signed URL has the form `<public_url>/images/<image_id>?expires=<unix>&sig=<hex>` where
//! `sig = sha256(key | image_id | expires)`. The REST layer recomputes the signature before
//! serving bytes.

use crate::{FilesError, FilesResult};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

#[derive(Clone)]
pub struct UrlSigner {
    key: Vec<u8>,
    public_url: String,
    ttl_secs: i64,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("public_url", &self.public_url)
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl UrlSigner {
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidSigningConfig`] if the key is empty or the TTL is not
    /// positive.
    pub fn new(key: Vec<u8>, public_url: impl Into<String>, ttl_secs: i64) -> FilesResult<Self> {
        if key.is_empty() {
            return Err(FilesError::InvalidSigningConfig(
                "signing key cannot be empty".into(),
            ));
        }
        if ttl_secs <= 0 {
            return Err(FilesError::InvalidSigningConfig(
                "URL lifetime must be positive".into(),
            ));
        }
        let public_url = public_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            key,
            public_url,
            ttl_secs,
        })
    }

    /// Builds a URL for `image_id` that stays valid for the configured lifetime after `now`.
    pub fn sign_url(&self, image_id: &str, now: DateTime<Utc>) -> String {
        let expires = now.timestamp() + self.ttl_secs;
        format!(
            "{}/images/{}?expires={}&sig={}",
            self.public_url,
            image_id,
            expires,
            self.signature(image_id, expires)
        )
    }

    /// Checks a signature presented for `image_id`.
    ///
    /// # Errors
    ///
    /// - [`FilesError::InvalidSignature`] when the signature does not match
    /// - [`FilesError::ExpiredUrl`] when the signature matches but `expires` is in the past
    pub fn verify(
        &self,
        image_id: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> FilesResult<()> {
        let expected = self.signature(image_id, expires);
        let matches: bool = expected.as_bytes().ct_eq(signature.as_bytes()).into();
        if !matches {
            return Err(FilesError::InvalidSignature);
        }
        if now.timestamp() > expires {
            return Err(FilesError::ExpiredUrl);
        }
        Ok(())
    }

    fn signature(&self, image_id: &str, expires: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.key);
        hasher.update(b"|");
        hasher.update(image_id.as_bytes());
        hasher.update(b"|");
        hasher.update(expires.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn signer() -> UrlSigner {
        UrlSigner::new(b"test-key".to_vec(), "http://localhost:3002/", 60).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn query_param<'a>(url: &'a str, name: &str) -> &'a str {
        let query = url.split_once('?').unwrap().1;
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix(&format!("{}=", name)))
            .unwrap()
    }

    #[test]
    fn test_sign_url_shape() {
        let url = signer().sign_url("Skins/Acne/1-a.jpg", at(1_000));
        assert!(url.starts_with("http://localhost:3002/images/Skins/Acne/1-a.jpg?expires=1060&sig="));
    }

    #[test]
    fn test_verify_accepts_fresh_signature() {
        let s = signer();
        let url = s.sign_url("Skins/Tmp/1-a.png", at(1_000));
        let sig = query_param(&url, "sig");
        assert!(s.verify("Skins/Tmp/1-a.png", 1_060, sig, at(1_030)).is_ok());
    }

    #[test]
    fn test_verify_rejects_other_image() {
        let s = signer();
        let url = s.sign_url("Skins/Tmp/1-a.png", at(1_000));
        let sig = query_param(&url, "sig");
        assert!(matches!(
            s.verify("Skins/Tmp/2-b.png", 1_060, sig, at(1_030)),
            Err(FilesError::InvalidSignature)
        ));
    }

    #[test]
    fn test_verify_rejects_tampered_expiry() {
        let s = signer();
        let url = s.sign_url("Skins/Tmp/1-a.png", at(1_000));
        let sig = query_param(&url, "sig");
        assert!(matches!(
            s.verify("Skins/Tmp/1-a.png", 9_999, sig, at(1_030)),
            Err(FilesError::InvalidSignature)
        ));
    }

    #[test]
    fn test_verify_rejects_expired() {
        let s = signer();
        let url = s.sign_url("Skins/Tmp/1-a.png", at(1_000));
        let sig = query_param(&url, "sig");
        assert!(matches!(
            s.verify("Skins/Tmp/1-a.png", 1_060, sig, at(1_061)),
            Err(FilesError::ExpiredUrl)
        ));
    }

    #[test]
    fn test_new_rejects_bad_config() {
        assert!(UrlSigner::new(Vec::new(), "http://x", 60).is_err());
        assert!(UrlSigner::new(b"k".to_vec(), "http://x", 0).is_err());
    }
}

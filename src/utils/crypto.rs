use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Hex encoded SHA-256 of a file's content
pub fn checksum(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Digest used for Cloudinary request signatures. Accounts verify SHA-1
/// unless they were switched to SHA-256.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl SignatureAlgorithm {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Some(Self::Sha1),
            "sha256" | "sha-256" => Some(Self::Sha256),
            _ => None,
        }
    }
}

fn hex_digest<D: Digest>(to_sign: &str, api_secret: &str) -> String {
    let mut hasher = D::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Signs a set of API parameters the way Cloudinary expects:
/// keys sorted, `k=v` pairs joined by `&`, secret appended, then hashed.
/// Empty values are left out of the signature.
pub fn sign_params(params: &BTreeMap<String, String>, api_secret: &str, algorithm: SignatureAlgorithm) -> String {
    let to_sign = params
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    match algorithm {
        SignatureAlgorithm::Sha1 => hex_digest::<Sha1>(&to_sign, api_secret),
        SignatureAlgorithm::Sha256 => hex_digest::<Sha256>(&to_sign, api_secret),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_known_value() {
        assert_eq!(
            checksum(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_signature_ignores_insertion_order_and_empty_values() {
        let mut a = BTreeMap::new();
        a.insert("timestamp".to_string(), "1700000000".to_string());
        a.insert("folder".to_string(), "pm_connect".to_string());
        a.insert("public_id".to_string(), String::new());

        let mut b = BTreeMap::new();
        b.insert("folder".to_string(), "pm_connect".to_string());
        b.insert("timestamp".to_string(), "1700000000".to_string());

        let alg = SignatureAlgorithm::default();
        assert_eq!(sign_params(&a, "secret", alg), sign_params(&b, "secret", alg));
        assert_ne!(sign_params(&a, "secret", alg), sign_params(&a, "other", alg));
    }

    #[test]
    fn test_default_signature_is_sha1() {
        let mut params = BTreeMap::new();
        params.insert("folder".to_string(), "f".to_string());
        params.insert("timestamp".to_string(), "1".to_string());

        let signature = sign_params(&params, "s3cr3t", SignatureAlgorithm::default());
        assert_eq!(signature.len(), 40);
        assert_eq!(signature, hex::encode(Sha1::digest(b"folder=f&timestamp=1s3cr3t")));
    }

    #[test]
    fn test_sha256_signature_on_request() {
        let mut params = BTreeMap::new();
        params.insert("folder".to_string(), "f".to_string());
        params.insert("timestamp".to_string(), "1".to_string());

        let expected = hex::encode(Sha256::digest(b"folder=f&timestamp=1s3cr3t"));
        assert_eq!(sign_params(&params, "s3cr3t", SignatureAlgorithm::Sha256), expected);
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(SignatureAlgorithm::parse("SHA256"), Some(SignatureAlgorithm::Sha256));
        assert_eq!(SignatureAlgorithm::parse("sha-1"), Some(SignatureAlgorithm::Sha1));
        assert_eq!(SignatureAlgorithm::parse("md5"), None);
    }
}

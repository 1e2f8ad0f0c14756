use sha2::{Digest, Sha256};

/// Computes the deterministic signature of an API request
///
/// The signature is a SHA-256 over the operation name and the sorted
/// parameter key/value pairs, so parameter order never changes the key.
/// The API key is not among the parameters and never enters the signature.
pub fn request_signature(operation: &str, params: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cmp(&b.1)));

    let mut hasher = Sha256::new();
    hasher.update(operation.as_bytes());
    for (key, value) in sorted {
        hasher.update([0x1f]);
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }

    hex::encode(hasher.finalize())
}

use sha2::{Digest, Sha256};

/// Hash several fields in order as one SHA-256 digest.
///
/// Fields are fed to the hasher back to back with no separator.
pub fn sha256_parts<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

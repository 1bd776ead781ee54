use std::path::Path;

use blake3::Hasher;

use crate::error::HoldError;

/// Number of hex characters kept from the BLAKE3 digest.
const FINGERPRINT_LEN: usize = 16;

/// Computes a short, stable fingerprint of a path.
///
/// Used to name per-cache-home files inside a shared staging directory. The
/// path is hashed as given, so callers should canonicalize it first.
///
/// # Errors
///
/// Returns [`HoldError::InvalidUtf8Path`] if the path is not valid UTF-8.
pub fn fingerprint_path(path: &Path) -> Result<String, HoldError> {
    let text = path
        .to_str()
        .ok_or_else(|| HoldError::InvalidUtf8Path(path.to_path_buf()))?;

    let mut hasher = Hasher::new();
    hasher.update(text.as_bytes());
    let mut hex = hasher.finalize().to_hex().to_string();
    hex.truncate(FINGERPRINT_LEN);

    Ok(hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let first = fingerprint_path(Path::new("/home/ci/.gradle")).unwrap();
        let second = fingerprint_path(Path::new("/home/ci/.gradle")).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), FINGERPRINT_LEN);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_differs_per_path() {
        let a = fingerprint_path(Path::new("/home/ci/.gradle")).unwrap();
        let b = fingerprint_path(Path::new("/home/ci/other-gradle")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_matches_blake3_prefix() {
        let expected = blake3::hash(b"hello world").to_hex().to_string();
        let fingerprint = fingerprint_path(Path::new("hello world")).unwrap();
        assert_eq!(fingerprint, &expected[..FINGERPRINT_LEN]);
    }

    #[test]
    #[cfg(unix)]
    fn test_fingerprint_rejects_non_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new(OsStr::from_bytes(b"/tmp/\xff\xfe"));
        let result = fingerprint_path(path);
        assert!(matches!(result, Err(HoldError::InvalidUtf8Path(_))));
    }
}

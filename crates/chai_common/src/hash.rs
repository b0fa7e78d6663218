//! Content fingerprints for cache invalidation.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A 64-bit content fingerprint computed using XXH3.
///
/// Two macro-expanded sources with the same `Fingerprint` are assumed to compile
/// to the same object. The value is persisted as a decimal integer, so `Display`
/// and `FromStr` round-trip through that representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Computes a fingerprint from a byte slice using XXH3-64.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_64(data))
    }

    /// Reads a file and fingerprints its full contents.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read(path)?;
        Ok(Self::from_bytes(&content))
    }
}

impl From<u64> for Fingerprint {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a persisted fingerprint is not a decimal `u64`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid fingerprint '{text}'")]
pub struct ParseFingerprintError {
    /// The text that failed to parse.
    pub text: String,
}

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ParseFingerprintError {
                text: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = Fingerprint::from_bytes(b"int main() { return 0; }");
        let b = Fingerprint::from_bytes(b"int main() { return 0; }");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_differ() {
        let a = Fingerprint::from_bytes(b"int a;");
        let b = Fingerprint::from_bytes(b"int b;");
        assert_ne!(a, b);
    }

    #[test]
    fn display_is_decimal() {
        let h = Fingerprint::from(42);
        assert_eq!(h.to_string(), "42");
        let h = Fingerprint::from_bytes(b"test");
        assert!(h.to_string().chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn parse_display_output() {
        let h = Fingerprint::from_bytes(b"parse me");
        let back: Fingerprint = h.to_string().parse().unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "12ab".parse::<Fingerprint>().unwrap_err();
        assert_eq!(err.text, "12ab");
        assert!("-5".parse::<Fingerprint>().is_err());
        assert!("".parse::<Fingerprint>().is_err());
    }

    #[test]
    fn from_file_matches_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.i");
        std::fs::write(&path, "int main() {}").unwrap();
        assert_eq!(
            Fingerprint::from_file(&path).unwrap(),
            Fingerprint::from_bytes(b"int main() {}")
        );
    }

    #[test]
    fn from_file_missing_errors() {
        assert!(Fingerprint::from_file(Path::new("/nonexistent/main.i")).is_err());
    }
}

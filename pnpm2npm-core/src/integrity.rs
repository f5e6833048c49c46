use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Checks that `value` is a Subresource Integrity string npm can verify:
/// one or more space separated `<algorithm>-<base64 digest>` tokens, each
/// with a supported algorithm and a digest of the right length.
pub fn validate(value: &str) -> Result<(), String> {
    let mut seen = false;

    for token in value.split_whitespace() {
        seen = true;

        let token = token.split('?').next().unwrap_or(token);
        let Some((algorithm, digest)) = token.split_once('-') else {
            return Err(format!("integrity token {token:?} has no algorithm prefix"));
        };

        let expected = match algorithm {
            "sha1" => 20,
            "sha256" => 32,
            "sha384" => 48,
            "sha512" => 64,
            other => return Err(format!("unsupported integrity algorithm {other:?}")),
        };

        let bytes = STANDARD
            .decode(digest)
            .map_err(|err| format!("integrity digest for {algorithm} is not base64: {err}"))?;

        if bytes.len() != expected {
            return Err(format!(
                "{algorithm} digest is {} bytes, expected {expected}",
                bytes.len()
            ));
        }
    }

    if seen {
        Ok(())
    } else {
        Err("integrity is empty".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA512: &str = "sha512-v2kDEe57lecTulaDIuNTPy3Ry4gLGJ6Z1O3vE1krgXZNrsQ+mqGKPoGj6rbrU5tQDe2XYJGAWXRN4aqjO5NUGg==";

    #[test]
    fn accepts_sha512() {
        assert!(validate(SHA512).is_ok());
    }

    #[test]
    fn accepts_multiple_tokens() {
        let value = format!("sha1-2jmj7l5rSw0yVb/vlWAYkK/YBwk= {SHA512}");
        assert!(validate(&value).is_ok());
    }

    #[test]
    fn rejects_truncated_digest() {
        assert!(validate("sha512-abcd").is_err());
    }

    #[test]
    fn rejects_unknown_algorithm() {
        assert!(validate("md5-1B2M2Y8AsgTpgAmY7PhCfg==").is_err());
    }

    #[test]
    fn rejects_empty() {
        assert!(validate("   ").is_err());
    }
}

//! Domains serving `/keyspub.txt`.

use url::Url;

use super::{require_https, NameError, UrlError};

const MAX_LEN: usize = 256;

pub(super) fn normalize_name(raw: &str) -> String {
    let mut name = raw.trim().to_lowercase();
    while let Some(rest) = name
        .strip_prefix("https://")
        .or_else(|| name.strip_prefix("http://"))
    {
        name = rest.trim_start().to_string();
    }
    name.trim_end_matches(|c: char| c == '/' || c.is_whitespace())
        .to_string()
}

pub(super) fn validate_name(name: &str) -> Result<(), NameError> {
    super::check_name(name, MAX_LEN, |c| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.'
    })?;
    if name.starts_with('.') || name.ends_with('.') || name.contains("..") {
        return Err(NameError::InvalidChars);
    }
    Ok(())
}

/// The proof always lives at `https://<name>/keyspub.txt`.
pub(super) fn validate_url(name: &str, url: &Url) -> Result<String, UrlError> {
    require_https(url)?;
    let host = url.host_str().unwrap_or_default();
    if host != name {
        return Err(UrlError::BadHost(host.to_string()));
    }
    Ok(format!("https://{name}/keyspub.txt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_names() {
        assert_eq!(validate_name("example.com"), Ok(()));
        assert_eq!(validate_name("sub.key-proof.org"), Ok(()));
        assert_eq!(validate_name(".example.com"), Err(NameError::InvalidChars));
        assert_eq!(validate_name("example..com"), Err(NameError::InvalidChars));
        assert_eq!(validate_name("example_com"), Err(NameError::InvalidChars));
        assert_eq!(
            validate_name(&"a".repeat(MAX_LEN + 1)),
            Err(NameError::TooLong(MAX_LEN))
        );
    }

    #[test]
    fn path_is_rewritten() {
        for raw in [
            "https://example.com/keyspub.txt",
            "https://example.com/",
            "https://example.com/about",
        ] {
            assert_eq!(
                validate_url("example.com", &Url::parse(raw).unwrap()).unwrap(),
                "https://example.com/keyspub.txt"
            );
        }
        assert!(matches!(
            validate_url("example.com", &Url::parse("https://evil.com/keyspub.txt").unwrap()),
            Err(UrlError::BadHost(_))
        ));
        assert!(matches!(
            validate_url("example.com", &Url::parse("http://example.com/keyspub.txt").unwrap()),
            Err(UrlError::BadScheme(_))
        ));
    }
}

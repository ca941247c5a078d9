//! Armoring of signed messages for posting on external services.
//!
//! ```text
//! BEGIN MESSAGE.
//! 8vBnDgpJvOysm5K rLp3ba7dWmpc0fT yfhSSTq9eGe43y9 RzJ51tIZvmKGtrh
//! AyQa9mqJZN9bkXz ....
//! END MESSAGE.
//! ```
//!
//! The body is base62, broken into 15-character words grouped four per line
//! and terminated by a literal `.`. An optional brand may sit between `BEGIN`
//! and `MESSAGE.`; the footer must repeat it.

use crate::{base62, CryptoError};

const WORD_LEN: usize = 15;
const WORDS_PER_LINE: usize = 4;

/// A decoded armored message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Armored {
    pub brand: Option<String>,
    pub data: Vec<u8>,
}

fn header(brand: Option<&str>) -> String {
    match brand {
        Some(b) if !b.is_empty() => format!("BEGIN {b} MESSAGE."),
        _ => "BEGIN MESSAGE.".to_string(),
    }
}

fn footer(brand: Option<&str>) -> String {
    match brand {
        Some(b) if !b.is_empty() => format!("END {b} MESSAGE."),
        _ => "END MESSAGE.".to_string(),
    }
}

/// Armor bytes with an optional brand.
pub fn armor(data: &[u8], brand: Option<&str>) -> String {
    let encoded = base62::encode(data);
    let words: Vec<&str> = encoded
        .as_bytes()
        .chunks(WORD_LEN)
        .map(|w| std::str::from_utf8(w).unwrap_or_default())
        .collect();
    let lines: Vec<String> = words
        .chunks(WORDS_PER_LINE)
        .map(|line| line.join(" "))
        .collect();

    format!("{}\n{}.\n{}", header(brand), lines.join("\n"), footer(brand))
}

/// Parse an armored message. Leading and trailing whitespace is ignored;
/// anything else outside the header and footer is an error.
pub fn dearmor(armored: &str) -> Result<Armored, CryptoError> {
    let s = armored.trim();
    let rest = s
        .strip_prefix("BEGIN ")
        .ok_or_else(|| CryptoError::Armor("missing BEGIN".to_string()))?;
    let header_end = rest
        .find("MESSAGE.")
        .ok_or_else(|| CryptoError::Armor("missing MESSAGE. in header".to_string()))?;
    let brand = rest[..header_end].trim();
    let brand = (!brand.is_empty()).then(|| brand.to_string());

    let rest = &rest[header_end + "MESSAGE.".len()..];
    let dot = rest
        .find('.')
        .ok_or_else(|| CryptoError::Armor("unterminated body".to_string()))?;
    let body: String = rest[..dot].chars().filter(|c| !c.is_whitespace()).collect();
    if !body.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CryptoError::Armor("invalid body character".to_string()));
    }

    let trailer = rest[dot + 1..].trim();
    let expected = footer(brand.as_deref());
    if trailer != expected {
        return Err(CryptoError::Armor(format!(
            "footer mismatch: expected {expected:?}"
        )));
    }

    Ok(Armored {
        brand,
        data: base62::decode(&body)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_words_of_15_four_per_line() {
        let out = armor(&[7u8; 100], None);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "BEGIN MESSAGE.");
        assert_eq!(*lines.last().unwrap(), "END MESSAGE.");
        let first = lines[1].split(' ').collect::<Vec<_>>();
        assert_eq!(first.len(), 4);
        assert!(first.iter().all(|w| w.len() == 15));
        assert!(lines[lines.len() - 2].ends_with('.'));
    }

    #[test]
    fn brand_is_carried_in_header_and_footer() {
        let out = armor(b"hello", Some("KEYPROOF"));
        assert!(out.starts_with("BEGIN KEYPROOF MESSAGE."));
        assert!(out.ends_with("END KEYPROOF MESSAGE."));
        let parsed = dearmor(&out).unwrap();
        assert_eq!(parsed.brand.as_deref(), Some("KEYPROOF"));
        assert_eq!(parsed.data, b"hello");
    }

    #[test]
    fn dearmor_tolerates_reflowed_whitespace() {
        let out = armor(&[42u8; 90], None);
        let reflowed = out.replace('\n', "  ");
        assert_eq!(dearmor(&reflowed).unwrap().data, vec![42u8; 90]);
    }

    #[test]
    fn footer_must_match_brand() {
        let out = armor(b"hello", Some("KEYPROOF"));
        let broken = out.replace("END KEYPROOF", "END OTHER");
        assert!(matches!(dearmor(&broken), Err(CryptoError::Armor(_))));
    }

    #[test]
    fn missing_terminator_is_rejected() {
        assert!(dearmor("BEGIN MESSAGE. abc").is_err());
        assert!(dearmor("hello").is_err());
    }
}

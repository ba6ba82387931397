use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::ops::Range;

pub const WHATSAPP: &str = "whatsapp";
pub const TELEGRAM: &str = "telegram";
pub const PHONE_NUMBER: &str = "phone_number";
pub const URL: &str = "url";
pub const EMAIL: &str = "email";

lazy_static! {
    // Evaluation order matters: the messenger detectors also contain
    // phone-number-like digit groups and must win over `phone_number`.
    static ref DETECTORS: Vec<(&'static str, Regex)> = vec![
        (
            WHATSAPP,
            Regex::new(
                r"(?i)\b(?:whatsapp|wa|w\.a|whtsap|whatsap|whtsp|wa\.me)[.\s:]*(?:\+?[0-9]{1,3}[-.\s]?)?(?:\([0-9]{1,4}\)[-.\s]?)?[0-9]{1,4}[-.\s]?[0-9]{1,4}[-.\s]?[0-9]{1,9}\b",
            )
            .unwrap(),
        ),
        (
            TELEGRAM,
            Regex::new(
                r"(?i)\b(?:telegram|tele|t\.me|tlgrm)[.\s:]*(?:@|https?://t\.me/)?[\w_]{5,32}\b",
            )
            .unwrap(),
        ),
        (
            PHONE_NUMBER,
            Regex::new(
                r"(?i)\b(?:\+?[0-9]{1,3}[-.\s]?)?(?:\([0-9]{1,4}\)[-.\s]?)?[0-9]{1,4}[-.\s]?[0-9]{1,4}[-.\s]?[0-9]{1,9}\b",
            )
            .unwrap(),
        ),
        (
            URL,
            Regex::new(r"(?i)https?://(?:[-\w.]|(?:%[\da-fA-F]{2}))+[/\w.-]*(?:\?[-\w%&=.]*)?")
                .unwrap(),
        ),
        (
            EMAIL,
            Regex::new(r"(?i)\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap(),
        ),
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternMatch {
    pub name: &'static str,
    pub matched: String,
    pub span: Range<usize>,
}

/// Regex detectors for contact details and links.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternMatcher;

impl PatternMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Run the detectors over raw comment text and return the first hit.
    pub fn find(&self, raw_text: &str) -> Option<PatternMatch> {
        DETECTORS.iter().find_map(|&(name, ref regex)| {
            regex.find(raw_text).map(|m| PatternMatch {
                name,
                matched: m.as_str().to_string(),
                span: m.range(),
            })
        })
    }

    pub fn detector_names(&self) -> Vec<&'static str> {
        DETECTORS.iter().map(|(name, _)| *name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messengers_checked_before_phone_numbers() {
        let matcher = PatternMatcher::new();
        assert_eq!(
            matcher.detector_names(),
            vec![WHATSAPP, TELEGRAM, PHONE_NUMBER, URL, EMAIL]
        );

        let hit = matcher.find("WA: 081234567890").unwrap();
        assert_eq!(hit.name, WHATSAPP);
        assert_eq!(hit.matched, "WA: 081234567890");
    }

    #[test]
    fn test_phone_number() {
        let matcher = PatternMatcher::new();
        let hit = matcher.find("Hubungi saya di 081234567890").unwrap();
        assert_eq!(hit.name, PHONE_NUMBER);
        assert_eq!(hit.matched, "081234567890");
        assert_eq!(hit.span, 16..28);
    }

    #[test]
    fn test_telegram_handle() {
        let matcher = PatternMatcher::new();
        let hit = matcher.find("Telegram: @username").unwrap();
        assert_eq!(hit.name, TELEGRAM);

        let hit = matcher.find("join telegram slotgacor88").unwrap();
        assert_eq!(hit.name, TELEGRAM);
    }

    #[test]
    fn test_url_and_email() {
        let matcher = PatternMatcher::new();
        assert_eq!(
            matcher.find("Kunjungi https://example.com/judi").unwrap().name,
            URL
        );
        assert_eq!(
            matcher.find("kirim ke admin@situs.com ya").unwrap().name,
            EMAIL
        );
    }

    #[test]
    fn test_case_insensitive() {
        let matcher = PatternMatcher::new();
        assert_eq!(matcher.find("WHATSAPP 0812 3456 7890").unwrap().name, WHATSAPP);
        assert_eq!(matcher.find("HTTPS://EXAMPLE.COM").unwrap().name, URL);
    }

    #[test]
    fn test_clean_text() {
        let matcher = PatternMatcher::new();
        assert!(matcher.find("Great video, really enjoyed the content!").is_none());
        assert!(matcher.find("").is_none());
    }
}

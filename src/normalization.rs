use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref TAG_REGEX: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
    // Five or more digits in a row is most likely a phone number
    static ref DIGIT_RUN_REGEX: Regex = Regex::new(r"[0-9]{5,}").unwrap();
}

/// Leetspeak substitutions undone before keyword matching.
const LEET_MAP: &[(char, char)] = &[
    ('0', 'o'),
    ('1', 'i'),
    ('3', 'e'),
    ('4', 'a'),
    ('5', 's'),
    ('7', 't'),
    ('@', 'a'),
];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedText {
    /// Fully normalized text, leetspeak undone where allowed.
    pub normalized: String,
    /// Same pipeline without the leetspeak pass.
    pub literal: String,
}

impl NormalizedText {
    /// True when leetspeak substitution changed the text.
    pub fn was_deobfuscated(&self) -> bool {
        self.normalized != self.literal
    }
}

/// Canonicalizes comment text for keyword matching.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, text: &str) -> String {
        self.normalize_text(text).normalized
    }

    pub fn normalize_text(&self, text: &str) -> NormalizedText {
        let canonical = self.canonicalize(text);
        let deobfuscated = self.undo_leetspeak(&canonical);

        NormalizedText {
            normalized: collapse_whitespace(&deobfuscated),
            literal: collapse_whitespace(&canonical),
        }
    }

    /// True when compatibility decomposition changes the raw text, i.e. it
    /// uses look-alike code points such as full-width letters.
    pub fn is_obfuscation_suspect(&self, text: &str) -> bool {
        !text.nfkd().eq(text.chars())
    }

    // Entities, tags, NFKD and case folding.
    fn canonicalize(&self, text: &str) -> String {
        let decoded = html_escape::decode_html_entities(text);
        let stripped = TAG_REGEX.replace_all(&decoded, " ");
        let decomposed: String = stripped.nfkd().collect();
        decomposed.to_lowercase()
    }

    fn undo_leetspeak(&self, text: &str) -> String {
        if DIGIT_RUN_REGEX.is_match(text) {
            return text.to_string();
        }

        text.chars()
            .map(|ch| {
                LEET_MAP
                    .iter()
                    .find(|(from, _)| *from == ch)
                    .map(|(_, to)| *to)
                    .unwrap_or(ch)
            })
            .collect()
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text, " ").trim().to_string()
}

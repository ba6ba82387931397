use crate::normalization::{NormalizedText, TextNormalizer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    Gambling,
    Spam,
    #[serde(alias = "Contact Info", alias = "contact_info")]
    ContactInfo,
    #[default]
    Other,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Gambling => "Gambling",
            Category::Spam => "Spam",
            Category::ContactInfo => "Contact Info",
            Category::Other => "Other",
        };
        f.write_str(label)
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', ' '], "").as_str() {
            "gambling" => Ok(Category::Gambling),
            "spam" => Ok(Category::Spam),
            "contactinfo" | "contact" => Ok(Category::ContactInfo),
            "other" => Ok(Category::Other),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub term: String,
    #[serde(default)]
    pub category: Category,
}

impl BlacklistEntry {
    pub fn new(term: impl Into<String>, category: Category) -> Self {
        Self {
            term: term.into(),
            category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WhitelistEntry {
    pub term: String,
}

impl WhitelistEntry {
    pub fn new(term: impl Into<String>) -> Self {
        Self { term: term.into() }
    }
}

/// A configured term in both normalized forms, so it compares like for
/// like with comment text.
#[derive(Debug, Clone)]
struct ListKey {
    normalized: String,
    literal: String,
}

impl ListKey {
    fn new(term: &str) -> Self {
        let NormalizedText {
            normalized,
            literal,
        } = TextNormalizer::new().normalize_text(term);
        Self {
            normalized,
            literal,
        }
    }

    fn is_blank(&self) -> bool {
        self.literal.is_empty()
    }

    fn found_in(&self, text: &NormalizedText) -> bool {
        text.literal.contains(self.literal.as_str())
            || text.normalized.contains(self.normalized.as_str())
    }
}

/// A blacklist entry found in a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlacklistHit<'a> {
    pub entry: &'a BlacklistEntry,
    /// False when the term only shows up once leetspeak is undone.
    pub verbatim: bool,
}

/// Case-insensitive substring matching against the blacklist and whitelist.
#[derive(Debug, Clone, Default)]
pub struct ListMatcher {
    // in configured order
    blacklist: Vec<(ListKey, BlacklistEntry)>,
    whitelist: Vec<ListKey>,
}

impl ListMatcher {
    /// Duplicate terms (ignoring case) keep their first occurrence; blank
    /// terms are dropped since they would match everything.
    pub fn new(blacklist: Vec<BlacklistEntry>, whitelist: Vec<WhitelistEntry>) -> Self {
        let mut seen = HashSet::new();
        let blacklist = blacklist
            .into_iter()
            .filter_map(|entry| {
                let key = ListKey::new(&entry.term);
                if key.is_blank() || !seen.insert(key.literal.clone()) {
                    log::debug!("Skipping blank or duplicate blacklist term '{}'", entry.term);
                    return None;
                }
                Some((key, entry))
            })
            .collect();

        let mut seen = HashSet::new();
        let whitelist = whitelist
            .iter()
            .map(|entry| ListKey::new(&entry.term))
            .filter(|key| !key.is_blank() && seen.insert(key.literal.clone()))
            .collect();

        Self {
            blacklist,
            whitelist,
        }
    }

    /// First blacklisted term, in configured order, present in the text.
    pub fn match_blacklist(&self, text: &NormalizedText) -> Option<BlacklistHit<'_>> {
        self.blacklist.iter().find_map(|(key, entry)| {
            key.found_in(text).then(|| BlacklistHit {
                entry,
                verbatim: !text.was_deobfuscated()
                    || text.literal.contains(key.literal.as_str()),
            })
        })
    }

    pub fn match_whitelist(&self, text: &NormalizedText) -> bool {
        self.whitelist.iter().any(|key| key.found_in(text))
    }

    pub fn blacklist_len(&self) -> usize {
        self.blacklist.len()
    }

    pub fn whitelist_len(&self) -> usize {
        self.whitelist.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(raw: &str) -> NormalizedText {
        TextNormalizer::new().normalize_text(raw)
    }

    fn matcher() -> ListMatcher {
        ListMatcher::new(
            vec![
                BlacklistEntry::new("slot online", Category::Gambling),
                BlacklistEntry::new("Judi Online", Category::Gambling),
                BlacklistEntry::new("whatsapp", Category::ContactInfo),
                BlacklistEntry::new("JUDI ONLINE", Category::Spam),
                BlacklistEntry::new("   ", Category::Other),
            ],
            vec![WhitelistEntry::new("Tutorial"), WhitelistEntry::new("game review")],
        )
    }

    #[test]
    fn test_blacklist_first_match_wins() {
        let lists = matcher();
        let hit = lists
            .match_blacklist(&text("main slot online atau judi online"))
            .unwrap();
        assert_eq!(hit.entry.term, "slot online");
        assert!(hit.verbatim);

        let hit = lists.match_blacklist(&text("situs judi online")).unwrap();
        assert_eq!(hit.entry.term, "Judi Online");
        assert_eq!(hit.entry.category, Category::Gambling);
    }

    #[test]
    fn test_duplicates_and_blank_terms_dropped() {
        let lists = matcher();
        assert_eq!(lists.blacklist_len(), 3);
        assert!(lists.match_blacklist(&text("nothing to see")).is_none());
        assert!(lists.match_blacklist(&text("")).is_none());
    }

    #[test]
    fn test_whitelist_is_case_insensitive() {
        let lists = matcher();
        assert!(lists.match_whitelist(&text("ini tutorial game slot")));
        assert!(lists.match_whitelist(&text("A GAME REVIEW")));
        assert!(!lists.match_whitelist(&text("main slot online")));
    }

    #[test]
    fn test_terms_with_leet_characters_match_verbatim() {
        let lists = ListMatcher::new(
            vec![BlacklistEntry::new("Togel 4D", Category::Gambling)],
            vec![WhitelistEntry::new("top 10")],
        );

        let hit = lists.match_blacklist(&text("ayo main togel 4d hari ini")).unwrap();
        assert_eq!(hit.entry.term, "Togel 4D");
        assert!(hit.verbatim);

        // Digit runs disable leetspeak undo in the comment; the literal form
        // still matches
        let hit = lists
            .match_blacklist(&text("togel 4d wa 081234567890"))
            .unwrap();
        assert!(hit.verbatim);

        assert!(lists.match_whitelist(&text("Top 10 game terbaik")));
    }

    #[test]
    fn test_leetspeak_only_match_is_not_verbatim() {
        let lists = matcher();
        let hit = lists.match_blacklist(&text("situs jud1 0nl1ne")).unwrap();
        assert_eq!(hit.entry.term, "Judi Online");
        assert!(!hit.verbatim);
    }

    #[test]
    fn test_terms_with_compatibility_characters() {
        let lists = ListMatcher::new(
            vec![BlacklistEntry::new("ｓｌｏｔ gacor", Category::Gambling)],
            vec![],
        );
        let hit = lists.match_blacklist(&text("main slot gacor")).unwrap();
        assert!(hit.verbatim);
    }

    #[test]
    fn test_category_accepts_display_label() {
        let entry: BlacklistEntry =
            toml::from_str("term = \"hubungi\"\ncategory = \"Contact Info\"").unwrap();
        assert_eq!(entry.category, Category::ContactInfo);
        assert_eq!(entry.category.to_string(), "Contact Info");

        let entry: BlacklistEntry = toml::from_str("term = \"x\"").unwrap();
        assert_eq!(entry.category, Category::Other);
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("Contact Info".parse::<Category>(), Ok(Category::ContactInfo));
        assert_eq!("contact_info".parse::<Category>(), Ok(Category::ContactInfo));
        assert_eq!("GAMBLING".parse::<Category>(), Ok(Category::Gambling));
        assert!("lottery".parse::<Category>().is_err());
    }
}

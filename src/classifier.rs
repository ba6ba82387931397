use crate::comment::Comment;
use crate::heuristics::HeuristicScorer;
use crate::lists::{BlacklistEntry, Category, ListMatcher, WhitelistEntry};
use crate::normalization::TextNormalizer;
use crate::patterns::PatternMatcher;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Comments longer than this (in characters) that contain a digit are
/// flagged before any other check runs. Any Unicode digit counts, full-width
/// ones included.
pub const LONG_COMMENT_THRESHOLD: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReasonKind {
    Obfuscation,
    Pattern(String),
    Blacklist { term: String, category: Category },
    HeuristicScore(usize),
    LongNumericComment,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub flagged: bool,
    pub reason_kind: ReasonKind,
    pub reason_text: String,
}

impl Verdict {
    fn clean() -> Self {
        Self {
            flagged: false,
            reason_kind: ReasonKind::None,
            reason_text: String::new(),
        }
    }

    fn flag(reason_kind: ReasonKind, reason_text: String) -> Self {
        Self {
            flagged: true,
            reason_kind,
            reason_text,
        }
    }
}

/// Immutable blacklist/whitelist state. Replaced wholesale on reload.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    lists: ListMatcher,
}

impl ConfigSnapshot {
    pub fn new(blacklist: Vec<BlacklistEntry>, whitelist: Vec<WhitelistEntry>) -> Self {
        Self {
            lists: ListMatcher::new(blacklist, whitelist),
        }
    }

    pub fn lists(&self) -> &ListMatcher {
        &self.lists
    }
}

/// Rule-based comment classifier.
///
/// Classification never fails and performs no I/O. The pipeline is
/// `Send + Sync`; concurrent callers each read one consistent snapshot.
pub struct ClassificationPipeline {
    normalizer: TextNormalizer,
    patterns: PatternMatcher,
    scorer: HeuristicScorer,
    active: RwLock<Arc<ConfigSnapshot>>,
}

impl ClassificationPipeline {
    pub fn new(snapshot: ConfigSnapshot) -> Self {
        Self {
            normalizer: TextNormalizer::new(),
            patterns: PatternMatcher::new(),
            scorer: HeuristicScorer::new(),
            active: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Swap in a new snapshot. In-flight classifications finish against the
    /// snapshot they started with.
    pub fn reload(&self, snapshot: ConfigSnapshot) {
        log::info!(
            "Reloading lists: {} blacklisted terms, {} whitelisted terms",
            snapshot.lists.blacklist_len(),
            snapshot.lists.whitelist_len()
        );
        let snapshot = Arc::new(snapshot);
        match self.active.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }

    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        match self.active.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn classify(&self, comment: &Comment) -> Verdict {
        self.classify_text(&comment.raw_text)
    }

    pub fn classify_text(&self, raw_text: &str) -> Verdict {
        let snapshot = self.snapshot();
        self.classify_with(&snapshot, raw_text)
    }

    fn classify_with(&self, snapshot: &ConfigSnapshot, raw_text: &str) -> Verdict {
        // Runs before the whitelist, so whitelisted terms cannot rescue it
        if raw_text.chars().count() > LONG_COMMENT_THRESHOLD
            && raw_text.chars().any(char::is_numeric)
        {
            return Verdict::flag(
                ReasonKind::LongNumericComment,
                "Long comment with numbers".to_string(),
            );
        }

        if self.normalizer.is_obfuscation_suspect(raw_text) {
            return Verdict::flag(
                ReasonKind::Obfuscation,
                "Contains obfuscated characters".to_string(),
            );
        }

        let text = self.normalizer.normalize_text(raw_text);
        let lists = snapshot.lists();

        if lists.match_whitelist(&text) {
            log::debug!("Whitelisted: {}", text.normalized);
            return Verdict::clean();
        }

        if let Some(hit) = self.patterns.find(raw_text) {
            return Verdict::flag(
                ReasonKind::Pattern(hit.name.to_string()),
                format!("Suspicious pattern: {}", hit.name),
            );
        }

        if let Some(hit) = lists.match_blacklist(&text) {
            let entry = hit.entry;
            if !hit.verbatim {
                // Only visible once leetspeak was undone
                return Verdict::flag(
                    ReasonKind::Obfuscation,
                    format!("Contains obfuscated blacklisted term: {}", entry.term),
                );
            }
            return Verdict::flag(
                ReasonKind::Blacklist {
                    term: entry.term.clone(),
                    category: entry.category,
                },
                format!("Blacklisted term: {} ({})", entry.term, entry.category),
            );
        }

        let count = self.scorer.score(&text.normalized);
        if self.scorer.is_flagged(count) {
            return Verdict::flag(
                ReasonKind::HeuristicScore(count),
                format!("Multiple gambling indicators: {} found", count),
            );
        }

        Verdict::clean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn snapshot() -> ConfigSnapshot {
        ConfigSnapshot::new(
            vec![
                BlacklistEntry::new("judi online", Category::Gambling),
                BlacklistEntry::new("slot online", Category::Gambling),
                BlacklistEntry::new("togel", Category::Gambling),
                BlacklistEntry::new("casino online", Category::Gambling),
                BlacklistEntry::new("click here", Category::Spam),
                BlacklistEntry::new("whatsapp", Category::ContactInfo),
                BlacklistEntry::new("telegram", Category::ContactInfo),
                BlacklistEntry::new("hubungi", Category::ContactInfo),
                BlacklistEntry::new("kontak", Category::ContactInfo),
            ],
            vec![
                WhitelistEntry::new("game review"),
                WhitelistEntry::new("tutorial"),
                WhitelistEntry::new("educational"),
            ],
        )
    }

    fn pipeline() -> ClassificationPipeline {
        ClassificationPipeline::new(snapshot())
    }

    #[test]
    fn test_direct_blacklist_match() {
        let verdict = pipeline().classify_text("Kunjungi situs judi online terpercaya");
        assert!(verdict.flagged);
        assert_eq!(
            verdict.reason_kind,
            ReasonKind::Blacklist {
                term: "judi online".to_string(),
                category: Category::Gambling,
            }
        );
        assert_eq!(verdict.reason_text, "Blacklisted term: judi online (Gambling)");
    }

    #[test]
    fn test_leetspeak_blacklist_term_reported_as_obfuscation() {
        let verdict = pipeline().classify_text("Kunjungi situs jud1 0nline terpercaya");
        assert!(verdict.flagged);
        assert_eq!(verdict.reason_kind, ReasonKind::Obfuscation);
        assert!(verdict.reason_text.contains("judi online"));
    }

    #[test]
    fn test_blacklist_term_containing_digits() {
        let pipeline = ClassificationPipeline::new(ConfigSnapshot::new(
            vec![BlacklistEntry::new("togel 4d", Category::Gambling)],
            vec![],
        ));
        let verdict = pipeline.classify_text("ayo main togel 4d hari ini");
        assert!(verdict.flagged);
        assert_eq!(
            verdict.reason_kind,
            ReasonKind::Blacklist {
                term: "togel 4d".to_string(),
                category: Category::Gambling,
            }
        );

        let verdict = pipeline.classify_text("ayo main t0gel 4d hari ini");
        assert_eq!(verdict.reason_kind, ReasonKind::Obfuscation);
    }

    #[test]
    fn test_compatibility_characters_short_circuit() {
        let verdict = pipeline().classify_text("Ｓｌｏｔ ｇａｃｏｒ hari ini");
        assert!(verdict.flagged);
        assert_eq!(verdict.reason_kind, ReasonKind::Obfuscation);
        assert_eq!(verdict.reason_text, "Contains obfuscated characters");
    }

    #[test]
    fn test_whitelist_overrides_blacklist() {
        let pipeline = pipeline();
        let verdict = pipeline.classify_text("tutorial game slot yang bagus");
        assert!(!verdict.flagged);
        assert_eq!(verdict.reason_kind, ReasonKind::None);

        let verdict = pipeline.classify_text("Tutorial: main slot online yuk");
        assert!(!verdict.flagged);

        let verdict = pipeline.classify_text("Main slot online yuk");
        assert!(verdict.flagged);
    }

    #[test]
    fn test_whitelist_overrides_patterns() {
        let verdict = pipeline().classify_text("Educational channel, email me at guru@sekolah.id");
        assert!(!verdict.flagged);
    }

    #[test]
    fn test_phone_pattern() {
        let verdict = pipeline().classify_text("Hubungi saya di 081234567890");
        assert!(verdict.flagged);
        assert_eq!(verdict.reason_kind, ReasonKind::Pattern("phone_number".to_string()));
        assert_eq!(verdict.reason_text, "Suspicious pattern: phone_number");
    }

    #[test]
    fn test_messenger_and_url_patterns() {
        let pipeline = pipeline();
        assert_eq!(
            pipeline.classify_text("WA: 081234567890").reason_kind,
            ReasonKind::Pattern("whatsapp".to_string())
        );
        assert_eq!(
            pipeline.classify_text("Telegram: @username").reason_kind,
            ReasonKind::Pattern("telegram".to_string())
        );
        assert_eq!(
            pipeline.classify_text("Kunjungi https://example.com/judi").reason_kind,
            ReasonKind::Pattern("url".to_string())
        );
    }

    #[test]
    fn test_heuristic_threshold() {
        let pipeline = pipeline();

        let verdict = pipeline.classify_text("What a jackpot of a game, loved it");
        assert!(!verdict.flagged);

        let verdict = pipeline.classify_text("Slot gacor maxwin dijamin jackpot terbesar");
        assert!(verdict.flagged);
        match verdict.reason_kind {
            ReasonKind::HeuristicScore(count) => assert!(count >= 2),
            other => panic!("unexpected reason {:?}", other),
        }
        assert!(verdict.reason_text.starts_with("Multiple gambling indicators"));
    }

    #[test]
    fn test_long_comment_with_digits_checked_first() {
        let pipeline = pipeline();

        let long_with_digit = format!("{} 7", "tutorial yang sangat panjang ".repeat(20));
        assert!(long_with_digit.chars().count() > LONG_COMMENT_THRESHOLD);
        let verdict = pipeline.classify_text(&long_with_digit);
        assert!(verdict.flagged);
        assert_eq!(verdict.reason_kind, ReasonKind::LongNumericComment);

        let long_without_digit = "komentar biasa saja ".repeat(30);
        assert!(!pipeline.classify_text(&long_without_digit).flagged);
    }

    #[test]
    fn test_long_comment_with_full_width_digit() {
        let text = format!("{}１", "komentar biasa saja ".repeat(30));
        assert!(text.chars().count() > LONG_COMMENT_THRESHOLD);
        let verdict = pipeline().classify_text(&text);
        assert_eq!(verdict.reason_kind, ReasonKind::LongNumericComment);
    }

    #[test]
    fn test_clean_and_degenerate_input() {
        let pipeline = pipeline();
        assert!(!pipeline.classify_text("Great video, really enjoyed the content!").flagged);
        assert_eq!(pipeline.classify_text(""), Verdict::clean());
        assert!(!pipeline.classify_text("   \n\t ").flagged);
        assert!(!pipeline.classify_text("Mantap 👍🔥").flagged);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let pipeline = pipeline();
        let comment = Comment::from_text("Kunjungi situs judi online terpercaya");
        assert_eq!(pipeline.classify(&comment), pipeline.classify(&comment));
    }

    #[test]
    fn test_reload_swaps_snapshot() {
        let pipeline = pipeline();
        assert!(!pipeline.classify_text("beli koin murah").flagged);

        let held = pipeline.snapshot();
        pipeline.reload(ConfigSnapshot::new(
            vec![BlacklistEntry::new("koin murah", Category::Spam)],
            vec![],
        ));

        let verdict = pipeline.classify_text("beli koin murah");
        assert_eq!(
            verdict.reason_kind,
            ReasonKind::Blacklist {
                term: "koin murah".to_string(),
                category: Category::Spam,
            }
        );
        // A snapshot taken before the reload is unaffected
        assert_eq!(held.lists().blacklist_len(), 9);
    }

    #[test]
    fn test_concurrent_classification() {
        let pipeline = Arc::new(pipeline());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pipeline = Arc::clone(&pipeline);
                thread::spawn(move || {
                    (0..50)
                        .map(|_| pipeline.classify_text("situs judi online").flagged)
                        .all(|flagged| flagged)
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}

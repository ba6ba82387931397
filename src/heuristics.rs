/// Number of distinct indicators needed before a comment is flagged.
pub const FLAG_THRESHOLD: usize = 2;

/// Weak gambling signals. A single one is common in normal discussion
/// (game reviews, giveaways); several together rarely are.
pub const GAMBLING_INDICATORS: &[&str] = &[
    // Indonesian gambling terms
    "judi",
    "judol",
    "slot",
    "casino",
    "togel",
    "toto",
    "bet",
    "taruhan",
    "jackpot",
    "maxwin",
    "bonus",
    "deposit",
    "withdraw",
    "rtp",
    "gacor",
    // Gambling site boilerplate
    "daftar",
    "login",
    "link alternatif",
    "situs resmi",
    "situs terpercaya",
    // Promotional language
    "dijamin",
    "terbesar",
    "terpercaya",
    "resmi",
    "official",
    "terbukti",
    "kemenangan",
    "hadiah",
    "free spin",
    "scatter",
    "wild",
];

#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    indicators: Vec<String>,
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicScorer {
    pub fn new() -> Self {
        Self::with_indicators(GAMBLING_INDICATORS.iter().copied())
    }

    pub fn with_indicators<I, S>(indicators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            indicators: indicators
                .into_iter()
                .map(|s| s.into().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Count vocabulary entries occurring in the text. Entries are counted
    /// independently, so "situs terpercaya" also counts "terpercaya".
    pub fn score(&self, normalized_text: &str) -> usize {
        self.indicators_found(normalized_text).len()
    }

    pub fn indicators_found<'a>(&'a self, normalized_text: &str) -> Vec<&'a str> {
        self.indicators
            .iter()
            .filter(|indicator| normalized_text.contains(indicator.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn is_flagged(&self, count: usize) -> bool {
        count >= FLAG_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_indicator_does_not_flag() {
        let scorer = HeuristicScorer::new();
        let count = scorer.score("what a jackpot of a game, loved it");
        assert_eq!(count, 1);
        assert!(!scorer.is_flagged(count));
    }

    #[test]
    fn test_multiple_indicators_flag() {
        let scorer = HeuristicScorer::new();
        let count = scorer.score("slot gacor maxwin dijamin jackpot terbesar");
        assert_eq!(count, 6);
        assert!(scorer.is_flagged(count));
    }

    #[test]
    fn test_overlapping_indicators_counted_independently() {
        let scorer = HeuristicScorer::new();
        let found = scorer.indicators_found("ini situs terpercaya");
        assert_eq!(found, vec!["situs terpercaya", "terpercaya"]);
    }

    #[test]
    fn test_custom_vocabulary() {
        let scorer = HeuristicScorer::with_indicators(["Poker", "", "chips"]);
        assert_eq!(scorer.score("poker night, bring chips"), 2);
        assert_eq!(scorer.score(""), 0);
    }
}

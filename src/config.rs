use crate::classifier::ConfigSnapshot;
use crate::lists::{BlacklistEntry, Category, WhitelistEntry};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Prefix for environment variables overriding file settings.
pub const ENV_PREFIX: &str = "JUDOL_GUARD_";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("blank term in {0}")]
    BlankTerm(&'static str),
    #[error("duplicate blacklist term: {0}")]
    DuplicateTerm(String),
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub whitelist: WhitelistConfig,
    #[serde(default)]
    pub blacklist: Vec<BlacklistEntry>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub auto_delete: bool,
    #[serde(default = "default_max_comments_per_scan")]
    pub max_comments_per_scan: usize,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_removal_concurrency")]
    pub removal_concurrency: usize,
    #[serde(default = "default_removal_delay_ms")]
    pub removal_delay_ms: u64,
}

fn default_max_comments_per_scan() -> usize {
    500
}

fn default_max_pages() -> usize {
    10
}

fn default_page_size() -> u32 {
    100
}

fn default_removal_concurrency() -> usize {
    4
}

fn default_removal_delay_ms() -> u64 {
    250
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_delete: false,
            max_comments_per_scan: default_max_comments_per_scan(),
            max_pages: default_max_pages(),
            page_size: default_page_size(),
            removal_concurrency: default_removal_concurrency(),
            removal_delay_ms: default_removal_delay_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct YouTubeConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// OAuth bearer token, obtained elsewhere.
    pub access_token: Option<String>,
    /// Read-only API key, used for fetching when no token is set.
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_api_base() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            access_token: None,
            api_key: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct WhitelistConfig {
    #[serde(default)]
    pub terms: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let gambling = [
            "judi online",
            "slot online",
            "togel",
            "casino online",
            "situs judi",
            "agen judi",
            "bandar judi",
            "poker online",
            "situs slot",
            "slot gacor",
            "slot maxwin",
            "slot demo",
            "rtp slot",
            "bocoran slot",
            "link alternatif",
            "bonus new member",
        ];
        let spam = [
            "make money fast",
            "work from home",
            "earn money online",
            "click here",
            "free money",
            "get rich quick",
            "earn $",
        ];
        let contact = [
            "whatsapp",
            "wa:",
            "hubungi",
            "kontak",
            "contact",
            "telegram",
            "dm for",
            "dm me",
            "direct message",
        ];

        let blacklist = gambling
            .iter()
            .map(|t| BlacklistEntry::new(*t, Category::Gambling))
            .chain(spam.iter().map(|t| BlacklistEntry::new(*t, Category::Spam)))
            .chain(
                contact
                    .iter()
                    .map(|t| BlacklistEntry::new(*t, Category::ContactInfo)),
            )
            .collect();

        let whitelist = [
            "game slot",
            "slot game",
            "video game",
            "game review",
            "tutorial",
            "review",
            "critique",
            "analysis",
            "educational",
            "learning",
            "course",
            "class",
        ]
        .iter()
        .map(|t| t.to_string())
        .collect();

        Self {
            settings: Settings::default(),
            youtube: YouTubeConfig::default(),
            whitelist: WhitelistConfig { terms: whitelist },
            blacklist,
        }
    }
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to built-in defaults.
    /// Environment overrides are applied either way.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            log::warn!(
                "Config file not found: {}, using built-in defaults",
                path.display()
            );
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        log::info!("Saved configuration to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for entry in &self.blacklist {
            let key = entry.term.trim().to_lowercase();
            if key.is_empty() {
                return Err(ConfigError::BlankTerm("blacklist"));
            }
            if !seen.insert(key) {
                return Err(ConfigError::DuplicateTerm(entry.term.clone()));
            }
        }
        if self.whitelist.terms.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::BlankTerm("whitelist"));
        }
        if self.settings.removal_concurrency == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "removal_concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.settings.page_size == 0 || self.settings.page_size > 100 {
            return Err(ConfigError::InvalidSetting {
                name: "page_size",
                reason: "must be between 1 and 100".to_string(),
            });
        }
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(format!("{ENV_PREFIX}{name}")).ok())
    }

    /// Apply overrides from `lookup`, which maps an unprefixed upper-case
    /// setting name to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("AUTO_DELETE") {
            self.settings.auto_delete = parse_bool("auto_delete", &value)?;
        }
        if let Some(value) = lookup("MAX_COMMENTS_PER_SCAN") {
            self.settings.max_comments_per_scan = parse_number("max_comments_per_scan", &value)?;
        }
        if let Some(value) = lookup("MAX_PAGES") {
            self.settings.max_pages = parse_number("max_pages", &value)?;
        }
        if let Some(value) = lookup("REMOVAL_CONCURRENCY") {
            self.settings.removal_concurrency = parse_number("removal_concurrency", &value)?;
        }
        if let Some(value) = lookup("REMOVAL_DELAY_MS") {
            self.settings.removal_delay_ms = parse_number("removal_delay_ms", &value)?;
        }
        if let Some(value) = lookup("ACCESS_TOKEN") {
            self.youtube.access_token = Some(value);
        }
        if let Some(value) = lookup("API_KEY") {
            self.youtube.api_key = Some(value);
        }
        if let Some(value) = lookup("API_BASE") {
            self.youtube.api_base = value;
        }
        self.validate()
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(
            self.blacklist.clone(),
            self.whitelist
                .terms
                .iter()
                .map(|t| WhitelistEntry::new(t.clone()))
                .collect(),
        )
    }

    /// Returns false if the term (ignoring case) is already listed.
    pub fn add_blacklist_term(&mut self, term: &str, category: Category) -> bool {
        let term = term.trim();
        if term.is_empty() || self.blacklist.iter().any(|e| e.term.eq_ignore_ascii_case(term)) {
            return false;
        }
        self.blacklist.push(BlacklistEntry::new(term, category));
        true
    }

    pub fn remove_blacklist_term(&mut self, term: &str) -> bool {
        let before = self.blacklist.len();
        self.blacklist
            .retain(|e| !e.term.eq_ignore_ascii_case(term.trim()));
        self.blacklist.len() != before
    }

    pub fn add_whitelist_term(&mut self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty()
            || self
                .whitelist
                .terms
                .iter()
                .any(|t| t.eq_ignore_ascii_case(term))
        {
            return false;
        }
        self.whitelist.terms.push(term.to_string());
        true
    }

    pub fn remove_whitelist_term(&mut self, term: &str) -> bool {
        let before = self.whitelist.terms.len();
        self.whitelist
            .terms
            .retain(|t| !t.eq_ignore_ascii_case(term.trim()));
        self.whitelist.terms.len() != before
    }
}

pub fn generate_default_config<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    AppConfig::default().save_to_file(path)
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(ConfigError::InvalidSetting {
            name,
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidSetting {
            name,
            reason: format!("expected a number, got '{}'", value.trim()),
        })
}

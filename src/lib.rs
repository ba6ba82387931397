pub mod batch;
pub mod classifier;
pub mod comment;
pub mod config;
pub mod heuristics;
pub mod lists;
pub mod moderation;
pub mod normalization;
pub mod patterns;
pub mod youtube;

pub use classifier::{ClassificationPipeline, ConfigSnapshot, ReasonKind, Verdict};
pub use comment::{Comment, CommentId, ThreadId, VideoId};
pub use config::AppConfig;
pub use lists::{BlacklistEntry, Category, WhitelistEntry};
pub use moderation::{
    ActionOutcome, ErrorKind, ModerationAction, ModerationActuator, PlatformClient, PlatformError,
};
pub use youtube::YouTubeClient;

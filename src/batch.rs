use crate::classifier::{ClassificationPipeline, ReasonKind, Verdict};
use crate::comment::{Comment, CommentId, ThreadId};
use crate::moderation::{ActionOutcome, ErrorKind, ModerationAction, ModerationActuator};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Error messages kept in a removal summary.
const MAX_SAMPLED_ERRORS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct FlaggedComment {
    pub comment: Comment,
    pub verdict: Verdict,
}

/// Classify comments and keep the flagged ones.
pub fn scan(pipeline: &ClassificationPipeline, comments: Vec<Comment>) -> Vec<FlaggedComment> {
    let total = comments.len();
    let flagged: Vec<FlaggedComment> = comments
        .into_iter()
        .filter_map(|comment| {
            let verdict = pipeline.classify(&comment);
            verdict.flagged.then_some(FlaggedComment { comment, verdict })
        })
        .collect();

    log::info!("Scanned {} comments, {} flagged", total, flagged.len());
    flagged
}

/// Group verdict reasons for display, e.g. "Gambling (3), Pattern: url (1)".
pub fn reason_summary(flagged: &[FlaggedComment]) -> String {
    let mut groups: BTreeMap<String, usize> = BTreeMap::new();
    for item in flagged {
        let label = match &item.verdict.reason_kind {
            ReasonKind::Blacklist { category, .. } => category.to_string(),
            ReasonKind::Pattern(name) => format!("Pattern: {name}"),
            ReasonKind::Obfuscation => "Obfuscation".to_string(),
            ReasonKind::HeuristicScore(_) => "Gambling indicators".to_string(),
            ReasonKind::LongNumericComment => "Long comment with numbers".to_string(),
            ReasonKind::None => continue,
        };
        *groups.entry(label).or_default() += 1;
    }

    groups
        .into_iter()
        .map(|(label, count)| format!("{label} ({count})"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy)]
pub struct RemovalOptions {
    /// Removals in flight at once.
    pub concurrency: usize,
    /// Pause held by each worker after a removal, before the next starts.
    pub delay: Duration,
}

impl Default for RemovalOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            delay: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RemovalSummary {
    pub deleted: usize,
    pub marked_as_spam: usize,
    pub failed: usize,
    /// First few failure messages.
    pub errors: Vec<String>,
    pub results: Vec<(CommentId, ActionOutcome)>,
}

impl RemovalSummary {
    fn record(&mut self, comment_id: CommentId, outcome: ActionOutcome) {
        match (outcome.success, outcome.action) {
            (true, ModerationAction::Deleted) => self.deleted += 1,
            (true, ModerationAction::MarkedAsSpam) => self.marked_as_spam += 1,
            _ => {
                self.failed += 1;
                if self.errors.len() < MAX_SAMPLED_ERRORS {
                    self.errors.push(format!("{}: {}", comment_id, outcome.message));
                }
            }
        }
        self.results.push((comment_id, outcome));
    }

    pub fn quota_exhausted(&self) -> bool {
        self.results
            .iter()
            .any(|(_, o)| o.error_kind == Some(ErrorKind::QuotaExceeded))
    }
}

/// Remove a batch of comments with bounded concurrency.
///
/// Repeated comment ids are removed once, so no two attempts ever target
/// the same comment.
pub async fn remove_flagged(
    actuator: &ModerationActuator,
    targets: Vec<(CommentId, Option<ThreadId>)>,
    options: RemovalOptions,
) -> RemovalSummary {
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut seen = HashSet::new();
    let mut handles = Vec::new();

    for (comment_id, thread_id) in targets {
        if !seen.insert(comment_id.clone()) {
            log::debug!("Skipping duplicate removal of {}", comment_id);
            continue;
        }

        let actuator = actuator.clone();
        let semaphore = Arc::clone(&semaphore);
        let delay = options.delay;
        let id = comment_id.clone();
        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let outcome = actuator.remove(&id, thread_id.as_ref()).await;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            outcome
        });
        handles.push((comment_id, handle));
    }

    let mut summary = RemovalSummary::default();
    for (comment_id, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Removal task for {} did not complete: {}", comment_id, e);
                ActionOutcome {
                    action: ModerationAction::NoAction,
                    success: false,
                    error_kind: Some(ErrorKind::Unknown),
                    message: format!("Removal task did not complete: {e}"),
                }
            }
        };
        summary.record(comment_id, outcome);
    }

    log::info!(
        "Removal finished: {} deleted, {} marked as spam, {} failed",
        summary.deleted,
        summary.marked_as_spam,
        summary.failed
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ConfigSnapshot;
    use crate::lists::{BlacklistEntry, Category, WhitelistEntry};
    use crate::moderation::tests::ScriptedClient;
    use crate::moderation::PlatformError;

    fn comment(id: &str, text: &str) -> Comment {
        let mut comment = Comment::from_text(text);
        comment.id = CommentId::new(id);
        comment.thread_id = ThreadId::new(format!("thread-{id}"));
        comment
    }

    fn pipeline() -> ClassificationPipeline {
        ClassificationPipeline::new(ConfigSnapshot::new(
            vec![
                BlacklistEntry::new("judi online", Category::Gambling),
                BlacklistEntry::new("dm me", Category::ContactInfo),
            ],
            vec![WhitelistEntry::new("tutorial")],
        ))
    }

    #[test]
    fn test_scan_keeps_flagged_only() {
        let flagged = scan(
            &pipeline(),
            vec![
                comment("a", "Situs judi online terbaik"),
                comment("b", "Nice tutorial, thanks"),
                comment("c", "dm me for info"),
                comment("d", "Cek https://promo.example"),
            ],
        );

        let ids: Vec<&str> = flagged.iter().map(|f| f.comment.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "d"]);
        assert_eq!(
            reason_summary(&flagged),
            "Contact Info (1), Gambling (1), Pattern: url (1)"
        );
    }

    #[tokio::test]
    async fn test_remove_flagged_summarizes_outcomes() {
        let client = Arc::new(ScriptedClient::new(
            Err(PlatformError::new(ErrorKind::PermissionDenied, "not yours")),
            Ok(()),
            Ok(()),
        ));
        let actuator = ModerationActuator::new(client.clone());

        let summary = remove_flagged(
            &actuator,
            vec![
                (CommentId::new("a"), Some(ThreadId::new("thread-a"))),
                (CommentId::new("b"), None),
                (CommentId::new("a"), Some(ThreadId::new("thread-a"))),
            ],
            RemovalOptions {
                concurrency: 2,
                delay: Duration::ZERO,
            },
        )
        .await;

        assert_eq!(summary.deleted, 0);
        assert_eq!(summary.marked_as_spam, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.results.len(), 2);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].starts_with("b: "));
        assert!(!summary.quota_exhausted());

        let calls = client.calls();
        assert_eq!(calls.iter().filter(|c| *c == "delete:a").count(), 1);
    }

    #[tokio::test]
    async fn test_sampled_errors_are_capped() {
        let client = Arc::new(ScriptedClient::new(
            Err(PlatformError::new(ErrorKind::QuotaExceeded, "quota")),
            Ok(()),
            Ok(()),
        ));
        let actuator = ModerationActuator::new(client);

        let targets = (0..5)
            .map(|i| (CommentId::new(format!("c{i}")), None))
            .collect();
        let summary = remove_flagged(&actuator, targets, RemovalOptions::default()).await;

        assert_eq!(summary.failed, 5);
        assert_eq!(summary.errors.len(), MAX_SAMPLED_ERRORS);
        assert!(summary.quota_exhausted());
    }
}

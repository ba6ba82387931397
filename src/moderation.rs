use crate::comment::{CommentId, ThreadId};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    QuotaExceeded,
    NotFound,
    PermissionDenied,
    BadRequest,
    CommentsDisabled,
    Unknown,
}

impl ErrorKind {
    /// Errors the fallback ladder can work around with a weaker action.
    pub fn allows_fallback(self) -> bool {
        matches!(self, ErrorKind::PermissionDenied | ErrorKind::BadRequest)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::QuotaExceeded => "API quota exceeded",
            ErrorKind::NotFound => "comment not found",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::BadRequest => "bad request",
            ErrorKind::CommentsDisabled => "comments disabled",
            ErrorKind::Unknown => "unknown error",
        };
        f.write_str(label)
    }
}

/// A failed platform call, already classified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct PlatformError {
    pub kind: ErrorKind,
    pub message: String,
}

impl PlatformError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Moderation states the actuator sets. Only rejection hides a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationStatus {
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ModerationStatus::Rejected => "rejected",
        }
    }
}

/// Write operations the actuator needs from an authenticated platform
/// client.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    async fn delete(&self, comment_id: &CommentId) -> Result<(), PlatformError>;

    async fn set_moderation_status(
        &self,
        thread_id: &ThreadId,
        status: ModerationStatus,
    ) -> Result<(), PlatformError>;

    async fn mark_as_spam(&self, comment_id: &CommentId) -> Result<(), PlatformError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModerationAction {
    Deleted,
    MarkedAsSpam,
    NoAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub action: ModerationAction,
    pub success: bool,
    pub error_kind: Option<ErrorKind>,
    pub message: String,
}

impl ActionOutcome {
    fn succeeded(action: ModerationAction, message: impl Into<String>) -> Self {
        Self {
            action,
            success: true,
            error_kind: None,
            message: message.into(),
        }
    }

    fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            action: ModerationAction::NoAction,
            success: false,
            error_kind: Some(kind),
            message: message.into(),
        }
    }
}

/// Removal strategies, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Delete,
    SetModerationStatus,
    MarkAsSpam,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Next(Tier),
    Done(ActionOutcome),
}

impl Tier {
    /// Transition table of the removal ladder.
    ///
    /// `captured` is the most specific error seen by earlier tiers; it is
    /// reported when the last tier fails with an unclassified error.
    pub fn next(
        self,
        result: &Result<(), PlatformError>,
        has_thread: bool,
        captured: Option<ErrorKind>,
    ) -> Step {
        match (self, result) {
            (Tier::Delete, Ok(())) => Step::Done(ActionOutcome::succeeded(
                ModerationAction::Deleted,
                "Comment deleted successfully",
            )),
            (Tier::Delete, Err(e)) if e.kind.allows_fallback() => {
                if has_thread {
                    Step::Next(Tier::SetModerationStatus)
                } else {
                    Step::Done(ActionOutcome::failed(
                        e.kind,
                        format!("Cannot moderate comment without a thread id ({})", e.kind),
                    ))
                }
            }
            (Tier::Delete, Err(e)) => Step::Done(ActionOutcome::failed(e.kind, e.message.clone())),

            (Tier::SetModerationStatus, Ok(())) => Step::Done(ActionOutcome::succeeded(
                ModerationAction::MarkedAsSpam,
                "Comment rejected through moderation",
            )),
            (Tier::SetModerationStatus, Err(_)) => Step::Next(Tier::MarkAsSpam),

            (Tier::MarkAsSpam, Ok(())) => Step::Done(ActionOutcome::succeeded(
                ModerationAction::MarkedAsSpam,
                "Comment marked as spam; the platform may not remove it immediately",
            )),
            (Tier::MarkAsSpam, Err(e)) => {
                let kind = match e.kind {
                    ErrorKind::Unknown => captured.unwrap_or(ErrorKind::Unknown),
                    specific => specific,
                };
                Step::Done(ActionOutcome::failed(
                    kind,
                    format!("All removal methods failed: {}", e.message),
                ))
            }
        }
    }
}

/// Removes flagged comments through a delete → moderate → mark-as-spam
/// fallback ladder.
///
/// Only the owner of a comment may delete it. For comments written by
/// others the weaker tiers hide or report it instead, which the platform
/// applies asynchronously.
///
/// Clones share in-flight state: a removal requested while another one for
/// the same comment is running waits for it and reports its outcome.
#[derive(Clone)]
pub struct ModerationActuator {
    client: Arc<dyn PlatformClient>,
    in_flight: Arc<Mutex<HashMap<CommentId, Arc<OnceCell<ActionOutcome>>>>>,
}

impl ModerationActuator {
    pub fn new(client: Arc<dyn PlatformClient>) -> Self {
        Self {
            client,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Attempt removal. Every failure is classified into the outcome; this
    /// never returns an error.
    pub async fn remove(
        &self,
        comment_id: &CommentId,
        thread_id: Option<&ThreadId>,
    ) -> ActionOutcome {
        if comment_id.is_empty() {
            error!("Invalid comment id: '{}'", comment_id);
            return ActionOutcome::failed(ErrorKind::BadRequest, "Invalid comment ID format");
        }

        let (slot, joined) = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match in_flight.get(comment_id) {
                Some(slot) => (Arc::clone(slot), true),
                None => {
                    let slot = Arc::new(OnceCell::new());
                    in_flight.insert(comment_id.clone(), Arc::clone(&slot));
                    (slot, false)
                }
            }
        };
        if joined {
            debug!("Comment {}: joining removal already in progress", comment_id);
        }

        let outcome = slot
            .get_or_init(|| self.run_ladder(comment_id, thread_id))
            .await
            .clone();

        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if in_flight
            .get(comment_id)
            .is_some_and(|current| Arc::ptr_eq(current, &slot))
        {
            in_flight.remove(comment_id);
        }
        outcome
    }

    async fn run_ladder(
        &self,
        comment_id: &CommentId,
        thread_id: Option<&ThreadId>,
    ) -> ActionOutcome {
        let thread_id = thread_id.filter(|t| !t.is_empty());
        let mut tier = Tier::Delete;
        let mut captured: Option<ErrorKind> = None;

        loop {
            let result = self.attempt(tier, comment_id, thread_id).await;
            if let Err(e) = &result {
                warn!("{:?} failed for comment {}: {}", tier, comment_id, e);
                if e.kind != ErrorKind::Unknown {
                    captured = Some(e.kind);
                }
            }

            match tier.next(&result, thread_id.is_some(), captured) {
                Step::Next(next) => {
                    debug!("Comment {}: falling back from {:?} to {:?}", comment_id, tier, next);
                    tier = next;
                }
                Step::Done(outcome) => {
                    if outcome.success {
                        info!("Comment {}: {:?} ({})", comment_id, outcome.action, outcome.message);
                    } else {
                        error!("Comment {}: removal failed ({})", comment_id, outcome.message);
                    }
                    return outcome;
                }
            }
        }
    }

    async fn attempt(
        &self,
        tier: Tier,
        comment_id: &CommentId,
        thread_id: Option<&ThreadId>,
    ) -> Result<(), PlatformError> {
        match tier {
            Tier::Delete => {
                debug!("Attempting to delete comment {}", comment_id);
                self.client.delete(comment_id).await
            }
            Tier::SetModerationStatus => match thread_id {
                Some(thread_id) => {
                    debug!("Attempting to reject thread {}", thread_id);
                    self.client
                        .set_moderation_status(thread_id, ModerationStatus::Rejected)
                        .await
                }
                None => Err(PlatformError::new(ErrorKind::BadRequest, "thread id not provided")),
            },
            Tier::MarkAsSpam => {
                debug!("Attempting to mark comment {} as spam", comment_id);
                self.client.mark_as_spam(comment_id).await
            }
        }
    }
}

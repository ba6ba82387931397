use crate::comment::{Comment, CommentId, ThreadId, VideoId};
use crate::config::YouTubeConfig;
use crate::moderation::{ErrorKind, ModerationStatus, PlatformClient, PlatformError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use log::{debug, error, info, warn};
use regex::Regex;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

lazy_static! {
    static ref VIDEO_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap();
}

/// Pause between comment pages to stay clear of rate limits.
const PAGE_DELAY: Duration = Duration::from_millis(500);

/// Extract a video id from a watch URL, a short URL or a bare id.
pub fn extract_video_id(input: &str) -> Option<VideoId> {
    let input = input.trim();
    if VIDEO_ID_REGEX.is_match(input) {
        return Some(VideoId::new(input));
    }

    let url = Url::parse(input).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");
    let candidate = match host {
        "youtu.be" => url.path_segments()?.next()?.to_string(),
        "youtube.com" => match url.path_segments()?.next()? {
            "watch" => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned())?,
            "shorts" | "embed" | "live" => url.path_segments()?.nth(1)?.to_string(),
            _ => return None,
        },
        _ => return None,
    };

    VIDEO_ID_REGEX
        .is_match(&candidate)
        .then(|| VideoId::new(candidate))
}

/// Map an API failure to an [`ErrorKind`], preferring the API's reason code
/// over the HTTP status.
pub fn classify_error(status: u16, body: &str) -> ErrorKind {
    let reasons: Vec<String> = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|r| r.error.errors.into_iter().map(|e| e.reason).collect())
        .unwrap_or_default();

    for reason in &reasons {
        match reason.as_str() {
            "quotaExceeded"
            | "dailyLimitExceeded"
            | "rateLimitExceeded"
            | "userRateLimitExceeded" => return ErrorKind::QuotaExceeded,
            "commentNotFound" | "videoNotFound" | "notFound" | "parentCommentNotFound" => {
                return ErrorKind::NotFound
            }
            "commentsDisabled" => return ErrorKind::CommentsDisabled,
            "forbidden" | "insufficientPermissions" | "authError" => {
                return ErrorKind::PermissionDenied
            }
            "badRequest" | "invalidValue" | "operationNotSupported" | "processingFailure" => {
                return ErrorKind::BadRequest
            }
            _ => {}
        }
    }

    match status {
        400 => ErrorKind::BadRequest,
        401 | 403 => ErrorKind::PermissionDenied,
        404 => ErrorKind::NotFound,
        429 => ErrorKind::QuotaExceeded,
        _ => ErrorKind::Unknown,
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorItem {
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadPage {
    #[serde(default)]
    pub items: Vec<CommentThreadItem>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadItem {
    pub id: String,
    pub snippet: ThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSnippet {
    pub top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLevelComment {
    pub id: String,
    pub snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnippet {
    #[serde(default)]
    pub author_display_name: String,
    #[serde(default)]
    pub text_display: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ItemList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    snippet: ChannelSnippet,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
    #[serde(default)]
    statistics: VideoStatistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_title: String,
    published_at: Option<DateTime<Utc>>,
}

// The API sends counts as decimal strings
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    comment_count: Option<String>,
}

/// Summary of a video, shown before a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoInfo {
    pub id: VideoId,
    pub title: String,
    pub channel_title: String,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: Option<u64>,
    pub comment_count: Option<u64>,
}

impl From<VideoItem> for VideoInfo {
    fn from(item: VideoItem) -> Self {
        let count = |value: Option<String>| value.and_then(|v| v.parse().ok());
        Self {
            id: VideoId::new(item.id),
            title: item.snippet.title,
            channel_title: item.snippet.channel_title,
            published_at: item.snippet.published_at,
            view_count: count(item.statistics.view_count),
            comment_count: count(item.statistics.comment_count),
        }
    }
}

impl CommentThreadItem {
    pub fn into_comment(self) -> Comment {
        let top = self.snippet.top_level_comment;
        Comment {
            id: CommentId::new(top.id),
            thread_id: ThreadId::new(self.id),
            author: top.snippet.author_display_name,
            raw_text: top.snippet.text_display,
            published_at: top.snippet.published_at,
        }
    }
}

/// YouTube Data API v3 client for fetching and moderating comments.
pub struct YouTubeClient {
    client: Client,
    config: YouTubeConfig,
}

impl YouTubeClient {
    pub fn new(config: YouTubeConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("judol-guard/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match (&self.config.access_token, &self.config.api_key) {
            (Some(token), _) => request.bearer_auth(token),
            (None, Some(key)) => request.query(&[("key", key)]),
            (None, None) => request,
        }
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<Response, PlatformError> {
        let response = self.authorize(request).send().await.map_err(|e| {
            error!("{} request failed: {}", what, e);
            PlatformError::new(ErrorKind::Unknown, format!("{what} request failed: {e}"))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let kind = classify_error(status.as_u16(), &body);
        warn!("{} returned HTTP {} ({})", what, status.as_u16(), kind);
        Err(PlatformError::new(
            kind,
            format!("{what} failed with HTTP {}: {kind}", status.as_u16()),
        ))
    }

    /// Fetch one page of top-level comment threads.
    pub async fn fetch_comments(
        &self,
        video_id: &VideoId,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<CommentThreadPage, PlatformError> {
        let mut request = self.client.get(self.endpoint("commentThreads")).query(&[
            ("part", "snippet"),
            ("videoId", video_id.as_str()),
            ("textFormat", "html"),
        ]);
        request = request.query(&[("maxResults", max_results)]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = self.execute(request, "commentThreads.list").await?;
        response.json::<CommentThreadPage>().await.map_err(|e| {
            PlatformError::new(ErrorKind::Unknown, format!("Malformed comment page: {e}"))
        })
    }

    /// Fetch up to `max_pages` pages of comments, flattened. Paging stops
    /// once `limit` comments are collected.
    pub async fn fetch_all_comments(
        &self,
        video_id: &VideoId,
        page_size: u32,
        max_pages: usize,
        limit: usize,
    ) -> Result<Vec<Comment>, PlatformError> {
        let mut comments = Vec::new();
        let mut page_token: Option<String> = None;

        for page in 0..max_pages {
            let remaining = limit.saturating_sub(comments.len());
            if remaining == 0 {
                debug!("Comment limit of {} reached", limit);
                break;
            }
            if page > 0 {
                tokio::time::sleep(PAGE_DELAY).await;
            }

            let max_results = u32::try_from(remaining).unwrap_or(u32::MAX).min(page_size);
            let response = self
                .fetch_comments(video_id, page_token.as_deref(), max_results)
                .await?;
            debug!("Fetched page {} with {} threads", page + 1, response.items.len());
            comments.extend(response.items.into_iter().map(CommentThreadItem::into_comment));

            match response.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        comments.truncate(limit);
        info!("Fetched {} comments for video {}", comments.len(), video_id);
        Ok(comments)
    }

    /// Title of the authenticated user's channel, if they have one.
    pub async fn channel_name(&self) -> Result<Option<String>, PlatformError> {
        let request = self
            .client
            .get(self.endpoint("channels"))
            .query(&[("part", "snippet"), ("mine", "true")]);

        let response = self.execute(request, "channels.list").await?;
        let channels: ItemList<ChannelItem> = response.json().await.map_err(|e| {
            PlatformError::new(ErrorKind::Unknown, format!("Malformed channel list: {e}"))
        })?;
        Ok(channels.items.into_iter().next().map(|c| c.snippet.title))
    }

    pub async fn video_info(&self, video_id: &VideoId) -> Result<Option<VideoInfo>, PlatformError> {
        let request = self
            .client
            .get(self.endpoint("videos"))
            .query(&[("part", "snippet,statistics"), ("id", video_id.as_str())]);

        let response = self.execute(request, "videos.list").await?;
        let videos: ItemList<VideoItem> = response.json().await.map_err(|e| {
            PlatformError::new(ErrorKind::Unknown, format!("Malformed video list: {e}"))
        })?;

        let info = videos.items.into_iter().next().map(VideoInfo::from);
        if info.is_none() {
            warn!("Video not found: {}", video_id);
        }
        Ok(info)
    }

    /// Cheapest authenticated call; false only when the quota is spent.
    pub async fn check_quota(&self) -> bool {
        let request = self
            .client
            .get(self.endpoint("channels"))
            .query(&[("part", "id"), ("mine", "true"), ("maxResults", "1")]);

        match self.execute(request, "channels.list").await {
            Err(e) if e.kind == ErrorKind::QuotaExceeded => {
                error!("YouTube API quota exceeded");
                false
            }
            _ => true,
        }
    }
}

#[async_trait]
impl PlatformClient for YouTubeClient {
    async fn delete(&self, comment_id: &CommentId) -> Result<(), PlatformError> {
        let request = self
            .client
            .delete(self.endpoint("comments"))
            .query(&[("id", comment_id.as_str())]);
        self.execute(request, "comments.delete").await.map(|_| ())
    }

    async fn set_moderation_status(
        &self,
        thread_id: &ThreadId,
        status: ModerationStatus,
    ) -> Result<(), PlatformError> {
        let request = self
            .client
            .post(self.endpoint("comments/setModerationStatus"))
            .query(&[
                ("id", thread_id.as_str()),
                ("moderationStatus", status.as_str()),
                ("banAuthor", "false"),
            ])
            .header(reqwest::header::CONTENT_LENGTH, 0);
        self.execute(request, "comments.setModerationStatus")
            .await
            .map(|_| ())
    }

    async fn mark_as_spam(&self, comment_id: &CommentId) -> Result<(), PlatformError> {
        let request = self
            .client
            .post(self.endpoint("comments/markAsSpam"))
            .query(&[("id", comment_id.as_str())])
            .header(reqwest::header::CONTENT_LENGTH, 0);
        self.execute(request, "comments.markAsSpam").await.map(|_| ())
    }
}

use clap::{Arg, ArgAction, Command};
use judol_guard::batch::{self, RemovalOptions};
use judol_guard::config::{self, AppConfig};
use judol_guard::youtube::{self, YouTubeClient};
use judol_guard::{
    Category, ClassificationPipeline, Comment, CommentId, ModerationAction, ModerationActuator,
    ThreadId,
};
use log::LevelFilter;
use std::process;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let matches = Command::new("judol-guard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Detects and removes gambling ads and spam from YouTube comments")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("judol-guard.toml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Validate the configuration and print the loaded lists")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("test-comment")
                .long("test-comment")
                .value_name("TEXT")
                .help("Classify a single comment and print the verdict")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("test-file")
                .long("test-file")
                .value_name("FILE")
                .help("Classify a JSON array of comments")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("scan")
                .long("scan")
                .value_name("VIDEO")
                .help("Fetch and classify the comments of a video (URL or id)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("remove")
                .long("remove")
                .help("Remove flagged comments found by --scan")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("video-info")
                .long("video-info")
                .value_name("VIDEO")
                .help("Show title and statistics of a video (URL or id)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("check-quota")
                .long("check-quota")
                .help("Check whether the YouTube API quota is still available")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("channel")
                .long("channel")
                .help("Show the channel of the configured access token")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("remove-comment")
                .long("remove-comment")
                .value_name("COMMENT_ID")
                .help("Remove a single comment")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("thread-id")
                .long("thread-id")
                .value_name("THREAD_ID")
                .help("Thread id of the comment given to --remove-comment")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("add-blacklist")
                .long("add-blacklist")
                .value_name("TERM")
                .help("Add a blacklist term to the configuration file")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("category")
                .long("category")
                .value_name("CATEGORY")
                .help("Category for --add-blacklist (Gambling, Spam, ContactInfo, Other)")
                .default_value("Other"),
        )
        .arg(
            Arg::new("remove-blacklist")
                .long("remove-blacklist")
                .value_name("TERM")
                .help("Remove a blacklist term from the configuration file")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("add-whitelist")
                .long("add-whitelist")
                .value_name("TERM")
                .help("Add a whitelist term to the configuration file")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("remove-whitelist")
                .long("remove-whitelist")
                .value_name("TERM")
                .help("Remove a whitelist term from the configuration file")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(path) = matches.get_one::<String>("generate-config") {
        match config::generate_default_config(path) {
            Ok(()) => println!("✅ Default configuration written to {path}"),
            Err(e) => {
                eprintln!("❌ Failed to generate configuration: {e:#}");
                process::exit(1);
            }
        }
        return;
    }

    let config_path = matches
        .get_one::<String>("config")
        .cloned()
        .unwrap_or_else(|| "judol-guard.toml".to_string());

    let mut config = match AppConfig::load_or_default(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            process::exit(1);
        }
    };

    if edit_lists(&matches, &mut config, &config_path) {
        return;
    }

    if matches.get_flag("test-config") {
        println!("🔍 Configuration OK");
        println!("Blacklisted terms: {}", config.blacklist.len());
        for entry in &config.blacklist {
            println!("  {:<24} {}", entry.term, entry.category);
        }
        println!("Whitelisted terms: {}", config.whitelist.terms.len());
        for term in &config.whitelist.terms {
            println!("  {term}");
        }
        println!("Auto delete: {}", config.settings.auto_delete);
        return;
    }

    let pipeline = ClassificationPipeline::new(config.snapshot());

    if let Some(text) = matches.get_one::<String>("test-comment") {
        let verdict = pipeline.classify_text(text);
        print_json(&verdict);
        return;
    }

    if let Some(path) = matches.get_one::<String>("test-file") {
        test_comment_file(&pipeline, path);
        return;
    }

    if matches.get_flag("check-quota") {
        let client = YouTubeClient::new(config.youtube.clone());
        if client.check_quota().await {
            println!("✅ API quota available");
        } else {
            println!("⚠️  API quota exceeded; try again after the daily reset.");
            process::exit(1);
        }
        return;
    }

    if matches.get_flag("channel") {
        let client = YouTubeClient::new(config.youtube.clone());
        match client.channel_name().await {
            Ok(Some(name)) => println!("📺 {name}"),
            Ok(None) => println!("No channel found for this account"),
            Err(e) => {
                eprintln!("❌ Failed to fetch channel: {e}");
                process::exit(1);
            }
        }
        return;
    }

    if let Some(video) = matches.get_one::<String>("video-info") {
        let Some(video_id) = youtube::extract_video_id(video) else {
            eprintln!("❌ Not a valid YouTube video URL or id: {video}");
            process::exit(1);
        };
        match YouTubeClient::new(config.youtube.clone()).video_info(&video_id).await {
            Ok(Some(info)) => print_json(&info),
            Ok(None) => {
                eprintln!("❌ Video not found: {video_id}");
                process::exit(1);
            }
            Err(e) => {
                eprintln!("❌ Failed to fetch video info: {e}");
                process::exit(1);
            }
        }
        return;
    }

    if let Some(comment_id) = matches.get_one::<String>("remove-comment") {
        let actuator = actuator(&config);
        let thread_id = matches.get_one::<String>("thread-id").map(ThreadId::new);
        let outcome = actuator
            .remove(&CommentId::new(comment_id.as_str()), thread_id.as_ref())
            .await;
        print_json(&outcome);
        if !outcome.success {
            process::exit(1);
        }
        return;
    }

    if let Some(video) = matches.get_one::<String>("scan") {
        let remove = matches.get_flag("remove") || config.settings.auto_delete;
        scan_video(&config, &pipeline, video, remove).await;
        return;
    }

    eprintln!("Nothing to do. Try --help.");
    process::exit(2);
}

/// Handle the list editing flags. Returns true if any were given.
fn edit_lists(matches: &clap::ArgMatches, config: &mut AppConfig, path: &str) -> bool {
    let mut edited = false;

    if let Some(term) = matches.get_one::<String>("add-blacklist") {
        let category = match matches
            .get_one::<String>("category")
            .map(|c| c.parse::<Category>())
            .unwrap_or(Ok(Category::Other))
        {
            Ok(category) => category,
            Err(e) => {
                eprintln!("❌ {e}");
                process::exit(1);
            }
        };
        if config.add_blacklist_term(term, category) {
            println!("✅ Added '{term}' ({category}) to the blacklist");
        } else {
            println!("'{term}' is already blacklisted");
        }
        edited = true;
    }
    if let Some(term) = matches.get_one::<String>("remove-blacklist") {
        if config.remove_blacklist_term(term) {
            println!("✅ Removed '{term}' from the blacklist");
        } else {
            println!("'{term}' is not blacklisted");
        }
        edited = true;
    }
    if let Some(term) = matches.get_one::<String>("add-whitelist") {
        if config.add_whitelist_term(term) {
            println!("✅ Added '{term}' to the whitelist");
        } else {
            println!("'{term}' is already whitelisted");
        }
        edited = true;
    }
    if let Some(term) = matches.get_one::<String>("remove-whitelist") {
        if config.remove_whitelist_term(term) {
            println!("✅ Removed '{term}' from the whitelist");
        } else {
            println!("'{term}' is not whitelisted");
        }
        edited = true;
    }

    if edited {
        if let Err(e) = config.save_to_file(path) {
            eprintln!("❌ Failed to save configuration: {e:#}");
            process::exit(1);
        }
    }
    edited
}

fn actuator(config: &AppConfig) -> ModerationActuator {
    if config.youtube.access_token.is_none() {
        log::warn!("No access token configured; removal requests will be rejected");
    }
    ModerationActuator::new(Arc::new(YouTubeClient::new(config.youtube.clone())))
}

fn test_comment_file(pipeline: &ClassificationPipeline, path: &str) {
    let comments: Vec<Comment> = match std::fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|content| serde_json::from_str(&content).map_err(anyhow::Error::from))
    {
        Ok(comments) => comments,
        Err(e) => {
            eprintln!("❌ Failed to read comments from {path}: {e}");
            process::exit(1);
        }
    };

    let total = comments.len();
    for comment in &comments {
        let verdict = pipeline.classify(comment);
        let marker = if verdict.flagged { "🚫" } else { "✅" };
        println!("{marker} [{}] {}", comment.id, verdict.reason_text);
    }

    let flagged = batch::scan(pipeline, comments);
    println!();
    println!("Flagged {} of {} comments", flagged.len(), total);
    if !flagged.is_empty() {
        println!("Reasons: {}", batch::reason_summary(&flagged));
    }
}

async fn scan_video(
    config: &AppConfig,
    pipeline: &ClassificationPipeline,
    video: &str,
    remove: bool,
) {
    let Some(video_id) = youtube::extract_video_id(video) else {
        eprintln!("❌ Not a valid YouTube video URL or id: {video}");
        process::exit(1);
    };

    let client = Arc::new(YouTubeClient::new(config.youtube.clone()));
    match client.video_info(&video_id).await {
        Ok(Some(info)) => println!("🎬 {} ({})", info.title, info.channel_title),
        Ok(None) => {
            eprintln!("❌ Video not found: {video_id}");
            process::exit(1);
        }
        Err(e) => log::warn!("Could not fetch video info: {}", e),
    }

    let settings = &config.settings;
    let comments = match client
        .fetch_all_comments(
            &video_id,
            settings.page_size,
            settings.max_pages,
            settings.max_comments_per_scan,
        )
        .await
    {
        Ok(comments) => comments,
        Err(e) => {
            eprintln!("❌ Failed to fetch comments: {e}");
            process::exit(1);
        }
    };

    let total = comments.len();
    let flagged = batch::scan(pipeline, comments);
    println!("🔍 Scanned {total} comments, {} flagged", flagged.len());
    for item in &flagged {
        println!(
            "  🚫 [{}] {}: {}",
            item.comment.id, item.comment.author, item.verdict.reason_text
        );
    }
    if !flagged.is_empty() {
        println!("Reasons: {}", batch::reason_summary(&flagged));
    }

    if !remove || flagged.is_empty() {
        return;
    }

    if !client.check_quota().await {
        eprintln!("⚠️  API quota exceeded; nothing removed. Try again after the reset.");
        process::exit(1);
    }
    match client.channel_name().await {
        Ok(Some(name)) => println!("Removing as {name}"),
        Ok(None) => log::warn!("No channel found for the configured account"),
        Err(e) => log::warn!("Could not fetch channel name: {}", e),
    }

    let actuator = ModerationActuator::new(client);
    let targets = flagged
        .iter()
        .map(|f| (f.comment.id.clone(), Some(f.comment.thread_id.clone())))
        .collect();
    let options = RemovalOptions {
        concurrency: config.settings.removal_concurrency,
        delay: Duration::from_millis(config.settings.removal_delay_ms),
    };
    let summary = batch::remove_flagged(&actuator, targets, options).await;

    println!();
    println!("🧹 Removal summary");
    println!("  ├─ Deleted: {}", summary.deleted);
    println!("  ├─ Marked as spam: {}", summary.marked_as_spam);
    println!("  └─ Failed: {}", summary.failed);
    for error in &summary.errors {
        println!("     • {error}");
    }
    if summary.marked_as_spam > 0 {
        println!("Note: comments marked as spam are reviewed by YouTube and may stay visible.");
    }
    if summary.quota_exhausted() {
        println!("⚠️  API quota exceeded; try again after the daily reset.");
    }
    if summary
        .results
        .iter()
        .all(|(_, o)| o.action == ModerationAction::NoAction)
    {
        process::exit(1);
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("❌ Failed to serialize result: {e}");
            process::exit(1);
        }
    }
}

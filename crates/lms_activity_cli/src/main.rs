//! Command-line driver for the activity extractor.
//!
//! # Responsibility
//! - Feed a saved LMS page through the extraction engine.
//! - Import, list and remind on activities kept in a local SQLite store.
//!
//! Usage:
//!   lms-activity extract --html course.html --url https://lms.example.edu/course/view.php?id=7
//!   lms-activity import --html course.html --url ... --db activities.sqlite3 --user 1
//!   lms-activity list --db activities.sqlite3 --user 1 --status pending
//!   lms-activity reminders --db activities.sqlite3 --user 1

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use lms_activity_core::reminder::{badge_text, deadline_urgency, due_reminders, Urgency};
use lms_activity_core::{
    handle_request, init_logging, open_db, ActivityFilter, ActivityService, ActivityStatus,
    ActivityType, AppConfig, Connection, ContentRequest, Extractor, HtmlPage, LogLevel, Priority,
    SqliteActivityRepository, UserId,
};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lms-activity")]
#[command(about = "Extract and track academic deadlines from LMS pages")]
#[command(version)]
struct Cli {
    /// JSON config file (extractor and reminder settings)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for rolling log files; logging is off when omitted
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the extraction response for a saved page as JSON
    Extract(PageArgs),
    /// Extract a saved page and store every result
    Import {
        #[command(flatten)]
        page: PageArgs,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// List stored activities ordered by deadline
    List {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long, value_parser = parse_status)]
        status: Option<ActivityStatus>,
        #[arg(long = "type", value_parser = parse_type)]
        kind: Option<ActivityType>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
    },
    /// Print reminders that are due now
    Reminders {
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Args)]
struct PageArgs {
    /// Saved HTML of the LMS page
    #[arg(long)]
    html: PathBuf,
    /// URL the page was served from; base for relative links
    #[arg(long)]
    url: String,
}

#[derive(Args)]
struct StoreArgs {
    /// SQLite database file
    #[arg(long)]
    db: PathBuf,
    /// Owner of the stored activities
    #[arg(long, default_value_t = 1)]
    user: UserId,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = match cli.log_level.as_deref() {
            Some(raw) => LogLevel::parse(raw)?,
            None => LogLevel::build_default(),
        };
        init_logging(level, &absolute(log_dir)?).context("failed to start logging")?;
    }

    let config = match &cli.config {
        Some(path) => AppConfig::from_json_file(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Command::Extract(page) => run_extract(&page, &config),
        Command::Import { page, store } => run_import(&page, &store, &config),
        Command::List {
            store,
            status,
            kind,
            priority,
        } => {
            let filter = ActivityFilter {
                status,
                kind,
                priority,
                ..ActivityFilter::default()
            };
            run_list(&store, &filter)
        }
        Command::Reminders { store } => run_reminders(&store, &config),
    }
}

fn run_extract(page: &PageArgs, config: &AppConfig) -> Result<()> {
    let page = load_page(page)?;
    let extractor = Extractor::new(config.extractor.clone());
    let response = handle_request(ContentRequest::ExtractActivities, &page.accessor(), &extractor);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn run_import(page: &PageArgs, store: &StoreArgs, config: &AppConfig) -> Result<()> {
    let page = load_page(page)?;
    let extractor = Extractor::new(config.extractor.clone());
    let found = extractor.extract(&page.accessor());

    let conn = open_store(&store.db)?;
    let service = ActivityService::new(SqliteActivityRepository::new(&conn));
    let report = service.import_extracted(store.user, &found);

    for activity in &report.imported {
        println!(
            "imported {} [{}] due {}",
            activity.title,
            activity.kind.as_str(),
            activity.deadline.to_rfc3339()
        );
    }
    for failure in &report.failed {
        eprintln!("failed {}: {}", failure.title, failure.reason);
    }
    println!(
        "{} imported, {} failed",
        report.imported_count(),
        report.failed_count()
    );
    Ok(())
}

fn run_list(store: &StoreArgs, filter: &ActivityFilter) -> Result<()> {
    let conn = open_store(&store.db)?;
    let service = ActivityService::new(SqliteActivityRepository::new(&conn));
    let activities = service.list_activities(store.user, filter)?;
    println!("{}", serde_json::to_string_pretty(&activities)?);
    Ok(())
}

fn run_reminders(store: &StoreArgs, config: &AppConfig) -> Result<()> {
    let conn = open_store(&store.db)?;
    let service = ActivityService::new(SqliteActivityRepository::new(&conn));
    let activities = service.list_activities(store.user, &ActivityFilter::default())?;
    let now = Utc::now();

    for reminder in due_reminders(&activities, now, &config.reminders) {
        println!("{}: {}", reminder.title, reminder.message);
    }
    for activity in activities.iter().filter(|activity| activity.is_pending()) {
        let marker = match deadline_urgency(activity.deadline, now, &config.reminders) {
            Urgency::Overdue => "overdue",
            Urgency::DueSoon => "due soon",
            Urgency::Normal => "",
        };
        if !marker.is_empty() {
            println!("[{marker}] {}", activity.title);
        }
    }
    let badge = badge_text(&activities);
    if !badge.is_empty() {
        println!("pending: {badge}");
    }
    Ok(())
}

fn load_page(args: &PageArgs) -> Result<HtmlPage> {
    let html = std::fs::read_to_string(&args.html)
        .with_context(|| format!("failed to read {}", args.html.display()))?;
    info!(
        "event=page_load module=cli status=ok bytes={} url={}",
        html.len(),
        args.url
    );
    Ok(HtmlPage::parse(&html, &args.url))
}

fn open_store(path: &Path) -> Result<Connection> {
    open_db(path).with_context(|| format!("failed to open store {}", path.display()))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

fn parse_status(raw: &str) -> Result<ActivityStatus, String> {
    ActivityStatus::parse(raw).ok_or_else(|| {
        format!("unknown status `{raw}`; expected pending|in_progress|completed|cancelled")
    })
}

fn parse_type(raw: &str) -> Result<ActivityType, String> {
    ActivityType::parse(raw).ok_or_else(|| {
        format!("unknown type `{raw}`; expected assignment|quiz|exam|project|reading|other")
    })
}

fn parse_priority(raw: &str) -> Result<Priority, String> {
    Priority::parse(raw).ok_or_else(|| format!("unknown priority `{raw}`; expected low|medium|high"))
}

use chrono::Utc;
use clap::Parser;
use colored::*;
use directories::ProjectDirs;
use pagepatch::api::{CmdMessage, ListedRecord, LocatedElement, MessageLevel, PagepatchApi};
use pagepatch::config::{PagepatchConfig, Preferences, PREFERENCE_KEYS};
use pagepatch::error::{PatchError, Result};
use pagepatch::model::EditKind;
use pagepatch::store::FsBackend;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

mod args;
use args::{Cli, Commands};

const HOME_ENV: &str = "PAGEPATCH_HOME";
const LOG_ENV: &str = "PAGEPATCH_LOG";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct AppContext {
    api: PagepatchApi<FsBackend>,
    config: PagepatchConfig,
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let ctx = init_context(&cli)?;

    match cli.command {
        Some(Commands::List { page }) => handle_list(&ctx, page),
        Some(Commands::Clear) => handle_clear(&ctx),
        Some(Commands::Prefs { key, value }) => handle_prefs(&ctx, key, value),
        Some(Commands::Replay {
            snapshot,
            page,
            output,
        }) => handle_replay(&ctx, &snapshot, &page, output),
        Some(Commands::Locate { snapshot, path }) => handle_locate(&ctx, &snapshot, &path),
        None => handle_list(&ctx, None),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let data_dir = resolve_data_dir(cli)?;
    debug!(data_dir = %data_dir.display(), "using data directory");

    let config = PagepatchConfig::load(&data_dir)?;
    let api = PagepatchApi::new(FsBackend::new(data_dir));
    Ok(AppContext { api, config })
}

fn resolve_data_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(dir) = &cli.data_dir {
        return Ok(dir.clone());
    }
    if let Some(dir) = std::env::var_os(HOME_ENV) {
        return Ok(PathBuf::from(dir));
    }
    ProjectDirs::from("com", "pagepatch", "pagepatch")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| PatchError::Api("Could not determine data directory".into()))
}

fn handle_list(ctx: &AppContext, page: Option<String>) -> Result<()> {
    let result = ctx.api.list(page.as_deref())?;
    print_records(&result.listed_records);
    print_messages(&result.messages);
    Ok(())
}

fn handle_clear(ctx: &AppContext) -> Result<()> {
    let result = ctx.api.clear()?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_prefs(ctx: &AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let show_all = key.is_none();
    let result = ctx.api.prefs(key.as_deref(), value.as_deref())?;
    if show_all {
        if let Some(preferences) = &result.preferences {
            print_preferences(preferences);
        }
        print_engine_config(&ctx.config);
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_replay(
    ctx: &AppContext,
    snapshot: &Path,
    page: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let content = fs::read_to_string(snapshot).map_err(PatchError::Io)?;
    let result = ctx.api.replay(&content, page)?;

    match (output, &result.document) {
        (Some(path), Some(document)) => {
            fs::write(&path, document).map_err(PatchError::Io)?;
            print_messages(&result.messages);
        }
        (None, Some(document)) => {
            // stdout carries the document, so messages go to stderr
            println!("{}", document);
            eprint_messages(&result.messages);
        }
        (_, None) => print_messages(&result.messages),
    }
    Ok(())
}

fn handle_locate(ctx: &AppContext, snapshot: &Path, path: &str) -> Result<()> {
    let content = fs::read_to_string(snapshot).map_err(PatchError::Io)?;
    let result = ctx.api.locate(&content, path)?;
    if let Some(located) = &result.located {
        print_located(located);
    }
    print_messages(&result.messages);
    Ok(())
}

fn styled(message: &CmdMessage) -> ColoredString {
    match message.level {
        MessageLevel::Info => message.content.dimmed(),
        MessageLevel::Success => message.content.green(),
        MessageLevel::Warning => message.content.yellow(),
        MessageLevel::Error => message.content.red(),
    }
}

fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        println!("{}", styled(message));
    }
}

fn eprint_messages(messages: &[CmdMessage]) {
    for message in messages {
        eprintln!("{}", styled(message));
    }
}

fn print_preferences(preferences: &Preferences) {
    for key in PREFERENCE_KEYS {
        if let Ok(value) = preferences.get(key) {
            let shown = if value { "on".green() } else { "off".red() };
            println!("{} = {}", key, shown);
        }
    }
}

fn print_engine_config(config: &PagepatchConfig) {
    println!(
        "{}",
        format!("settle-delay-ms = {}", config.settle_delay_ms).dimmed()
    );
    println!(
        "{}",
        format!(
            "overlay = {}x{} {}",
            config.overlay_width, config.overlay_height, config.overlay_fill
        )
        .dimmed()
    );
}

fn print_located(located: &LocatedElement) {
    println!("{} {}", located.tag.yellow(), located.canonical_path.bold());
    if !located.text.is_empty() {
        println!("{}", located.text);
    }
}

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;
const KIND_WIDTH: usize = 8;

fn print_records(records: &[ListedRecord]) {
    for listed in records {
        let record = &listed.record;
        let idx_str = format!("{:>3}. ", listed.position);
        let kind_str = format!("{:<width$}", record.kind.to_string(), width = KIND_WIDTH);

        let target = match &record.locator {
            Some(locator) => format!("{} {}", record.page, locator),
            None => record.page.to_string(),
        };
        let value_preview: String = match record.kind {
            EditKind::Overlay => String::new(),
            _ => record
                .new_value
                .chars()
                .take(50)
                .map(|c| if c == '\n' { ' ' } else { c })
                .collect(),
        };
        let description = if value_preview.is_empty() {
            target
        } else {
            format!("{} → {}", target, value_preview)
        };

        let fixed_width = idx_str.width() + KIND_WIDTH + TIME_WIDTH;
        let available = LINE_WIDTH.saturating_sub(fixed_width);
        let shown = truncate_to_width(&description, available);
        let padding = available.saturating_sub(shown.width());

        let kind_colored = match record.kind {
            EditKind::Text => kind_str.normal(),
            EditKind::Image => kind_str.cyan(),
            EditKind::Overlay => kind_str.magenta(),
        };

        println!(
            "{}{}{}{}{}",
            idx_str,
            kind_colored,
            shown,
            " ".repeat(padding),
            format_time_ago(record.updated_at).dimmed()
        );
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthChar;

    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

fn format_time_ago(timestamp: chrono::DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let formatter = timeago::Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}

mod api;
mod config;
mod console;
mod editor;
mod error;
mod notifications;
mod schema;
mod types;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::Path;
use tokio::io::BufReader;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use api::HttpConfigStore;
use crate::config::{ClientSettings, LogFormat};
use console::Console;
use editor::{ConfigEditor, FieldKind};
use schema::{SectionId, ACTIVE_STRATEGIES_PATH, ALL_STRATEGIES};

#[derive(Parser)]
#[command(name = "tradepilot-settings")]
#[command(author = "Trading Bot")]
#[command(version = "0.1.0")]
#[command(about = "View and edit the TradePilot bot configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file path
    #[arg(short, long, default_value = "tradepilot.toml")]
    config: String,

    /// Bot API base URL (overrides the settings file)
    #[arg(long)]
    api_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current configuration
    Show {
        /// Only this section (mt5, general, risk, strategies, sessions)
        #[arg(short, long)]
        section: Option<String>,
        /// Show passwords in clear text
        #[arg(long)]
        reveal: bool,
    },
    /// Print the value at a dotted path
    Get {
        path: String,
    },
    /// Set one field and save
    Set {
        path: String,
        value: String,
        /// Input kind (text, integer, number, percent, boolean, list, ...)
        #[arg(short, long)]
        kind: Option<String>,
    },
    /// Enable or disable a strategy and save
    Strategy {
        name: String,
        #[arg(long)]
        disable: bool,
    },
    /// Interactive editing session
    Edit,
    /// List every known field with its kind
    Fields,
    /// Write a starter settings file
    InitConfig {
        #[arg(short, long, default_value = "tradepilot.toml")]
        output: String,
    },
}

fn init_logging(verbose: bool, format: LogFormat) -> Result<()> {
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::InitConfig { output } = &cli.command {
        ClientSettings::default().write_template(Path::new(output))?;
        println!("Wrote {}", output);
        return Ok(());
    }

    let mut settings = ClientSettings::load(&cli.config)?;
    if let Some(url) = cli.api_url.clone() {
        settings.api_base_url = url;
        settings.validate().map_err(|errors| anyhow!(errors.join(", ")))?;
    }

    init_logging(cli.verbose, settings.log_format)?;
    info!("TradePilot settings v0.1.0 ({})", settings.api_base_url);

    let store = HttpConfigStore::new(&settings.api_base_url, settings.request_timeout())?;
    debug!("Using config endpoint under {}", store.base_url());

    let result = match cli.command {
        Commands::Show { section, reveal } => show(&store, section.as_deref(), reveal).await,
        Commands::Get { path } => get(&store, &path).await,
        Commands::Set { path, value, kind } => set(&store, &path, &value, kind.as_deref()).await,
        Commands::Strategy { name, disable } => toggle_strategy(&store, &name, !disable).await,
        Commands::Edit => {
            let mut console = Console::new(&store);
            console
                .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
                .await
        }
        Commands::Fields => {
            list_fields();
            Ok(())
        }
        Commands::InitConfig { .. } => Ok(()),
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

async fn loaded_editor(store: &HttpConfigStore) -> Result<ConfigEditor> {
    let mut editor = ConfigEditor::new();
    editor.load(store).await?;
    Ok(editor)
}

async fn show(store: &HttpConfigStore, section: Option<&str>, reveal: bool) -> Result<()> {
    let editor = loaded_editor(store).await?;
    let tree = editor
        .working()
        .ok_or_else(|| anyhow!("no configuration loaded"))?;

    let sections = match section {
        Some(s) => vec![SectionId::from_str(s).ok_or_else(|| anyhow!("unknown section '{}'", s))?],
        None => SectionId::all().to_vec(),
    };
    for s in sections {
        println!("{}", schema::render_section(tree, s, reveal));
    }
    Ok(())
}

async fn get(store: &HttpConfigStore, path: &str) -> Result<()> {
    let editor = loaded_editor(store).await?;
    match editor.read(path)? {
        Some(value) => println!("{}", serde_json::to_string_pretty(value)?),
        None => {
            warn!("{} is not set", path);
            println!("<absent>");
        }
    }
    Ok(())
}

async fn set(store: &HttpConfigStore, path: &str, raw: &str, kind: Option<&str>) -> Result<()> {
    let mut editor = loaded_editor(store).await?;

    let kind = match kind {
        Some(k) => FieldKind::from_str(k).ok_or_else(|| anyhow!("unknown kind '{}'", k))?,
        None => match schema::find_field(path) {
            Some(field) => field.kind,
            None => FieldKind::infer(editor.read(path)?),
        },
    };

    editor.set_field_from_input(path, kind, raw)?;
    commit(&mut editor, store).await
}

async fn toggle_strategy(store: &HttpConfigStore, name: &str, enable: bool) -> Result<()> {
    if !ALL_STRATEGIES.contains(&name) {
        return Err(anyhow!(
            "unknown strategy '{}' (expected one of {})",
            name,
            ALL_STRATEGIES.join(", ")
        ));
    }

    let mut editor = loaded_editor(store).await?;
    editor.toggle_list_membership(ACTIVE_STRATEGIES_PATH, name, enable)?;
    commit(&mut editor, store).await
}

async fn commit(editor: &mut ConfigEditor, store: &HttpConfigStore) -> Result<()> {
    let outcome = editor
        .save(store)
        .await?
        .applied()
        .ok_or_else(|| anyhow!("save response was discarded"))?;

    outcome.into_result()?;
    if let Some(notice) = editor.notice() {
        println!("{}", notice.text());
    }
    Ok(())
}

fn list_fields() {
    for section in SectionId::all() {
        println!("[{}] {}", section.key(), section.title());
        for field in section.fields() {
            println!("  {}", schema::catalog_entry(&field));
        }
    }
}

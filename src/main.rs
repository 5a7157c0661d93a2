use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use ycsource::config::{FolderId, Token};
use ycsource::host::JsonLinesSink;
use ycsource::resource::{get_table, get_table_def, list_table, table_names};
use ycsource::{Caches, ConnectionConfig, QualMap, YcClient};

/// Query Yandex Cloud resources as tables
#[derive(Parser, Debug)]
#[command(name = "ycsource", version, about, long_about = None)]
struct Args {
    /// Connection config file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Static OAuth or IAM token
    #[arg(long)]
    token: Option<String>,

    /// Service account authorized key file
    #[arg(long)]
    key_file: Option<PathBuf>,

    /// Folder to list folder-scoped resources from
    #[arg(short, long)]
    folder_id: Option<String>,

    /// Log level for debugging (defaults to the config's log_level)
    #[arg(long, value_enum)]
    log_level: Option<LogLevelArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available tables
    Tables,
    /// Stream every row of a table as JSON lines
    List {
        table: String,
        /// Column qualifier, e.g. `-q status=running` (repeatable)
        #[arg(short, long = "qual")]
        quals: Vec<String>,
    },
    /// Fetch a single row by id
    Get { table: String, id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Error,
    Info,
    Debug,
}

impl From<LogLevelArg> for ycsource::LogLevel {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => Self::Error,
            LogLevelArg::Info => Self::Info,
            LogLevelArg::Debug => Self::Debug,
        }
    }
}

fn setup_logging(level: ycsource::LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level();
    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: cannot open log file {:?}: {}", log_path, e);
            return None;
        },
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("ycsource started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("ycsource").join("ycsource.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".ycsource").join("ycsource.log");
    }
    PathBuf::from("ycsource.log")
}

fn load_config(args: &Args) -> Result<ConnectionConfig> {
    let mut config = match args.config {
        Some(ref path) => ConnectionConfig::load(path)?,
        None => ConnectionConfig::load_default()?,
    };

    if let Some(ref token) = args.token {
        config.token = Some(Token::from(token.as_str()));
        config.service_account_key_file = None;
    }
    if let Some(ref key_file) = args.key_file {
        config.service_account_key_file = Some(key_file.clone());
        config.token = None;
    }
    if let Some(ref folder_id) = args.folder_id {
        config.folder_id = Some(FolderId::from(folder_id.as_str()));
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(level.into());
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).context("Failed to load connection config")?;
    let _log_guard = setup_logging(config.log_level());

    if let Command::Tables = args.command {
        for name in table_names() {
            let description = get_table_def(name)
                .map(|t| t.description.as_str())
                .unwrap_or_default();
            println!("{:<45} {}", name, description);
        }
        return Ok(());
    }

    let caches = Caches::new();
    let client = YcClient::new(config, &caches).context("Invalid connection config")?;

    match args.command {
        Command::List { ref table, ref quals } => {
            let def = get_table_def(table).with_context(|| format!("Unknown table: {}", table))?;
            let mut qual_map = QualMap::new();
            for pair in quals {
                qual_map.insert_pair(def, pair)?;
            }

            let mut sink = JsonLinesSink::new(io::stdout());
            list_table(&client, table, &qual_map, &mut sink)
                .await
                .with_context(|| format!("Failed to list {}", table))?;
            tracing::info!("{} row(s) written", sink.rows());
        },
        Command::Get { ref table, ref id } => {
            let def = get_table_def(table).with_context(|| format!("Unknown table: {}", table))?;
            let quals = QualMap::new().with_string(&def.id_column, id);

            let row = get_table(&client, table, &quals)
                .await
                .with_context(|| format!("Failed to get {} from {}", id, table))?;
            match row {
                Some(row) => println!("{}", serde_json::Value::Object(row)),
                None => eprintln!("No {} given for {}", def.id_column, table),
            }
        },
        Command::Tables => {},
    }

    Ok(())
}

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use mpconf::config::Config;
use mpconf::midpoint::{MidpointClient, ObjectRef};
use mpconf::operation::{self, Operation};
use mpconf::processor::Processor;
use mpconf::properties::Properties;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Configure Midpoint through its REST API
#[derive(Parser, Debug)]
#[command(name = "mpconf", version, about, long_about = None)]
struct Args {
    /// Midpoint REST root, e.g. http://midpoint:8080/midpoint/ws/rest/
    #[arg(long)]
    url: Option<String>,

    #[arg(short, long)]
    username: Option<String>,

    #[arg(short, long)]
    password: Option<String>,

    /// Properties file for $(key) substitution
    #[arg(long)]
    properties: Option<PathBuf>,

    /// Config file (defaults to <config dir>/mpconf/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process every subfolder of a configuration tree
    Apply { root: PathBuf },
    /// Process the files of a single folder
    ApplyFolder { folder: PathBuf },
    /// Run the operations of one JSON file (no substitution)
    Operation { file: PathBuf },
    /// Run a task now
    RunTask(TaskArgs),
    /// Resume a suspended task
    ResumeTask(TaskArgs),
    /// Wait until a task reports success
    WaitTask {
        #[command(flatten)]
        task: TaskArgs,
        #[arg(long, default_value_t = 10)]
        iterations: u32,
        /// Seconds between checks
        #[arg(long, default_value_t = 10)]
        interval: u64,
    },
    /// Set the global security policy
    SetSecurityPolicy {
        #[arg(long)]
        oid: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove an object collection view from the admin GUI configuration
    DeleteCollectionView { identifier: String },
    /// Remove a widget from the admin GUI home page
    DeleteHomepageWidget { identifier: String },
    /// Store connection settings (without password) in the config file
    SaveConfig,
}

#[derive(clap::Args, Debug)]
struct TaskArgs {
    #[arg(long)]
    oid: Option<String>,
    #[arg(long)]
    name: Option<String>,
}

impl TaskArgs {
    fn object_ref(&self) -> Result<ObjectRef> {
        Ok(ObjectRef::from_parts(self.oid.clone(), self.name.clone())?)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> Option<&'static str> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some("error"),
            LogLevel::Warn => Some("warn"),
            LogLevel::Info => Some("info"),
            LogLevel::Debug => Some("debug"),
            LogLevel::Trace => Some("trace"),
        }
    }
}

/// Filter for the subscriber: `RUST_LOG` when set and valid, else the
/// `--log-level` with the HTTP stack kept quiet
fn build_env_filter(base_level: &str, rust_log: Option<String>) -> EnvFilter {
    if let Some(directives) = rust_log {
        EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(base_level))
    } else {
        EnvFilter::new(format!("{},hyper=warn,reqwest=warn", base_level))
    }
}

fn setup_logging(
    level: LogLevel,
    log_file: Option<&PathBuf>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(base_level) = level.as_filter() else {
        return Ok(None);
    };
    let filter = build_env_filter(base_level, std::env::var("RUST_LOG").ok());

    let Some(log_path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
        return Ok(None);
    };

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("mpconf {} started with log level: {:?}", env!("CARGO_PKG_VERSION"), level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level, args.log_file.as_ref())?;

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    if let Command::SaveConfig = args.command {
        let saved = Config {
            base_url: Some(config.effective_base_url(args.url.as_deref())?),
            username: Some(config.effective_username(args.username.as_deref())),
            password: None,
            properties_file: args.properties.clone().or(config.properties_file.clone()),
            ..config
        };
        saved.save()?;
        tracing::info!("Configuration saved");
        return Ok(());
    }

    let base_url = config.effective_base_url(args.url.as_deref())?;
    let username = config.effective_username(args.username.as_deref());
    let password = config.effective_password(args.password.as_deref())?;

    let properties = match args.properties.as_ref().or(config.properties_file.as_ref()) {
        Some(path) => Properties::load(path)?,
        None => Properties::default(),
    };

    tracing::info!("Connecting to {} as {}", base_url, username);
    let client = MidpointClient::new(&base_url, &username, &password, config.polling).await?;
    let processor =
        Processor::new(&client, &properties).with_scratch_dir(config.scratch_dir.clone());

    match &args.command {
        Command::Apply { root } => processor.process_subfolders(root).await?,
        Command::ApplyFolder { folder } => processor.process_folder(folder).await?,
        Command::Operation { file } => {
            let content = std::fs::read_to_string(file)?;
            for op in Operation::parse_all(&content)? {
                operation::execute(&client, &op).await?;
            }
        }
        Command::RunTask(task) => client.run_task(&task.object_ref()?).await?,
        Command::ResumeTask(task) => client.resume_task(&task.object_ref()?).await?,
        Command::WaitTask {
            task,
            iterations,
            interval,
        } => {
            let poller = mpconf::midpoint::Poller::new(
                *iterations,
                std::time::Duration::from_secs(*interval),
            );
            client
                .wait_for_completed_task(&poller, &task.object_ref()?)
                .await?
        }
        Command::SetSecurityPolicy { oid, name } => {
            let policy = ObjectRef::from_parts(oid.clone(), name.clone())?;
            client.set_security_policy(&policy).await?;
        }
        Command::DeleteCollectionView { identifier } => {
            client.delete_object_collection_view(identifier).await?
        }
        Command::DeleteHomepageWidget { identifier } => {
            client.delete_homepage_widget(identifier).await?
        }
        Command::SaveConfig => {}
    }

    tracing::info!("mpconf finished");
    Ok(())
}

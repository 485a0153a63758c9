//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use wishlist_core::pipeline::{CompileResult, ProgressReporter, compile_wishlist};
use wishlist_github::GitHubClient;
use wishlist_shared::{
    AppConfig, CompileConfig, Credentials, OrderingStrategy, init_config, load_config,
    load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// wishlist-compiler: merge community wishlist fragments into one DIM wishlist.
#[derive(Parser)]
#[command(
    name = "wishlist-compiler",
    version,
    about = "Merge wishlist roll files from a GitHub directory into a single deduplicated wishlist.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// File ordering strategy.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum OrderArg {
    /// Order by the first commit that touched each file.
    History,
    /// Order by each file's last-modified timestamp.
    LastModified,
}

impl From<OrderArg> for OrderingStrategy {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::History => OrderingStrategy::History,
            OrderArg::LastModified => OrderingStrategy::LastModified,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch, merge, and write the wishlist.
    Compile {
        /// Config file to use instead of ~/.wishlist-compiler/wishlist.toml.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Repository owner.
        #[arg(long)]
        owner: Option<String>,

        /// Repository name.
        #[arg(long)]
        repo: Option<String>,

        /// Directory within the repository holding the wishlist files.
        #[arg(short, long)]
        dir: Option<String>,

        /// Skip files whose name contains this tag.
        #[arg(short, long)]
        exclude: Option<String>,

        /// Output file path.
        #[arg(short, long)]
        out: Option<String>,

        /// File ordering strategy.
        #[arg(long, value_enum)]
        order: Option<OrderArg>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show {
        /// Config file to show instead of the default location.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "wishlist=info",
        1 => "wishlist=debug",
        _ => "wishlist=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// CLI overrides for the `compile` command.
struct CompileOverrides {
    owner: Option<String>,
    repo: Option<String>,
    dir: Option<String>,
    exclude: Option<String>,
    out: Option<String>,
    order: Option<OrderArg>,
}

impl CompileOverrides {
    fn apply(self, config: &mut AppConfig) {
        if let Some(owner) = self.owner {
            config.source.owner = owner;
        }
        if let Some(repo) = self.repo {
            config.source.repo = repo;
        }
        if let Some(dir) = self.dir {
            config.source.path = dir;
        }
        if let Some(exclude) = self.exclude {
            config.source.exclude = exclude;
        }
        if let Some(out) = self.out {
            config.output.path = Some(out);
        }
        if let Some(order) = self.order {
            config.output.ordering = order.into();
        }
    }
}

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Compile {
            config,
            owner,
            repo,
            dir,
            exclude,
            out,
            order,
        } => {
            let overrides = CompileOverrides {
                owner,
                repo,
                dir,
                exclude,
                out,
                order,
            };
            cmd_compile(config.as_deref(), overrides).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show { config } => cmd_config_show(config.as_deref()).await,
        },
    }
}

fn load_app_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_compile(config_path: Option<&Path>, overrides: CompileOverrides) -> Result<()> {
    let mut config = load_app_config(config_path)?;
    overrides.apply(&mut config);

    // Credentials must be present before any network activity.
    let credentials = Credentials::from_env(&config.github)?;

    let cwd =
        std::env::current_dir().map_err(|e| eyre!("cannot determine working directory: {e}"))?;
    let compile = CompileConfig::resolve(&config, &cwd)?;

    info!(
        repo = %compile.repo,
        dir = %compile.source_dir,
        exclude = %compile.exclude,
        ordering = %compile.ordering,
        "compiling wishlist"
    );

    let client = GitHubClient::new(compile.api_base_url.clone(), credentials)?;
    let reporter = CliProgress::new();

    let result = compile_wishlist(&client, &compile, &reporter).await?;

    // Print summary
    println!();
    println!("  Wishlist ready for DIM!");
    println!("  Path:         {}", result.output_path.display());
    println!("  Files:        {}", result.file_count);
    println!("  Unique rolls: {}", result.unique_rolls);
    println!("  Roll lines:   {}", result.roll_lines);
    println!("  Time:         {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load_app_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_aggregated(&self, name: &str, current: usize, total: usize, new_rolls: usize) {
        self.spinner.set_message(format!(
            "Aggregating [{current}/{total}] {name} (+{new_rolls} rolls)"
        ));
    }

    fn done(&self, _result: &CompileResult) {
        self.spinner.finish_and_clear();
    }
}

mod report;
mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hnscout-cli")]
#[command(about = "Discover startups and technical innovations on Hacker News")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Incremental run: stories since the newest processed item
    Run,
    /// Scan a fixed lookback window regardless of prior state
    Historical {
        /// Days to look back (defaults to HNSCOUT_LOOKBACK_DAYS)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Render the top recent discoveries
    Report {
        #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
        format: ReportFormat,

        /// Maximum discoveries (defaults to HNSCOUT_REPORT_LIMIT)
        #[arg(long)]
        limit: Option<u32>,

        /// Window in days (defaults to HNSCOUT_REPORT_DAYS)
        #[arg(long)]
        days: Option<u32>,

        /// Directory for markdown/json output files
        #[arg(long, default_value = report::DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,
    },
    /// Database management commands
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check database connectivity
    Ping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Console,
    Markdown,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = hnscout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Run) => run::run_incremental(&config).await,
        Some(Commands::Historical { days }) => {
            run::run_historical(&config, days.unwrap_or(config.lookback_days)).await
        }
        Some(Commands::Report {
            format,
            limit,
            days,
            output_dir,
        }) => {
            let store = hnscout_db::open_store(&config).await?;
            let snapshot = hnscout_pipeline::build_snapshot(
                store.as_ref(),
                limit.unwrap_or(config.report_limit),
                days.unwrap_or(config.report_days),
            )
            .await?;
            report::emit(&snapshot, format, &output_dir)
        }
        Some(Commands::Db { command }) => run_db_command(&config, command).await,
        None => {
            println!("hnscout-cli: nothing to do (try `hnscout-cli run` or `--help`)");
            Ok(())
        }
    }
}

async fn run_db_command(
    config: &hnscout_core::AppConfig,
    command: DbCommands,
) -> anyhow::Result<()> {
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for db commands"))?;
    let pool = hnscout_db::connect_pool(url, hnscout_db::PoolConfig::from_app_config(config)).await?;

    match command {
        DbCommands::Migrate => {
            let applied = hnscout_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        DbCommands::Ping => {
            hnscout_db::ping(&pool).await?;
            println!("database reachable");
        }
    }
    Ok(())
}

//! sqlite-pg-migrate CLI - SQLite to PostgreSQL migration for the movies catalog.

use clap::{Parser, Subcommand};
use sqlite_pg_migrate::{ensure_valid, Config, MigrateError, Orchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "sqlite-pg-migrate")]
#[command(about = "SQLite to PostgreSQL migration for the movies catalog")]
#[command(version)]
struct Cli {
    /// Path to the SQLite file (overrides SQLITE_PATH)
    #[arg(long)]
    sqlite_path: Option<PathBuf>,

    /// Destination schema (overrides DB_SCHEMA)
    #[arg(long)]
    schema: Option<String>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy all tables from SQLite into PostgreSQL
    Run {
        /// Dry run: check tables and show plan without transferring data
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate row counts between source and target
    Validate,

    /// Test database connections
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    let mut config = Config::from_env()?;
    if let Some(path) = cli.sqlite_path {
        config.source.path = path;
    }
    if let Some(schema) = cli.schema {
        config.target.schema = schema;
    }
    config.validate()?;
    info!(
        "Loaded configuration: {} -> {}:{}/{} (schema {})",
        config.source.path.display(),
        config.target.host,
        config.target.port,
        config.target.database,
        config.target.schema
    );

    match cli.command {
        Commands::Run { dry_run } => {
            let orchestrator = Orchestrator::new(config).await?;
            let result = orchestrator.run(dry_run).await;
            orchestrator.close().await;
            let result = result?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                let status_msg = if dry_run { "Dry run completed!" } else { "Migration completed!" };
                println!("\n{}", status_msg);
                println!("  Run ID: {}", result.run_id);
                println!("  Duration: {:.2}s", result.duration_seconds);
                println!("  Tables: {}", result.tables_total);
                for table in &result.tables {
                    if dry_run {
                        println!("    {}: {} rows", table.table, table.source_rows);
                    } else {
                        println!(
                            "    {}: {} read, {} inserted, {} skipped ({} pages)",
                            table.table,
                            table.rows_read,
                            table.rows_inserted,
                            table.rows_skipped,
                            table.pages
                        );
                    }
                }
                println!(
                    "  Rows: {} read, {} inserted, {} skipped",
                    result.rows_read, result.rows_inserted, result.rows_skipped
                );
                println!("  Throughput: {} rows/sec", result.rows_per_second);
            }
        }

        Commands::Validate => {
            let orchestrator = Orchestrator::new(config).await?;
            let results = orchestrator.validate().await;
            orchestrator.close().await;
            let results = results?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!("Validation Results:");
                for r in &results {
                    println!(
                        "  {} {}: source={} expected={} target={}",
                        if r.matches { "OK      " } else { "MISMATCH" },
                        r.table,
                        r.source_rows,
                        r.expected_rows,
                        r.target_rows
                    );
                }
            }

            ensure_valid(&results)?;
            if !cli.output_json {
                println!("Validation completed successfully");
            }
        }

        Commands::HealthCheck => {
            let result = Orchestrator::health_check(&config).await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source (SQLite): {} ({}ms)",
                    if result.source_connected { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target (PostgreSQL): {} ({}ms)",
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Err(MigrateError::Validation("Health check failed".to_string()));
            }
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity '{}'", other)),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}'", other)),
    }

    Ok(())
}

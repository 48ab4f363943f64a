//! `sqlfan` - run SQL scripts concurrently and move data into tables
//!
//! Commands run against the SQLite database named by `database_path` in
//! `sqlfan.toml` (or `--database` / `SQLFAN_DATABASE`). Results go to stdout,
//! logs to stderr.
//!
//! ```text
//! sqlfan exec --file report.sql --max-concurrency 8
//! echo "SELECT 1; SELECT 2" | sqlfan exec
//! sqlfan upload orders.csv --table ORDERS
//! sqlfan generate --table FAKE --rows 100 --column id:integer:1:1000 --column label:string
//! sqlfan check
//! sqlfan ddl SALES --schema PUBLIC --kind table --object ORDERS --object ITEMS
//! ```

mod column_spec;
mod config;
mod logging;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlfan_core::{DriverSessionFactory, SessionFactory};
use sqlfan_driver_sqlite::{SqliteDriver, SqliteLoader};
use sqlfan_query::{ObjectKind, RunnerOptions, connect_and_execute_with_retry};
use sqlfan_services::{
    ColumnSpec, MetadataService, QueryService, TestDataGenerator, TestDataService, UploadService,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

use crate::config::Config;
use crate::logging::{LogFormat, LoggingConfig};

/// Rows shown after an upload or a generate
const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Parser)]
#[command(name = "sqlfan", version, about = "Concurrent SQL script runner and table loader")]
struct Cli {
    /// Config file (default: <config dir>/sqlfan/sqlfan.toml)
    #[arg(long, global = true, env = "SQLFAN_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database to run against, overriding the config file
    #[arg(long, global = true, env = "SQLFAN_DATABASE")]
    database: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Level for SQLFAN's own log events; RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Split a script on `;` and run its statements concurrently
    Exec {
        /// Read the script from this file instead of stdin
        #[arg(long, short)]
        file: Option<PathBuf>,

        /// Statements in flight at once
        #[arg(long, env = "SQLFAN_MAX_CONCURRENCY")]
        max_concurrency: Option<usize>,
    },
    /// Load a CSV/TXT file or the first sheet of a workbook into a table, creating it if needed
    Upload {
        file: PathBuf,

        #[arg(long)]
        table: String,
    },
    /// Generate synthetic rows and write them into a table
    Generate {
        #[arg(long)]
        table: String,

        #[arg(long)]
        rows: usize,

        /// NAME:TYPE[:ARGS], repeatable (integer, float, string, date, timestamp, boolean)
        #[arg(long = "column", required = true, value_parser = column_spec::parse)]
        columns: Vec<ColumnSpec>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Check the configured credentials and that the database answers
    Check,
    /// Print the DDL of a warehouse database, or of named objects in one schema
    Ddl {
        /// Warehouse database to describe
        #[arg(value_name = "DATABASE")]
        warehouse: String,

        #[arg(long)]
        schema: Option<String>,

        /// Object kind, e.g. table, view, "masking policy"
        #[arg(long, requires_all = ["schema", "objects"])]
        kind: Option<ObjectKind>,

        /// Object name, repeatable
        #[arg(long = "object", requires = "kind")]
        objects: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(LoggingConfig::new(cli.log_format, &cli.log_level)) {
        eprintln!("Failed to initialize logging: {:#}", e);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_path()?,
    };
    let config = Config::load(&config_path)?.with_overrides(cli.database, None);

    match cli.command {
        Command::Exec {
            file,
            max_concurrency,
        } => {
            let config = config.with_overrides(None, max_concurrency);
            exec(&config, file).await
        }
        Command::Upload { file, table } => upload(&config, file, &table).await,
        Command::Generate {
            table,
            rows,
            columns,
            seed,
        } => generate(&config, &table, rows, &columns, seed).await,
        Command::Check => check(&config).await,
        Command::Ddl {
            warehouse,
            schema,
            kind,
            objects,
        } => ddl(&config, &warehouse, schema, kind, &objects).await,
    }
}

async fn read_script(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read script: {}", path.display())),
        None => {
            let mut script = String::new();
            tokio::io::stdin()
                .read_to_string(&mut script)
                .await
                .context("Failed to read script from stdin")?;
            Ok(script)
        }
    }
}

async fn exec(config: &Config, file: Option<PathBuf>) -> Result<ExitCode> {
    let script = read_script(file).await?;

    let factory: Arc<dyn SessionFactory> = Arc::new(SqliteDriver::new(&config.database_path));
    let options = RunnerOptions::new().with_max_concurrency(config.max_concurrency);
    let service = QueryService::new(factory, options);

    let execution = service.execute_script(&script).await;
    for result in &execution.results {
        println!("{}\n", output::render_result(result));
    }
    println!("{}", output::render_summary(&execution.summary));

    Ok(if execution.summary.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn upload(config: &Config, file: PathBuf, table_name: &str) -> Result<ExitCode> {
    let loader = Arc::new(SqliteLoader::new(&config.database_path));
    let service = UploadService::new(
        loader,
        &config.credentials.database,
        &config.credentials.schema,
    );

    let table = service.load_file(&file)?;
    let written = service.upload(&table, table_name).await?;

    println!("{}", output::render_table(&service.preview(&table, PREVIEW_ROWS)));
    println!(
        "Uploaded {} row(s) from {} into {}",
        written,
        file.display(),
        table_name
    );
    Ok(ExitCode::SUCCESS)
}

async fn generate(
    config: &Config,
    table_name: &str,
    rows: usize,
    columns: &[ColumnSpec],
    seed: Option<u64>,
) -> Result<ExitCode> {
    let mut generator = match seed {
        Some(seed) => TestDataGenerator::seeded(seed),
        None => TestDataGenerator::from_entropy(),
    };
    let service = TestDataService::new(
        Arc::new(SqliteLoader::new(&config.database_path)),
        &config.credentials.database,
        &config.credentials.schema,
    );

    let (table, written) = service
        .generate_and_save(&mut generator, table_name, columns, rows)
        .await?;

    println!("{}", output::render_table(&table.head(PREVIEW_ROWS)));
    println!("Generated {} row(s) into {}", written, table_name);
    Ok(ExitCode::SUCCESS)
}

async fn check(config: &Config) -> Result<ExitCode> {
    let missing = config.credentials.missing_fields();
    if missing.is_empty() {
        println!("Credentials: complete");
    } else {
        println!("Credentials: missing {}", missing.join(", "));
    }

    let driver = Arc::new(SqliteDriver::new(&config.database_path));
    let factory = DriverSessionFactory::new(driver, config.credentials.clone());
    let ping = connect_and_execute_with_retry(&factory, "SELECT 1", &config.retry.policy()).await;

    match &ping {
        Ok(_) => println!("Database {}: reachable", config.database_path.display()),
        Err(e) => println!(
            "Database {}: {}",
            config.database_path.display(),
            e.message()
        ),
    }

    Ok(if missing.is_empty() && ping.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn ddl(
    config: &Config,
    database: &str,
    schema: Option<String>,
    kind: Option<ObjectKind>,
    objects: &[String],
) -> Result<ExitCode> {
    let driver = Arc::new(SqliteDriver::new(&config.database_path));
    let factory: Arc<dyn SessionFactory> =
        Arc::new(DriverSessionFactory::new(driver, config.credentials.clone()));
    let service = MetadataService::new(factory).with_policy(config.retry.policy());

    let script = match kind {
        Some(kind) => {
            let schema = schema.context("--schema is required with --kind")?;
            service.object_ddl(kind, database, &schema, objects).await?
        }
        None => service.database_ddl(database).await?,
    };

    println!("{}", script);
    Ok(ExitCode::SUCCESS)
}

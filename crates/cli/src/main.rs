//! `employee-service` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`: start the API server.
//! - `add`: insert one employee and print its id.
//! - `list`: print every employee as JSON.
//! - `delete`: delete an employee by id.
//! - `stats`: print the median age and salary.
//!
//! Warehouse options come before the sub-command and fall back to the
//! `BQ_*` environment variables.  A `.env` file in the working directory
//! (or a parent) is loaded first; variables already set take precedence.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api::dto::CreateEmployeeDto;
use db::{EmployeeRepository, MemoryWarehouse, TableRef};
use warehouse::bigquery::DEFAULT_API_URL;
use warehouse::{
    ApplicationDefault, BigQueryConfig, BigQueryWarehouse, StaticToken, TokenSource, Warehouse,
};

#[derive(Parser)]
#[command(
    name = "employee-service",
    about = "Employee records over an analytical warehouse table",
    version
)]
struct Cli {
    #[command(flatten)]
    warehouse: WarehouseArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// BigQuery REST API.
    Bigquery,
    /// Process-local table; contents are lost on exit.
    Memory,
}

#[derive(Debug, Args)]
struct WarehouseArgs {
    #[arg(long, env = "WAREHOUSE_BACKEND", value_enum, default_value_t = Backend::Bigquery)]
    backend: Backend,

    #[arg(long, env = "BQ_PROJECT_ID")]
    project: Option<String>,

    #[arg(long, env = "BQ_DATASET")]
    dataset: Option<String>,

    #[arg(long, env = "BQ_TABLE")]
    table: Option<String>,

    /// Fixed OAuth bearer token, e.g. from `gcloud auth print-access-token`.
    /// Application default credentials are used when unset.
    #[arg(long, env = "BQ_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    #[arg(long, env = "BQ_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    #[arg(long, env = "BQ_LOCATION")]
    location: Option<String>,

    /// Per-statement deadline, polling included.
    #[arg(
        long,
        env = "BQ_TIMEOUT_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..=3600)
    )]
    timeout_secs: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server.
    Serve {
        #[arg(long, env = "BIND", default_value = "0.0.0.0:8000")]
        bind: String,
    },
    /// Add an employee and print the assigned id.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: i64,
        #[arg(long)]
        salary: f64,
    },
    /// Print all employees, ascending by id.
    List,
    /// Delete an employee by id.
    Delete {
        id: i64,
    },
    /// Print the approximate median age and salary.
    Stats,
}

impl WarehouseArgs {
    fn table_ref(&self) -> anyhow::Result<Option<TableRef>> {
        match (&self.project, &self.dataset, &self.table) {
            (Some(project), Some(dataset), Some(table)) => Ok(Some(TableRef::new(
                project.as_str(),
                dataset.as_str(),
                table.as_str(),
            )?)),
            (None, None, None) => Ok(None),
            _ => bail!("BQ_PROJECT_ID, BQ_DATASET and BQ_TABLE must be set together"),
        }
    }

    async fn open(&self) -> anyhow::Result<EmployeeRepository> {
        let table = self.table_ref()?;

        match self.backend {
            Backend::Memory => {
                let table = match table {
                    Some(table) => table,
                    None => TableRef::new("local", "hr", "employees")?,
                };
                warn!("using the in-memory warehouse; data is lost on exit");
                let warehouse: Arc<dyn Warehouse> = Arc::new(MemoryWarehouse::new());
                Ok(EmployeeRepository::open(warehouse, table))
            }
            Backend::Bigquery => {
                let table = table.context(
                    "BQ_PROJECT_ID, BQ_DATASET and BQ_TABLE are required for the bigquery backend",
                )?;
                let tokens: Arc<dyn TokenSource> = match &self.access_token {
                    Some(token) => {
                        info!("using the fixed BQ_ACCESS_TOKEN; it is not refreshed");
                        Arc::new(StaticToken::new(token.as_str()))
                    }
                    None => Arc::new(
                        ApplicationDefault::discover()
                            .await
                            .context("set BQ_ACCESS_TOKEN or configure application default credentials")?,
                    ),
                };

                let config = BigQueryConfig {
                    api_url: self.api_url.clone(),
                    project_id: table.project().to_string(),
                    location: self.location.clone(),
                    timeout: Duration::from_secs(self.timeout_secs),
                };
                let warehouse: Arc<dyn Warehouse> = Arc::new(BigQueryWarehouse::new(config, tokens)?);
                Ok(EmployeeRepository::open(warehouse, table))
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match env_file {
        Ok(path) => info!("loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("ignoring unreadable .env file: {e}"),
    }

    let cli = Cli::parse();
    let repository = Arc::new(cli.warehouse.open().await?);

    let outcome = run(cli.command, &repository).await;
    repository.close().await?;
    outcome
}

async fn run(command: Command, repository: &Arc<EmployeeRepository>) -> anyhow::Result<()> {
    match command {
        Command::Serve { bind } => {
            info!("Starting API server on {bind}");
            api::serve(&bind, api::AppState::new(Arc::clone(repository)))
                .await
                .with_context(|| format!("API server on {bind} failed"))?;
        }
        Command::Add { name, age, salary } => {
            let employee = CreateEmployeeDto { name, age, salary }.validate()?;
            let employee_id = repository.add(&employee).await?;
            println!("{employee_id}");
        }
        Command::List => {
            let records = repository.list().await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::Delete { id } => {
            repository.delete_by_id(id).await?;
            println!("deleted {id}");
        }
        Command::Stats => {
            let stats = serde_json::json!({
                "median_age": repository.median_age().await?,
                "median_salary": repository.median_salary().await?,
            });
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}

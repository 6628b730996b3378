//! CLI entry point for the route client.
//!
//! Resolves a bearer credential from the ambient environment, then calls the
//! item routes of the configured service one after another and echoes each
//! response to stdout.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use run_route_client::credentials::{
    AdcCredentials, AmbientCredentials, CredentialProvider, EnvCredentials, StaticCredentials,
};
use run_route_client::fetch::BasicClient;
use run_route_client::services::items_api::{ItemsApi, NewItem};
use run_route_client::services::run::{Route, RunPlan, run_routes};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const PLACEHOLDER_BASE_URL: &str = "https://YOUR_CLOUD_RUN_BASE_URL";

#[derive(Parser)]
#[command(name = "run_route_client")]
#[command(about = "Call a service's item routes with ambient bearer credentials", long_about = None)]
struct Cli {
    /// Base endpoint of the service (e.g. https://my-service-xyz-uc.a.run.app)
    #[arg(long, env = "BASE_URL", default_value = PLACEHOLDER_BASE_URL)]
    base_url: String,

    /// Audience for identity tokens (defaults to the base URL)
    #[arg(long, env = "AUDIENCE")]
    audience: Option<String>,

    /// Id used for GET /data/item/{id}
    #[arg(long, env = "ITEM_ID", default_value = "123")]
    item_id: String,

    /// Bearer token to use instead of the ambient lookup
    #[arg(long, env = "IDENTITY_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Environment variable consulted before Application Default Credentials
    #[arg(long, default_value = EnvCredentials::DEFAULT_VAR)]
    token_var: String,

    /// Stop at the first failed route call instead of running the rest
    #[arg(long, default_value_t = false)]
    fail_fast: bool,

    /// Run a single route
    #[arg(long, value_enum)]
    only: Option<Route>,

    /// Name of the item to create
    #[arg(long, default_value = "New Learning Module")]
    name: String,

    /// Duration of the item to create, in minutes
    #[arg(long, default_value_t = 60)]
    duration_minutes: u32,

    /// Category of the item to create
    #[arg(long, default_value = "Programming")]
    category: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let _guard = init_logging()?;

    let cli = Cli::parse();

    if cli.base_url == PLACEHOLDER_BASE_URL {
        warn!("Base URL is still the placeholder; set --base-url or BASE_URL");
    }

    let credentials = credential_provider(&cli)?;
    let api = ItemsApi::connect(&cli.base_url, BasicClient::new(), credentials)
        .await
        .context("failed to prepare route client")?;
    info!(base_url = api.base_url(), "Credentials resolved");

    let plan = RunPlan {
        routes: match cli.only {
            Some(route) => vec![route],
            None => Route::ALL.to_vec(),
        },
        item_id: cli.item_id,
        new_item: NewItem {
            name: cli.name,
            duration_minutes: cli.duration_minutes,
            category: cli.category,
        },
        fail_fast: cli.fail_fast,
    };

    run_routes(&api, &plan, &mut std::io::stdout().lock()).await?;
    Ok(())
}

/// Builds the credential chain from the CLI options. No I/O happens here.
fn credential_provider(cli: &Cli) -> Result<Arc<dyn CredentialProvider>> {
    if let Some(token) = &cli.token {
        return Ok(Arc::new(StaticCredentials::new(token.as_str())));
    }

    let audience = cli
        .audience
        .as_deref()
        .unwrap_or_else(|| cli.base_url.trim_end_matches('/'));
    let adc = AdcCredentials::new(audience)
        .context("failed to initialize application default credentials")?;

    Ok(Arc::new(AmbientCredentials::from_sources(
        EnvCredentials::from_var(&cli.token_var),
        Arc::new(adc),
    )))
}

/// Colored stderr logging, plus a JSON daily-rolling file when `LOG_FILE_PATH` is set.
fn init_logging() -> Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let (json_layer, guard) = match std::env::var("LOG_FILE_PATH") {
        Ok(log_file_path) => {
            let log_dir = Path::new(&log_file_path)
                .parent()
                .unwrap_or(Path::new("logs"));
            let log_file_name = Path::new(&log_file_path)
                .file_name()
                .unwrap_or(OsStr::new("run_route_client.log"));

            let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(non_blocking_file)
                .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(guard)
}

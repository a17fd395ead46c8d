//! BucketStack Bucket Service - provisions a configurable S3 bucket.
//!
//! The bucket is named `<bucketName>-<account id>`, always blocks public
//! access, and optionally carries versioning, default encryption, and
//! noncurrent-version lifecycle rules. On success the stack outputs are
//! printed to stdout as JSON.
//!
//! # Usage
//!
//! ```text
//! bucketstack-bucket-service [--preview] [--config <path>]
//! ```
//!
//! The optional config file is a flat JSON object of namespaced settings
//! (`"bucket-service:bucketName": "logs"`). Environment variables override it.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BUCKETSTACK_CONFIG` | *(unset)* | Settings file, same as `--config` |
//! | `BUCKET_NAME` | *(required)* | Base bucket name |
//! | `VERSIONING` | `false` | Enable versioning |
//! | `ENCRYPTION` | `AES256` | `AES256` or `aws:kms` |
//! | `LIFECYCLE_ENABLED` | `false` | Noncurrent-version lifecycle rules |
//! | `LIFECYCLE_DAYS` | `90` | Days before transition to `STANDARD_IA` |
//! | `EXPIRATION_DAYS` | `0` | Days before noncurrent versions expire |
//! | `AWS_REGION` | `eu-north-1` | Deployment region |
//! | `AWS_ENDPOINT_URL` | *(unset)* | S3/STS endpoint override |
//! | `S3_FORCE_PATH_STYLE` | `false` | Path-style bucket addressing |
//! | `BUCKETSTACK_PREVIEW` | `false` | Print the plan instead of applying it |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `json` for structured logs |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::path::PathBuf;

use anyhow::{Context, Result};
use bucketstack_core::EngineConfig;
use bucketstack_engine::{RunMode, RunReport, S3Engine, run};
use bucketstack_stacks::{BucketServiceConfig, BucketServiceStack, Stack};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the settings file.
const CONFIG_ENV: &str = "BUCKETSTACK_CONFIG";

/// Initialize the tracing subscriber on stderr.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

/// Pick the run mode from the config and command-line flags.
fn run_mode(config: &EngineConfig, args: &[String]) -> RunMode {
    if config.preview || args.iter().any(|a| a == "--preview") {
        RunMode::Preview
    } else {
        RunMode::Apply
    }
}

/// The settings file from `--config <path>`, falling back to `env_path`.
fn config_path(args: &[String], env_path: Option<String>) -> Result<Option<PathBuf>> {
    match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args
                .get(i + 1)
                .filter(|p| !p.starts_with("--"))
                .context("--config requires a path")?;
            Ok(Some(PathBuf::from(path)))
        }
        None => Ok(env_path.filter(|p| !p.is_empty()).map(PathBuf::from)),
    }
}

/// Render the run outcome as pretty JSON.
fn render(report: &RunReport) -> Result<String> {
    let json = match report {
        RunReport::Preview(plan) => serde_json::to_string_pretty(plan)?,
        RunReport::Applied(state) => serde_json::to_string_pretty(&state.outputs)?,
    };
    Ok(json)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = EngineConfig::from_env();

    init_tracing(&config.log_level)?;

    let path = config_path(&args, std::env::var(CONFIG_ENV).ok())?;
    let service_config = BucketServiceConfig::load(path.as_deref())
        .context("failed to load bucket service configuration")?;
    let stack = BucketServiceStack::new(service_config);
    let mode = run_mode(&config, &args);

    info!(
        stack = stack.name(),
        bucket = %stack.config().bucket_name,
        region = %stack.config().region,
        ?mode,
        version = VERSION,
        "starting BucketStack bucket service"
    );

    let engine = S3Engine::connect(&stack.provider(), &config).await;
    let report = run(&engine, mode, |account| stack.build(account))
        .await
        .context("bucket service stack failed")?;

    println!("{}", render(&report)?);
    Ok(())
}

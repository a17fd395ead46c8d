//! BucketStack Bootstrap - provisions the state bucket.
//!
//! Creates `kro-platform-pulumi-state-<account id>` in `eu-north-1`, versioned,
//! encrypted with `AES256`, and closed to public access. On success the stack
//! outputs are printed to stdout as JSON.
//!
//! # Usage
//!
//! ```text
//! bucketstack-bootstrap [--preview]
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AWS_ENDPOINT_URL` | *(unset)* | S3/STS endpoint override |
//! | `S3_FORCE_PATH_STYLE` | `false` | Path-style bucket addressing |
//! | `BUCKETSTACK_PREVIEW` | `false` | Print the plan instead of applying it |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `json` for structured logs |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use anyhow::{Context, Result};
use bucketstack_core::EngineConfig;
use bucketstack_engine::{RunMode, RunReport, S3Engine, run};
use bucketstack_stacks::{BootstrapStack, Stack};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

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

    let stack = BootstrapStack;
    let mode = run_mode(&config, &args);
    info!(stack = stack.name(), ?mode, version = VERSION, "starting BucketStack bootstrap");

    let engine = S3Engine::connect(&stack.provider(), &config).await;
    let report = run(&engine, mode, |account| stack.build(account))
        .await
        .context("bootstrap stack failed")?;

    println!("{}", render(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use bucketstack_core::AccountId;
    use bucketstack_engine::InMemoryEngine;

    use super::*;

    #[test]
    fn test_should_select_preview_from_flag_or_config() {
        let config = EngineConfig::default();
        assert_eq!(run_mode(&config, &[]), RunMode::Apply);
        assert_eq!(run_mode(&config, &["--preview".to_owned()]), RunMode::Preview);

        let config = EngineConfig {
            preview: true,
            ..EngineConfig::default()
        };
        assert_eq!(run_mode(&config, &[]), RunMode::Preview);
    }

    #[tokio::test]
    async fn test_should_render_outputs_as_json() {
        let engine = InMemoryEngine::new(AccountId::new("123456789012").unwrap());
        let report = run(&engine, RunMode::Apply, |account| BootstrapStack.build(account))
            .await
            .expect("bootstrap run");

        let rendered: serde_json::Value =
            serde_json::from_str(&render(&report).unwrap()).expect("valid json");
        assert_eq!(
            rendered["stateBackendUrl"],
            "s3://kro-platform-pulumi-state-123456789012"
        );
    }
}

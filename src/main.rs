use std::process::ExitCode;

use clap::Parser;
use rls_smoke::{AppError, CheckMode, Config, RunOptions, SmokeTest, exit_code};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rls-smoke")]
#[command(about = "Check that row-level security keeps two test users' data apart")]
struct Cli {
    /// Pass a step on any 2xx status without inspecting returned rows
    #[arg(long)]
    status_only: bool,

    /// After teardown, confirm the item and both users are gone
    #[arg(long)]
    verify_cleanup: bool,

    /// Exit with status 2 when any check failed
    #[arg(long)]
    fail_on_error: bool,

    /// Domain for generated test emails (overrides RLS_SMOKE_EMAIL_DOMAIN)
    #[arg(long)]
    email_domain: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before anything reads the environment, RUST_LOG included.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let result = match Config::from_env() {
        Ok(mut config) => {
            if let Some(domain) = cli.email_domain {
                config.email_domain = domain;
            }

            let options = RunOptions {
                check_mode: if cli.status_only {
                    CheckMode::StatusOnly
                } else {
                    CheckMode::Strict
                },
                verify_cleanup: cli.verify_cleanup,
            };

            let result = SmokeTest::new(&config, options).run().await;
            if let Err(e) = &result {
                eprintln!("❌ RLS smoke test failed: {}", e);
            }
            result
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            Err(AppError::from(e))
        }
    };

    ExitCode::from(exit_code(&result, cli.fail_on_error))
}

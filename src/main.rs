use clap::Parser;
use idempay::application::controller::SubmissionController;
use idempay::domain::payment::PaymentRequest;
use idempay::domain::policy::RetryPolicy;
use idempay::domain::ports::SharedProcessor;
use idempay::infrastructure::simulated::{
    BackendTiming, RandomPlan, Resolution, ScriptedPlan, SimulatedBackend,
};
use miette::{IntoDiagnostic, Result, miette};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Payer identity, e.g. an email address
    payer: String,

    /// Payment amount
    amount: Decimal,

    /// Deterministic backend script instead of random outcomes
    /// (comma-separated `ok`, `fail`, `slow`)
    #[arg(long)]
    script: Option<String>,

    /// Submit the same payment a second time after the first chain settles
    #[arg(long)]
    resubmit: bool,

    /// Maximum retry attempts per submission chain
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Linear backoff step in milliseconds
    #[arg(long, default_value_t = 1000)]
    backoff_step_ms: u64,

    /// Backend round-trip delay in milliseconds
    #[arg(long, default_value_t = 800)]
    short_delay_ms: u64,

    /// Lower bound of the slow-confirmation delay in milliseconds
    #[arg(long, default_value_t = 5000)]
    long_delay_min_ms: u64,

    /// Upper bound of the slow-confirmation delay in milliseconds
    #[arg(long, default_value_t = 10000)]
    long_delay_max_ms: u64,
}

/// One state transition, printed as a JSON line for the caller to render.
#[derive(Serialize)]
struct StatusLine<'a> {
    status: &'static str,
    message: &'a str,
}

fn parse_script(script: &str) -> Result<Vec<Resolution>> {
    script
        .split(',')
        .map(|step| match step.trim() {
            "ok" => Ok(Resolution::Commit),
            "fail" => Ok(Resolution::Reject),
            "slow" => Ok(Resolution::CommitDelayed),
            other => Err(miette!(
                "unknown script step '{other}', expected ok, fail or slow"
            )),
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let timing = BackendTiming {
        short_delay: Duration::from_millis(cli.short_delay_ms),
        long_delay_min: Duration::from_millis(cli.long_delay_min_ms),
        long_delay_max: Duration::from_millis(cli.long_delay_max_ms),
    };
    let processor: SharedProcessor = match &cli.script {
        Some(script) => Arc::new(SimulatedBackend::with_plan_and_timing(
            ScriptedPlan::new(parse_script(script)?),
            timing,
        )),
        None => Arc::new(SimulatedBackend::with_plan_and_timing(RandomPlan, timing)),
    };

    let policy = RetryPolicy::new(cli.max_retries, Duration::from_millis(cli.backoff_step_ms));
    let controller = SubmissionController::new(processor, policy);

    let mut transitions = controller.subscribe();
    let printer = tokio::spawn(async move {
        while transitions.changed().await.is_ok() {
            let state = transitions.borrow_and_update().clone();
            let line = StatusLine {
                status: state.status(),
                message: state.message(),
            };
            if let Ok(json) = serde_json::to_string(&line) {
                println!("{json}");
            }
        }
    });

    let request = PaymentRequest::new(cli.payer.clone(), cli.amount);
    controller.submit(request.clone()).await;
    controller.settled().await;

    if cli.resubmit {
        controller.submit(request).await;
        controller.settled().await;
    }

    drop(controller);
    printer.await.into_diagnostic()?;

    Ok(())
}

//! pages-await - Entry Point
//!
//! Waits for the Cloudflare Pages deployment of the current commit, mirrors it
//! into GitHub deployments and optionally posts a chat notification.

use std::collections::HashMap;
use std::env;

use pages_await::actions::commit::collect_commit_info;
use pages_await::actions::context::RunnerContext;
use pages_await::actions::outputs::ActionOutputs;
use pages_await::app::options::{log_level, AppOptions, Inputs};
use pages_await::app::run::{publish_outcome, run, ISSUES_URL};
use pages_await::errors::AwaitError;
use pages_await::logs::{init_logging, LogOptions};
use pages_await::utils::version_info;

use tracing::error;

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to render version info: {e}"),
        }
        return;
    }

    let json_logs = cli_args.contains_key("json-logs");
    let inputs = Inputs::from_process(cli_args);
    let mut outputs = ActionOutputs::from_env();

    // Initialize logging; an invalid level still fails the step below
    let level = log_level(&inputs);
    let log_options = LogOptions::for_runner(
        level.as_ref().ok().copied().flatten(),
        json_logs,
        |name| inputs.var(name),
    );
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let options = match level.and_then(|_| AppOptions::from_inputs(&inputs)) {
        Ok(options) => options,
        Err(e) => {
            error!("{}", e);
            outputs.set_failed(&e.to_string());
            std::process::exit(1);
        }
    };

    let runner = RunnerContext::load(&inputs).await;
    let commit = collect_commit_info(&runner).await;

    match tokio::spawn(run(options, commit)).await {
        Ok(Ok(outcome)) => {
            if let Err(e) = publish_outcome(&outcome, &mut outputs).await {
                error!("Failed to publish outputs: {}", e);
                outputs.set_failed(&e.to_string());
            }
        }
        Ok(Err(e)) => {
            error!("{}", e);
            if matches!(e, AwaitError::Internal(_)) {
                error!("Please report this issue: {}", ISSUES_URL);
            }
            outputs.set_failed(&e.to_string());
        }
        Err(e) => {
            error!("Please report this issue: {}", ISSUES_URL);
            error!("{}", e);
            outputs.set_failed(&AwaitError::from(e).to_string());
        }
    }

    if outputs.is_failed() {
        std::process::exit(1);
    }
}

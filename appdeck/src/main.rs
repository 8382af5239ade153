//! Appdeck - Entry Point
//!
//! Command-line front end for the app lifecycle manager: create, get,
//! list, deploy, delete, stream logs, and health-check managed apps.

use std::collections::HashMap;
use std::env;

use anyhow::{bail, Context, Result};
use tracing::error;

use appdeck::apps::health::{check_app, HealthOptions};
use appdeck::apps::logs::fetch_app_logs;
use appdeck::apps::manager::{AppManager, CreateOrUpdateApp, ListApps};
use appdeck::apps::tracker::NoopTracker;
use appdeck::config::WorkspaceOptions;
use appdeck::http::apps::RestControlPlane;
use appdeck::http::client::HttpClient;
use appdeck::logs::{init_logging, LogOptions};
use appdeck::utils::version_info;

const USAGE: &str = "Usage: appdeck <create|get|list|deploy|delete|logs|health> \
    --name=<app> [--path=<workspace path>] [--description=..] [--mode=snapshot] \
    [--contains=..] [--limit=N] [--deployment-id=..] [--no-restart] \
    [--host=..] [--token=..] [--log-level=info]";

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut command: Option<String> = None;
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
        } else if command.is_none() {
            command = Some(arg.clone());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{}", e),
        }
        return;
    }

    // Initialize logging
    let log_options = LogOptions {
        log_level: cli_args
            .get("log-level")
            .and_then(|level| level.parse().ok())
            .unwrap_or_default(),
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let Some(command) = command else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    if let Err(e) = run_command(&command, &cli_args).await {
        error!("{} failed: {:#}", command, e);
        std::process::exit(1);
    }
}

async fn run_command(command: &str, cli_args: &HashMap<String, String>) -> Result<()> {
    let workspace = workspace_options(cli_args)?;
    let control_plane = RestControlPlane::new(HttpClient::new(&workspace)?);
    let tracker = NoopTracker;
    let manager = AppManager::new(&control_plane, &tracker);

    let name = |key: &str| require(cli_args, key, command);

    match command {
        "create" | "deploy" => {
            let summary = manager
                .create_or_update(CreateOrUpdateApp {
                    name: name("name")?.to_string(),
                    source_code_path: cli_args.get("path").cloned(),
                    description: cli_args.get("description").cloned(),
                    mode: cli_args.get("mode").cloned(),
                })
                .await?;
            print_json(&summary)
        }
        "get" => {
            let app = manager.get(name("name")?).await?;
            print_json(&app)
        }
        "list" => {
            let apps = manager
                .list(ListApps {
                    name_contains: cli_args.get("contains").cloned(),
                    limit: cli_args
                        .get("limit")
                        .map(|l| l.parse().context("--limit must be an integer"))
                        .transpose()?,
                })
                .await?;
            print_json(&apps)
        }
        "delete" => {
            let confirmation = manager.delete(name("name")?).await?;
            print_json(&confirmation)
        }
        "logs" => {
            let logs = fetch_app_logs(
                &control_plane,
                &workspace,
                name("name")?,
                cli_args.get("deployment-id").map(String::as_str),
            )
            .await?;
            print_json(&logs)
        }
        "health" => {
            let options = HealthOptions {
                restart_on_unhealthy: !cli_args.contains_key("no-restart"),
                ..Default::default()
            };
            let report = check_app(&control_plane, &workspace, name("name")?, &options).await?;
            print_json(&report)
        }
        other => bail!("Unknown command {:?}\n{}", other, USAGE),
    }
}

fn require<'a>(
    cli_args: &'a HashMap<String, String>,
    key: &str,
    command: &str,
) -> Result<&'a str> {
    cli_args
        .get(key)
        .map(String::as_str)
        .with_context(|| format!("--{}=<value> is required for {}", key, command))
}

fn workspace_options(cli_args: &HashMap<String, String>) -> Result<WorkspaceOptions> {
    match (cli_args.get("host"), cli_args.get("token")) {
        (Some(host), Some(token)) => Ok(WorkspaceOptions::new(host.clone(), token.clone())),
        _ => Ok(WorkspaceOptions::from_env()?),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

mod calculator;
mod config;
mod history;
mod ipc;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::calculator::evaluate_expression;
use crate::config::Config;
use crate::ipc::client::DaemonClient;
use crate::ipc::{EvalRequest, EvalResponse, HistoryResponse, StatsResponse};

#[derive(Parser)]
#[command(name = "safecalc", version, about = "Safe calculator daemon and client")]
struct Cli {
    /// Path to config.toml (defaults to ~/.config/safecalc/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print raw JSON responses.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the daemon in the foreground.
    Serve,
    /// Evaluate an expression.
    Eval {
        /// Calculator mode recorded with the entry (standard or scientific).
        #[arg(long, short)]
        mode: Option<String>,

        /// Evaluate in-process without contacting the daemon or recording history.
        #[arg(long)]
        local: bool,

        /// The expression; multiple words are joined with spaces.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        expression: Vec<String>,
    },
    /// Show the most recent evaluations.
    History,
    /// Delete all recorded evaluations.
    Clear,
    /// Show the number of recorded evaluations and the latest timestamp.
    Stats,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("safecalc=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref());

    match cli.command {
        Command::Serve => {
            ipc::server::run(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Eval {
            mode,
            local,
            expression,
        } => {
            let expression = expression.join(" ");
            let response = if local {
                EvalResponse::from(evaluate_expression(&expression))
            } else {
                let client = DaemonClient::connect(&config.socket_path).await?;
                client
                    .eval(EvalRequest {
                        expression: Some(expression),
                        mode,
                    })
                    .await?
            };
            print_eval(&response, cli.json)
        }
        Command::History => {
            let client = DaemonClient::connect(&config.socket_path).await?;
            let response = client.history().await?;
            print_history(&response, cli.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Clear => {
            let client = DaemonClient::connect(&config.socket_path).await?;
            let response = client.clear_history().await?;
            if cli.json {
                print_json(&response)?;
            } else {
                println!("History cleared");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Stats => {
            let client = DaemonClient::connect(&config.socket_path).await?;
            let response = client.stats().await?;
            print_stats(&response, cli.json)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_eval(response: &EvalResponse, json: bool) -> Result<ExitCode> {
    if json {
        print_json(response)?;
    } else if let Some(result) = &response.result {
        println!("{result}");
    } else if let Some(error) = &response.error {
        eprintln!("{error}");
    }

    Ok(if response.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_history(response: &HistoryResponse, json: bool) -> Result<()> {
    if json {
        return print_json(response);
    }

    if response.items.is_empty() {
        println!("No history");
    }
    for entry in &response.items {
        println!(
            "#{:<5} {}  [{}]  {} = {}",
            entry.id,
            entry.created_at,
            entry.mode.as_str(),
            entry.expression,
            entry.result
        );
    }
    Ok(())
}

fn print_stats(response: &StatsResponse, json: bool) -> Result<()> {
    if json {
        return print_json(response);
    }

    println!("Total: {}", response.total);
    println!("Last:  {}", response.last.as_deref().unwrap_or("never"));
    Ok(())
}

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};

use stepwise_config::StepwiseConfig;
use stepwise_core::executor::{ExecuteError, ExecuteOptions};
use stepwise_runtime::{init_tracing_if_needed, RunOptions, RuntimeApp, RuntimeError};

const DEFAULT_CONFIG_PATH: &str = "configs/stepwise.yaml";

#[derive(Debug, Parser)]
#[command(name = "stepwise", about = "Turn a request into a plan and run it")]
pub struct Cli {
    /// Config file; defaults to configs/stepwise.yaml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a plan and print it
    Plan(PlanArgs),
    /// Generate a plan, execute it and print the execution record
    Run(RunArgs),
    /// List the available actions
    Actions,
}

#[derive(Debug, Args, Clone)]
struct PlanArgs {
    /// Bypass the plan cache
    #[arg(long)]
    no_cache: bool,
    #[arg(value_name = "REQUEST", required = true)]
    request: Vec<String>,
}

#[derive(Debug, Args, Clone)]
struct RunArgs {
    /// Bypass the plan cache
    #[arg(long)]
    no_cache: bool,
    #[arg(long)]
    user_id: Option<String>,
    #[arg(long)]
    session_id: Option<String>,
    #[arg(value_name = "REQUEST", required = true)]
    request: Vec<String>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let app = build_app(self.config.as_deref())?;
        match self.command {
            Command::Plan(args) => {
                let request = args.request.join(" ");
                let plan = app.generate(&request, cache_override(args.no_cache)).await?;
                print_json(&serde_json::to_value(&plan)?)
            }
            Command::Run(args) => {
                let request = args.request.join(" ");
                let options = RunOptions {
                    use_cache: cache_override(args.no_cache),
                    execute: ExecuteOptions {
                        user_id: args.user_id,
                        session_id: args.session_id,
                        ..ExecuteOptions::default()
                    },
                };
                match app.run(&request, options).await {
                    Ok(outcome) => {
                        let record = app
                            .status(&outcome.report.execution_id)
                            .await?
                            .context("execution record missing after run")?;
                        print_json(&serde_json::to_value(&record)?)
                    }
                    Err(RuntimeError::Execute(err @ ExecuteError::StepFailed { .. })) => {
                        if let Some(record) = err.execution() {
                            print_json(&serde_json::to_value(record)?)?;
                        }
                        Err(err.into())
                    }
                    Err(err) => Err(err.into()),
                }
            }
            Command::Actions => {
                let actions: Vec<Value> = app
                    .actions()
                    .into_iter()
                    .map(|meta| {
                        json!({
                            "name": meta.name,
                            "description": meta.description,
                            "input_schema": meta.input_schema,
                        })
                    })
                    .collect();
                print_json(&Value::Array(actions))
            }
        }
    }
}

fn cache_override(no_cache: bool) -> Option<bool> {
    no_cache.then_some(false)
}

fn build_app(config: Option<&Path>) -> anyhow::Result<RuntimeApp> {
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    let path = config.or_else(|| default_path.exists().then_some(default_path));
    let app = match path {
        Some(path) => RuntimeApp::from_config_path(path)
            .with_context(|| format!("failed to start from {}", path.display()))?,
        None => {
            let config = StepwiseConfig::default();
            init_tracing_if_needed(&config.observability);
            RuntimeApp::from_config(config)?
        }
    };
    Ok(app)
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

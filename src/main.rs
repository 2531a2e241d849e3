//! Tierroute command-line entry point
//!
//! Runs a prompt through the tiered executor, prints a routing decision,
//! writes a config template, or serves the HTTP API.

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::net::SocketAddr;
use std::sync::Arc;
use tierroute::{
    cli::{self, Cli, Command},
    config::Config,
    conversation::Conversation,
    error::{AppError, AppResult},
    execution::{ExecutionPolicy, Executor},
    handlers::{self, AppState},
    models::HttpCompletionClient,
    router::TierClassifier,
    telemetry,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = &cli.command {
        return write_config_template(output.as_deref());
    }

    let config = load_config(&cli)?;
    telemetry::init(&config.observability.log_level);

    match cli.command {
        Some(Command::Classify { ref prompt }) => {
            let Some(prompt) = cli::join_prompt(prompt) else {
                return Err(AppError::Validation("prompt cannot be empty".to_string()).into());
            };
            let decision = TierClassifier::from_config(&config)
                .classify(&prompt, &Conversation::from_prompt(&prompt));
            println!("{}", cli::render_decision(&decision));
        }
        Some(Command::Serve { ref host, port }) => {
            serve(config, host.clone(), port).await?;
        }
        Some(Command::Config { .. }) => {}
        None => {
            let prompt = match cli.prompt_text() {
                Some(prompt) => prompt,
                None => read_prompt_from_stdin()?,
            };
            run_prompt(&cli, &config, &prompt).await?;
        }
    }

    Ok(())
}

/// Load the config file; a missing default file falls back to built-in defaults
fn load_config(cli: &Cli) -> AppResult<Config> {
    let (path, explicit) = cli.config_path();
    if explicit {
        Config::from_file(path)
    } else {
        Config::from_file_or_default(path)
    }
}

fn write_config_template(output: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let template = cli::generate_config_template();
    match output {
        Some(path) => {
            std::fs::write(path, template)?;
            eprintln!("Configuration template written to {}", path);
        }
        None => print!("{}", template),
    }
    Ok(())
}

fn read_prompt_from_stdin() -> AppResult<String> {
    print!("Enter your prompt: ");
    io::stdout()
        .flush()
        .map_err(|e| AppError::Internal(format!("Failed to flush stdout: {}", e)))?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| AppError::Internal(format!("Failed to read prompt from stdin: {}", e)))?;

    let prompt = line.trim().to_string();
    if prompt.is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }
    Ok(prompt)
}

async fn run_prompt(cli: &Cli, config: &Config, prompt: &str) -> AppResult<()> {
    let client = Arc::new(HttpCompletionClient::from_config(&config.proxy)?);
    let executor = Executor::from_config(config, client)?;

    let result = match cli.max_local_retries {
        Some(retries) => {
            let policy: ExecutionPolicy = executor.policy().with_max_local_retries(retries)?;
            let conversation = Conversation::from_prompt(prompt);
            executor
                .execute_with_policy(prompt, &conversation, &policy)
                .await
        }
        None => executor.run_prompt(prompt).await,
    };

    println!("{}", cli::render_result(&result));
    Ok(())
}

async fn serve(config: Config, host: Option<String>, port: Option<u16>) -> AppResult<()> {
    let mut config = config;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let ip: std::net::IpAddr = config.server.host.parse().map_err(|e| {
        AppError::Config(format!(
            "server.host '{}' is not a valid IP address: {}",
            config.server.host, e
        ))
    })?;
    let addr = SocketAddr::from((ip, config.server.port));

    let client = Arc::new(HttpCompletionClient::from_config(&config.proxy)?);
    let state = AppState::new(Arc::new(config), client)?;
    let app = handlers::app(state);

    tracing::info!("Starting Tierroute server on {}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

//! Terminal chat against a Foundry agent.
//!
//! Reads one user message per line from stdin and prints a plain transcript of
//! the run events. Approval requests are answered interactively.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use foundry_agents::ClientFactory;
use foundry_api::config::{Config, Secrets};
use foundry_api::render::Transcript;
use foundry_api::telemetry::init_logging;
use foundry_runner::{AgentSession, ApprovalDecision};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Chat with an Azure AI Foundry agent
#[derive(Parser, Debug)]
#[command(name = "foundry-chat", version, about = "Terminal chat with a Foundry agent")]
struct Args {
    /// Continue an existing thread instead of creating a new one
    #[arg(short, long)]
    thread: Option<String>,

    /// Wait for the final reply instead of streaming run events
    #[arg(long)]
    simple: bool,

    /// Let the agent call MCP tools without asking
    #[arg(long)]
    no_approval: bool,

    /// Config file to use instead of config/default.toml + config/{ENV}.toml
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

type InputLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_ref())?;

    // Keep stdout for the transcript
    let mut logging = config.logging.clone();
    logging.format = "compact".to_string();
    init_logging(&logging);

    let client = ClientFactory::create_client(config.foundry_config()?)?;
    let options = config
        .run_options()
        .with_require_approval(config.run.require_approval && !args.no_approval);

    let mut builder = AgentSession::builder()
        .client(client)
        .agent_id(config.foundry.agent_id.clone())
        .run_options(options)
        .poll_config(config.poll_config());
    if let Some(thread_id) = args.thread {
        builder = builder.thread_id(thread_id);
    }
    if let Some(credential) = config.mcp_credential()? {
        builder = builder.with_mcp(config.mcp.server_label.clone(), credential);
    }
    let mut session = builder.build()?;

    let thread_id = session.ensure_thread().await?;
    println!("Thread: {}  (type 'exit' to quit)", thread_id);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut transcript = Transcript::new();

    loop {
        prompt("you> ")?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if matches!(message, "exit" | "quit") {
            break;
        }

        let (thread_id, run_id) = session.send_message(message).await?;

        if args.simple {
            match session.wait_for_reply(&thread_id, &run_id).await {
                Ok(reply) => {
                    println!("assistant> {}", reply.content);
                    if !reply.citations.is_empty() {
                        println!("  sources: {}", reply.citations.join(", "));
                    }
                }
                Err(e) => println!("error> {}", e),
            }
        } else {
            stream_run(&session, &mut transcript, &mut lines, &thread_id, &run_id).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let Some(path) = path else {
        return Config::load().context("Failed to load configuration");
    };

    let mut config = Config::from_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    config.secrets = Secrets::from_env();
    config.validate()?;
    Ok(config)
}

/// Print events until the run ends, asking for a decision at every approval request
async fn stream_run(
    session: &AgentSession,
    transcript: &mut Transcript,
    lines: &mut InputLines,
    thread_id: &str,
    run_id: &str,
) -> Result<()> {
    let mut processor = session.processor();
    let poll_interval = session.poll_config().poll_interval;

    loop {
        let mut events = processor.poll_run_events(thread_id, run_id, poll_interval)?;
        while let Some(event) = events.next().await {
            println!("{}", transcript.record(&event));
        }

        let Some(approval) = processor.blocked_event().cloned() else {
            return Ok(());
        };

        let approved = ask_approval(lines).await?;
        let decision = ApprovalDecision::from_approved(approved);
        session.submit_approvals(&approval, decision).await?;
        println!("[{}]", if approved { "approved" } else { "denied" });

        processor.unblock();
    }
}

async fn ask_approval(lines: &mut InputLines) -> Result<bool> {
    prompt("approve? [y/N] ")?;
    let answer = lines.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn prompt(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

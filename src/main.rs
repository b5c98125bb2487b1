use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use imessage_summary::api;
use imessage_summary::config::{load_dotenv, Settings};
use imessage_summary::services::contacts::{harvest_contacts, load_or_harvest};
use imessage_summary::services::messages::{fetch_chat_names, fetch_transcript};
use imessage_summary::state::AppState;
use imessage_summary::summary::summarize_lines;
use imessage_summary::transcript::{assemble, Transcript};
use imessage_summary::AppError;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "imessage-summary",
    version,
    about = "Summarize recent messages from an iMessage chat"
)]
struct Cli {
    /// Path to the Messages database (defaults to ~/Library/Messages/chat.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Path to the contacts file (defaults to ./all-contacts.json)
    #[arg(long, global = true)]
    contacts: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Summarize the most recent messages of a chat
    Summarize {
        /// Display name of the chat in Messages
        #[arg(short, long)]
        chat: String,

        /// Number of most recent messages to include
        #[arg(short, long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
        messages: u32,

        /// Number of output paragraphs, 3-4 sentences each
        #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
        paragraphs: u32,

        /// Skip the model and print the transcript instead
        #[arg(long, visible_alias = "np")]
        no_prompt: bool,

        /// With --no-prompt, print the transcript as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the transcript of a chat without summarizing it
    Transcript {
        #[arg(short, long)]
        chat: String,

        #[arg(short, long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
        messages: u32,

        /// Print as JSON instead of `speaker: text` lines
        #[arg(long)]
        json: bool,
    },

    /// List named chats, most recently active first
    Chats {
        #[arg(short, long, default_value_t = 50)]
        limit: u32,
    },

    /// Manage the contacts file
    Contacts {
        #[command(subcommand)]
        command: ContactsCommand,
    },

    /// Serve transcripts and summaries over HTTP on localhost
    Serve {
        #[arg(long, default_value_t = 3883)]
        port: u16,
    },
}

#[derive(Debug, Subcommand)]
enum ContactsCommand {
    /// Re-export phone numbers from Contacts into the contacts file
    Refresh,
}

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();

    // Logs go to stderr so stdout carries only the transcript or summary.
    //   RUST_LOG=openrouter=debug   (full request/response bodies)
    //   RUST_LOG=messages=info      (scan counts per fetch)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("server=info,contacts=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> imessage_summary::Result<()> {
    let settings = Settings::from_env()?.with_overrides(cli.db, cli.contacts);

    match cli.command {
        Command::Summarize {
            chat,
            messages,
            paragraphs,
            no_prompt,
            json,
        } => {
            let transcript = load_transcript(&settings, &chat, messages as usize)?;
            if no_prompt {
                return print_transcript(&transcript, json);
            }

            let lines = assemble(&transcript);
            if lines.is_empty() {
                eprintln!("No messages found for chat \"{chat}\"");
                return Ok(());
            }

            let client = settings.summary_client()?;
            let summary = summarize_lines(&client, &lines, paragraphs as usize).await?;
            println!("{summary}");
        }
        Command::Transcript {
            chat,
            messages,
            json,
        } => {
            let transcript = load_transcript(&settings, &chat, messages as usize)?;
            print_transcript(&transcript, json)?;
        }
        Command::Chats { limit } => {
            for name in fetch_chat_names(&settings.db_path, limit as usize)? {
                println!("{name}");
            }
        }
        Command::Contacts {
            command: ContactsCommand::Refresh,
        } => {
            let directory = harvest_contacts(&settings.contacts_path)?;
            println!(
                "Wrote {} contacts to {}",
                directory.len(),
                settings.contacts_path.display()
            );
        }
        Command::Serve { port } => serve(settings, port).await?,
    }

    Ok(())
}

fn load_transcript(
    settings: &Settings,
    chat: &str,
    limit: usize,
) -> imessage_summary::Result<Transcript> {
    let directory = load_or_harvest(&settings.contacts_path)?;
    Ok(fetch_transcript(&settings.db_path, chat, limit, &directory)?)
}

fn print_transcript(transcript: &Transcript, json: bool) -> imessage_summary::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(transcript)?);
    } else {
        for line in assemble(transcript) {
            println!("{line}");
        }
    }
    Ok(())
}

async fn serve(settings: Settings, port: u16) -> imessage_summary::Result<()> {
    let directory = load_or_harvest(&settings.contacts_path)?;
    let summary_client = settings.summary_client()?;
    let db_path = settings.db_path.clone();

    let state = AppState {
        settings,
        directory: Arc::new(directory),
        summary_client,
    };
    let app = api::router(state);

    let addr = format!("127.0.0.1:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Server(format!("failed to bind {addr}: {e}")))?;

    info!(target: "server", "Server running on http://{}", addr);
    info!(target: "server", "Using database: {}", db_path.display());

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Server(e.to_string()))
}

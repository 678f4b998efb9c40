//! Send one message through the Gmail API.
//!
//! The first run prints an authorization URL and waits for the code; the
//! resulting token is cached for later runs.

use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use integrations_gmail::{GmailClient, MailMessage, GMAIL_API_BASE};

#[derive(Parser)]
#[command(name = "send-mail")]
#[command(about = "Send an email as an authorized Gmail user")]
#[command(version)]
struct Cli {
    #[arg(long, help = "Sender address")]
    from: String,

    #[arg(long, help = "Recipient address")]
    to: String,

    #[arg(long, default_value = "", help = "Message subject")]
    subject: String,

    #[arg(
        long,
        help = "Message body; read from stdin when omitted (stdin is then unavailable for the authorization code)"
    )]
    body: Option<String>,

    #[arg(
        long,
        env = "GMAIL_CREDENTIALS",
        default_value = "credentials.json",
        help = "Google client secret file"
    )]
    credentials: PathBuf,

    #[arg(
        long,
        env = "GMAIL_TOKEN_CACHE",
        default_value = "token.json",
        help = "Token cache file"
    )]
    token_cache: PathBuf,

    #[arg(long, default_value = GMAIL_API_BASE, help = "Gmail API base URL")]
    api_base: String,

    #[arg(long, help = "Delete the cached token first (required after changing scopes)")]
    reset_token: bool,
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let body = match cli.body {
        Some(body) => body,
        None => {
            let mut body = String::new();
            std::io::stdin().read_to_string(&mut body)?;
            body
        }
    };

    let client = GmailClient::from_client_secret_file(&cli.credentials, &cli.token_cache)
        .await?
        .with_api_base(cli.api_base);

    if cli.reset_token {
        client.reset_token().await?;
    }

    let receipt = client
        .send_message(&MailMessage::new(cli.from, cli.to, cli.subject, body))
        .await?;

    info!(
        status = receipt.status,
        id = receipt.id.as_deref().unwrap_or(""),
        "Status code: {}",
        receipt.status
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

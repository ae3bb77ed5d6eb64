use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use booth::format_remaining;
use greenroom::booth_loop::Booth;
use optic::{CaptureBackend, FootageBackend, SyntheticBackend};
use stagedoor::{ApiClient, ApiError, TokenStore};

/// Record and submit a timed video interview.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the interview service
    #[arg(long, env = "GREENROOM_API_URL", default_value = "http://localhost:8000")]
    api_url: String,

    /// Directory for the token, retry ledger, and playback files
    #[arg(long)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with the email and access code you were issued
    Login {
        #[arg(long)]
        email: String,
        /// Access code; prompted for when omitted
        #[arg(long)]
        code: Option<String>,
    },
    /// End the session and clear the stored token
    Logout,
    /// Show the current session and submission state
    Status,
    /// Enter the interview booth
    Interview {
        /// Feed a pre-encoded recording as the camera source instead of the
        /// synthetic test signal
        #[arg(long)]
        footage: Option<PathBuf>,
    },
}

fn default_state_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("greenroom"))
        .unwrap_or_else(|| PathBuf::from(".greenroom"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let state_dir = cli.state_dir.unwrap_or_else(default_state_dir);
    std::fs::create_dir_all(&state_dir)
        .with_context(|| format!("failed to create state directory {}", state_dir.display()))?;

    let client = ApiClient::new(&cli.api_url);
    let tokens = TokenStore::new(&state_dir);

    match cli.command {
        Command::Login { email, code } => login(&client, &tokens, &email, code).await,
        Command::Logout => logout(&client, &tokens).await,
        Command::Status => status(&client, &tokens).await,
        Command::Interview { footage } => {
            let backend: Arc<dyn CaptureBackend> = match footage {
                Some(path) => Arc::new(FootageBackend::new(path)),
                None => Arc::new(SyntheticBackend::new()),
            };
            let (booth, events) =
                Booth::checked_in(Arc::new(client), backend, tokens, state_dir).await?;
            booth.run(events).await
        }
    }
}

async fn login(
    client: &ApiClient,
    tokens: &TokenStore,
    email: &str,
    code: Option<String>,
) -> Result<()> {
    let code = match code {
        Some(code) => code,
        None => rustyline::DefaultEditor::new()
            .context("could not open the prompt")?
            .readline("access code: ")
            .context("no access code entered")?,
    };

    match client.login(email, code.trim()).await {
        Ok(auth) => {
            tokens.save(&auth.access_token)?;
            println!("Signed in as {}.", auth.user.user_data.email);
            if let Some(expiry) = &auth.user.access_expiry {
                println!("Access expires at {expiry}.");
            }
            Ok(())
        }
        Err(err) if err.is_access_expired() => bail!("{err}"),
        Err(ApiError::InvalidCredentials) => bail!("Invalid email or token."),
        Err(err) => Err(err.into()),
    }
}

async fn logout(client: &ApiClient, tokens: &TokenStore) -> Result<()> {
    if let Some(token) = tokens.load() {
        if let Err(err) = client.logout(&token).await {
            tracing::warn!(%err, "server-side logout failed");
        }
    }
    // The token is cleared no matter what the server said.
    tokens.clear();
    println!("Signed out.");
    Ok(())
}

async fn status(client: &ApiClient, tokens: &TokenStore) -> Result<()> {
    let Some(token) = tokens.load() else {
        println!("Not signed in.");
        return Ok(());
    };

    match client.whoami(&token).await {
        Ok(session) => {
            println!("Signed in as {}.", session.user_data.email);
            match &session.access_expiry {
                Some(expiry) => match chrono::DateTime::parse_from_rfc3339(expiry) {
                    Ok(parsed) => {
                        let remaining_ms = (parsed.with_timezone(&chrono::Utc)
                            - chrono::Utc::now())
                        .num_milliseconds();
                        println!("Time remaining: {}", format_remaining(remaining_ms));
                    }
                    Err(_) => println!("Access expires at {expiry}."),
                },
                None => println!("No access expiry on this session."),
            }
            if session.upload_completed() {
                println!("Submission: completed.");
            } else {
                println!("Submission: not yet uploaded.");
            }
            Ok(())
        }
        Err(err) => {
            // A rejected session check invalidates the stored token.
            tokens.clear();
            if err.is_access_expired() {
                println!("Session Expired: {err}");
            } else {
                println!("Session check failed: {err}");
            }
            Ok(())
        }
    }
}

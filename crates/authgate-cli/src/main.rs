//! authgate - sign in to the backend from a terminal.
//!
//! Usage:
//!   authgate login [username]   sign in (prompts for the password)
//!   authgate logout             forget the stored session
//!   authgate status             show the stored session

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use authgate_core::{ApiClient, AuthError, Config, Session, SessionManager, SessionState};

// ============================================================================
// Constants
// ============================================================================

/// Directory for an additional log file, unset to log to stderr only
const LOG_DIR_ENV: &str = "AUTHGATE_LOG_DIR";

const LOG_FILE: &str = "authgate.log";

const USAGE: &str = "Usage: authgate <login [username] | logout | status>";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Login(Option<String>),
    Logout,
    Status,
    Help,
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args.first().map(String::as_str) {
        Some("login") => Ok(Command::Login(args.get(1).cloned())),
        Some("logout") => Ok(Command::Logout),
        Some("status") | None => Ok(Command::Status),
        Some("-h") | Some("--help") | Some("help") => Ok(Command::Help),
        Some(other) => Err(anyhow::anyhow!("Unknown command: {}\n{}", other, USAGE)),
    }
}

/// Initialize the tracing subscriber for logging.
/// The returned guard flushes the log file when dropped.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

/// What to tell the user for each failure kind
fn user_message(err: &AuthError) -> String {
    match err {
        AuthError::InvalidInput => "Username and password required".to_string(),
        AuthError::InvalidCredentials => {
            "Invalid username or password. Please try again.".to_string()
        }
        AuthError::UnexpectedResponse => {
            "Unexpected server response. Please try again.".to_string()
        }
        AuthError::Timeout => "Connection timed out. Please try again.".to_string(),
        AuthError::Cancelled => "Login cancelled.".to_string(),
        AuthError::AlreadyInProgress => "A login is already in progress.".to_string(),
        AuthError::AlreadySignedIn => "Already signed in. Run `authgate logout` first.".to_string(),
        AuthError::Storage(e) => format!("Could not save the session: {}", e),
    }
}

fn describe(session: &Session) -> String {
    let name = session.username.as_deref().unwrap_or("(unknown user)");
    match session.role.as_deref() {
        Some(role) => format!("{} ({})", name, role),
        None => name.to_string(),
    }
}

fn prompt_username(default: Option<&str>) -> Result<String> {
    match default {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match default {
        Some(last) if input.is_empty() => last.to_string(),
        _ => input.to_string(),
    })
}

/// Remember the username in the config file, without persisting env overrides
fn remember_username(username: &str) {
    let mut stored = Config::load().unwrap_or_default();
    stored.last_username = Some(username.to_string());
    if let Err(e) = stored.save() {
        warn!(error = %e, "Failed to save config");
    }
}

async fn login(
    manager: &SessionManager,
    config: &Config,
    username: Option<String>,
) -> Result<ExitCode> {
    if let Some(session) = manager.restore_session() {
        println!("Already signed in as {}", describe(&session));
        return Ok(ExitCode::SUCCESS);
    }

    let username = match username {
        Some(u) => u,
        None => prompt_username(config.last_username.as_deref())?,
    };
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    match manager.sign_in(&username, &password).await {
        Ok(session) => {
            remember_username(username.trim());
            println!("Login successful! Signed in as {}", describe(&session));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Login failed: {}", user_message(&e));
            manager.clear_error();
            Ok(ExitCode::FAILURE)
        }
    }
}

fn logout(manager: &SessionManager) -> ExitCode {
    let session = manager.restore_session();
    // Always clear, so leftovers such as a role without a token go too
    manager.sign_out();
    match session {
        Some(session) => println!("Signed out {}", describe(&session)),
        None => println!("Not signed in"),
    }
    ExitCode::SUCCESS
}

fn status(manager: &SessionManager) -> ExitCode {
    match manager.restore_session() {
        Some(session) => println!("Signed in as {}", describe(&session)),
        None => println!("Not signed in"),
    }
    ExitCode::SUCCESS
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(ExitCode::SUCCESS);
    }

    // Initialize logging
    let _log_guard = init_tracing();
    info!(?command, "authgate starting");

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    config.apply_env()?;

    let client = ApiClient::new(config.api_base_url())?;
    let store = config.credential_store()?;
    let manager = SessionManager::new(Arc::new(client), store);

    let _progress = manager.subscribe(|state| {
        if matches!(state, SessionState::Authenticating) {
            println!("Authenticating...");
        }
    });

    let code = match command {
        Command::Login(username) => login(&manager, &config, username).await?,
        Command::Logout => logout(&manager),
        Command::Status => status(&manager),
        Command::Help => ExitCode::SUCCESS,
    };

    info!("authgate shutting down");
    Ok(code)
}

// ============================================================================
// Tests
// ============================================================================

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use admin::{
    AdminConfig, AdminController, BiometricOutcome, BiometricPrompt, CallbackAuthenticator,
    HttpAdminApi, TracingAuditSink, biometric::BiometricCallback,
};
use auth::{
    AuthApiClient, MemoryTokenStore, Session, SessionManager, TokenStore, validation::LoginForm,
};
use common::ClientConfig;
use takes::TakesApiClient;

#[derive(Parser)]
#[command(name = "entativa-console", about = "Terminal shell for the Entativa client core")]
pub struct Cli {
    #[arg(long, env = "ENTATIVA_IDENTIFIER", help = "Email or username")]
    pub identifier: String,

    #[arg(long, env = "ENTATIVA_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Show the signed-in account
    Whoami,
    /// Permanently ban a user
    Ban {
        user_id: String,
        #[arg(long)]
        reason: String,
    },
    /// Hide a user's content from everyone else
    Shadowban {
        user_id: String,
        #[arg(long)]
        reason: String,
    },
    /// Act as a user until Enter is pressed or the grant expires
    Impersonate {
        user_id: String,
        #[arg(long)]
        reason: String,
    },
    /// Print a page of the takes feed
    Feed {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

/// Typed stand-in for a biometric answer
fn confirmation_outcome(line: Option<&str>) -> BiometricOutcome {
    match line.map(|l| l.trim().to_ascii_lowercase()) {
        None => BiometricOutcome::Cancelled,
        Some(answer) if answer == "y" || answer == "yes" => BiometricOutcome::Success,
        Some(answer) if answer.is_empty() => BiometricOutcome::Cancelled,
        Some(_) => BiometricOutcome::Failed,
    }
}

fn read_line() -> Option<String> {
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}

async fn prompt(text: String) -> Result<Option<String>> {
    eprint!("{}", text);
    std::io::stderr().flush().ok();
    Ok(tokio::task::spawn_blocking(read_line).await?)
}

fn stdin_confirmation(prompt: BiometricPrompt, callback: BiometricCallback) {
    eprint!("{} - {} [y/N]: ", prompt.title, prompt.subtitle);
    std::io::stderr().flush().ok();
    std::thread::spawn(move || {
        let line = read_line();
        callback.resolve(confirmation_outcome(line.as_deref()));
    });
}

fn admin_controller(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<AdminController> {
    Ok(AdminController::new(
        AdminConfig::default(),
        tokens,
        Arc::new(CallbackAuthenticator::new(stdin_confirmation)),
        Arc::new(HttpAdminApi::new(config)?),
        Arc::new(TracingAuditSink),
    ))
}

async fn run_admin(command: Command, controller: &AdminController) -> Result<()> {
    let status = controller.request_admin_access().await?;
    info!("Admin mode active until {:?}", status.expires_at);

    match command {
        Command::Ban { user_id, reason } => {
            controller.ban_user(&user_id, &reason).await?;
            println!("{} banned", user_id);
        }
        Command::Shadowban { user_id, reason } => {
            controller.shadowban_user(&user_id, &reason).await?;
            println!("{} shadowbanned", user_id);
        }
        Command::Impersonate { user_id, reason } => {
            let password = prompt("Password: ".to_string())
                .await?
                .context("No password given")?;
            let grant = controller
                .impersonate_user(&user_id, &reason, password.trim_end_matches(['\r', '\n']))
                .await?;

            println!("Impersonating {}", grant.user_id);
            println!("Token: {}", grant.token);

            let mut status = controller.subscribe();
            tokio::select! {
                _ = prompt("Press Enter to end impersonation\n".to_string()) => {
                    controller.end_impersonation().await?;
                }
                _ = status.wait_for(|s| s.impersonating.is_none()) => {
                    println!("Impersonation expired");
                }
            }
        }
        _ => {}
    }

    Ok(())
}

async fn print_feed(takes: &TakesApiClient, page: u32, limit: u32) -> Result<()> {
    let feed = takes.get_feed(page, limit).await?;
    for take in &feed.takes {
        println!(
            "{}  @{}  {} likes  {}",
            take.id, take.username, take.likes_count, take.caption
        );
    }
    if feed.has_more {
        println!("-- more on page {} --", feed.page + 1);
    }
    Ok(())
}

fn print_session(session: &Session) {
    println!("{} (@{})", session.user.display_name(), session.user.username);
    if session.is_founder {
        println!("founder account");
    }
    if let Some(expires_at) = session.expires_at {
        println!("session expires {}", expires_at);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let cli = Cli::parse();
    let config = ClientConfig::from_env()?;

    let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
    let sessions = SessionManager::new(AuthApiClient::new(&config, tokens.clone())?);

    let session = sessions
        .login(&LoginForm {
            email_or_username: cli.identifier,
            password: cli.password,
        })
        .await?;
    info!("Signed in as {}", session.user.username);

    let result = match cli.command {
        Command::Whoami => {
            print_session(&session);
            Ok(())
        }
        Command::Feed { page, limit } => {
            let takes = TakesApiClient::new(&config, tokens.clone())?;
            print_feed(&takes, page, limit).await
        }
        command => {
            let controller = admin_controller(&config, tokens.clone())?;
            let result = run_admin(command, &controller).await;
            controller.end_admin_session().await;
            result
        }
    };

    sessions.logout().await?;
    result
}

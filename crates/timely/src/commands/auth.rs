//! Auth command - Asana sign-in and session management.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use console::{Style, style};
use serde::Serialize;

use timely_auth::session::now_ms;
use timely_auth::store::{clear_persisted_session, read_persisted_session};
use timely_navigation::{CallbackOutcome, CallbackParams, complete_login};

use super::Context;

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Sign in with Asana (OAuth, or a personal access token)
    Login {
        /// Personal access token to sign in with instead of OAuth
        #[arg(long)]
        token: Option<String>,

        /// Sign in with the personal access token from ASANA_TOKEN
        #[arg(long, conflicts_with = "token")]
        personal: bool,

        /// Print the authorization URL and exit; finish with 'timely auth callback'
        #[arg(long)]
        no_wait: bool,
    },

    /// Finish an OAuth login from the provider's redirect URL
    Callback {
        /// Redirect URL (or its query string) containing code and state
        url: String,
    },

    /// Show the stored session
    Status,

    /// Clear the stored session
    Logout,
}

/// Session summary for JSON output.
#[derive(Debug, Serialize)]
struct StatusOutput {
    authenticated: bool,
    user: Option<String>,
    email: Option<String>,
    expires_at: Option<i64>,
    can_refresh: bool,
}

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    match args.command {
        AuthCommand::Login {
            token,
            personal,
            no_wait,
        } => {
            if token.is_some() || personal {
                cmd_login_token(token.as_deref(), ctx).await
            } else {
                cmd_login(no_wait, ctx).await
            }
        }
        AuthCommand::Callback { url } => cmd_callback(&url, ctx).await,
        AuthCommand::Status => cmd_status(ctx),
        AuthCommand::Logout => cmd_logout(ctx),
    }
}

async fn cmd_login(no_wait: bool, ctx: &Context) -> Result<()> {
    let store = ctx.session_store()?;
    store.initialize_auth().await;

    if store.is_authenticated() {
        let name = store.user().map(|u| u.name).unwrap_or_default();
        println!("Already signed in as {}", name);
        println!("Run 'timely auth logout' first to sign in again.");
        return Ok(());
    }

    let auth_url = store.generate_oauth_url();

    println!("Asana OAuth Sign-in");
    println!("===================");
    println!();
    println!("Open this URL in your browser:");
    println!();
    println!("  {}", auth_url);
    println!();

    if no_wait {
        println!("After approving, finish with:");
        println!("  timely auth callback '<redirect url>'");
        return Ok(());
    }

    if open_url(&auth_url).is_err() {
        println!("(Could not open browser automatically)");
        println!();
    }

    println!("After approving, paste the full URL you were redirected to:");
    print!("redirect> ");
    use std::io::Write;
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.is_empty() {
        println!("No input provided, aborting.");
        return Ok(());
    }

    finish_login(input, ctx).await
}

async fn cmd_callback(url: &str, ctx: &Context) -> Result<()> {
    finish_login(url, ctx).await
}

async fn finish_login(redirect_url: &str, ctx: &Context) -> Result<()> {
    let store = ctx.session_store()?;
    let params = CallbackParams::from_url(redirect_url);

    println!("Exchanging code for tokens...");
    match complete_login(&store, &params).await {
        CallbackOutcome::LoggedIn { redirect } => {
            let name = store.user().map(|u| u.name).unwrap_or_default();
            println!();
            println!("Signed in as {}", name);
            println!("Continue at: {}", redirect);
            Ok(())
        }
        CallbackOutcome::Failed { error, .. } => bail!("Sign-in failed: {}", error),
    }
}

async fn cmd_login_token(token: Option<&str>, ctx: &Context) -> Result<()> {
    let store = ctx.session_store()?;

    if !store.login_with_token(token).await {
        bail!(
            "Sign-in failed: {}",
            store.error().unwrap_or_else(|| "unknown error".to_string())
        );
    }

    let name = store.user().map(|u| u.name).unwrap_or_default();
    println!("Signed in as {} with a personal access token", name);
    Ok(())
}

fn cmd_status(ctx: &Context) -> Result<()> {
    let session = read_persisted_session(ctx.durable_storage().as_ref())?.unwrap_or_default();

    let now = now_ms();
    let output = StatusOutput {
        authenticated: session.is_authenticated_at(now),
        user: session.user.as_ref().map(|u| u.name.clone()),
        email: session.user.as_ref().map(|u| u.email.clone()),
        expires_at: session.expires_at,
        can_refresh: session.refresh_token.is_some(),
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let green = Style::new().green();
    let yellow = Style::new().yellow();
    let dim = Style::new().dim();

    println!();
    println!("{}", style("Asana Session").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();

    if session.access_token.is_none() {
        println!("  {} {}", dim.apply_to("Status:"), yellow.apply_to("● signed out"));
        println!();
        println!("  {}", dim.apply_to("Sign in with: timely auth login"));
        println!();
        return Ok(());
    }

    if output.authenticated {
        println!("  {} {}", dim.apply_to("Status:"), green.apply_to("● signed in"));
    } else {
        println!("  {} {}", dim.apply_to("Status:"), yellow.apply_to("● expired"));
    }
    if let Some(user) = &session.user {
        println!("  {} {} <{}>", dim.apply_to("User:"), user.name, user.email);
        if ctx.verbose
            && let Some(workspaces) = &user.workspaces
        {
            for workspace in workspaces {
                println!("  {} {}", dim.apply_to("Workspace:"), workspace.name);
            }
        }
    }
    println!(
        "  {} {}",
        dim.apply_to("Expires:"),
        expires_display(session.remaining_ms_at(now), session.expires_at)
    );
    println!(
        "  {} {}",
        dim.apply_to("Refresh:"),
        if output.can_refresh { "available" } else { "none" }
    );
    println!();

    Ok(())
}

fn cmd_logout(ctx: &Context) -> Result<()> {
    let durable = ctx.durable_storage();
    let pending = ctx.pending_storage();

    if clear_persisted_session(durable.as_ref(), pending.as_ref())? {
        println!("Session removed.");
    } else {
        println!("No stored session found.");
    }

    Ok(())
}

/// Human-readable time until expiry.
fn expires_display(remaining_ms: i64, expires_at: Option<i64>) -> String {
    let Some(expires_at) = expires_at else {
        return "unknown".to_string();
    };
    let at = chrono::DateTime::from_timestamp_millis(expires_at)
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_default();

    if remaining_ms <= 0 {
        return format!("expired ({})", at);
    }
    let minutes = remaining_ms / 60_000;
    let span = if minutes >= 24 * 60 {
        format!("{}d", minutes / (24 * 60))
    } else if minutes >= 60 {
        format!("{}h {}m", minutes / 60, minutes % 60)
    } else {
        format!("{}m", minutes)
    };
    format!("in {} ({})", span, at)
}

/// Try to open a URL in the default browser.
fn open_url(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).status()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).status()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .status()?;
    }
    Ok(())
}

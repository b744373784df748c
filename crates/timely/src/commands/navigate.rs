//! Navigate command - resolves a route through the guard chain.

use anyhow::Result;
use clap::Args;
use console::Style;
use serde::Serialize;

use timely_navigation::{ChainOptions, DocumentTitle, RouteTable, Router, standard_chain};

use super::Context;

/// Arguments for the navigate command.
#[derive(Args, Debug)]
pub struct NavigateArgs {
    /// Path to open, e.g. /reports?week=12
    pub path: String,
}

/// Navigation result for JSON output.
#[derive(Debug, Serialize)]
struct NavigateOutput {
    requested: String,
    route: Option<String>,
    path: String,
    title: String,
    authenticated: bool,
}

/// Run the navigate command.
pub async fn run(args: NavigateArgs, ctx: &Context) -> Result<()> {
    let store = ctx.session_store()?;
    store.initialize_auth().await;

    let title = DocumentTitle::new("Timely");
    let chain = standard_chain(
        store.clone(),
        title.clone(),
        &ChainOptions {
            development: ctx.verbose,
            ..Default::default()
        },
    );
    let router = Router::new(RouteTable::standard(), chain);
    let location = router.navigate(&args.path).await?;

    let output = NavigateOutput {
        requested: args.path,
        route: location.name.clone(),
        path: location.full_path.clone(),
        title: title.get(),
        authenticated: store.is_authenticated(),
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!("  {} {}", dim.apply_to("Route:"), output.route.as_deref().unwrap_or("-"));
    println!("  {} {}", dim.apply_to("Path:"), output.path);
    println!("  {} {}", dim.apply_to("Title:"), output.title);
    if location.is_named("login") && output.requested != output.path {
        println!();
        println!(
            "  {}",
            dim.apply_to("Sign in with 'timely auth login' to open this page.")
        );
    }

    Ok(())
}

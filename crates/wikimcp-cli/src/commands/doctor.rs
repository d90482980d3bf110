//! Diagnostic command: configuration and per-wiki connectivity.

use serde_json::Value;

use wikimcp_core::ApiError;

use crate::AppContext;

fn print_failure(prefix: &str, error: &ApiError) {
    println!("  ✗ {}: {}", prefix, error);
    if let Some(suggestion) = error.recovery_suggestion() {
        println!("    Suggestion: {}", suggestion);
    }
}

pub async fn run(ctx: &AppContext) -> anyhow::Result<()> {
    println!("Running diagnostics...\n");

    println!("Config file: {}", ctx.config_path.display());
    if ctx.config_path.exists() {
        println!("  ✓ Exists");
    } else {
        println!("  ✗ Does not exist (using built-in defaults)");
    }

    let validation = ctx.config.validate();
    for warning in validation.warnings() {
        println!("  ! {}: {}", warning.field, warning.message);
    }

    println!("\nDefault wiki: {}", ctx.wikis.current_id().await);

    for (id, wiki) in ctx.wikis.all_wikis().await {
        println!("\n{} ({})", id, wiki.sitename);
        let dispatcher = ctx.wikis.dispatcher_for(&id).await?;

        let siteinfo = dispatcher
            .action::<Value>(
                &[("action", "query"), ("meta", "siteinfo"), ("siprop", "general")],
                false,
            )
            .await;
        match siteinfo {
            Ok(body) => {
                let generator = body["query"]["general"]["generator"].as_str().unwrap_or("unknown");
                println!("  ✓ Reachable at {} ({})", wiki.api_url(), generator);
            }
            Err(e) => print_failure("Site info", &e),
        }

        if wiki.oauth_token().is_some() {
            let userinfo = dispatcher
                .action::<Value>(&[("action", "query"), ("meta", "userinfo")], false)
                .await;
            match userinfo {
                Ok(body) if body["query"]["userinfo"].get("anon").is_none() => {
                    let name = body["query"]["userinfo"]["name"].as_str().unwrap_or("?");
                    println!("  ✓ OAuth token accepted (user {})", name);
                }
                Ok(_) => println!("  ✗ OAuth token not accepted (request ran anonymously)"),
                Err(e) => print_failure("OAuth check", &e),
            }
        } else if wiki.has_credentials() {
            if dispatcher.session().is_authenticated().await {
                println!("  ✓ Logged in as {}", wiki.username().unwrap_or_default());
            } else {
                println!("  ✗ Login failed for {}", wiki.username().unwrap_or_default());
            }
        } else if wiki.is_private() {
            println!("  ✗ Private wiki without credentials");
        } else {
            println!("  - Anonymous access");
        }
    }

    println!("\nDiagnostics complete.");
    Ok(())
}

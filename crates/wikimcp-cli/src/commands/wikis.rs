//! Lists the configured wikis.

use crate::AppContext;

pub async fn run(ctx: &AppContext) {
    let current = ctx.wikis.current_id().await;
    let wikis = ctx.wikis.all_wikis().await;

    println!("Configured wikis:\n");
    for (id, wiki) in &wikis {
        let marker = if *id == current { " (default)" } else { "" };
        let auth = if wiki.oauth_token().is_some() {
            "OAuth token"
        } else if wiki.has_credentials() {
            "username/password"
        } else {
            "anonymous"
        };
        println!("  {}{}", id, marker);
        println!("    Site:   {}", wiki.sitename);
        println!("    Server: {}{}", wiki.server(), wiki.script_path());
        println!("    Auth:   {}{}", auth, if wiki.is_private() { ", private" } else { "" });
    }
}

use std::sync::Arc;

use anyhow::{Result, bail};
use snippy_client::{
    Credential, CredentialProvider, HttpTransport, SnippetFetcher, StaticCredentials,
};
use snippy_config::Config;
use snippy_core::pagination::{self, PageItem};
use snippy_core::{PageResult, query};
use snippy_sync::{FilterStateSynchronizer, ListView, MemoryHistory, Navigator, Snapshot, SyncDriver};
use tracing::debug;

use crate::cli::ListArgs;

pub async fn handle(args: ListArgs, config: &Config) -> Result<()> {
    let requested = args.filters.to_filters();
    let search = query::encode(&requested);
    let signed_in = args.token.is_some();

    let credentials: Arc<dyn CredentialProvider> =
        Arc::new(StaticCredentials::new(args.token.map(Credential::new)));
    let transport = HttpTransport::new(&config.api.user_agent, config.api.timeout())?;
    let fetcher = SnippetFetcher::new(transport, &config.api.base_url, &config.api.list_path);
    debug!(endpoint = %fetcher.endpoint(), "using snippet service");

    let history = MemoryHistory::at(&config.list.view_path, &search);
    let sync = FilterStateSynchronizer::new(history, credentials)
        .with_max_clamp_attempts(config.list.max_clamp_attempts);
    let mut driver = SyncDriver::new(sync, Arc::new(fetcher));

    driver.start();
    let snapshot = driver.run_until_idle().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    if snapshot.filters.page != requested.page {
        println!(
            "Page {} is out of range, showing page {}.",
            requested.page, snapshot.filters.page
        );
    }

    match snapshot.view() {
        ListView::Loading => println!("Loading..."),
        ListView::Empty => {
            println!("No snippets match these filters.");
            if !signed_in {
                println!("(not signed in: pass --token or set SNIPPY_TOKEN)");
            }
        }
        ListView::Failed(_) => bail!("Couldn't load snippets, try again."),
        ListView::Loaded(page) => print_page(page),
    }

    print_footer(&snapshot, &driver.synchronizer().navigator().location().href());
    Ok(())
}

fn print_page(page: &PageResult) {
    for snippet in &page.items {
        let visibility = if snippet.is_private { " (private)" } else { "" };
        let tags = if snippet.tags.is_empty() {
            String::new()
        } else {
            format!("  #{}", snippet.tags.join(" #"))
        };
        println!(
            "{}  {}  [{}]{}{}",
            snippet.uuid, snippet.title, snippet.language, visibility, tags
        );
    }
}

fn print_footer(snapshot: &Snapshot, href: &str) {
    if let Some(page) = &snapshot.result {
        if page.total_pages > 1 {
            println!();
            println!("{}", pagination_bar(page.total_pages, page.page));
        }
        println!(
            "Page {} of {} ({} snippets)",
            page.page,
            page.total_pages.max(1),
            page.total_items
        );
    }
    println!("URL: {}", href);
}

fn pagination_bar(total_pages: u32, current: u32) -> String {
    let mut parts = Vec::new();
    if pagination::has_prev(current) {
        parts.push("<- Prev".to_string());
    }
    for item in pagination::page_items(total_pages, current) {
        parts.push(match item {
            PageItem::Page { number, current: true } => format!("[{}]", number),
            PageItem::Page { number, .. } => number.to_string(),
            PageItem::Ellipsis => "...".to_string(),
        });
    }
    if pagination::has_next(current, total_pages) {
        parts.push("Next ->".to_string());
    }
    parts.join(" ")
}

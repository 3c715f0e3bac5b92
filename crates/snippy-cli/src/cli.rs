use clap::{Args, Parser, Subcommand};
use snippy_core::filter::parse_date;
use snippy_core::{FilterSet, Language, Visibility};
use time::Date;

#[derive(Parser)]
#[command(name = "snippy")]
#[command(about = "Browse and share code snippets", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List snippets matching the given filters
    List(ListArgs),

    /// Work with filter query strings
    #[command(subcommand)]
    Query(QueryCommands),

    /// Inspect the configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Bearer token for the snippet service
    #[arg(long, env = "SNIPPY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Print the settled list state as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone, Default)]
pub struct FilterArgs {
    /// Page number (1-based)
    #[arg(long)]
    pub page: Option<u32>,

    /// Items per page (max 20)
    #[arg(long)]
    pub per_page: Option<u32>,

    /// Only snippets with this tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Only snippets in this language (python, javascript)
    #[arg(long)]
    pub language: Option<Language>,

    /// Only public or only private snippets
    #[arg(long)]
    pub visibility: Option<Visibility>,

    /// Only snippets by this author
    #[arg(long)]
    pub username: Option<String>,

    /// Created before this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub created_before: Option<Date>,

    /// Created on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub created_after: Option<Date>,
}

impl FilterArgs {
    pub fn to_filters(&self) -> FilterSet {
        let defaults = FilterSet::default();
        FilterSet {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
            tags: self.tags.clone(),
            language: self.language,
            visibility: self.visibility,
            username: self.username.clone(),
            created_before: self.created_before,
            created_after: self.created_after,
        }
        .normalized()
    }
}

#[derive(Subcommand)]
pub enum QueryCommands {
    /// Encode filters as a URL query string
    Encode(FilterArgs),

    /// Decode a URL query string into filters
    Decode {
        /// Query string, with or without the leading `?`
        query: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the active configuration
    Show,

    /// Print the configuration file path
    Path,
}

use anyhow::Result;
use snippy_core::query;

use crate::cli::QueryCommands;

pub fn handle(cmd: QueryCommands) -> Result<()> {
    match cmd {
        QueryCommands::Encode(args) => {
            let encoded = query::encode(&args.to_filters());
            if encoded.is_empty() {
                println!("(defaults, empty query)");
            } else {
                println!("?{}", encoded);
            }
        }
        QueryCommands::Decode { query: raw } => {
            let filters = query::decode(&raw);
            println!("{}", serde_json::to_string_pretty(&filters)?);

            let canonical = query::encode(&filters);
            if canonical != raw.strip_prefix('?').unwrap_or(&raw) {
                println!("canonical: ?{}", canonical);
            }
        }
    }
    Ok(())
}

//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `conceptlink_core` linkage.
//! - When a database is given (first argument or `CONCEPTLINK_DB_PATH`),
//!   print the relationship vocabulary with usage counts.

use conceptlink_core::{
    init_from_config, open_db, CoreConfig, LinkNameRegistry, SqliteLinkNameRepository,
};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("conceptlink_core ping={}", conceptlink_core::ping());
    println!("conceptlink_core version={}", conceptlink_core::core_version());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut config = CoreConfig::from_env()?;
    if let Some(path) = std::env::args_os().nth(1) {
        config.db_path = Some(PathBuf::from(path));
    }
    init_from_config(&config)?;

    let Some(db_path) = config.db_path.as_deref() else {
        return Ok(());
    };
    let conn = open_db(db_path)?;
    let registry = LinkNameRegistry::new(SqliteLinkNameRepository::try_new(&conn)?);
    let vocabulary = registry.list_with_usage()?;
    info!(
        "event=cli_list_link_names module=cli status=ok count={}",
        vocabulary.len()
    );

    for entry in vocabulary {
        let pair = entry.pair;
        let kind = if pair.is_symmetric { "symmetric" } else { "directed" };
        println!(
            "{}\t{} / {}\t{}\tused={}",
            pair.id, pair.forward_name, pair.reverse_name, kind, entry.usage_count
        );
    }
    Ok(())
}

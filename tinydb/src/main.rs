use std::path::PathBuf;

use tinydb::config::EngineConfig;
use tinydb::{Table, diagnostics};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tinydb=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // A path on the command line wins over TINYDB_DATABASE_PATH.
    let path = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => match config.require_database_path() {
            Ok(path) => path.to_path_buf(),
            Err(e) => {
                println!("Must supply a database filename.");
                tracing::debug!("{e}");
                std::process::exit(1);
            }
        },
    };

    let mut table = match Table::open_with_config(&path, &config) {
        Ok(table) => table,
        Err(e) => {
            tracing::error!("Failed to open {}: {e}", path.display());
            std::process::exit(1);
        }
    };

    println!("Constants:");
    print!("{}", diagnostics::layout_constants());

    match diagnostics::dump_tree(&mut table) {
        Ok(tree) => {
            println!("Tree:");
            print!("{tree}");
        }
        Err(e) => {
            tracing::error!("Failed to read tree: {e}");
            std::process::exit(1);
        }
    }

    if let Err(e) = table.close() {
        tracing::error!("Failed to close {}: {e}", path.display());
        std::process::exit(1);
    }
}

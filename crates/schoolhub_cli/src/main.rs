//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `schoolhub_core` linkage:
//!   logging bootstrap plus an in-memory database migration.
//! - Keep output deterministic for quick local sanity checks.

use log::info;
use schoolhub_core::db::open_db_in_memory;
use schoolhub_core::{default_log_level, init_logging};

fn main() {
    let log_dir = std::env::temp_dir().join("schoolhub-cli-logs");
    if let Err(err) = init_logging(default_log_level(), &log_dir.to_string_lossy()) {
        eprintln!("schoolhub_core logging=error detail={err}");
        std::process::exit(1);
    }

    println!("schoolhub_core version={}", schoolhub_core::core_version());
    match open_db_in_memory() {
        Ok(_) => {
            info!("event=cli_smoke module=cli status=ok");
            println!("schoolhub_core migrations=ok");
        }
        Err(err) => {
            eprintln!("schoolhub_core migrations=error detail={err}");
            std::process::exit(1);
        }
    }
}

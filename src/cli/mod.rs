pub mod actions;
pub mod commands;
pub mod dispatch;
pub mod telemetry;

use crate::cli::actions::Action;
use anyhow::Result;

pub mod built_info {
    #![allow(clippy::doc_markdown, clippy::needless_raw_string_hashes, clippy::unreadable_literal)]
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Parse arguments, set up logging and build the action to run.
///
/// # Errors
///
/// Returns an error if logging cannot be initialized or the arguments are invalid.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    telemetry::init(matches.get_count("verbose"))?;

    dispatch::handler(&matches)
}

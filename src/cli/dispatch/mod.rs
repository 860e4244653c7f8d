//! Map parsed CLI arguments to the action to run.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::upstream;
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let upstream = upstream::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        upstream_url: upstream.url,
        upstream_token: upstream.token,
        upstream_connect_timeout: upstream.connect_timeout,
    }))
}

use anyhow::{Context, Result, bail};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

pub const ARG_UPSTREAM_URL: &str = "upstream-url";
pub const ARG_UPSTREAM_TOKEN: &str = "upstream-token";
pub const ARG_UPSTREAM_CONNECT_TIMEOUT: &str = "upstream-connect-timeout-seconds";

/// Where and how to reach the authentication domain service.
#[derive(Debug, Clone)]
pub struct Options {
    pub url: Url,
    pub token: Option<SecretString>,
    pub connect_timeout: Duration,
}

impl Options {
    /// Parse upstream arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the URL is missing, unparsable, or not `http(s)`.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        // clap passes through empty strings when env vars are set to ""
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let Some(raw_url) = get_non_empty(ARG_UPSTREAM_URL) else {
            bail!("missing required argument: --{ARG_UPSTREAM_URL}");
        };

        let url = Url::parse(raw_url.trim())
            .with_context(|| format!("invalid --{ARG_UPSTREAM_URL}: {raw_url}"))?;

        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "invalid --{ARG_UPSTREAM_URL}: scheme must be http or https, got {}",
                url.scheme()
            );
        }

        let connect_timeout = matches
            .get_one::<u64>(ARG_UPSTREAM_CONNECT_TIMEOUT)
            .copied()
            .unwrap_or(5);

        Ok(Self {
            url,
            token: get_non_empty(ARG_UPSTREAM_TOKEN).map(SecretString::from),
            connect_timeout: Duration::from_secs(connect_timeout),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_UPSTREAM_URL)
                .short('u')
                .long(ARG_UPSTREAM_URL)
                .help("Base URL of the authentication domain service")
                .env("AUTHGATE_UPSTREAM_URL"),
        )
        .arg(
            Arg::new(ARG_UPSTREAM_TOKEN)
                .long(ARG_UPSTREAM_TOKEN)
                .help("Bearer token presented to the authentication domain service")
                .env("AUTHGATE_UPSTREAM_TOKEN")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_UPSTREAM_CONNECT_TIMEOUT)
                .long(ARG_UPSTREAM_CONNECT_TIMEOUT)
                .help("Connect timeout for the upstream client in seconds")
                .env("AUTHGATE_UPSTREAM_CONNECT_TIMEOUT_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
}

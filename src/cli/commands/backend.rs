use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

pub const ARG_BACKEND_URL: &str = "backend-url";
pub const ARG_API_KEY: &str = "api-key";
pub const ARG_ACCESS_TOKEN: &str = "access-token";
pub const ARG_INTENT_FILE: &str = "intent-file";
pub const ARG_TIMEOUT: &str = "timeout";

#[derive(Debug)]
pub struct Options {
    pub url: String,
    pub api_key: String,
    pub access_token: Option<String>,
    pub intent_file: PathBuf,
    pub timeout_seconds: u64,
}

impl Options {
    /// Parse backend options from CLI matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let url = matches
            .get_one::<String>(ARG_BACKEND_URL)
            .cloned()
            .context("missing required argument: --backend-url")?;
        let api_key = matches
            .get_one::<String>(ARG_API_KEY)
            .cloned()
            .context("missing required argument: --api-key")?;

        Ok(Self {
            url,
            api_key,
            access_token: matches.get_one::<String>(ARG_ACCESS_TOKEN).cloned(),
            intent_file: matches
                .get_one::<PathBuf>(ARG_INTENT_FILE)
                .cloned()
                .unwrap_or_else(|| PathBuf::from(".terraguard/storage.json")),
            timeout_seconds: matches.get_one::<u64>(ARG_TIMEOUT).copied().unwrap_or(10),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BACKEND_URL)
                .long(ARG_BACKEND_URL)
                .help("Platform backend base URL, e.g. https://project.example.org")
                .env("TERRAGUARD_BACKEND_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_API_KEY)
                .long(ARG_API_KEY)
                .help("Project API key sent with every request")
                .env("TERRAGUARD_API_KEY")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_ACCESS_TOKEN)
                .long(ARG_ACCESS_TOKEN)
                .help("Caller access token; without it nobody is signed in")
                .env("TERRAGUARD_ACCESS_TOKEN")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_INTENT_FILE)
                .long(ARG_INTENT_FILE)
                .help("File backing the client-local storage that holds the pending intent")
                .env("TERRAGUARD_INTENT_FILE")
                .default_value(".terraguard/storage.json")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("Backend request timeout in seconds")
                .env("TERRAGUARD_TIMEOUT")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..))
                .global(true),
        )
}

pub mod backend;
pub mod logging;

use clap::{
    Arg, ColorChoice, Command,
    builder::{
        PossibleValuesParser,
        styling::{AnsiColor, Effects, Styles},
    },
};

use crate::models::Role;

pub const CMD_CHECK: &str = "check";
pub const CMD_WATCH: &str = "watch";
pub const CMD_VERIFY_COMPLETE: &str = "verify-complete";
pub const CMD_SELECT_ROLE: &str = "select-role";

pub const ARG_ROLE: &str = "role";
pub const ARG_PATH: &str = "path";
pub const ARG_POLL_INTERVAL: &str = "poll-interval";

fn role_values() -> PossibleValuesParser {
    PossibleValuesParser::new(Role::ALL.map(Role::as_str))
}

fn guard_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ROLE)
                .short('r')
                .long(ARG_ROLE)
                .help("Role the portal requires; omit to only observe the caller")
                .value_parser(role_values()),
        )
        .arg(
            Arg::new(ARG_PATH)
                .long(ARG_PATH)
                .help("Path being visited, stored as the pending intent on redirect (default: the role's portal)"),
        )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("terraguard")
        .about("Portal access guard for the environmental monitoring dashboard")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(guard_args(
            Command::new(CMD_CHECK).about("Run the verification protocol once and print the verdict"),
        ))
        .subcommand(
            guard_args(
                Command::new(CMD_WATCH)
                    .about("Keep a guard active and re-verify on every session change"),
            )
            .arg(
                Arg::new(ARG_POLL_INTERVAL)
                    .long(ARG_POLL_INTERVAL)
                    .help("Seconds between session polls")
                    .env("TERRAGUARD_POLL_INTERVAL")
                    .default_value("30")
                    .value_parser(clap::value_parser!(u64).range(1..)),
            ),
        )
        .subcommand(
            Command::new(CMD_VERIFY_COMPLETE)
                .about("Resume the pending intent after the email address was confirmed"),
        )
        .subcommand(
            Command::new(CMD_SELECT_ROLE)
                .about("Save the caller's role and resume the pending intent")
                .arg(
                    Arg::new(ARG_ROLE)
                        .help("Role to assign")
                        .required(true)
                        .value_parser(role_values()),
                ),
        );

    let command = backend::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "terraguard");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Portal access guard for the environmental monitoring dashboard".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_check_args() {
        let matches = new().get_matches_from(vec![
            "terraguard",
            "--backend-url",
            "https://api.terraguard.dev",
            "--api-key",
            "anon-key",
            "check",
            "--role",
            "ngo",
            "--path",
            "/portal/ngo/reports",
        ]);

        assert_eq!(
            matches.get_one::<String>(backend::ARG_BACKEND_URL).cloned(),
            Some("https://api.terraguard.dev".to_string())
        );
        let Some((name, sub)) = matches.subcommand() else {
            panic!("expected a subcommand");
        };
        assert_eq!(name, CMD_CHECK);
        assert_eq!(sub.get_one::<String>(ARG_ROLE).cloned(), Some("ngo".to_string()));
        assert_eq!(
            sub.get_one::<String>(ARG_PATH).cloned(),
            Some("/portal/ngo/reports".to_string())
        );
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result = new().try_get_matches_from(vec![
            "terraguard",
            "check",
            "--role",
            "superuser",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_select_role_requires_role() {
        let result = new().try_get_matches_from(vec!["terraguard", "select-role"]);
        assert!(result.is_err());

        let matches = new()
            .try_get_matches_from(vec!["terraguard", "select-role", "research"])
            .ok();
        let role = matches
            .as_ref()
            .and_then(|m| m.subcommand_matches(CMD_SELECT_ROLE))
            .and_then(|m| m.get_one::<String>(ARG_ROLE).cloned());
        assert_eq!(role, Some("research".to_string()));
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("TERRAGUARD_BACKEND_URL", Some("https://api.terraguard.dev")),
                ("TERRAGUARD_API_KEY", Some("anon-key")),
                ("TERRAGUARD_ACCESS_TOKEN", Some("user-token")),
                ("TERRAGUARD_INTENT_FILE", Some("/tmp/terraguard.json")),
                ("TERRAGUARD_TIMEOUT", Some("3")),
                ("TERRAGUARD_POLL_INTERVAL", Some("5")),
                ("TERRAGUARD_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec!["terraguard", "watch"]);
                assert_eq!(
                    matches.get_one::<String>(backend::ARG_API_KEY).cloned(),
                    Some("anon-key".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>(backend::ARG_ACCESS_TOKEN).cloned(),
                    Some("user-token".to_string())
                );
                assert_eq!(
                    matches.get_one::<PathBuf>(backend::ARG_INTENT_FILE).cloned(),
                    Some(PathBuf::from("/tmp/terraguard.json"))
                );
                assert_eq!(matches.get_one::<u64>(backend::ARG_TIMEOUT).copied(), Some(3));
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(2)
                );
                let watch = matches.subcommand_matches(CMD_WATCH);
                assert_eq!(
                    watch.and_then(|m| m.get_one::<u64>(ARG_POLL_INTERVAL).copied()),
                    Some(5)
                );
            },
        );
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("TERRAGUARD_INTENT_FILE", None::<&str>),
                ("TERRAGUARD_TIMEOUT", None),
                ("TERRAGUARD_POLL_INTERVAL", None),
            ],
            || {
                let matches = new().get_matches_from(vec!["terraguard", "watch"]);
                assert_eq!(
                    matches.get_one::<PathBuf>(backend::ARG_INTENT_FILE).cloned(),
                    Some(PathBuf::from(".terraguard/storage.json"))
                );
                assert_eq!(matches.get_one::<u64>(backend::ARG_TIMEOUT).copied(), Some(10));
                let watch = matches.subcommand_matches(CMD_WATCH);
                assert_eq!(
                    watch.and_then(|m| m.get_one::<u64>(ARG_POLL_INTERVAL).copied()),
                    Some(30)
                );
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("TERRAGUARD_LOG_LEVEL", Some(level))], || {
                let matches = new().get_matches_from(vec!["terraguard", "verify-complete"]);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(u8::try_from(index).unwrap_or(0))
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        let levels = ["-v", "-vv", "-vvv", "-vvvv"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("TERRAGUARD_LOG_LEVEL", None::<&str>)], || {
                let matches =
                    new().get_matches_from(vec!["terraguard", "verify-complete", level]);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(u8::try_from(index + 1).unwrap_or(0))
                );
            });
        }
    }
}

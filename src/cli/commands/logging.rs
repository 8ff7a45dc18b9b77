use clap::{Arg, ArgAction, Command, builder::ValueParser};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names in `-v` count order.
const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Maps `TERRAGUARD_LOG_LEVEL` to the same count `-v` flags produce.
#[must_use]
pub fn log_level_parser() -> ValueParser {
    ValueParser::from(|level: &str| -> Result<u8, String> {
        LEVELS
            .iter()
            .position(|name| name.eq_ignore_ascii_case(level))
            .and_then(|count| u8::try_from(count).ok())
            .ok_or_else(|| {
                format!(
                    "invalid log level '{level}', expected one of: {}",
                    LEVELS.join(", ")
                )
            })
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env("TERRAGUARD_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(log_level_parser()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> Command {
        with_args(Command::new("terraguard"))
    }

    #[test]
    fn test_level_names_are_case_insensitive() {
        temp_env::with_vars([("TERRAGUARD_LOG_LEVEL", Some("DEBUG"))], || {
            let matches = command().get_matches_from(vec!["terraguard"]);
            assert_eq!(matches.get_one::<u8>(ARG_VERBOSITY).copied(), Some(3));
        });
    }

    #[test]
    fn test_numeric_and_unknown_levels_are_rejected() {
        for level in ["3", "verbose"] {
            temp_env::with_vars([("TERRAGUARD_LOG_LEVEL", Some(level))], || {
                let result = command().try_get_matches_from(vec!["terraguard"]);
                assert!(result.is_err(), "{level} should be rejected");
            });
        }
    }
}

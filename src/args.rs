//! Command-line argument parsing and processing.
//!
//! This module handles parsing of command-line arguments and provides a clean
//! interface for the main application logic. It supports the standard help,
//! version, and debug flags while gracefully handling unknown options.

use crate::constants::DEFAULT_SIMULATION_MULTIPLIER;

/// Accelerated clock requested with `--simulate`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulateOptions {
    /// `YYYY-MM-DD HH:MM:SS`, interpreted in the configured timezone
    pub start_time: String,
    /// Simulated seconds per real second
    pub multiplier: f64,
}

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the watcher with these settings
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        json_output: bool,
        log_file: Option<String>,
        simulate: Option<SimulateOptions>,
    },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown or malformed arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// The first item is the program name and is skipped. Help and version
    /// flags win over everything else; any unknown flag or missing flag value
    /// turns into [`CliAction::ShowHelpDueToError`].
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        if args_vec
            .iter()
            .any(|arg| arg == "--version" || arg == "-V" || arg == "-v")
        {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }
        if args_vec.iter().any(|arg| arg == "--help" || arg == "-h") {
            return ParsedArgs {
                action: CliAction::ShowHelp,
            };
        }

        let mut debug_enabled = false;
        let mut json_output = false;
        let mut config_dir: Option<String> = None;
        let mut log_file: Option<String> = None;
        let mut simulate: Option<SimulateOptions> = None;

        let mut i = 0;
        while i < args_vec.len() {
            match args_vec[i].as_str() {
                "--debug" | "-d" => debug_enabled = true,
                "--json" | "-j" => json_output = true,
                "--config" | "-c" => {
                    let Some(dir) = args_vec.get(i + 1) else {
                        return Self::error();
                    };
                    config_dir = Some(dir.clone());
                    i += 1;
                }
                "--log" | "-l" => {
                    let Some(path) = args_vec.get(i + 1) else {
                        return Self::error();
                    };
                    log_file = Some(path.clone());
                    i += 1;
                }
                "--simulate" | "-S" => {
                    let Some(start_time) = args_vec.get(i + 1) else {
                        return Self::error();
                    };
                    i += 1;

                    // Optional multiplier: the next argument if it is a number
                    let mut multiplier = DEFAULT_SIMULATION_MULTIPLIER;
                    if let Some(next) = args_vec.get(i + 1)
                        && !next.starts_with('-')
                    {
                        match next.parse::<f64>() {
                            Ok(m) if m > 0.0 && m.is_finite() => multiplier = m,
                            _ => return Self::error(),
                        }
                        i += 1;
                    }

                    simulate = Some(SimulateOptions {
                        start_time: start_time.clone(),
                        multiplier,
                    });
                }
                _ => return Self::error(),
            }
            i += 1;
        }

        ParsedArgs {
            action: CliAction::Run {
                debug_enabled,
                config_dir,
                json_output,
                log_file,
                simulate,
            },
        }
    }

    /// Parse from the process arguments.
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }

    fn error() -> ParsedArgs {
        ParsedArgs {
            action: CliAction::ShowHelpDueToError,
        }
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!("{}", env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("solarwatch [OPTIONS]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-j, --json             Print events as JSON lines instead of log output");
    log_indented!("-l, --log <file>       Write log output to a file");
    log_indented!("-S, --simulate         Run against an accelerated clock");
    log_indented!("                       Usage: --simulate \"<YYYY-MM-DD HH:MM:SS>\" [multiplier]");
    log_indented!("-V, --version          Print version information");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_action(
        debug_enabled: bool,
        config_dir: Option<&str>,
        json_output: bool,
        log_file: Option<&str>,
        simulate: Option<SimulateOptions>,
    ) -> CliAction {
        CliAction::Run {
            debug_enabled,
            config_dir: config_dir.map(str::to_string),
            json_output,
            log_file: log_file.map(str::to_string),
            simulate,
        }
    }

    #[test]
    fn test_parse_no_args() {
        let parsed = ParsedArgs::parse(vec!["solarwatch"]);
        assert_eq!(parsed.action, run_action(false, None, false, None, None));
    }

    #[test]
    fn test_parse_debug_flag() {
        let parsed = ParsedArgs::parse(vec!["solarwatch", "--debug"]);
        assert_eq!(parsed.action, run_action(true, None, false, None, None));

        let parsed = ParsedArgs::parse(vec!["solarwatch", "-d"]);
        assert_eq!(parsed.action, run_action(true, None, false, None, None));
    }

    #[test]
    fn test_parse_config_and_log() {
        let parsed = ParsedArgs::parse(vec![
            "solarwatch",
            "--config",
            "/tmp/sw",
            "--log",
            "/tmp/sw.log",
            "--json",
        ]);
        assert_eq!(
            parsed.action,
            run_action(false, Some("/tmp/sw"), true, Some("/tmp/sw.log"), None)
        );
    }

    #[test]
    fn test_parse_missing_flag_value() {
        for flag in ["--config", "--log", "--simulate"] {
            let parsed = ParsedArgs::parse(vec!["solarwatch", flag]);
            assert_eq!(parsed.action, CliAction::ShowHelpDueToError, "{flag}");
        }
    }

    #[test]
    fn test_parse_simulate() {
        let parsed = ParsedArgs::parse(vec!["solarwatch", "--simulate", "2024-06-21 04:00:00"]);
        assert_eq!(
            parsed.action,
            run_action(
                false,
                None,
                false,
                None,
                Some(SimulateOptions {
                    start_time: "2024-06-21 04:00:00".to_string(),
                    multiplier: DEFAULT_SIMULATION_MULTIPLIER,
                })
            )
        );

        let parsed = ParsedArgs::parse(vec![
            "solarwatch",
            "-S",
            "2024-06-21 04:00:00",
            "600",
            "--debug",
        ]);
        assert_eq!(
            parsed.action,
            run_action(
                true,
                None,
                false,
                None,
                Some(SimulateOptions {
                    start_time: "2024-06-21 04:00:00".to_string(),
                    multiplier: 600.0,
                })
            )
        );
    }

    #[test]
    fn test_parse_simulate_rejects_bad_multiplier() {
        let parsed = ParsedArgs::parse(vec!["solarwatch", "-S", "2024-06-21 04:00:00", "fast"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);

        let parsed = ParsedArgs::parse(vec!["solarwatch", "-S", "2024-06-21 04:00:00", "0"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_help_and_version_take_precedence() {
        let parsed = ParsedArgs::parse(vec!["solarwatch", "--debug", "--help"]);
        assert_eq!(parsed.action, CliAction::ShowHelp);

        let parsed = ParsedArgs::parse(vec!["solarwatch", "--bogus", "-V"]);
        assert_eq!(parsed.action, CliAction::ShowVersion);
    }

    #[test]
    fn test_unknown_argument() {
        let parsed = ParsedArgs::parse(vec!["solarwatch", "--unknown"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);

        let parsed = ParsedArgs::parse(vec!["solarwatch", "geo"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }
}

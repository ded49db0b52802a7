//! `resource:limit-clear [--process-type <type>] <app>`
//!
//! Argument marshaling only; the work happens in `resource::limit_clear`.

use clap::Parser;
use std::process::ExitCode;

use dokku_plugin_hooks::{limit_clear, log_fail, HookConfig};
use dokku_release_core::{init_tracing, level_for};

#[derive(Parser, Debug)]
#[command(name = "resource:limit-clear")]
#[command(about = "Clear resource limits for an app", long_about = None)]
struct Cli {
    /// A process type to clear
    #[arg(long, default_value = "")]
    process_type: String,

    /// Remaining arguments, forwarded unchanged
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(false, level_for(false, false));

    match limit_clear(&HookConfig::from_env(), &cli.args, &cli.process_type) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log_fail(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_and_args_forwarded() {
        let cli =
            Cli::try_parse_from(["resource:limit-clear", "--process-type", "web", "app"]).unwrap();
        assert_eq!(cli.process_type, "web");
        assert_eq!(cli.args, vec!["app".to_string()]);

        let cli = Cli::try_parse_from(["resource:limit-clear"]).unwrap();
        assert_eq!(cli.process_type, "");
        assert!(cli.args.is_empty());
    }
}

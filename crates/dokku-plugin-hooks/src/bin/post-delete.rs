//! post-delete trigger: `post-delete <app>`

use clap::Parser;
use std::process::ExitCode;

use dokku_plugin_hooks::{log_fail, post_delete, DockerImageRuntime, HookConfig};
use dokku_release_core::{init_tracing, level_for};

#[derive(Parser, Debug)]
#[command(name = "post-delete")]
#[command(about = "Remove local state and images of a deleted app", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// App that was deleted
    app: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(false, level_for(false, cli.verbose));

    let config = HookConfig::from_env();
    let runtime = DockerImageRuntime::new(&config.docker);
    match post_delete(&config, &runtime, &cli.app).await {
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
    fn test_app_is_required() {
        assert!(Cli::try_parse_from(["post-delete"]).is_err());
        let cli = Cli::try_parse_from(["post-delete", "node-js-app"]).unwrap();
        assert_eq!(cli.app, "node-js-app");
    }
}

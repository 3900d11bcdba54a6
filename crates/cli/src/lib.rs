//! Command-line front end for swaggen.
//!
//! Reads the rc file, obtains the schema document, runs the compiler and
//! writes the generated modules to disk.

use clap::{CommandFactory, Parser, Subcommand};

mod commands;
mod common;
pub mod prompt;
pub mod settings;
pub mod source;
pub mod writer;

#[derive(Parser)]
#[command(
    name = "swaggen",
    version,
    about = "\x1b[33mswaggen\x1b[0m turns OpenAPI and Swagger documents into typed API clients"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate interface and request modules
    Generate(commands::generate::GenerateArgs),
    /// Generate mock response data
    Mock(commands::mock::MockArgs),
    /// Inspect or reset the rc file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the current settings
    Show,
    /// Restore default settings
    Reset,
    /// Print the rc file location
    Path,
}

/// Parse `args` and run the selected command, returning the exit code.
pub async fn run(args: Vec<String>) -> i32 {
    match Cli::try_parse_from(args) {
        Ok(cli) => match cli.command {
            Some(Commands::Generate(args)) => commands::generate::run(args).await,
            Some(Commands::Mock(args)) => commands::mock::run(args).await,
            Some(Commands::Config(config_cmd)) => match config_cmd {
                ConfigCommands::Show => commands::config::show(),
                ConfigCommands::Reset => commands::config::reset(),
                ConfigCommands::Path => commands::config::path(),
            },
            None => {
                let mut cmd = Cli::command();
                let _ = cmd.print_help();
                println!();
                0
            }
        },
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[tokio::test]
    async fn test_unknown_flag_is_a_usage_error() {
        let code = run(vec!["swaggen".to_string(), "generate".to_string(), "--nope".to_string()]).await;
        assert_eq!(code, 2);
    }
}

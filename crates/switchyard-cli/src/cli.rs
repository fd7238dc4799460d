//! CLI argument definitions for Switchyard.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "switchyard",
    version,
    about = "Fetch, inspect and evaluate feature toggles",
    long_about = "Switchyard talks to a feature-toggle server the same way the client library does. \
                  Toggles can also be read from a backup or bootstrap file and evaluated offline."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (defaults to ~/.switchyard/config.toml)
    #[arg(long, global = true, env = "SWITCHYARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Server API URL, e.g. https://flags.example.com/api
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// API token sent as the Authorization header
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Application name reported to the server
    #[arg(long, global = true)]
    pub app_name: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch toggles from the server
    Fetch {
        /// Write the fetched toggles to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List toggles from a file or the server
    #[command(alias = "ls")]
    List {
        /// Read toggles from this file instead of the server
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Evaluate one toggle locally
    Eval {
        /// Toggle name
        toggle: String,
        /// Read toggles from this file instead of the server
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        session_id: Option<String>,
        #[arg(long)]
        remote_address: Option<String>,
        #[arg(long)]
        environment: Option<String>,
        /// Extra context property as key=value (repeatable)
        #[arg(short, long = "property", value_parser = parse_property)]
        properties: Vec<(String, String)>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_property(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_requires_key_and_equals() {
        assert_eq!(
            parse_property("plan=pro"),
            Ok(("plan".to_string(), "pro".to_string()))
        );
        assert_eq!(
            parse_property("empty="),
            Ok(("empty".to_string(), String::new()))
        );
        assert!(parse_property("noequals").is_err());
        assert!(parse_property("=value").is_err());
    }

    #[test]
    fn eval_collects_properties() {
        let cli = Cli::try_parse_from([
            "switchyard",
            "eval",
            "checkout.new",
            "--user-id",
            "42",
            "-p",
            "plan=pro",
            "--property",
            "region=eu",
        ])
        .unwrap();
        let Command::Eval {
            toggle,
            user_id,
            properties,
            ..
        } = cli.command
        else {
            panic!("expected eval");
        };
        assert_eq!(toggle, "checkout.new");
        assert_eq!(user_id.as_deref(), Some("42"));
        assert_eq!(properties.len(), 2);
    }
}

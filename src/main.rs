//! Flowpilot - chat assistant for an Airflow deployment
//!
//! Single launcher for the three services:
//! - **tools**: JSON-RPC tool server over the Airflow REST API
//! - **relay**: chat relay running the tool-calling agent
//! - **bridge**: SSE endpoint behind the chat widget in the Airflow console

use flowpilot_core::config::{load_config, sample_config};
use flowpilot_core::{FlowpilotConfig, ToolRegistry};
use std::path::{Path, PathBuf};

const USAGE: &str = "\
Usage: flowpilot <command> [--config PATH]

Commands:
  serve <tools|relay|bridge|all>   Run a service (or all three)
  tools                            Print the tool catalog as JSON
  sample-config                    Print a sample .flowpilot.toml
  help                             Show this message";

/// Service selected by `serve`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Service {
    Tools,
    Relay,
    Bridge,
    All,
}

impl Service {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "tools" => Some(Service::Tools),
            "relay" => Some(Service::Relay),
            "bridge" => Some(Service::Bridge),
            "all" => Some(Service::All),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Serve(Service),
    Tools,
    SampleConfig,
    Help,
}

/// Command-line arguments
#[derive(Debug, PartialEq, Eq)]
struct Args {
    command: Command,
    /// Explicit config file
    config: Option<PathBuf>,
}

impl Args {
    /// Parse command-line arguments
    fn parse() -> Result<Self, String> {
        Self::parse_from(std::env::args().skip(1))
    }

    fn parse_from(args: impl IntoIterator<Item = String>) -> Result<Self, String> {
        let mut args = args.into_iter();
        let mut positional = Vec::new();
        let mut config = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = Some(PathBuf::from(
                        args.next().ok_or("--config needs a path")?,
                    ));
                }
                "--help" | "-h" => positional.insert(0, "help".to_string()),
                _ if !arg.starts_with('-') => positional.push(arg),
                _ => return Err(format!("unknown flag: {}", arg)),
            }
        }

        let command = match positional.first().map(String::as_str) {
            None | Some("help") => Command::Help,
            Some("tools") => Command::Tools,
            Some("sample-config") => Command::SampleConfig,
            Some("serve") => {
                let name = positional.get(1).ok_or("serve needs a service name")?;
                let service = Service::parse(name)
                    .ok_or_else(|| format!("unknown service: {}", name))?;
                Command::Serve(service)
            }
            Some(other) => return Err(format!("unknown command: {}", other)),
        };

        Ok(Self { command, config })
    }
}

fn load(explicit: Option<&Path>) -> anyhow::Result<FlowpilotConfig> {
    let cwd = std::env::current_dir()?;
    Ok(load_config(explicit, &cwd)?)
}

#[cfg(feature = "web")]
fn serve(service: Service, config: FlowpilotConfig) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        match service {
            Service::Tools => flowpilot_server::run_tool_server(config).await,
            Service::Relay => flowpilot_server::run_relay(config).await,
            Service::Bridge => flowpilot_server::run_bridge(config).await,
            Service::All => flowpilot_server::run_all(config).await,
        }
    })
}

#[cfg(not(feature = "web"))]
fn serve(_service: Service, _config: FlowpilotConfig) -> anyhow::Result<()> {
    anyhow::bail!("flowpilot was built without the `web` feature")
}

fn main() -> anyhow::Result<()> {
    let args = match Args::parse() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("error: {}\n\n{}", msg, USAGE);
            std::process::exit(2);
        }
    };

    match args.command {
        Command::Help => println!("{}", USAGE),
        Command::SampleConfig => print!("{}", sample_config()),
        Command::Tools => {
            let catalog = ToolRegistry::new().list_tools_json();
            println!("{}", serde_json::to_string_pretty(&catalog)?);
        }
        Command::Serve(service) => serve(service, load(args.config.as_deref())?)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Result<Args, String> {
        Args::parse_from(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn test_serve_with_config() {
        assert_eq!(
            parse(&["serve", "relay", "--config", "/etc/flowpilot.toml"]).unwrap(),
            Args {
                command: Command::Serve(Service::Relay),
                config: Some(PathBuf::from("/etc/flowpilot.toml")),
            }
        );
    }

    #[test]
    fn test_defaults_to_help() {
        assert_eq!(parse(&[]).unwrap().command, Command::Help);
        assert_eq!(parse(&["tools", "-h"]).unwrap().command, Command::Help);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(parse(&["serve"]).is_err());
        assert!(parse(&["serve", "scheduler"]).is_err());
        assert!(parse(&["launch"]).is_err());
        assert!(parse(&["tools", "--verbose"]).is_err());
        assert!(parse(&["tools", "--config"]).is_err());
    }

    #[test]
    fn test_load_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flowpilot.toml");
        std::fs::write(&path, "[bridge]\nrelay_url = \"http://relay.internal:9000\"\n").unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.bridge.relay_url, "http://relay.internal:9000");
        assert!(load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}

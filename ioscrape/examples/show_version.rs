//! Fetch `show version` from a registered device.
//!
//! Connection details come from the ssh client config file named by
//! `MCP_SSH_CONFIG` (default `./config/ssh_config`). If the device asks for
//! a password it is read from the variable named by `CISCO_PASSWORD_ENV`
//! (default `CISCO_PASSWORD`).
//!
//! # Usage
//!
//! ```bash
//! CISCO_PASSWORD=secret cargo run --example show_version -- --host Cisco-3560-PoE-switch
//! ```
//!
//! Pass `--list` to print the known host identifiers.

use std::env;

use ioscrape::{DeviceTool, Settings, ShowVersionRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = Settings::from_env()?;
    let tool = DeviceTool::from_settings(&settings);

    if args.list {
        for id in tool.registry().ids() {
            println!("{id}");
        }
        return Ok(());
    }

    let Some(host) = args.host else {
        eprintln!("Error: --host is required (see --help)");
        std::process::exit(1);
    };

    match tool.call(ShowVersionRequest { host }).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error ({:?}): {}", e.kind(), e);
            std::process::exit(2);
        }
    }
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: Option<String>,
    list: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = None;
        let mut list = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    i += 1;
                    if i < args.len() {
                        host = Some(args[i].clone());
                    }
                }
                "--list" | "-l" => list = true,
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Self { host, list }
    }

    fn print_help() {
        println!(
            r#"ioscrape show_version example

USAGE:
    cargo run --example show_version -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>    Registered host identifier
    -l, --list           Print the registered host identifiers
    --help               Print this help message

ENVIRONMENT:
    MCP_SSH_CONFIG         ssh client config file [default: ./config/ssh_config]
    CISCO_PASSWORD_ENV     Name of the password variable [default: CISCO_PASSWORD]
    MCP_SSH_TIMEOUT_SECS   Per-wait timeout in seconds [default: 25]
"#
        );
    }
}

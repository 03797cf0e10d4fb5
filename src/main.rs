// SPDX-FileCopyrightText: 2023 Linutronix GmbH
// SPDX-License-Identifier: GPL-3.0-or-later

//! Main executable of grpcconf
// we do not want to panic or exit, see explanation in main()
#![cfg_attr(
    not(test),
    deny(
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::expect_used,
        clippy::exit,
        clippy::unwrap_used,
        clippy::indexing_slicing,
        clippy::modulo_arithmetic, // % 0 panics - use checked_rem
        clippy::integer_division,  // / 0 panics - use checked_div
        clippy::unreachable,
        clippy::unwrap_in_result,
    )
)]
#![allow(clippy::unnecessary_wraps)] // wraps are necessary for certain combinations of feature flags

use anyhow::{anyhow, ensure, Context, Error, Result};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;

use futures::lock::Mutex;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use grpcconf::configuration::{Configuration, YAMLConfiguration};
use grpcconf::controller::{Controller, Expectation, Provisioning, PushOutcome};
use grpcconf::device::{Device, DummyDevice};
use grpcconf::parser::{
    parse_brief, parse_detail, parse_respawn_count, parse_stats, parse_telemetry_summary,
};
use grpcconf::renderer::render;
use grpcconf::synthesizer::{synthesize, synthesize_unconfig};
use grpcconf::verify::verify_configuration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the configuration text for the YAML file
    Render {
        /// YAML configuration file
        #[arg(value_name = "FILE")]
        config: PathBuf,
    },

    /// Print the removal text of every unconfig request of the YAML file
    Unconfig {
        /// YAML configuration file
        #[arg(value_name = "FILE")]
        config: PathBuf,
    },

    /// Parse the output of a show command and print it as JSON
    Parse {
        /// Format of the show output
        #[arg(value_enum)]
        format: Format,

        /// Server to look for. Mandatory for the brief format.
        #[arg(short, long)]
        server: Option<String>,

        /// File with the show output. Read from stdin if not provided.
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,
    },

    /// Push the configuration (or its removal) to the device
    Apply {
        /// YAML configuration file
        #[arg(value_name = "FILE")]
        config: PathBuf,

        /// Program and arguments receiving the configuration text on stdin, one per occurrence
        #[arg(long, allow_hyphen_values = true, required_unless_present = "dry_run")]
        push_command: Vec<String>,

        /// Push the unconfig requests instead of the configuration
        #[arg(long)]
        unconfig: bool,

        /// The device has to reject the configuration
        #[arg(long)]
        expect_failure: bool,

        /// Do not contact any device, only log what would be pushed
        #[arg(long)]
        dry_run: bool,
    },

    /// Compare the state reported by the device with the expectations of the YAML file
    Verify {
        /// YAML configuration file
        #[arg(value_name = "FILE")]
        config: PathBuf,

        /// Program and arguments getting the show command as last argument, one per occurrence
        #[arg(long, allow_hyphen_values = true, required = true)]
        show_command: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Brief,
    Detail,
    Stats,
    Telemetry,
    Respawn,
}

#[tokio::main(flavor = "current_thread")]
/// Main function of `grpcconf`
///
/// # Errors
/// Will return `Err` if any error occurs that can not be handled,
/// including a device that did not behave as expected and failed verifications.
/// panic! is disencouraged in this codebase, but still stopping of the
/// execution in rare cases can not be excluded (e.g. due to external crates).
///
/// # Panics
/// The only known case is when the tokio runtime can not even be started
/// before calling the actual main function.
pub async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render { config } => {
            let grpc_config = read_configuration(&config)?.get_grpc_config()?;
            print!("{}", render(&synthesize(&grpc_config)));
        }
        Commands::Unconfig { config } => {
            for request in read_configuration(&config)?.get_unconfig_requests()? {
                print!("{}", render(&synthesize_unconfig(&request)));
            }
        }
        Commands::Parse {
            format,
            server,
            input,
        } => {
            let text = read_input(input.as_deref())?;
            println!("{}", parse(format, server.as_deref(), &text)?);
        }
        Commands::Apply {
            config,
            push_command,
            unconfig,
            expect_failure,
            dry_run,
        } => {
            let configuration = Arc::new(Mutex::new(read_configuration(&config)?));
            let device: Arc<Mutex<dyn Device + Sync + Send>> = if dry_run {
                Arc::new(Mutex::new(DummyDevice::new()))
            } else {
                new_command_device(push_command, vec![])?
            };
            let expectation = if expect_failure {
                Expectation::Failure
            } else {
                Expectation::Success
            };

            let controller = Controller::new();
            let outcomes = if unconfig {
                controller
                    .unconfigure(configuration, device, expectation)
                    .await?
            } else {
                vec![controller.apply(configuration, device, expectation).await?]
            };

            for outcome in outcomes {
                match outcome {
                    PushOutcome::Skipped => println!("Skipped, nothing to push"),
                    PushOutcome::Pushed => println!("Pushed"),
                    PushOutcome::Rejected(reason) => println!("Rejected as expected: {reason}"),
                }
            }
        }
        Commands::Verify {
            config,
            show_command,
        } => {
            let configuration = Arc::new(Mutex::new(read_configuration(&config)?));
            let device = new_command_device(vec![], show_command)?;

            let verdicts = verify_configuration(configuration, device).await?;
            for verdict in &verdicts {
                let result = if verdict.passed() { "PASS" } else { "FAIL" };
                println!("[{result}] {}", verdict.subject);
            }

            let failed = verdicts.iter().filter(|v| !v.passed()).count();
            ensure!(
                failed == 0,
                "{failed} of {} verifications failed",
                verdicts.len()
            );
        }
    }

    Ok(())
}

fn read_configuration(file: &Path) -> Result<YAMLConfiguration> {
    let mut configuration = YAMLConfiguration::new();
    configuration.read(
        File::open(file).with_context(|| format!("Opening {} failed", file.display()))?,
    )?;
    Ok(configuration)
}

fn read_input(input: Option<&Path>) -> Result<String> {
    let mut text = String::new();
    match input {
        Some(file) => File::open(file)
            .with_context(|| format!("Opening {} failed", file.display()))?
            .read_to_string(&mut text),
        None => std::io::stdin().read_to_string(&mut text),
    }
    .context("Reading show output failed")?;
    Ok(text)
}

fn parse(format: Format, server: Option<&str>, text: &str) -> Result<String> {
    let json = match format {
        Format::Brief => {
            let name = server.ok_or_else(|| anyhow!("--server is required to parse a brief listing"))?;
            serde_json::to_string_pretty(&parse_brief(text, name)?)
        }
        Format::Detail => serde_json::to_string_pretty(&parse_detail(text)),
        Format::Stats => serde_json::to_string_pretty(&parse_stats(text, server.unwrap_or_default())),
        Format::Telemetry => serde_json::to_string_pretty(&parse_telemetry_summary(text)?),
        Format::Respawn => serde_json::to_string_pretty(&parse_respawn_count(text)?),
    };

    json.context("Serializing parsed output failed")
}

#[allow(dead_code)] // will not be used if ALL features are enabled
fn feature_missing_error(feature: &str, alternative: &str) -> Error {
    anyhow!("{} feature is not built in!\nYou can still use {} if appropriate for your use case or rebuild with the feature enabled!", feature, alternative)
}

#[cfg(feature = "command")]
use grpcconf::device::CommandDevice;
#[cfg(feature = "command")]
fn new_command_device(
    push_program: Vec<String>,
    show_program: Vec<String>,
) -> Result<Arc<Mutex<dyn Device + Sync + Send>>> {
    Ok(Arc::new(Mutex::new(CommandDevice::new(
        push_program,
        show_program,
    ))))
}

#[cfg(not(feature = "command"))]
fn new_command_device(
    _push_program: Vec<String>,
    _show_program: Vec<String>,
) -> Result<Arc<Mutex<dyn Device + Sync + Send>>> {
    Err(feature_missing_error("command", "--dry-run or the parse subcommand"))
}

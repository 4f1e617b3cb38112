// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! `daqctl`: a thin REST client for `daqd`, the data-acquisition
//! orchestrator daemon. `clap` subcommands delegate to `commands::*`
//! handlers that call a client module and print formatted results.

mod client;
mod color;
mod commands;
mod exit_error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use client::DaemonClient;
use exit_error::ExitError;
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "daqctl", about = "Control client for the daq-acquisition orchestrator daemon", styles = color::styles())]
struct Cli {
    /// Base URL of the running `daqd` REST API.
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    url: String,

    /// Output format for command results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Daemon status overview: uptime, session state, registered modules.
    Status,
    /// Request graceful daemon shutdown.
    Shutdown,
    /// Report OS/arch platform info.
    Platform,
    /// Session lifecycle.
    #[command(subcommand)]
    Session(SessionCommand),
    /// Trial lifecycle within the active session.
    #[command(subcommand)]
    Trial(TrialCommand),
    /// Module process lifecycle.
    #[command(subcommand)]
    Module(ModuleCommand),
    /// Connected-device registry.
    #[command(subcommand)]
    Device(DeviceCommand),
    /// GUI window arrangement.
    Windows {
        /// `grid`, `cascade`, `tile_horizontal`, or `tile_vertical`.
        layout: String,
        #[arg(long, default_value_t = 1920)]
        screen_width: u32,
        #[arg(long, default_value_t = 1080)]
        screen_height: u32,
    },
    /// Daemon and module log inspection.
    #[command(subcommand)]
    Logs(LogsCommand),
    /// Query a module family's extension surface (gaze/IMU/battery/...).
    Extension { family: String, key: String },
}

#[derive(Debug, Subcommand)]
enum SessionCommand {
    Start {
        #[arg(long)]
        session_dir: Option<PathBuf>,
    },
    Stop,
    Show,
}

#[derive(Debug, Subcommand)]
enum TrialCommand {
    Start {
        #[arg(long)]
        label: Option<String>,
    },
    Stop,
    Status,
}

#[derive(Debug, Subcommand)]
enum ModuleCommand {
    List,
    Show { name: String },
    Start { name: String },
    Stop { name: String },
    Instances,
}

#[derive(Debug, Subcommand)]
enum DeviceCommand {
    List,
    Connect { id: String },
    Disconnect { id: String },
    ScanningStatus,
}

#[derive(Debug, Subcommand)]
enum LogsCommand {
    Paths,
    Master,
    Module { name: String },
    Tail { path: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let client = DaemonClient::new(&cli.url);

    if let Err(err) = run(&client, cli.command, cli.format).await {
        let exit_err = match err.downcast_ref::<client::ClientError>() {
            Some(client_err) => ExitError::from_status(client_err.status(), client_err.to_string()),
            None => ExitError::new(1, err.to_string()),
        };
        eprintln!("error: {exit_err}");
        return ExitCode::from(exit_err.code as u8);
    }
    ExitCode::SUCCESS
}

async fn run(client: &DaemonClient, command: Command, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        Command::Status => commands::status::handle(client, format).await,
        Command::Shutdown => {
            let result = client.shutdown().await?;
            output::print_value(format, &result, |_| println!("shutdown requested"))
        }
        Command::Platform => {
            let result = client.platform().await?;
            output::print_value(format, &result, |v| {
                println!("{} / {}", v["os"].as_str().unwrap_or("?"), v["arch"].as_str().unwrap_or("?"))
            })
        }
        Command::Session(cmd) => match cmd {
            SessionCommand::Start { session_dir } => commands::session::start(client, session_dir, format).await,
            SessionCommand::Stop => commands::session::stop(client, format).await,
            SessionCommand::Show => commands::session::show(client, format).await,
        },
        Command::Trial(cmd) => match cmd {
            TrialCommand::Start { label } => commands::trial::start(client, label, format).await,
            TrialCommand::Stop => commands::trial::stop(client, format).await,
            TrialCommand::Status => commands::trial::status(client, format).await,
        },
        Command::Module(cmd) => match cmd {
            ModuleCommand::List => commands::module::list(client, format).await,
            ModuleCommand::Show { name } => commands::module::show(client, &name, format).await,
            ModuleCommand::Start { name } => commands::module::start(client, &name, format).await,
            ModuleCommand::Stop { name } => commands::module::stop(client, &name, format).await,
            ModuleCommand::Instances => commands::module::instances(client, format).await,
        },
        Command::Device(cmd) => match cmd {
            DeviceCommand::List => commands::device::list(client, format).await,
            DeviceCommand::Connect { id } => commands::device::connect(client, &id, format).await,
            DeviceCommand::Disconnect { id } => commands::device::disconnect(client, &id, format).await,
            DeviceCommand::ScanningStatus => commands::device::scanning_status(client, format).await,
        },
        Command::Windows { layout, screen_width, screen_height } => {
            commands::windows::arrange(client, &layout, screen_width, screen_height, format).await
        }
        Command::Logs(cmd) => match cmd {
            LogsCommand::Paths => commands::logs::paths(client, format).await,
            LogsCommand::Master => commands::logs::master(client).await,
            LogsCommand::Module { name } => commands::logs::module(client, &name).await,
            LogsCommand::Tail { path } => commands::logs::tail(client, &path).await,
        },
        Command::Extension { family, key } => commands::extension::query(client, &family, &key, format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_without_panicking() {
        Cli::command().debug_assert();
    }
}

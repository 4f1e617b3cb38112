// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

//! `daqd`: the master orchestrator process entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use daq_core::device::DeviceInterface;
use daq_core::module::ModuleDescriptor;
use daq_core::SystemClock;
use daq_daemon::api::{build_router, AppState};
use daq_daemon::{DaemonConfig, Orchestrator};
use daq_discovery::{DiscoveryDriver, StaticSource};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "daqd", about = "Data-acquisition orchestrator daemon")]
struct Cli {
    /// Path to a `key=value` daemon configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the REST API port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the session data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose per-request logging and include debug fields in
    /// error responses.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "daq_daemon=info,tower_http=info".into()))
        .init();

    let mut config = DaemonConfig::load(cli.config.as_ref())?;
    if let Some(port) = cli.port {
        config.api_port = port;
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    config.api_debug = config.api_debug || cli.debug;

    std::fs::create_dir_all(&config.state_dir)?;
    std::fs::create_dir_all(&config.log_dir)?;
    std::fs::create_dir_all(&config.data_dir)?;

    let descriptors = builtin_module_descriptors(&config);
    let (orchestrator, mut event_rx) = Orchestrator::new(config.clone(), descriptors, SystemClock);
    let orchestrator = Arc::new(Mutex::new(orchestrator));

    let event_orchestrator = orchestrator.clone();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            event_orchestrator.lock().await.apply_event(event);
        }
    });

    // No real hardware adapters ship in this build; the static source
    // starts empty and exists so the registry's sweep-diffing logic runs
    // end to end even with nothing plugged in.
    let discovery_shutdown = CancellationToken::new();
    let (sweep_tx, mut sweep_rx) = tokio::sync::mpsc::channel(64);
    let usb_source = Arc::new(StaticSource::new(Vec::new()));
    let usb_driver = DiscoveryDriver::new(usb_source, config.discovery_retry_interval);
    let discovery_handle = usb_driver.spawn(sweep_tx, discovery_shutdown.clone());

    let sweep_orchestrator = orchestrator.clone();
    tokio::spawn(async move {
        while let Some(sighted) = sweep_rx.recv().await {
            let events = sweep_orchestrator.lock().await.apply_sweep(sighted, DeviceInterface::Usb);
            for event in events {
                info!(?event, "discovery sweep event");
            }
        }
    });

    let state = AppState { orchestrator, debug: config.api_debug, log_dir: config.log_dir.clone(), started_at: std::time::Instant::now() };
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.api_host, config.api_port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "daqd listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    discovery_shutdown.cancel();
    let _ = discovery_handle.await;

    Ok(())
}

/// Built-in module descriptors, pointing at the sibling `modules/*` binaries
/// built alongside `daqd`. A real deployment may extend this list from a
/// config file; hard-coding the shipped modules keeps the daemon runnable
/// standalone.
fn builtin_module_descriptors(config: &DaemonConfig) -> Vec<ModuleDescriptor> {
    let modules_dir = std::env::current_exe().ok().and_then(|p| p.parent().map(PathBuf::from)).unwrap_or_else(|| PathBuf::from("."));
    vec![
        ModuleDescriptor {
            name: "Audio".to_string(),
            display_name: "Audio capture".to_string(),
            module_id: "audio".to_string(),
            entry_point: modules_dir.join("daq-audio").to_string_lossy().to_string(),
            entry_args: vec![],
            config_path: config.state_dir.join("audio.conf"),
            supports_snapshot: false,
            has_gui: false,
        },
        ModuleDescriptor {
            name: "Gps".to_string(),
            display_name: "GPS".to_string(),
            module_id: "gps".to_string(),
            entry_point: modules_dir.join("daq-gps").to_string_lossy().to_string(),
            entry_args: vec![],
            config_path: config.state_dir.join("gps.conf"),
            supports_snapshot: false,
            has_gui: false,
        },
        ModuleDescriptor {
            name: "Camera".to_string(),
            display_name: "Camera".to_string(),
            module_id: "cameras".to_string(),
            entry_point: modules_dir.join("daq-camera").to_string_lossy().to_string(),
            entry_args: vec![],
            config_path: config.state_dir.join("camera.conf"),
            supports_snapshot: true,
            has_gui: true,
        },
        ModuleDescriptor {
            name: "Notes".to_string(),
            display_name: "Notes".to_string(),
            module_id: "notes".to_string(),
            entry_point: modules_dir.join("daq-notes").to_string_lossy().to_string(),
            entry_args: vec![],
            config_path: config.state_dir.join("notes.conf"),
            supports_snapshot: false,
            has_gui: false,
        },
        ModuleDescriptor {
            name: "ResponseTime".to_string(),
            display_name: "Response time".to_string(),
            module_id: "drt".to_string(),
            entry_point: modules_dir.join("daq-drt").to_string_lossy().to_string(),
            entry_args: vec![],
            config_path: config.state_dir.join("drt.conf"),
            supports_snapshot: false,
            has_gui: false,
        },
        ModuleDescriptor {
            name: "Goggles".to_string(),
            display_name: "Occlusion goggles".to_string(),
            module_id: "vog".to_string(),
            entry_point: modules_dir.join("daq-vog").to_string_lossy().to_string(),
            entry_args: vec![],
            config_path: config.state_dir.join("vog.conf"),
            supports_snapshot: false,
            has_gui: false,
        },
        ModuleDescriptor {
            name: "EyeTracker".to_string(),
            display_name: "Eye tracker".to_string(),
            module_id: "eyetracker".to_string(),
            entry_point: modules_dir.join("daq-eyetracker").to_string_lossy().to_string(),
            entry_args: vec![],
            config_path: config.state_dir.join("eyetracker.conf"),
            supports_snapshot: false,
            has_gui: false,
        },
    ]
}

/// Waits for either Ctrl-C or SIGTERM. The REST server's 5s drain budget
/// for in-flight handlers is enforced by `axum::serve`'s graceful shutdown
/// itself.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}

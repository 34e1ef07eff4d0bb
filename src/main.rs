//! # pip-shell-probe
//!
//! Connects to the running compositor and reports what pip-shell would be
//! able to do there: whether the layer shell is available and at which
//! version, and whether windows could fall back to plain xdg toplevels.

use anyhow::Result;
use clap::Parser;
use log::{error, info, warn};

use pip_shell::config::ShellConfig;
use pip_shell::logging;
use pip_shell::protocol::ProtocolRegistry;
use pip_shell::{major_version, micro_version, minor_version, PipShell, WaylandConnection};

#[derive(Parser)]
#[command(name = "pip-shell-probe")]
#[command(about = "Report layer-shell support of the running wayland compositor")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/pip-shell/pip-shell.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// List every global the compositor advertises
    #[arg(short, long)]
    list_globals: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration before logging so its level applies; report afterwards
    let loaded = ShellConfig::load(&cli.config);
    let config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => ShellConfig::default(),
    };

    logging::init(&config.logging, cli.debug);

    info!(
        "🔎 pip-shell-probe {}.{}.{}",
        major_version(),
        minor_version(),
        micro_version()
    );
    match loaded {
        Ok(_) => info!("✅ Configuration loaded from: {}", cli.config),
        Err(e) => {
            warn!("❌ Failed to load configuration: {:#}", e);
            info!("📝 Using default configuration");
        }
    }

    let connection = match WaylandConnection::connect() {
        Ok(connection) => connection,
        Err(e) => {
            error!("❌ {:#}", e);
            println!("layer shell supported: no (not a wayland session)");
            return Ok(());
        }
    };

    if cli.list_globals {
        for (interface, version) in connection.advertised() {
            println!("{:<48} v{}", interface, version);
        }
    }

    let registry = ProtocolRegistry::new(connection.global_source());
    let fallback_available = registry.toplevel_shell().is_some();
    let shell = PipShell::new(registry, &config);

    if shell.is_supported() {
        println!(
            "layer shell supported: yes (zwlr_layer_shell_v1 v{})",
            shell.protocol_version()
        );
    } else {
        println!("layer shell supported: no");
    }
    println!(
        "xdg toplevel fallback: {}",
        match (fallback_available, config.fallback.toplevel) {
            (true, true) => "available",
            (true, false) => "available, disabled by configuration",
            (false, _) => "unavailable",
        }
    );
    println!("default namespace: {}", config.surface.namespace);

    connection.flush()?;
    Ok(())
}

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hughes_power_watchdog::config::{is_valid_address, ConfigEntry};
use hughes_power_watchdog::switch::monitoring_unique_id;
use hughes_power_watchdog::utils::logger;
use hughes_power_watchdog::{Hub, LoopbackLink, PowerWatchdogCoordinator};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Drive the Power Watchdog monitoring switch", long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, help = "Bluetooth address of the device (MAC or platform UUID)")]
    address: Option<String>,

    #[clap(long, help = "Config entry id (random when omitted)")]
    entry_id: Option<String>,

    #[clap(long, help = "Device name shown by the host")]
    name: Option<String>,

    #[clap(long, help = "Load the config entry from a JSON file instead")]
    entry: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Enable monitoring and connect
    On,
    /// Disconnect and suspend monitoring
    Off,
    /// Print the switch state without changing it
    Status,
    /// Turn monitoring on, hold, then turn it off again
    Cycle {
        #[clap(long, default_value = "5s", value_parser = humantime::parse_duration,
               help = "How long to keep monitoring on")]
        hold: Duration,
    },
}

fn load_entry(cli: &Cli) -> Result<ConfigEntry> {
    if let Some(path) = &cli.entry {
        return ConfigEntry::from_file(path)
            .with_context(|| format!("Failed to load config entry from {}", path.display()));
    }

    let Some(address) = cli.address.as_deref() else {
        bail!("Either --address or --entry is required");
    };
    if !is_valid_address(address) {
        bail!("Invalid device address: {}", address);
    }

    let entry_id = cli
        .entry_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
    let mut entry = ConfigEntry::new(entry_id, address);
    if let Some(name) = &cli.name {
        entry = entry.with_name(name.as_str());
    }
    entry.validate()?;
    Ok(entry)
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::init();
    let cli = Cli::parse();
    let entry = load_entry(&cli)?;
    let entry_id = entry.entry_id.clone();

    let link = Arc::new(LoopbackLink::new(entry.address()));
    let hub = Hub::new();
    hub.insert_coordinator(Arc::new(PowerWatchdogCoordinator::new(entry, link)));
    hub.async_setup_entry(&entry_id).await?;

    let mut events = hub.bus().subscribe().await;
    let switch = hub
        .registry()
        .get(&monitoring_unique_id(&entry_id))
        .context("Monitoring switch was not registered")?;

    match cli.command {
        Commands::On => switch.turn_on().await?,
        Commands::Off => switch.turn_off().await?,
        Commands::Status => {}
        Commands::Cycle { hold } => {
            switch.turn_on().await?;
            tracing::info!("Holding monitoring on for {}", humantime::format_duration(hold));
            tokio::time::sleep(hold).await;
            switch.turn_off().await?;
        }
    }

    while let Ok(event) = events.try_recv() {
        println!("{}", serde_json::to_string(&event)?);
    }
    println!("{}", serde_json::to_string(&switch.state_snapshot())?);

    hub.async_unload_entry(&entry_id).await?;
    Ok(())
}

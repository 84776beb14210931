// # mdnsd - mDNS Publisher Daemon
//
// Thin integration layer. All reconciliation logic lives in mdns-core; this
// binary only:
//
// 1. Reads configuration from environment variables
// 2. Initializes logging
// 3. Wires the supervisor client, interface lookup and Avahi publisher
// 4. Runs the reconciler until the first fatal error
//
// ## Configuration
//
// - `INTERFACE`: Optional. Publish the IPv4 address of this interface instead
//   of the supervisor-reported primary address
// - `BALENA_SUPERVISOR_ADDRESS`: Required. Supervisor base URL
// - `BALENA_SUPERVISOR_API_KEY`: Required. Supervisor API key
// - `MDNS_LOG_LEVEL`: Optional. trace, debug, info (default), warn, error
//
// ## Termination
//
// The daemon never exits on its own with success. Any fatal error is logged
// and turned into exit code 1 so the container supervisor restarts it. No
// signal handlers are installed; SIGTERM and SIGINT end the process with
// their default disposition and Avahi drops the groups with the bus
// connection.
//
// ## Example
//
// ```bash
// export BALENA_SUPERVISOR_ADDRESS=http://127.0.0.1:48484
// export BALENA_SUPERVISOR_API_KEY=your_key
// export INTERFACE=eth0
//
// mdnsd
// ```

use anyhow::{Context, Result};
use mdns_core::config::{IdentityConfig, PublisherConfig};
use mdns_core::traits::InterfaceLookup;
use mdns_core::{AddressSource, ReconcileEvent, Reconciler, Resolver};
use mdns_identity_http::SupervisorClient;
use mdns_ip_interface::SystemInterfaces;
use mdns_publisher_avahi::AvahiPublisher;
use std::env;
use std::process::ExitCode;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

const ENV_INTERFACE: &str = "INTERFACE";
const ENV_SUPERVISOR_ADDRESS: &str = "BALENA_SUPERVISOR_ADDRESS";
const ENV_SUPERVISOR_API_KEY: &str = "BALENA_SUPERVISOR_API_KEY";
const ENV_LOG_LEVEL: &str = "MDNS_LOG_LEVEL";

/// Exit codes for the termination scenarios
///
/// Both map to 1: the process supervisor only needs to know it must restart.
#[derive(Debug, Clone, Copy)]
enum MdnsExitCode {
    /// Configuration error or startup failure
    ConfigError,
    /// Fatal error while reconciling
    RuntimeError,
}

impl From<MdnsExitCode> for ExitCode {
    fn from(code: MdnsExitCode) -> Self {
        match code {
            MdnsExitCode::ConfigError | MdnsExitCode::RuntimeError => ExitCode::from(1),
        }
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    publisher: PublisherConfig,
    log_level: Level,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup(ENV_SUPERVISOR_ADDRESS)
            .filter(|v| !v.is_empty())
            .with_context(|| format!("{} is required", ENV_SUPERVISOR_ADDRESS))?;
        let api_key = lookup(ENV_SUPERVISOR_API_KEY)
            .filter(|v| !v.is_empty())
            .with_context(|| format!("{} is required", ENV_SUPERVISOR_API_KEY))?;

        let mut publisher = PublisherConfig::new(IdentityConfig::new(base_url, api_key));
        if let Some(interface) = lookup(ENV_INTERFACE).filter(|v| !v.trim().is_empty()) {
            publisher = publisher.with_interface(interface.trim());
        }

        let log_level = match lookup(ENV_LOG_LEVEL) {
            Some(level) => parse_log_level(&level)?,
            None => Level::INFO,
        };

        Ok(Self {
            publisher,
            log_level,
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.publisher.validate()?;
        Ok(())
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            ENV_LOG_LEVEL,
            level
        ),
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return MdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return MdnsExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return MdnsExitCode::ConfigError.into();
    }

    info!("Starting mdnsd");

    // One tick at a time; a single thread is all the work needs
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return MdnsExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => {
                error!("Reconciler stopped without reporting an error");
                MdnsExitCode::RuntimeError
            }
            Err(e) => {
                error!("mDNS publisher error: {:#}", e);
                MdnsExitCode::RuntimeError
            }
        }
    });

    code.into()
}

/// Wire components and run the reconciler
async fn run_daemon(config: Config) -> Result<()> {
    let publisher_config = config.publisher;

    let identity = SupervisorClient::from_config(&publisher_config.identity)?;

    let address = match publisher_config.address.interface() {
        Some(interface) => {
            info!("Publishing address of interface {}", interface);
            AddressSource::FixedInterface {
                interface: interface.to_string(),
                lookup: Box::new(SystemInterfaces::new()),
            }
        }
        None => {
            info!("Publishing primary address reported by the supervisor");
            AddressSource::Provider
        }
    };

    let resolver = Resolver::new(Box::new(identity), address, &publisher_config.engine);

    check_interface(&publisher_config, &SystemInterfaces::new())?;

    let publisher = AvahiPublisher::connect()
        .await
        .context("Could not reach Avahi on the system bus")?;
    info!("Publishing through {}", publisher.version());

    let (mut reconciler, mut event_rx) = Reconciler::new(
        Box::new(resolver),
        Box::new(publisher),
        &publisher_config.engine,
    )?;

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            // Failures are logged by main with the full error chain
            if !matches!(event, ReconcileEvent::Failed { .. }) {
                debug!("Reconciler event: {:?}", event);
            }
        }
    });

    reconciler.run().await?;
    Ok(())
}

/// Reject a missing or address-less interface before touching the bus
fn check_interface(
    config: &PublisherConfig,
    lookup: &dyn InterfaceLookup,
) -> mdns_core::Result<()> {
    if let Some(interface) = config.address.interface() {
        let address = lookup.ipv4_address(interface)?;
        debug!("Interface {} currently has address {}", interface, address);
    }
    Ok(())
}

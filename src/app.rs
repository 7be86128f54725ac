use crate::config::{MonitorConfig, QueryConfig};
use crate::dns::Client;
use crate::output::{Console, JsonLog};
use crate::pcap::{CaptureLoader, CaptureSession, Sinks, local_client};
use crate::query::QueryEngine;
use crate::shutdown::ShutdownCoordinator;
use crate::storage::{self, PersistenceQueue, StorageBackend};
use anyhow::{Context, Result};
use futures::stream::{StreamExt, TryStreamExt};
use log::{info, warn};
use std::io::{self, Write};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Print the capture devices libpcap can see.
pub fn list_interfaces() -> Result<()> {
    let interfaces = CaptureLoader::list_interfaces()?;
    println!("Available network interfaces:");
    for device in interfaces {
        let status = if device.flags.is_up() { "UP" } else { "DOWN" };
        let running = if device.flags.is_running() {
            "RUNNING"
        } else {
            ""
        };
        let loopback = if device.flags.is_loopback() {
            "LOOPBACK"
        } else {
            ""
        };

        println!("  {} [{}] {} {}", device.name, status, running, loopback);

        if let Some(desc) = device.desc {
            println!("    Description: {desc}");
        }
        for address in &device.addresses {
            println!("    Address: {}", address.addr);
        }
    }
    Ok(())
}

/// Everything a monitor run writes to besides the console. Opened after the
/// capture handle, in the order JSON log, storage, client row, queue.
pub struct Outputs {
    pub client: Client,
    json: Option<JsonLog>,
    backend: Option<Arc<dyn StorageBackend>>,
    queue: Option<PersistenceQueue>,
}

impl Outputs {
    /// Open the configured outputs. When a step fails, whatever was already
    /// opened is closed before the error is returned.
    pub async fn open(config: &MonitorConfig, client: Client) -> Result<Self> {
        let json = match &config.write {
            Some(path) => Some(
                JsonLog::open(path)
                    .await
                    .with_context(|| format!("Cannot open {}", path.display()))?,
            ),
            None => None,
        };

        let (backend, client) = match register(config, client).await {
            Ok(registered) => registered,
            Err(e) => {
                if let Some(json) = json {
                    let _ = json.close().await;
                }
                return Err(e);
            }
        };

        let queue = backend
            .clone()
            .map(|backend| PersistenceQueue::start(backend, config.queue_capacity));

        Ok(Self {
            client,
            json,
            backend,
            queue,
        })
    }

    pub fn sinks(&self, console: Console) -> Sinks {
        Sinks {
            console,
            json: self.json.as_ref().and_then(JsonLog::handle),
            queue: self.queue.as_ref().and_then(PersistenceQueue::sender),
            client_id: self.client.id,
        }
    }

    /// Hand every output to a coordinator that closes them in order.
    pub fn into_shutdown(self, cancel: CancellationToken) -> ShutdownCoordinator {
        ShutdownCoordinator::new(cancel)
            .with_json_log(self.json)
            .with_queue(self.queue)
            .with_storage(self.backend)
    }
}

/// Connect storage and persist the session row.
async fn register(
    config: &MonitorConfig,
    client: Client,
) -> Result<(Option<Arc<dyn StorageBackend>>, Client)> {
    let Some(backend) = storage::connect(&config.database)
        .await
        .context("Cannot open storage")?
    else {
        return Ok((None, client));
    };

    match backend.create_client(&client).await {
        Ok(id) => {
            info!("Registered client {} as #{id}", client.hostname);
            Ok((Some(backend), client.with_id(id)))
        }
        Err(e) => {
            backend.close().await;
            Err(e).context("Cannot register client")
        }
    }
}

/// Capture until interrupted. Returns the process exit status.
pub async fn run_monitor(config: MonitorConfig) -> Result<i32> {
    let interface = match &config.interface {
        Some(iface) => iface.clone(),
        None => CaptureLoader::select_default_interface()?,
    };
    let device = CaptureLoader::find(&interface)?;
    let client = local_client(&device);

    // Nothing is written anywhere until the capture handle and filter are up
    let source = CaptureLoader::open(device, config.port)?;
    let outputs = Outputs::open(&config, client).await?;

    let console = Console::new(config.quiet, config.hexdump);
    console.banner(&outputs.client);

    let cancel = CancellationToken::new();
    let handle =
        CaptureSession::new(source, config.port).spawn(outputs.sinks(console), cancel.clone());

    let report = outputs
        .into_shutdown(cancel)
        .with_capture(handle)
        .run()
        .await;

    if let Some(stats) = &report.capture {
        if let (Some(received), Some(dropped)) = (stats.pcap_received, stats.pcap_dropped) {
            info!("libpcap: {received} received, {dropped} dropped by kernel");
        }
        if stats.enqueue_failures > 0 {
            warn!("{} records never reached storage", stats.enqueue_failures);
        }
    }
    if !report.failed_steps.is_empty() {
        warn!("Shutdown steps failed: {}", report.failed_steps.join(", "));
    }
    info!("dnas stopped");

    Ok(report.exit_code())
}

/// Print stored records matching `config.request`, one line each.
pub async fn run_query(config: QueryConfig) -> Result<i32> {
    let Some(backend) = storage::open_existing(&config.database)
        .await
        .context("Cannot open storage")?
    else {
        return Ok(0);
    };

    let engine = QueryEngine::new(backend.clone());
    let result = print_records(&engine, &config).await;
    backend.close().await;

    let printed = result?;
    info!("{printed} records");
    Ok(0)
}

async fn print_records(engine: &QueryEngine, config: &QueryConfig) -> Result<usize> {
    let stream = engine.run(&config.request)?;
    let mut stream = match config.limit {
        Some(limit) => stream.take(limit).boxed(),
        None => stream,
    };

    let mut printed = 0;
    let mut out = io::stdout();
    while let Some(record) = stream.try_next().await? {
        writeln!(out, "{record}")?;
        printed += 1;
    }
    out.flush()?;
    Ok(printed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use std::path::Path;

    fn monitor_config(write: Option<&Path>, database: DatabaseConfig) -> MonitorConfig {
        MonitorConfig {
            interface: Some("eth0".to_string()),
            port: 53,
            write: write.map(Path::to_path_buf),
            hexdump: false,
            quiet: true,
            queue_capacity: 16,
            database,
        }
    }

    fn client() -> Client {
        Client::new("sensor".to_string(), None, "eth0".to_string(), None)
    }

    #[tokio::test]
    async fn unwritable_log_fails_before_storage_is_touched() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("dnas.db");
        let config = monitor_config(
            Some(&dir.path().join("missing").join("dns.json")),
            DatabaseConfig::sqlite(&db),
        );

        assert!(Outputs::open(&config, client()).await.is_err());
        assert!(!db.exists());
    }

    #[tokio::test]
    async fn storage_failure_closes_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("dns.json");
        let config = monitor_config(
            Some(&log),
            DatabaseConfig::sqlite(dir.path().join("missing").join("dnas.db")),
        );

        assert!(Outputs::open(&config, client()).await.is_err());
        assert!(log.exists());
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "");
    }

    #[tokio::test]
    async fn outputs_register_the_client_and_close_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = monitor_config(
            Some(&dir.path().join("dns.json")),
            DatabaseConfig::sqlite(dir.path().join("dnas.db")),
        );

        let outputs = Outputs::open(&config, client()).await.unwrap();
        assert_eq!(outputs.client.id, 1);

        let sinks = outputs.sinks(Console::new(true, false));
        assert_eq!(sinks.client_id, 1);
        assert!(sinks.json.is_some());
        assert!(sinks.queue.is_some());
        drop(sinks);

        let report = outputs
            .into_shutdown(CancellationToken::new())
            .run_until(async {})
            .await;
        assert!(report.failed_steps.is_empty());
        assert_eq!(report.json_lines, Some(0));
        assert_eq!(report.writer.unwrap().persisted, 0);
    }
}

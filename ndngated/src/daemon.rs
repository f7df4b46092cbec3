use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use ndngate_core::{Clock, Name};
use ndngate_engine::{FibTable, RuleEngine, Sweeper};

use crate::config::Config;
use crate::control_server::ControlServer;
use crate::packet_handler::{drain_deferred, PacketHandler};
use crate::seed::apply_seed_file;
use crate::service::Service;

/// The daemon: shared FIB and rule engine, the control server over them,
/// and the background sweep task driving the liveness machinery.
pub struct Daemon {
    config: Config,
    fib: Arc<RwLock<FibTable>>,
    engine: Arc<RwLock<RuleEngine>>,
    clock: Clock,
    control_server: ControlServer,
    packet_handler: Option<Arc<PacketHandler>>,
    sweep_task: Option<JoinHandle<()>>,
    drain_task: Option<JoinHandle<()>>,
    running: bool,
}

impl Daemon {
    pub fn new(config: Config) -> Self {
        let fib = Arc::new(RwLock::new(FibTable::new()));
        let engine = Arc::new(RwLock::new(RuleEngine::new(config.default_action)));
        let clock = Clock::new();
        let control_server = ControlServer::new(
            PathBuf::from(&config.daemon.control_socket),
            fib.clone(),
            clock.clone(),
        );
        Self {
            config,
            fib,
            engine,
            clock,
            control_server,
            packet_handler: None,
            sweep_task: None,
            drain_task: None,
            running: false,
        }
    }

    pub fn fib(&self) -> Arc<RwLock<FibTable>> {
        self.fib.clone()
    }

    pub fn engine(&self) -> Arc<RwLock<RuleEngine>> {
        self.engine.clone()
    }

    pub fn packet_handler(&self) -> Option<Arc<PacketHandler>> {
        self.packet_handler.clone()
    }

    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.running {
            return Ok(());
        }
        info!("Starting ndngate daemon");

        self.write_pid_file()?;
        self.seed_routes().await;
        self.seed_rules().await;
        self.apply_status_seed().await;

        let (handler, deferred_rx) = PacketHandler::new(self.fib.clone(), Some(self.engine.clone()));
        self.packet_handler = Some(Arc::new(handler));
        self.drain_task = Some(tokio::spawn(drain_deferred(deferred_rx)));

        self.control_server.start().await?;
        self.sweep_task = Some(self.spawn_sweep_task());

        self.running = true;
        info!("ndngate daemon started");
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if !self.running {
            return Ok(());
        }
        info!("Stopping ndngate daemon");

        if let Some(task) = self.sweep_task.take() {
            task.abort();
        }
        self.control_server.stop().await?;
        self.packet_handler = None;
        if let Some(task) = self.drain_task.take() {
            task.abort();
        }

        let pid_file = &self.config.daemon.pid_file;
        if std::path::Path::new(pid_file).exists() {
            if let Err(e) = std::fs::remove_file(pid_file) {
                warn!("Failed to remove PID file {}: {}", pid_file, e);
            }
        }

        self.running = false;
        info!("ndngate daemon stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn write_pid_file(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let pid = std::process::id();
        std::fs::write(&self.config.daemon.pid_file, pid.to_string())?;
        info!("PID {} written to {}", pid, self.config.daemon.pid_file);
        Ok(())
    }

    /// Install configured routes. A bad prefix skips that route, never the
    /// whole set.
    async fn seed_routes(&self) {
        let now = self.clock.now_us();
        let mut table = self.fib.write().await;
        for route in &self.config.routes {
            let name = match Name::from_uri(&route.prefix) {
                Ok(name) => name,
                Err(e) => {
                    warn!("Skipping route with bad prefix {:?}: {}", route.prefix, e);
                    continue;
                }
            };
            table.insert(name.clone(), route.priority, now);
            for face_id in &route.faces {
                if let Err(e) = table.add_face(&name, *face_id, now) {
                    warn!("Skipping face {} on {}: {}", face_id, name, e);
                }
            }
            if let Some(status) = route.status {
                if let Err(e) = table.set_status(&name, status, now) {
                    warn!("Failed to set status on {}: {}", name, e);
                }
            }
            info!("Seeded route {} with {} faces", name, route.faces.len());
        }
    }

    async fn seed_rules(&self) {
        let mut engine = self.engine.write().await;
        for (index, rule_config) in self.config.rules.iter().enumerate() {
            match rule_config.to_rule() {
                Ok(rule) => match engine.add_rule(rule) {
                    Ok(id) => info!("Installed packet control rule {}", id),
                    Err(e) => warn!("Skipping rule {}: {}", index, e),
                },
                Err(e) => warn!("Skipping malformed rule {}: {}", index, e),
            }
        }
    }

    async fn apply_status_seed(&self) {
        let Some(path) = &self.config.daemon.fib_status_file else {
            return;
        };
        let now = self.clock.now_us();
        let mut table = self.fib.write().await;
        match apply_seed_file(&mut table, path, now) {
            Ok(applied) => info!("Applied {} FIB status overrides from {}", applied, path),
            Err(e) => warn!("Could not read FIB status file {}: {}", path, e),
        }
    }

    fn spawn_sweep_task(&self) -> JoinHandle<()> {
        let fib = self.fib.clone();
        let clock = self.clock.clone();
        let tick_secs = self.config.sweep.tick_secs.max(1);
        let mut sweeper = Sweeper::new(self.config.sweep.to_sweep_config());

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(tick_secs));
            // the first tick of tokio's interval fires immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let now = clock.now_us();
                let outcome = {
                    let mut table = fib.write().await;
                    sweeper.tick(&mut table, now)
                };
                if let Some(demoted) = outcome.demoted {
                    if demoted > 0 {
                        info!("Sweep demoted {} stale entries", demoted);
                    }
                }
                if let Some(removed) = outcome.removed {
                    if removed > 0 {
                        info!("Sweep removed {} inactive entries", removed);
                    }
                }
            }
        })
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        if self.running {
            error!("Daemon dropped while running; sweep task aborted");
            if let Some(task) = self.sweep_task.take() {
                task.abort();
            }
        }
    }
}

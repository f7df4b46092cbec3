use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use ndngate_core::{Clock, ControlRequest, ControlResponse, Name};
use ndngate_engine::FibTable;

use crate::service::Service;

/// Largest well-formed request: 4-byte header, maximum name, trailing
/// face id. Anything longer is rejected without buffering the rest.
const MAX_REQUEST_LEN: usize = 4 + u16::MAX as usize + 2;

/// Unix-socket control server speaking the binary control protocol, one
/// request per connection.
pub struct ControlServer {
    socket_path: PathBuf,
    fib: Arc<RwLock<FibTable>>,
    clock: Clock,
    running: Arc<RwLock<bool>>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl ControlServer {
    pub fn new(socket_path: PathBuf, fib: Arc<RwLock<FibTable>>, clock: Clock) -> Self {
        Self {
            socket_path,
            fib,
            clock,
            running: Arc::new(RwLock::new(false)),
            accept_task: Mutex::new(None),
        }
    }

    async fn handle_connection(stream: &mut UnixStream, fib: &Arc<RwLock<FibTable>>, clock: &Clock) {
        let mut request = Vec::new();
        let mut limited = (&mut *stream).take(MAX_REQUEST_LEN as u64 + 1);
        if let Err(e) = limited.read_to_end(&mut request).await {
            warn!("Control connection read failed: {}", e);
            return;
        }

        let response = if request.len() > MAX_REQUEST_LEN {
            warn!("Control request exceeds {} bytes, rejected", MAX_REQUEST_LEN);
            ControlResponse::Failure.encode()
        } else {
            handle_request(fib, clock, &request).await
        };
        if let Err(e) = stream.write_all(&response).await {
            warn!("Control connection write failed: {}", e);
        }
    }
}

/// Apply one control request to the table and produce the response bytes.
/// A malformed request is rejected with a failure byte before any field
/// is acted on; it never partially applies.
pub async fn handle_request(fib: &Arc<RwLock<FibTable>>, clock: &Clock, data: &[u8]) -> Vec<u8> {
    let request = match ControlRequest::decode(data) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected control request: {}", e);
            return ControlResponse::Failure.encode();
        }
    };
    debug!("Control request: {:?}", request);

    let response = match request {
        ControlRequest::SetStatus { name, status } => match Name::from_wire(&name) {
            Ok(name) => {
                let now = clock.now_us();
                match fib.write().await.set_status(&name, status, now) {
                    Ok(()) => ControlResponse::Ok,
                    Err(e) => {
                        warn!("Control set-status failed: {}", e);
                        ControlResponse::Failure
                    }
                }
            }
            Err(e) => {
                warn!("Control set-status with bad name: {}", e);
                ControlResponse::Failure
            }
        },
        ControlRequest::GetStatus { name } => match Name::from_wire(&name) {
            Ok(name) => ControlResponse::Status(fib.read().await.get_status(&name)),
            Err(e) => {
                warn!("Control get-status with bad name: {}", e);
                ControlResponse::Failure
            }
        },
        ControlRequest::Statistics => {
            let stats = fib.read().await.statistics();
            ControlResponse::Statistics {
                active: stats.active as u32,
                inactive: stats.inactive as u32,
                suspended: stats.suspended as u32,
            }
        }
        ControlRequest::Cleanup => {
            let removed = fib.write().await.cleanup_inactive();
            info!("Control cleanup removed {} entries", removed);
            ControlResponse::Ok
        }
        ControlRequest::SetFaceStatus {
            name,
            face_id,
            status,
        } => match Name::from_wire(&name) {
            Ok(name) => {
                let now = clock.now_us();
                match fib
                    .write()
                    .await
                    .set_face_status(&name, face_id as u32, status, now)
                {
                    Ok(()) => ControlResponse::Ok,
                    Err(e) => {
                        warn!("Control set-face-status failed: {}", e);
                        ControlResponse::Failure
                    }
                }
            }
            Err(e) => {
                warn!("Control set-face-status with bad name: {}", e);
                ControlResponse::Failure
            }
        },
    };

    response.encode()
}

#[async_trait]
impl Service for ControlServer {
    async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // a stale socket from a previous run would fail the bind
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }
        let listener = UnixListener::bind(&self.socket_path)?;
        info!("Control server listening on {}", self.socket_path.display());

        *self.running.write().await = true;

        let fib = self.fib.clone();
        let clock = self.clock.clone();
        let task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((mut stream, _)) => {
                        let fib = fib.clone();
                        let clock = clock.clone();
                        tokio::spawn(async move {
                            ControlServer::handle_connection(&mut stream, &fib, &clock).await;
                        });
                    }
                    Err(e) => {
                        error!("Control server accept failed: {}", e);
                        break;
                    }
                }
            }
        });
        *self.accept_task.lock().await = Some(task);

        Ok(())
    }

    async fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        *self.running.write().await = false;
        // the accept loop parks inside accept(); abort it and reap the
        // task so the listener fd is closed before the socket file goes
        if let Some(task) = self.accept_task.lock().await.take() {
            task.abort();
            let _ = task.await;
        }
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }
        info!("Control server stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "ControlServer"
    }

    fn is_running(&self) -> bool {
        self.running.try_read().map(|r| *r).unwrap_or(false)
    }
}

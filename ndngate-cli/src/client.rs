use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::debug;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

use ndngate_core::{ControlRequest, ControlResponse, EntryStatus, FaceStatus, Name};

/// FIB statistics as reported by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FibCounts {
    pub active: u32,
    pub inactive: u32,
    pub suspended: u32,
}

/// Client for the daemon's Unix-socket control protocol. Each request uses
/// a fresh connection; the write half is shut down to mark end of request.
pub struct ControlClient {
    socket_path: PathBuf,
}

impl ControlClient {
    pub fn new<P: Into<PathBuf>>(socket_path: P) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    async fn request(&self, request: &ControlRequest) -> Result<Vec<u8>> {
        let mut stream = UnixStream::connect(&self.socket_path)
            .await
            .with_context(|| {
                format!(
                    "cannot connect to daemon at {} (is ndngated running?)",
                    self.socket_path.display()
                )
            })?;

        let encoded = request.encode();
        debug!("Sending {} byte control request", encoded.len());
        stream.write_all(&encoded).await?;
        stream.shutdown().await?;

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await?;
        if response.is_empty() {
            bail!("daemon closed the connection without a response");
        }
        Ok(response)
    }

    async fn expect_ok(&self, request: &ControlRequest) -> Result<()> {
        let response = self.request(request).await?;
        match ControlResponse::decode(request.operation(), &response)? {
            ControlResponse::Ok => Ok(()),
            ControlResponse::Failure => bail!("daemon rejected the request"),
            other => bail!("unexpected response: {:?}", other),
        }
    }

    pub async fn set_status(&self, name: &Name, status: EntryStatus) -> Result<()> {
        self.expect_ok(&ControlRequest::SetStatus {
            name: name.to_wire(),
            status,
        })
        .await
    }

    pub async fn get_status(&self, name: &Name) -> Result<EntryStatus> {
        let request = ControlRequest::GetStatus {
            name: name.to_wire(),
        };
        let response = self.request(&request).await?;
        match ControlResponse::decode(request.operation(), &response)? {
            ControlResponse::Status(status) => Ok(status),
            ControlResponse::Failure => bail!("daemon rejected the request"),
            other => bail!("unexpected response: {:?}", other),
        }
    }

    pub async fn statistics(&self) -> Result<FibCounts> {
        let request = ControlRequest::Statistics;
        let response = self.request(&request).await?;
        match ControlResponse::decode(request.operation(), &response)? {
            ControlResponse::Statistics {
                active,
                inactive,
                suspended,
            } => Ok(FibCounts {
                active,
                inactive,
                suspended,
            }),
            ControlResponse::Failure => bail!("daemon rejected the request"),
            other => bail!("unexpected response: {:?}", other),
        }
    }

    pub async fn cleanup(&self) -> Result<()> {
        self.expect_ok(&ControlRequest::Cleanup).await
    }

    pub async fn set_face_status(
        &self,
        name: &Name,
        face_id: u16,
        status: FaceStatus,
    ) -> Result<()> {
        self.expect_ok(&ControlRequest::SetFaceStatus {
            name: name.to_wire(),
            face_id,
            status,
        })
        .await
    }
}

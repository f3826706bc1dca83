//! # Plug Commands
//!
//! JSON command documents understood by the plug and the client that
//! delivers them.
//!
//! ## Example
//!
//! ```ignore
//! let client = CommandClient::new("192.168.1.11:9999");
//! client.execute(&RelayCommand::new(true), false).await?;
//! let info = client.sysinfo().await?;
//! ```

use crate::error::{Result, TasmotaError};
use crate::protocol::{read_frame, write_frame};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, instrument};

/// Connect, write and read are each bounded by this by default.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Command documents
// ============================================================================

/// `{"system":{"set_relay_state":{"state":0|1}}}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayCommand {
    pub system: RelaySystem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySystem {
    #[serde(rename = "set_relay_state")]
    pub relay_state: RelayState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayState {
    pub state: u8,
}

impl RelayCommand {
    pub fn new(on: bool) -> Self {
        Self {
            system: RelaySystem {
                relay_state: RelayState { state: on as u8 },
            },
        }
    }

    pub fn is_on(&self) -> bool {
        self.system.relay_state.state != 0
    }
}

/// `{"system":{"get_sysinfo":{}}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SysinfoQuery {
    system: SysinfoQuerySystem,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct SysinfoQuerySystem {
    get_sysinfo: Empty,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct Empty {}

/// Response to a [`SysinfoQuery`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Plug {
    #[serde(default)]
    pub system: PlugSystem,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlugSystem {
    #[serde(rename = "get_sysinfo", default)]
    pub sysinfo: Sysinfo,
}

/// Device information reported by the plug. Fields the firmware omits stay
/// at their defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Sysinfo {
    pub sw_ver: String,
    pub hw_ver: String,
    pub model: String,
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(rename = "hwId")]
    pub hw_id: String,
    pub alias: String,
    pub dev_name: String,
    pub mac: String,
    pub relay_state: u8,
    /// Seconds the relay has been on
    pub on_time: u64,
    pub led_off: u8,
    pub rssi: i64,
    pub err_code: i64,
}

impl Sysinfo {
    pub fn is_on(&self) -> bool {
        self.relay_state != 0
    }
}

// ============================================================================
// Transport
// ============================================================================

/// A bidirectional byte stream to a plug.
pub trait Connection: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> Connection for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// Opens connections to plugs.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, address: &str, timeout: Duration) -> Result<Box<dyn Connection>>;
}

/// Plain TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, address: &str, timeout: Duration) -> Result<Box<dyn Connection>> {
        let stream = bounded(address, timeout, async {
            TcpStream::connect(address)
                .await
                .map_err(|source| TasmotaError::Connect {
                    address: address.to_string(),
                    source,
                })
        })
        .await?;
        stream.set_nodelay(true)?;
        Ok(Box::new(stream))
    }
}

async fn bounded<T, F>(address: &str, timeout: Duration, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(timeout, operation)
        .await
        .map_err(|_| TasmotaError::Timeout {
            address: address.to_string(),
            timeout,
        })?
}

// ============================================================================
// Client
// ============================================================================

/// Sends commands to one plug, opening a fresh connection per command.
#[derive(Clone)]
pub struct CommandClient {
    address: String,
    connector: Arc<dyn Connector>,
    timeout: Duration,
}

impl CommandClient {
    /// Client connecting over TCP.
    pub fn new(address: impl Into<String>) -> Self {
        Self::with_connector(address, Arc::new(TcpConnector))
    }

    pub fn with_connector(address: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
        Self {
            address: address.into(),
            connector,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send `command`. With `read_response`, wait for the reply and return
    /// its decrypted payload.
    #[instrument(skip(self, command), fields(address = %self.address))]
    pub async fn execute<C>(&self, command: &C, read_response: bool) -> Result<Option<Vec<u8>>>
    where
        C: Serialize + Sync + ?Sized,
    {
        let payload = serde_json::to_vec(command)?;
        let mut conn = self.connector.connect(&self.address, self.timeout).await?;

        bounded(&self.address, self.timeout, write_frame(&mut conn, &payload)).await?;
        debug!(bytes = payload.len(), "Command sent");

        if !read_response {
            return Ok(None);
        }

        let response = bounded(&self.address, self.timeout, read_frame(&mut conn)).await?;
        debug!(bytes = response.len(), "Response received");
        Ok(Some(response))
    }

    /// Switch the relay.
    pub async fn set_relay(&self, on: bool) -> Result<()> {
        self.execute(&RelayCommand::new(on), false).await?;
        Ok(())
    }

    /// Query device information.
    pub async fn sysinfo(&self) -> Result<Sysinfo> {
        let response = self
            .execute(&SysinfoQuery::default(), true)
            .await?
            .ok_or_else(|| TasmotaError::Protocol("missing sysinfo response".to_string()))?;
        let plug: Plug = serde_json::from_slice(&response)?;
        Ok(plug.system.sysinfo)
    }
}

impl fmt::Debug for CommandClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandClient")
            .field("address", &self.address)
            .field("timeout", &self.timeout)
            .finish()
    }
}

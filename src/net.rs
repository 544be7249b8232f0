//! Wifi link control through `nmcli`.
//!
//! The daemon usually runs on a small board whose wifi occasionally drops;
//! NetworkManager is the system of record, so probing and reconnecting
//! both shell out to `nmcli` rather than talking netlink directly.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{error, info};

/// Probe and repair the network link the feeds depend on.
#[async_trait]
pub trait ConnectivityLink: Send + Sync {
    /// `true` when the link is up. Probe failures count as down.
    async fn probe(&self) -> bool;
    /// One reconnection attempt.
    async fn reconnect(&self) -> Result<()>;
}

pub struct NmcliLink {
    connection: String,
}

impl NmcliLink {
    /// Resolve the active wifi connection to watch. Fails when the machine
    /// has none, which callers should treat as "watchdog disabled", not as
    /// a reason to exit.
    pub async fn discover() -> Result<Self> {
        let out = Command::new("nmcli")
            .args(["--get-values", "name,device,type", "con", "show", "--active"])
            .output()
            .await
            .context("running nmcli con show")?;
        if !out.status.success() {
            bail!("nmcli con show exited with {}", out.status);
        }

        let text = String::from_utf8_lossy(&out.stdout);
        for line in text.lines() {
            let mut parts = line.splitn(3, ':');
            let (Some(name), Some(device), Some(kind)) =
                (parts.next(), parts.next(), parts.next())
            else {
                continue;
            };
            if device.starts_with("wlan") && kind.contains("wireless") {
                info!(connection = name, "watching wifi connection");
                return Ok(Self {
                    connection: name.to_string(),
                });
            }
        }
        bail!("no active wifi connection found")
    }

    #[cfg(test)]
    fn for_connection(name: &str) -> Self {
        Self {
            connection: name.to_string(),
        }
    }
}

#[async_trait]
impl ConnectivityLink for NmcliLink {
    async fn probe(&self) -> bool {
        let out = match Command::new("nmcli")
            .args(["--get-values", "connection,state", "device"])
            .output()
            .await
        {
            Ok(out) if out.status.success() => out,
            Ok(out) => {
                error!(status = %out.status, "nmcli device query failed");
                return false;
            }
            Err(e) => {
                error!(error = %e, "nmcli device query failed");
                return false;
            }
        };

        let text = String::from_utf8_lossy(&out.stdout);
        device_connected(&text, &self.connection)
    }

    async fn reconnect(&self) -> Result<()> {
        let status = Command::new("sudo")
            .args(["nmcli", "connection", "up", &self.connection])
            .status()
            .await
            .context("running nmcli connection up")?;
        if !status.success() {
            bail!("nmcli connection up exited with {status}");
        }
        info!(connection = %self.connection, "restarted wifi connection");
        Ok(())
    }
}

/// Scan `nmcli --get-values connection,state device` output for the named
/// connection in `connected` state.
fn device_connected(nmcli_output: &str, connection: &str) -> bool {
    nmcli_output.lines().any(|line| {
        let mut parts = line.splitn(2, ':');
        matches!(
            (parts.next(), parts.next()),
            (Some(name), Some(state)) if name == connection && state == "connected"
        )
    })
}

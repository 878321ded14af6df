use std::net::UdpSocket;

use reqwest::Client;
use tracing::warn;

use crate::domain::{Error, Result};

/// Work out the address other processes should use to reach this instance.
///
/// A configured override wins. With `use_public_ip` the address comes from an
/// external IP-lookup service; on lookup failure we fall back to local
/// discovery rather than aborting startup.
pub async fn resolve_address(
    client: &Client,
    override_host: Option<&str>,
    use_public_ip: bool,
    ip_service_url: &str,
) -> String {
    if use_public_ip {
        match public_address(client, ip_service_url).await {
            Ok(address) => return address,
            Err(e) => warn!(error = %e, "public ip lookup failed, using local discovery"),
        }
    }

    if let Some(host) = override_host.filter(|h| !h.is_empty()) {
        return host.to_string();
    }

    local_address().unwrap_or_else(|| "127.0.0.1".to_string())
}

async fn public_address(client: &Client, url: &str) -> Result<String> {
    let transport_error = |detail: String| Error::RemoteCollectionFailed {
        url: url.to_string(),
        detail,
    };

    let body = client
        .get(url)
        .send()
        .await
        .map_err(|e| transport_error(e.to_string()))?
        .error_for_status()
        .map_err(|e| transport_error(e.to_string()))?
        .text()
        .await
        .map_err(|e| transport_error(e.to_string()))?;

    let address = body.trim().to_string();
    if address.is_empty() {
        return Err(transport_error("empty response".to_string()));
    }
    Ok(address)
}

// Routing-table probe: connecting a UDP socket sends no packets but picks
// the interface the kernel would route through.
fn local_address() -> Option<String> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    socket.local_addr().ok().map(|addr| addr.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_override_host_wins_without_public_ip() {
        let client = Client::new();
        let address =
            resolve_address(&client, Some("orders.internal"), false, "http://unused").await;
        assert_eq!(address, "orders.internal");
    }

    #[tokio::test]
    async fn test_empty_override_falls_through_to_discovery() {
        let client = Client::new();
        let address = resolve_address(&client, Some(""), false, "http://unused").await;
        assert!(!address.is_empty());
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! SSRF protection — validates outbound webhook URLs against RFC-1918,
//! loopback, and link-local ranges.
//!
//! Called at config-load time, never per-request: resolution is
//! synchronous and blocking, which is only acceptable because this runs
//! once during startup/reload, not on a request hot path.

#![cfg(feature = "std")]

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, ToSocketAddrs};

/// Networks that must never be targets of outbound HTTP calls.
fn blocked_networks() -> &'static [(IpAddr, u8)] {
    &[
        (IpAddr::V4(Ipv4Addr::new(10, 0, 0, 0)), 8),
        (IpAddr::V4(Ipv4Addr::new(172, 16, 0, 0)), 12),
        (IpAddr::V4(Ipv4Addr::new(192, 168, 0, 0)), 16),
        (IpAddr::V4(Ipv4Addr::new(127, 0, 0, 0)), 8),
        (IpAddr::V4(Ipv4Addr::new(169, 254, 0, 0)), 16),
        (IpAddr::V6(Ipv6Addr::LOCALHOST), 128),
        (IpAddr::V6(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0)), 10),
        (IpAddr::V6(Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0)), 7),
    ]
}

fn ipv4_in_network(addr: Ipv4Addr, network: Ipv4Addr, prefix: u8) -> bool {
    let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - prefix) };
    (u32::from(addr) & mask) == (u32::from(network) & mask)
}

fn ipv6_in_network(addr: Ipv6Addr, network: Ipv6Addr, prefix: u8) -> bool {
    let mask = if prefix == 0 { 0u128 } else { u128::MAX << (128 - prefix) };
    (u128::from(addr) & mask) == (u128::from(network) & mask)
}

fn is_blocked(ip: IpAddr) -> Option<(IpAddr, u8)> {
    for &(network, prefix) in blocked_networks() {
        let matched = match (ip, network) {
            (IpAddr::V4(addr), IpAddr::V4(net)) => ipv4_in_network(addr, net, prefix),
            (IpAddr::V6(addr), IpAddr::V6(net)) => ipv6_in_network(addr, net, prefix),
            _ => false,
        };
        if matched {
            return Some((network, prefix));
        }
    }
    None
}

/// Errors from [`validate_webhook_url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlSafetyError {
    /// Scheme was not `https`.
    NotHttps(String),
    /// URL has no hostname component.
    MissingHostname,
    /// Hostname could not be resolved to an address.
    ResolutionFailed(String),
    /// The resolved address falls in a blocked network.
    BlockedAddress { address: String, network: String },
}

impl core::fmt::Display for UrlSafetyError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UrlSafetyError::NotHttps(scheme) => {
                write!(f, "webhook URL must use HTTPS, got {scheme}://")
            }
            UrlSafetyError::MissingHostname => write!(f, "webhook URL has no hostname"),
            UrlSafetyError::ResolutionFailed(hostname) => {
                write!(f, "cannot resolve hostname '{hostname}'")
            }
            UrlSafetyError::BlockedAddress { address, network } => write!(
                f,
                "webhook URL resolves to blocked address {address} (in {network})"
            ),
        }
    }
}

impl std::error::Error for UrlSafetyError {}

/// Validate that a webhook URL is safe for outbound requests.
///
/// Checks, in order:
/// 1. Scheme must be `https`.
/// 2. A hostname must be present.
/// 3. The hostname must resolve, and every resolved address must fall
///    outside all [`blocked_networks`].
///
/// All resolved addresses are checked, not just the first — a hostname
/// with both a public and a private A record is still rejected.
pub fn validate_webhook_url(url: &str) -> Result<(), UrlSafetyError> {
    let parsed = url::Url::parse(url).map_err(|_| UrlSafetyError::MissingHostname)?;

    if parsed.scheme() != "https" {
        return Err(UrlSafetyError::NotHttps(parsed.scheme().to_string()));
    }

    let hostname = parsed.host_str().ok_or(UrlSafetyError::MissingHostname)?;
    if hostname.is_empty() {
        return Err(UrlSafetyError::MissingHostname);
    }

    let port = parsed.port_or_known_default().unwrap_or(443);
    let addrs = (hostname, port)
        .to_socket_addrs()
        .map_err(|_| UrlSafetyError::ResolutionFailed(hostname.to_string()))?;

    let mut resolved_any = false;
    for socket_addr in addrs {
        resolved_any = true;
        let ip = socket_addr.ip();
        if let Some((network, prefix)) = is_blocked(ip) {
            return Err(UrlSafetyError::BlockedAddress {
                address: ip.to_string(),
                network: format!("{network}/{prefix}"),
            });
        }
    }

    if !resolved_any {
        return Err(UrlSafetyError::ResolutionFailed(hostname.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_https_scheme() {
        let result = validate_webhook_url("http://example.com/hook");
        assert!(matches!(result, Err(UrlSafetyError::NotHttps(scheme)) if scheme == "http"));
    }

    #[test]
    fn rejects_blocked_literal_address() {
        let result = validate_webhook_url("https://127.0.0.1/hook");
        assert!(matches!(result, Err(UrlSafetyError::BlockedAddress { .. })));
    }

    #[test]
    fn rejects_private_range_literal() {
        let result = validate_webhook_url("https://10.1.2.3/hook");
        assert!(matches!(result, Err(UrlSafetyError::BlockedAddress { .. })));
    }

    #[test]
    fn rejects_link_local_metadata_address() {
        let result = validate_webhook_url("https://169.254.169.254/latest/meta-data");
        assert!(matches!(result, Err(UrlSafetyError::BlockedAddress { .. })));
    }

    #[test]
    fn ipv4_network_membership_respects_prefix() {
        let inside = Ipv4Addr::new(172, 31, 255, 254);
        let outside = Ipv4Addr::new(172, 32, 0, 1);
        assert!(ipv4_in_network(inside, Ipv4Addr::new(172, 16, 0, 0), 12));
        assert!(!ipv4_in_network(outside, Ipv4Addr::new(172, 16, 0, 0), 12));
    }

    #[test]
    fn ipv6_loopback_is_blocked() {
        assert!(is_blocked(IpAddr::V6(Ipv6Addr::LOCALHOST)).is_some());
    }
}

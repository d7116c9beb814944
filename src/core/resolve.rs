//! Best-effort DNS resolution of the pool host.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time;

/// Looks up the pool host before the config is rendered.
///
/// A failed lookup is not fatal: the supervisor keeps the hostname in
/// `$url$` and publishes `HostResolutionFailed`.
#[async_trait]
pub trait HostResolver: Send + Sync + 'static {
    /// Returns the address `$url$` should point at for `host`.
    async fn resolve(&self, host: &str) -> Result<IpAddr, String>;
}

/// [`HostResolver`] backed by the system resolver; takes the first address.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> Result<IpAddr, String> {
        tokio::net::lookup_host((host, 0))
            .await
            .map_err(|e| e.to_string())?
            .next()
            .map(|addr| addr.ip())
            .ok_or_else(|| format!("no address for {host}"))
    }
}

/// Runs `resolver` for `host`, giving up after `deadline`.
pub(crate) async fn resolve_within(
    resolver: &dyn HostResolver,
    host: &str,
    deadline: Option<Duration>,
) -> Result<IpAddr, String> {
    match deadline {
        Some(limit) => time::timeout(limit, resolver.resolve(host))
            .await
            .map_err(|_| format!("lookup of {host} timed out after {limit:?}"))?,
        None => resolver.resolve(host).await,
    }
}

/// `$url$` value for a resolved address.
pub(crate) fn resolved_url(ip: IpAddr, port: Option<&str>) -> String {
    match (ip, port) {
        (IpAddr::V6(v6), Some(port)) => format!("[{v6}]:{port}"),
        (ip, Some(port)) => format!("{ip}:{port}"),
        (ip, None) => ip.to_string(),
    }
}

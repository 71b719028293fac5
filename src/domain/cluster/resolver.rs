use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use crate::domain::cluster::topology::ClusterTopology;
use crate::error::{Error, Result};

/// Resolves a node name into its network addresses.
#[async_trait]
pub trait NameResolver: Send + Sync + std::fmt::Debug {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the system resolver (`/etc/hosts`, DNS).
#[derive(Debug, Clone, Copy, Default)]
pub struct DnsResolver;

#[async_trait]
impl NameResolver for DnsResolver {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let mut ips: Vec<IpAddr> = Vec::new();

        for addr in tokio::net::lookup_host((host, 0)).await? {
            if !ips.contains(&addr.ip()) {
                ips.push(addr.ip());
            }
        }

        Ok(ips)
    }
}

/// Fixed host table. Used for clusters without name service and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    entries: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        StaticResolver { entries: HashMap::new() }
    }

    /// Assigns consecutive IPv4 addresses, starting at `base`, to every node of the topology.
    pub fn for_topology(topology: &ClusterTopology, base: Ipv4Addr) -> Self {
        let mut resolver = StaticResolver::new();
        let base = u32::from(base);

        for index in 0..topology.node_count() {
            let addr = Ipv4Addr::from(base.wrapping_add(index as u32));
            resolver.insert(topology.node_name(index), vec![IpAddr::V4(addr)]);
        }

        resolver
    }

    pub fn insert(&mut self, host: impl Into<String>, ips: Vec<IpAddr>) {
        self.entries.insert(host.into(), ips);
    }

    pub fn remove(&mut self, host: &str) -> Option<Vec<IpAddr>> {
        self.entries.remove(host)
    }
}

#[async_trait]
impl NameResolver for StaticResolver {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        match self.entries.get(host) {
            Some(ips) => Ok(ips.clone()),
            None => Err(io::Error::new(io::ErrorKind::NotFound, format!("no address known for {}", host))),
        }
    }
}

/// Bounds the time a single host lookup may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverPolicy {
    /// Timeout of one attempt.
    pub timeout: Duration,

    /// Additional attempts after the first one failed.
    pub retries: u32,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        ResolverPolicy { timeout: Duration::from_secs(2), retries: 2 }
    }
}

/// Looks up `host`, retrying failed or timed out attempts according to `policy`.
///
/// An empty answer counts as a failed attempt.
pub async fn resolve_with_retry(resolver: &dyn NameResolver, host: &str, policy: ResolverPolicy) -> Result<Vec<IpAddr>> {
    let attempts = policy.retries + 1;
    let mut reason = String::new();

    for attempt in 1..=attempts {
        reason = match tokio::time::timeout(policy.timeout, resolver.lookup(host)).await {
            Ok(Ok(ips)) if !ips.is_empty() => return Ok(ips),
            Ok(Ok(_)) => "no addresses returned".to_string(),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {} ms", policy.timeout.as_millis()),
        };

        log::warn!("Lookup of {} failed (attempt {}/{}): {}", host, attempt, attempts, reason);
    }

    Err(Error::ExternalLookupFailure { host: host.to_string(), reason })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct SlowResolver;

    #[async_trait]
    impl NameResolver for SlowResolver {
        async fn lookup(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)])
        }
    }

    #[tokio::test]
    async fn test_static_resolver_for_topology() {
        let topology = ClusterTopology::new("kn", 1, 4, 0).unwrap();
        let resolver = StaticResolver::for_topology(&topology, Ipv4Addr::new(10, 0, 0, 1));

        let ips = resolver.lookup("kn4").await.unwrap();
        assert_eq!(ips, vec![IpAddr::V4(Ipv4Addr::new(10, 0, 0, 4))]);
        assert!(resolver.lookup("kn5").await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_host_fails_after_retries() {
        let resolver = StaticResolver::new();
        let policy = ResolverPolicy { timeout: Duration::from_millis(50), retries: 1 };

        let result = resolve_with_retry(&resolver, "kn1", policy).await;
        assert!(matches!(result, Err(Error::ExternalLookupFailure { ref host, .. }) if host == "kn1"));
    }

    #[tokio::test]
    async fn test_slow_lookup_times_out() {
        let policy = ResolverPolicy { timeout: Duration::from_millis(20), retries: 0 };

        let result = resolve_with_retry(&SlowResolver, "kn1", policy).await;
        match result {
            Err(Error::ExternalLookupFailure { reason, .. }) => assert!(reason.contains("timed out")),
            other => panic!("expected a lookup failure, got {:?}", other),
        }
    }
}

use futures::future::join_all;
use std::net::IpAddr;

use crate::domain::cluster::resolver::{NameResolver, ResolverPolicy, resolve_with_retry};
use crate::error::Result;

/// PXE boot identifier of an address: the IPv4 octets as upper case hex (`10.0.0.1` -> `0A000001`).
///
/// IPv6 addresses have no such identifier, unless they are IPv4-mapped.
pub fn to_pxe(ip: &IpAddr) -> Option<String> {
    let v4 = match ip {
        IpAddr::V4(v4) => *v4,
        IpAddr::V6(v6) => v6.to_ipv4_mapped()?,
    };

    let [a, b, c, d] = v4.octets();
    Some(format!("{:02X}{:02X}{:02X}{:02X}", a, b, c, d))
}

/// Resolves every host concurrently and derives one PXE name per resolved IPv4 address.
///
/// Names are returned in host order. The first failing lookup fails the whole derivation.
pub async fn derive_pxe_names(resolver: &dyn NameResolver, hosts: &[String], policy: ResolverPolicy) -> Result<Vec<String>> {
    let lookups = hosts.iter().map(|host| resolve_with_retry(resolver, host, policy));
    let answers = join_all(lookups).await;

    let mut pxe_names = Vec::new();

    for (host, answer) in hosts.iter().zip(answers) {
        for ip in answer? {
            match to_pxe(&ip) {
                Some(name) => pxe_names.push(name),
                None => log::warn!("Skipping address {} of {}: no PXE name for IPv6 addresses.", ip, host),
            }
        }
    }

    Ok(pxe_names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cluster::resolver::StaticResolver;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_to_pxe() {
        assert_eq!(to_pxe(&IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10))).unwrap(), "C0A8010A");
        assert_eq!(to_pxe(&IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))).unwrap(), "0A000001");
        assert_eq!(to_pxe(&IpAddr::V6(Ipv4Addr::new(10, 0, 0, 2).to_ipv6_mapped())).unwrap(), "0A000002");
        assert!(to_pxe(&IpAddr::V6(Ipv6Addr::LOCALHOST)).is_none());
    }

    #[tokio::test]
    async fn test_one_name_per_address_in_host_order() {
        let mut resolver = StaticResolver::new();
        resolver.insert("kn2", vec![IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)), IpAddr::V6(Ipv6Addr::LOCALHOST)]);
        resolver.insert("kn1", vec![IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), IpAddr::V4(Ipv4Addr::new(10, 1, 0, 1))]);

        let hosts = vec!["kn1".to_string(), "kn2".to_string()];
        let names = derive_pxe_names(&resolver, &hosts, ResolverPolicy::default()).await.unwrap();
        assert_eq!(names, vec!["0A000001", "0A010001", "0A000002"]);
    }
}

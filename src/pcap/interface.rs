use crate::dns::Client;
use log::debug;
use pcap::Device;
use std::net::IpAddr;

/// Identity of the monitoring host as seen through `device`.
pub fn local_client(device: &Device) -> Client {
    let hostname = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string());

    let ip = primary_ipv4(device.addresses.iter().map(|a| a.addr));
    let mac = hardware_address(&device.name);
    debug!("Local client: {hostname} {ip:?} {} {mac:?}", device.name);

    Client::new(hostname, ip, device.name.clone(), mac)
}

/// First non-loopback IPv4 address, falling back to any non-loopback address.
fn primary_ipv4(addrs: impl Iterator<Item = IpAddr>) -> Option<IpAddr> {
    let candidates: Vec<IpAddr> = addrs.filter(|ip| !ip.is_loopback()).collect();
    candidates
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| candidates.first())
        .copied()
}

/// libpcap does not expose link-layer addresses; Linux publishes them in sysfs.
#[cfg(target_os = "linux")]
fn hardware_address(interface: &str) -> Option<String> {
    let path = format!("/sys/class/net/{interface}/address");
    std::fs::read_to_string(path)
        .ok()
        .map(|mac| mac.trim().to_string())
        .filter(|mac| !mac.is_empty())
}

#[cfg(not(target_os = "linux"))]
fn hardware_address(_interface: &str) -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_ipv4_over_ipv6_and_skips_loopback() {
        let addrs: Vec<IpAddr> = vec![
            "127.0.0.1".parse().unwrap(),
            "fe80::1".parse().unwrap(),
            "192.168.1.20".parse().unwrap(),
        ];
        assert_eq!(
            primary_ipv4(addrs.into_iter()),
            Some("192.168.1.20".parse().unwrap())
        );
    }

    #[test]
    fn falls_back_to_ipv6() {
        let addrs: Vec<IpAddr> = vec!["::1".parse().unwrap(), "2001:db8::5".parse().unwrap()];
        assert_eq!(
            primary_ipv4(addrs.into_iter()),
            Some("2001:db8::5".parse().unwrap())
        );
    }
}

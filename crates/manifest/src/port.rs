//! Published port syntax: `[ip:][host:]container[/protocol]`.

use std::fmt;

use crate::error::ManifestError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub host_ip: Option<String>,
    /// `None` when only the container port is given (ephemeral host port).
    pub host: Option<u16>,
    pub container: u16,
    pub protocol: Protocol,
}

fn parse_port(spec: &str, part: &str, what: &str) -> Result<u16, ManifestError> {
    let n: u32 = part
        .trim()
        .parse()
        .map_err(|_| ManifestError::port(spec, format!("{what} port '{part}' is not a number")))?;
    if n == 0 || n > u16::MAX as u32 {
        return Err(ManifestError::port(spec, format!("{what} port {n} is outside 1..=65535")));
    }
    Ok(n as u16)
}

impl PortMapping {
    pub fn parse(spec: &str) -> Result<Self, ManifestError> {
        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(ManifestError::port(spec, "empty"));
        }
        let (body, protocol) = match trimmed.rsplit_once('/') {
            Some((body, "tcp")) => (body, Protocol::Tcp),
            Some((body, "udp")) => (body, Protocol::Udp),
            Some((_, other)) => return Err(ManifestError::port(spec, format!("unknown protocol '{other}'"))),
            None => (trimmed, Protocol::Tcp),
        };
        if body.contains('-') {
            return Err(ManifestError::port(spec, "port ranges are not supported"));
        }

        let parts: Vec<&str> = body.split(':').collect();
        let (host_ip, host, container) = match parts.as_slice() {
            [container] => (None, None, parse_port(spec, container, "container")?),
            [host, container] => (None, Some(parse_port(spec, host, "host")?), parse_port(spec, container, "container")?),
            [ip, host, container] => {
                if ip.trim().is_empty() {
                    return Err(ManifestError::port(spec, "empty host ip"));
                }
                (Some(ip.trim().to_string()), Some(parse_port(spec, host, "host")?), parse_port(spec, container, "container")?)
            }
            _ => return Err(ManifestError::port(spec, "expected host:container")),
        };
        Ok(Self { host_ip, host, container, protocol })
    }

    /// Long syntax: `target`, optional `published`, `host_ip` and `protocol` keys.
    pub fn from_long(
        target: u32,
        published: Option<&str>,
        host_ip: Option<&str>,
        protocol: Option<&str>,
    ) -> Result<Self, ManifestError> {
        let spec = format!("target: {target}");
        let container = parse_port(&spec, &target.to_string(), "container")?;
        let host = match published.map(str::trim) {
            None | Some("") => None,
            Some(p) if p.contains('-') => return Err(ManifestError::port(&spec, "port ranges are not supported")),
            Some(p) => Some(parse_port(&spec, p, "host")?),
        };
        let protocol = match protocol.map(str::trim) {
            None | Some("tcp") => Protocol::Tcp,
            Some("udp") => Protocol::Udp,
            Some(other) => return Err(ManifestError::port(&spec, format!("unknown protocol '{other}'"))),
        };
        let host_ip = host_ip.map(str::trim).filter(|ip| !ip.is_empty()).map(str::to_string);
        Ok(Self { host_ip, host, container, protocol })
    }

    /// Whether the host side listens on every interface.
    pub fn binds_all_interfaces(&self) -> bool {
        matches!(self.host_ip.as_deref(), None | Some("0.0.0.0"))
    }

    pub fn published(host: u16, container: u16) -> Self {
        Self { host_ip: None, host: Some(host), container, protocol: Protocol::Tcp }
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ip) = &self.host_ip {
            write!(f, "{ip}:")?;
        }
        if let Some(host) = self.host {
            write!(f, "{host}:")?;
        }
        write!(f, "{}", self.container)?;
        if self.protocol == Protocol::Udp {
            write!(f, "/udp")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_container_pair() {
        let p = PortMapping::parse("27017:27017").unwrap();
        assert_eq!(p, PortMapping::published(27017, 27017));
        assert_eq!(p.to_string(), "27017:27017");
    }

    #[test]
    fn ip_and_protocol_forms() {
        let p = PortMapping::parse("127.0.0.1:8000:80/udp").unwrap();
        assert_eq!(p.host_ip.as_deref(), Some("127.0.0.1"));
        assert_eq!(p.host, Some(8000));
        assert_eq!(p.container, 80);
        assert_eq!(p.protocol, Protocol::Udp);
        assert_eq!(p.to_string(), "127.0.0.1:8000:80/udp");

        let only = PortMapping::parse("8000").unwrap();
        assert_eq!(only.host, None);
    }

    #[test]
    fn long_syntax_fields() {
        let p = PortMapping::from_long(27017, Some("27017"), None, None).unwrap();
        assert_eq!(p, PortMapping::published(27017, 27017));

        let p = PortMapping::from_long(53, Some("5353"), Some("127.0.0.1"), Some("udp")).unwrap();
        assert_eq!(p.to_string(), "127.0.0.1:5353:53/udp");
        assert!(!p.binds_all_interfaces());

        assert!(PortMapping::from_long(80, None, None, None).unwrap().host.is_none());
        assert!(PortMapping::from_long(0, Some("80"), None, None).is_err());
        assert!(PortMapping::from_long(80, Some("8000-8010"), None, None).is_err());
        assert!(PortMapping::from_long(80, Some("80"), None, Some("sctp")).is_err());
    }

    #[test]
    fn wildcard_host_ip() {
        assert!(PortMapping::parse("8080:80").unwrap().binds_all_interfaces());
        assert!(PortMapping::parse("0.0.0.0:8080:80").unwrap().binds_all_interfaces());
        assert!(!PortMapping::parse("127.0.0.1:8080:80").unwrap().binds_all_interfaces());
    }

    #[test]
    fn malformed_ports_are_rejected() {
        for bad in ["", "abc:80", "80:0", "70000:80", "1:2:3:4", "8000:8000/sctp", "8000-8010:8000-8010", ":80:80"] {
            assert!(PortMapping::parse(bad).is_err(), "{bad} should be rejected");
        }
    }
}

//! Validation of services and phone numbers given on the command line.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::Service;

static IPV4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$").expect("IPv4 pattern is valid")
});

static HOSTNAME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z\d-]{1,63}$").expect("hostname label pattern is valid")
});

static PHONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4,20}$").expect("phone number pattern is valid"));

/// Errors for malformed `host:port` specifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Not of the form `host:port`
    Malformed(String),

    /// Port is not a number
    InvalidPort(String),

    /// Port is outside of 1..=65535
    PortOutOfRange(u64),

    /// Looks like an IPv4 address but has an octet above 255
    InvalidIp(String),

    /// Not a valid DNS hostname
    InvalidHostname(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Malformed(s) => write!(f, "Invalid service '{}'.", s),
            ServiceError::InvalidPort(s) => write!(f, "Invalid port '{}'.", s),
            ServiceError::PortOutOfRange(p) => write!(f, "Invalid port number '{}'.", p),
            ServiceError::InvalidIp(s) => write!(f, "Invalid IP '{}'.", s),
            ServiceError::InvalidHostname(s) => write!(f, "Invalid hostname '{}'.", s),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Parse a `host:port` (or `IP:port`) string into a TCP [`Service`].
pub fn parse_service(spec: &str) -> Result<Service, ServiceError> {
    let mut parts = spec.split(':');
    let (Some(host), Some(port), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ServiceError::Malformed(spec.to_string()));
    };

    let port = parse_port(port)?;
    validate_host(host)?;

    Ok(Service::tcp(host, port))
}

fn parse_port(port: &str) -> Result<u16, ServiceError> {
    let number = port
        .trim()
        .parse::<u64>()
        .map_err(|_| ServiceError::InvalidPort(port.to_string()))?;

    match u16::try_from(number) {
        Ok(port) if port >= 1 => Ok(port),
        _ => Err(ServiceError::PortOutOfRange(number)),
    }
}

/// Validate `host` as either a dotted IPv4 address or a DNS hostname.
pub fn validate_host(host: &str) -> Result<(), ServiceError> {
    if IPV4.is_match(host) {
        let octets_ok = host
            .split('.')
            .all(|octet| octet.parse::<u16>().is_ok_and(|o| o <= 255));
        if !octets_ok {
            return Err(ServiceError::InvalidIp(host.to_string()));
        }
        return Ok(());
    }

    if !is_valid_hostname(host) {
        return Err(ServiceError::InvalidHostname(host.to_string()));
    }
    Ok(())
}

pub fn is_valid_hostname(hostname: &str) -> bool {
    if hostname.is_empty() || hostname.len() > 255 {
        return false;
    }

    // a single trailing dot marks a fully qualified name
    let hostname = hostname.strip_suffix('.').unwrap_or(hostname);

    hostname.split('.').all(|label| {
        HOSTNAME_LABEL.is_match(label) && !label.starts_with('-') && !label.ends_with('-')
    })
}

/// Phone numbers are plain digits starting with the country code, e.g. `4917712345678`.
pub fn is_valid_phone_number(number: &str) -> bool {
    PHONE_NUMBER.is_match(number)
}

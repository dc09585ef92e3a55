//! Validation of command-line values.
//!
//! These functions plug into clap as value parsers, so every configuration
//! error is caught and reported before any socket is opened.

use std::net::IpAddr;

/// Window sizes the protocol supports.
pub const WINDOW_SIZES: [u16; 3] = [3, 5, 10];

/// Lowest non-privileged port accepted.
pub const MIN_PORT: u16 = 1024;

/// Parse a dotted-decimal (or IPv6) address.
pub fn parse_ip(s: &str) -> Result<IpAddr, String> {
    s.parse()
        .map_err(|_| format!("the IP address {s} is not valid"))
}

/// Parse a port number in `[1024, 65535]`.
pub fn parse_port(s: &str) -> Result<u16, String> {
    let port: u16 = s
        .parse()
        .map_err(|_| format!("{s} is not a valid port"))?;
    if port < MIN_PORT {
        return Err(format!("{port} is not a valid port, use [{MIN_PORT}, 65535]"));
    }
    Ok(port)
}

/// Parse a window size, one of {3, 5, 10}.
pub fn parse_window_size(s: &str) -> Result<u16, String> {
    let size: u16 = s
        .parse()
        .map_err(|_| format!("{s} is not a valid window size"))?;
    if !WINDOW_SIZES.contains(&size) {
        return Err(format!("{size} is not a valid window size, use one of 3, 5, 10"));
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ip_parses() {
        assert!(parse_ip("127.0.0.1").is_ok());
        assert!(parse_ip("::1").is_ok());
    }

    #[test]
    fn invalid_ip_rejected() {
        assert!(parse_ip("256.0.0.1").is_err());
        assert!(parse_ip("localhost").is_err());
    }

    #[test]
    fn port_range_enforced() {
        assert_eq!(parse_port("8080"), Ok(8080));
        assert_eq!(parse_port("1024"), Ok(1024));
        assert_eq!(parse_port("65535"), Ok(65535));
        assert!(parse_port("1023").is_err());
        assert!(parse_port("65536").is_err());
        assert!(parse_port("eighty").is_err());
    }

    #[test]
    fn window_size_whitelist_enforced() {
        for ok in ["3", "5", "10"] {
            assert!(parse_window_size(ok).is_ok());
        }
        for bad in ["1", "4", "64", "x"] {
            assert!(parse_window_size(bad).is_err());
        }
    }
}

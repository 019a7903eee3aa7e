use std::net::IpAddr;

use anyhow::{anyhow, Result};
use serde::Serialize;

/// A DNS resolver under test: display name plus IP address (UDP port 53 implied).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsServer {
	pub name: String,
	pub addr: IpAddr,
}

impl DnsServer {
	fn new(name: &str, addr: &str) -> DnsServer {
		DnsServer {
			name: name.to_string(),
			// table entries are compile-time constants
			addr: addr.parse().unwrap(),
		}
	}
}

/// Return the full built-in table of well-known public resolvers.
pub fn built_in_resolvers() -> Vec<DnsServer> {
	vec![
		// Major providers
		DnsServer::new("Cloudflare", "1.1.1.1"),
		DnsServer::new("Cloudflare-Alt", "1.0.0.1"),
		DnsServer::new("Google", "8.8.8.8"),
		DnsServer::new("Google-Alt", "8.8.4.4"),
		DnsServer::new("Quad9", "9.9.9.9"),
		DnsServer::new("Quad9-Alt", "149.112.112.112"),
		DnsServer::new("OpenDNS", "208.67.222.222"),
		DnsServer::new("OpenDNS-Alt", "208.67.220.220"),

		// Ad-blocking and filtering
		DnsServer::new("AdGuard", "94.140.14.14"),
		DnsServer::new("AdGuard-Alt", "94.140.15.15"),
		DnsServer::new("CleanBrowsing", "185.228.168.9"),
		DnsServer::new("CleanBrowsing-Alt", "185.228.169.9"),
		DnsServer::new("NextDNS", "45.90.28.0"),
		DnsServer::new("NextDNS-Alt", "45.90.30.0"),
		DnsServer::new("ControlD", "76.76.2.0"),
		DnsServer::new("ControlD-Alt", "76.76.10.0"),

		// Privacy-focused
		DnsServer::new("Mullvad", "194.242.2.2"),
		DnsServer::new("Mullvad-Alt", "194.242.2.3"),
		DnsServer::new("DNS0-EU", "193.110.81.0"),
		DnsServer::new("DNS0-EU-Alt", "185.253.5.0"),
		DnsServer::new("UncensoredDNS", "91.239.100.100"),
		DnsServer::new("UncensoredDNS-Alt", "89.233.43.71"),

		// Regional/National
		DnsServer::new("AliDNS", "223.5.5.5"),
		DnsServer::new("AliDNS-Alt", "223.6.6.6"),
		DnsServer::new("DNSPod", "119.29.29.29"),
		DnsServer::new("DNSPod-Alt", "119.28.28.28"),
		DnsServer::new("Canadian-Shield", "149.112.121.10"),
		DnsServer::new("Canadian-Shield-Alt", "149.112.122.10"),

		// Alternative providers
		DnsServer::new("DNS-SB", "185.222.222.222"),
		DnsServer::new("DNS-SB-Alt", "45.11.45.11"),
		DnsServer::new("LibreDNS", "116.202.176.26"),
		DnsServer::new("LibreDNS-Alt", "116.203.115.192"),
	]
}

/// Return only the major public resolvers.
pub fn major_resolvers() -> Vec<DnsServer> {
	vec![
		DnsServer::new("Cloudflare", "1.1.1.1"),
		DnsServer::new("Cloudflare-Alt", "1.0.0.1"),
		DnsServer::new("Google", "8.8.8.8"),
		DnsServer::new("Google-Alt", "8.8.4.4"),
		DnsServer::new("Quad9", "9.9.9.9"),
		DnsServer::new("Quad9-Alt", "149.112.112.112"),
		DnsServer::new("NextDNS", "45.90.28.0"),
		DnsServer::new("NextDNS-Alt", "45.90.30.0"),
		DnsServer::new("AdGuard", "94.140.14.14"),
		DnsServer::new("AdGuard-Alt", "94.140.15.15"),
	]
}

/// Parse resolver definitions from text, one `name;ip` pair per line.
///
/// Blank lines and lines starting with '#' are skipped. A malformed line,
/// an empty name or address, or an invalid IP is a hard error.
pub fn parse_servers(content: &str) -> Result<Vec<DnsServer>> {
	let mut servers = Vec::new();

	for (i, line) in content.lines().enumerate() {
		let line_num = i + 1;
		let trimmed = line.trim();
		if trimmed.is_empty() || trimmed.starts_with('#') {
			continue;
		}

		let parts: Vec<&str> = trimmed.split(';').collect();
		if parts.len() != 2 {
			return Err(anyhow!("invalid format at line {}: expected 'name;ip'", line_num));
		}

		let name = parts[0].trim();
		let addr = parts[1].trim();
		if name.is_empty() || addr.is_empty() {
			return Err(anyhow!("empty name or IP at line {}", line_num));
		}

		let addr: IpAddr = addr.parse()
			.map_err(|_| anyhow!("invalid IP address at line {}: {}", line_num, addr))?;

		servers.push(DnsServer {
			name: name.to_string(),
			addr,
		});
	}

	if servers.is_empty() {
		return Err(anyhow!("no valid resolvers found in file"));
	}
	Ok(servers)
}

/// Load DNS servers from a file, or the built-in tables when no file is given.
pub fn load_servers(resolvers_file: Option<&str>, only_major: bool) -> Result<Vec<DnsServer>> {
	match resolvers_file {
		None => {
			if only_major {
				Ok(major_resolvers())
			} else {
				Ok(built_in_resolvers())
			}
		}
		Some(path) => {
			let content = std::fs::read_to_string(path)
				.map_err(|e| anyhow!("opening resolvers file '{}': {}", path, e))?;
			parse_servers(&content)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_servers_basic() {
		let content = "Cloudflare;1.1.1.1\n# comment\n\nGoogle;8.8.8.8\n";
		let servers = parse_servers(content).unwrap();
		assert_eq!(servers.len(), 2);
		assert_eq!(servers[0].name, "Cloudflare");
		assert_eq!(servers[0].addr.to_string(), "1.1.1.1");
		assert_eq!(servers[1].name, "Google");
	}

	#[test]
	fn test_parse_servers_ipv6() {
		let servers = parse_servers("Cloudflare-v6;2606:4700:4700::1111\n").unwrap();
		assert_eq!(servers[0].addr.to_string(), "2606:4700:4700::1111");
	}

	#[test]
	fn test_parse_servers_whitespace_trimmed() {
		let servers = parse_servers("  Quad9 ; 9.9.9.9  \n").unwrap();
		assert_eq!(servers[0].name, "Quad9");
		assert_eq!(servers[0].addr.to_string(), "9.9.9.9");
	}

	#[test]
	fn test_parse_servers_malformed_line() {
		assert!(parse_servers("just-a-name\n").is_err());
		assert!(parse_servers("a;b;c\n").is_err());
	}

	#[test]
	fn test_parse_servers_invalid_ip() {
		assert!(parse_servers("Bad;256.256.256.256\n").is_err());
		assert!(parse_servers("Bad;not-an-ip\n").is_err());
	}

	#[test]
	fn test_parse_servers_empty_fields() {
		assert!(parse_servers(";1.1.1.1\n").is_err());
		assert!(parse_servers("Name;\n").is_err());
	}

	#[test]
	fn test_parse_servers_all_comments() {
		assert!(parse_servers("# only\n# comments\n").is_err());
	}

	#[test]
	fn test_built_in_tables() {
		let all = built_in_resolvers();
		let major = major_resolvers();
		assert!(!all.is_empty());
		assert_eq!(major.len(), 10);
		assert!(major.len() < all.len());
		// every major resolver is also in the full table
		for m in &major {
			assert!(all.contains(m), "{} missing from full table", m.name);
		}
	}

	#[test]
	fn test_load_servers_defaults() {
		let all = load_servers(None, false).unwrap();
		let major = load_servers(None, true).unwrap();
		assert_eq!(all.len(), built_in_resolvers().len());
		assert_eq!(major.len(), major_resolvers().len());
	}
}

use anyhow::{anyhow, Result};

/// Return the built-in list of popular sites to benchmark against.
pub fn default_sites() -> Vec<String> {
	[
		// Search engines
		"google.com", "bing.com", "duckduckgo.com", "yahoo.com",

		// Knowledge & reference
		"wikipedia.org", "archive.org", "stackoverflow.com",
		"github.com", "gitlab.com",

		// Programming languages
		"python.org", "golang.org", "nodejs.org", "rust-lang.org",

		// Major news outlets
		"nytimes.com", "bbc.com", "cnn.com", "reuters.com",
		"theguardian.com", "bloomberg.com",

		// E-commerce
		"amazon.com", "ebay.com", "etsy.com", "shopify.com",

		// Streaming & entertainment
		"youtube.com", "netflix.com", "spotify.com", "vimeo.com",

		// Social & communication
		"linkedin.com", "zoom.us", "slack.com",

		// Cloud & tech
		"cloudflare.com", "aws.amazon.com", "microsoft.com",

		// Finance
		"paypal.com", "stripe.com", "visa.com",

		// Government & organizations
		"usa.gov", "europa.eu", "un.org", "nasa.gov",

		// Health & science
		"nih.gov", "cdc.gov", "mayoclinic.org",

		// Travel
		"booking.com", "airbnb.com", "expedia.com",

		// Additional popular sites
		"reddit.com", "twitter.com", "facebook.com", "instagram.com",
		"tiktok.com", "pinterest.com", "wordpress.com", "medium.com",
	]
	.iter()
	.map(|s| s.to_string())
	.collect()
}

/// Basic sanity check for a domain name: non-empty, at most 253 bytes,
/// no spaces, contains a dot, and no leading or trailing dot.
pub fn is_valid_domain(domain: &str) -> bool {
	if domain.is_empty() || domain.len() > 253 {
		return false;
	}
	!domain.contains(' ')
		&& domain.contains('.')
		&& !domain.starts_with('.')
		&& !domain.ends_with('.')
}

/// Parse a domain list from text, one domain per line.
///
/// Blank lines and '#' comments are skipped; invalid domains are skipped
/// with a warning. An empty result is an error.
pub fn parse_domains(content: &str) -> Result<Vec<String>> {
	let mut domains = Vec::new();

	for (i, line) in content.lines().enumerate() {
		let trimmed = line.trim();
		if trimmed.is_empty() || trimmed.starts_with('#') {
			continue;
		}

		if !is_valid_domain(trimmed) {
			log::warn!("skipping invalid domain at line {}: {}", i + 1, trimmed);
			continue;
		}

		domains.push(trimmed.to_string());
	}

	if domains.is_empty() {
		return Err(anyhow!("no valid domains found in file"));
	}
	Ok(domains)
}

/// Load the domain list from a file, or the built-in sites when no file is given.
pub fn load_domains(sites_file: Option<&str>) -> Result<Vec<String>> {
	match sites_file {
		None => Ok(default_sites()),
		Some(path) => {
			let content = std::fs::read_to_string(path)
				.map_err(|e| anyhow!("opening sites file '{}': {}", path, e))?;
			parse_domains(&content)
		}
	}
}

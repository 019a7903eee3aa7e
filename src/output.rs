use std::cmp::Ordering;
use std::io::Write;

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::bench::BenchmarkResult;
use crate::cli::OutputFormat;

/// Split results into valid and failed, with valid sorted best-first
/// (success rate descending, then mean latency ascending).
fn split_results(results: &[BenchmarkResult]) -> (Vec<&BenchmarkResult>, Vec<&BenchmarkResult>) {
	let mut valid: Vec<&BenchmarkResult> = Vec::new();
	let mut failed: Vec<&BenchmarkResult> = Vec::new();

	for result in results {
		if result.stats.is_valid() {
			valid.push(result);
		} else {
			failed.push(result);
		}
	}

	valid.sort_by(|a, b| {
		b.stats
			.success_rate()
			.partial_cmp(&a.stats.success_rate())
			.unwrap_or(Ordering::Equal)
			.then_with(|| {
				a.stats
					.mean
					.partial_cmp(&b.stats.mean)
					.unwrap_or(Ordering::Equal)
			})
	});

	(valid, failed)
}

/// NaN renders as an empty cell so failed stats do not show as "NaN".
fn format_float(value: f64) -> String {
	if value.is_nan() {
		String::new()
	} else {
		format!("{:.2}", value)
	}
}

fn truncate(s: &str, max_len: usize) -> String {
	if s.len() <= max_len || max_len < 4 {
		return s.to_string();
	}
	// cut on a char boundary so multi-byte names do not panic
	let cut = s
		.char_indices()
		.map(|(i, _)| i)
		.take_while(|&i| i <= max_len - 3)
		.last()
		.unwrap_or(0);
	format!("{}...", &s[..cut])
}

/// Print the benchmark summary in the selected format.
pub fn print_summary(results: &[BenchmarkResult], format: OutputFormat) -> Result<()> {
	if results.is_empty() {
		println!("\nNo benchmark results to display");
		return Ok(());
	}

	let (valid, failed) = split_results(results);

	match format {
		OutputFormat::Json => print_json(results)?,
		OutputFormat::Csv => {
			print_results_csv(std::io::stdout(), &valid)?;
			print_failed_csv(std::io::stderr(), &failed)?;
		}
		OutputFormat::Table => {
			print_results_table(&valid);
			print_failed_table(&failed);
		}
		OutputFormat::Default => {
			println!("\n{}", "=".repeat(80));
			println!("DNS BENCHMARK RESULTS - TOP PERFORMERS");
			println!("{}", "=".repeat(80));
			print_results_table(&valid);
			print_failed_table(&failed);
			println!("{}", "-".repeat(80));
			println!(
				"Summary: {} resolvers tested successfully, {} failed",
				valid.len(),
				failed.len(),
			);
			if let Some(first) = valid.first() {
				println!("Each resolver processed {} total queries", first.stats.total);
			}
		}
	}

	Ok(())
}

/// The full result list as pretty JSON, in benchmark order.
fn print_json(results: &[BenchmarkResult]) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(results)?);
	Ok(())
}

fn print_results_table(valid: &[&BenchmarkResult]) {
	if valid.is_empty() {
		return;
	}

	let mut table = Table::new();
	table.load_preset(UTF8_FULL);
	table.set_content_arrangement(ContentArrangement::Dynamic);
	table.set_header(vec![
		"Resolver", "Address", "Success %", "Mean (ms)", "Median (ms)",
		"Min (ms)", "Max (ms)", "Queries",
	]);

	for result in valid {
		let stats = &result.stats;
		table.add_row(vec![
			truncate(&result.server.name, 24),
			result.server.addr.to_string(),
			format!("{:.1}", stats.success_rate() * 100.0),
			format_float(stats.mean),
			format_float(stats.median),
			format_float(stats.min),
			format_float(stats.max),
			stats.total.to_string(),
		]);
	}

	println!("{table}");
}

fn print_failed_table(failed: &[&BenchmarkResult]) {
	if failed.is_empty() {
		return;
	}

	let mut table = Table::new();
	table.load_preset(UTF8_FULL);
	table.set_content_arrangement(ContentArrangement::Dynamic);
	table.set_header(vec!["Resolver", "Address", "Errors", "Total"]);

	for result in failed {
		table.add_row(vec![
			truncate(&result.server.name, 24),
			result.server.addr.to_string(),
			result.stats.errors.to_string(),
			result.stats.total.to_string(),
		]);
	}

	println!("\nFailed resolvers:");
	println!("{table}");
}

fn print_results_csv<W: Write>(writer: W, valid: &[&BenchmarkResult]) -> Result<()> {
	if valid.is_empty() {
		return Ok(());
	}

	let mut csv_writer = csv::Writer::from_writer(writer);
	csv_writer.write_record([
		"Resolver", "Address", "Success Rate(%)", "Mean (ms)", "Min (ms)", "Max (ms)",
		"Total Queries",
	])?;

	for result in valid {
		let stats = &result.stats;
		csv_writer.write_record([
			result.server.name.clone(),
			result.server.addr.to_string(),
			format!("{:.1}", stats.success_rate() * 100.0),
			format_float(stats.mean),
			format_float(stats.min),
			format_float(stats.max),
			stats.total.to_string(),
		])?;
	}

	csv_writer.flush()?;
	Ok(())
}

fn print_failed_csv<W: Write>(writer: W, failed: &[&BenchmarkResult]) -> Result<()> {
	if failed.is_empty() {
		return Ok(());
	}

	let mut csv_writer = csv::Writer::from_writer(writer);
	csv_writer.write_record(["Resolver", "Address", "Errors", "Total"])?;

	for result in failed {
		csv_writer.write_record([
			result.server.name.clone(),
			result.server.addr.to_string(),
			result.stats.errors.to_string(),
			result.stats.total.to_string(),
		])?;
	}

	csv_writer.flush()?;
	Ok(())
}

/// Write the per-resolver summary report as CSV.
pub fn write_report(path: &str, results: &[BenchmarkResult]) -> Result<()> {
	let mut writer = csv::Writer::from_path(path)?;

	writer.write_record([
		"Name", "Address", "Min(ms)", "Max(ms)", "Mean(ms)", "Median(ms)",
		"Successful", "Errors", "Total", "Success Rate(%)",
	])?;

	for result in results {
		let stats = &result.stats;
		writer.write_record([
			result.server.name.clone(),
			result.server.addr.to_string(),
			format_float(stats.min),
			format_float(stats.max),
			format_float(stats.mean),
			format_float(stats.median),
			stats.count.to_string(),
			stats.errors.to_string(),
			stats.total.to_string(),
			format!("{:.1}", stats.success_rate() * 100.0),
		])?;
	}

	writer.flush()?;
	log::info!("report written path={}", path);
	Ok(())
}

/// Write the domain x resolver matrix of mean latencies as CSV.
///
/// Cells are empty for domains a resolver never answered.
pub fn write_matrix_report(
	path: &str,
	results: &[BenchmarkResult],
	domains: &[String],
) -> Result<()> {
	let mut writer = csv::Writer::from_path(path)?;

	let mut header = vec!["Domain".to_string()];
	header.extend(results.iter().map(|r| r.server.name.clone()));
	writer.write_record(&header)?;

	for domain in domains {
		let mut row = vec![domain.clone()];
		for result in results {
			match result.domain_mean.get(domain) {
				Some(mean) => row.push(format_float(*mean)),
				None => row.push(String::new()),
			}
		}
		writer.write_record(&row)?;
	}

	writer.flush()?;
	log::info!("matrix report written path={}", path);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::servers::DnsServer;
	use crate::stats::calculate_stats;
	use std::collections::HashMap;

	fn result_with(name: &str, latencies: Vec<f64>, errors: usize, total: usize) -> BenchmarkResult {
		BenchmarkResult {
			server: DnsServer {
				name: name.to_string(),
				addr: "1.1.1.1".parse().unwrap(),
			},
			stats: calculate_stats(latencies, errors, total),
			domain_mean: HashMap::new(),
		}
	}

	#[test]
	fn test_split_results_sorts_best_first() {
		let results = vec![
			result_with("slow-reliable", vec![50.0, 60.0], 0, 2),
			result_with("dead", vec![], 2, 2),
			result_with("fast-reliable", vec![5.0, 6.0], 0, 2),
			result_with("flaky", vec![1.0], 1, 2),
		];

		let (valid, failed) = split_results(&results);
		assert_eq!(failed.len(), 1);
		assert_eq!(failed[0].server.name, "dead");

		let order: Vec<&str> = valid.iter().map(|r| r.server.name.as_str()).collect();
		// full success rate sorts first, mean breaks the tie
		assert_eq!(order, vec!["fast-reliable", "slow-reliable", "flaky"]);
	}

	#[test]
	fn test_format_float() {
		assert_eq!(format_float(12.345), "12.35");
		assert_eq!(format_float(f64::NAN), "");
	}

	#[test]
	fn test_truncate() {
		assert_eq!(truncate("short", 20), "short");
		assert_eq!(truncate("a-very-long-resolver-name", 10), "a-very-...");
	}

	#[test]
	fn test_truncate_multibyte_names() {
		// resolver names come from user files and may not be ASCII; the
		// cut must land on a char boundary, not mid-codepoint
		let name = "é".repeat(21);
		let cut = truncate(&name, 24);
		assert!(cut.ends_with("..."));
		assert!(cut.len() <= 24);
		assert_eq!(truncate("résolveur-très-long-éé", 10), "résolv...");
	}

	#[test]
	fn test_write_report_round_trip() {
		let path = std::env::temp_dir().join("dnsbench-test-report.csv");
		let path_str = path.to_str().unwrap();

		let results = vec![
			result_with("Good", vec![10.0, 20.0], 0, 2),
			result_with("Bad", vec![], 2, 2),
		];
		write_report(path_str, &results).unwrap();

		let content = std::fs::read_to_string(&path).unwrap();
		let lines: Vec<&str> = content.lines().collect();
		assert_eq!(lines.len(), 3);
		assert!(lines[0].starts_with("Name,Address"));
		assert!(lines[1].starts_with("Good,1.1.1.1,10.00,20.00,15.00"));
		// NaN stats render as empty cells
		assert!(lines[2].starts_with("Bad,1.1.1.1,,,,"));

		std::fs::remove_file(&path).unwrap();
	}

	#[test]
	fn test_write_matrix_report() {
		let path = std::env::temp_dir().join("dnsbench-test-matrix.csv");
		let path_str = path.to_str().unwrap();

		let mut result = result_with("Good", vec![10.0], 0, 1);
		result.domain_mean.insert("google.com".to_string(), 12.5);
		let domains = vec!["google.com".to_string(), "bing.com".to_string()];

		write_matrix_report(path_str, &[result], &domains).unwrap();

		let content = std::fs::read_to_string(&path).unwrap();
		let lines: Vec<&str> = content.lines().collect();
		assert_eq!(lines[0], "Domain,Good");
		assert_eq!(lines[1], "google.com,12.50");
		// no data for the second domain
		assert_eq!(lines[2], "bing.com,");

		std::fs::remove_file(&path).unwrap();
	}

	#[test]
	fn test_print_results_csv_output() {
		let results = vec![result_with("Good", vec![10.0, 20.0], 0, 2)];
		let (valid, _) = split_results(&results);

		let mut buf = Vec::new();
		print_results_csv(&mut buf, &valid).unwrap();

		let content = String::from_utf8(buf).unwrap();
		assert!(content.starts_with("Resolver,Address"));
		assert!(content.contains("Good,1.1.1.1,100.0,15.00,10.00,20.00,2"));
	}
}

// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Nuotta - Mass HTTP Reconnaissance Scanner
 * Standalone CLI for domain sweeps
 *
 * Features:
 * - Signature-driven technology fingerprinting (8 categories)
 * - Structural plugin/theme mining for WordPress, Joomla, Drupal
 * - Sensitive-file probing with content verification
 * - NVD CVE correlation with version fallback
 * - PostgreSQL result persistence
 *
 * (c) 2026 Bountyy Oy
 */

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nuotta_scanner::config::AppConfig;
use nuotta_scanner::correlator::VulnCorrelator;
use nuotta_scanner::database::{Database, DatabaseConfig};
use nuotta_scanner::engine::ScanEngine;
use nuotta_scanner::errors::ScannerError;
use nuotta_scanner::http_client::HttpClient;
use nuotta_scanner::nvd::NvdClient;
use nuotta_scanner::signatures::{Signature, SignatureStore};
use nuotta_scanner::types::ScanReport;

/// Nuotta - Mass HTTP Reconnaissance Scanner
#[derive(Parser)]
#[command(name = "nuotta")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version = "1.2.0")]
#[command(about = "Domain sweeps with tech fingerprinting and CVE correlation", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Quiet mode - only warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a list of domains from a file
    Scan {
        /// File with one domain per line
        domains_file: PathBuf,

        /// Output file for JSON results
        #[arg(short, long, default_value = "scan_results.json")]
        output: PathBuf,

        /// Max concurrent domain pipelines (overrides config)
        #[arg(short = 'C', long)]
        max_concurrent: Option<usize>,

        /// Request timeout in seconds (overrides config)
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Scan a single domain and print the report
    ScanOne {
        /// Domain or URL to scan
        domain: String,
    },

    /// Initialize the database schema
    InitDb,

    /// Show aggregate statistics from the database
    Stats,

    /// Manage signature documents
    Signatures {
        #[command(subcommand)]
        command: SignaturesCommand,
    },
}

#[derive(Subcommand)]
enum SignaturesCommand {
    /// Add a named signature to a category document
    Add {
        /// Signature category (cms, server, camera, ...)
        category: String,

        /// Technology name
        name: String,

        /// JSON file with the signature patterns
        patterns_file: PathBuf,
    },

    /// List the signatures in a category document
    List {
        /// Signature category
        category: String,
    },
}

fn init_logging(verbose: bool, debug: bool, quiet: bool) {
    let default_level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug, cli.quiet);

    let config = AppConfig::load(&cli.config);

    match cli.command {
        Commands::Scan {
            domains_file,
            output,
            max_concurrent,
            timeout,
        } => {
            let domains = load_domains(&domains_file)?;
            info!("Loaded {} domains from {:?}", domains.len(), domains_file);

            let engine = build_engine(&config, timeout).await?;
            let max_concurrent = max_concurrent.unwrap_or(config.scanner.max_concurrent);

            let reports = engine.scan(&domains, max_concurrent).await;
            save_results(&reports, &output)?;
            println!("Scan completed! Results saved to: {}", output.display());
        }

        Commands::ScanOne { domain } => {
            let engine = build_engine(&config, None).await?;
            let report = engine.scan_one(&domain).await;
            print_report(&report);
        }

        Commands::InitDb => {
            let database = connect_database(&config).await?;
            database.init_schema().await?;
            println!("Database schema initialized");
        }

        Commands::Stats => {
            let database = connect_database(&config).await?;
            let (total, alive, with_cameras) = database.domain_stats().await?;

            println!("\n{}", "=".repeat(50));
            println!("SCAN STATISTICS");
            println!("{}", "=".repeat(50));
            println!("Total domains: {total}");
            if total > 0 {
                println!(
                    "Alive: {} ({:.1}%)",
                    alive,
                    alive as f64 / total as f64 * 100.0
                );
                println!(
                    "With cameras: {} ({:.1}%)",
                    with_cameras,
                    with_cameras as f64 / total as f64 * 100.0
                );
            }
        }

        Commands::Signatures { command } => {
            let store = SignatureStore::new(&config.signatures.dir);
            match command {
                SignaturesCommand::Add {
                    category,
                    name,
                    patterns_file,
                } => {
                    let raw = std::fs::read_to_string(&patterns_file)
                        .with_context(|| format!("Failed to read {patterns_file:?}"))?;
                    let signature: Signature = serde_json::from_str(&raw).map_err(|e| {
                        ScannerError::Configuration(format!("invalid signature JSON: {e}"))
                    })?;
                    store.add(&category, &name, signature)?;
                    println!("Signature '{name}' added to '{category}'");
                }
                SignaturesCommand::List { category } => {
                    let signatures = store.load(&category);
                    if signatures.is_empty() {
                        println!("No signatures found for type '{category}'");
                        return Ok(());
                    }

                    println!("\nSignatures for '{category}':");
                    println!("{}", "=".repeat(50));
                    for (name, signature) in signatures.iter() {
                        println!("\n{name}:");
                        let rendered = serde_json::to_string_pretty(signature)
                            .unwrap_or_else(|_| "<unprintable>".to_string());
                        for line in rendered.lines() {
                            println!("  {line}");
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

async fn build_engine(config: &AppConfig, timeout_override: Option<u64>) -> Result<ScanEngine> {
    let timeout = timeout_override.unwrap_or(config.scanner.timeout);
    let http_client = Arc::new(HttpClient::new(timeout, config.scanner.max_retries)?);
    let signatures = Arc::new(SignatureStore::new(&config.signatures.dir));
    let correlator = VulnCorrelator::new(NvdClient::new(config.nvd.api_key.as_deref())?);
    let database = Arc::new(connect_database(config).await?);
    database.init_schema().await?;

    Ok(ScanEngine::new(
        http_client,
        signatures,
        correlator,
        database,
    ))
}

async fn connect_database(config: &AppConfig) -> Result<Database> {
    Database::connect(DatabaseConfig {
        url: config.database.url.clone(),
        pool_size: config.database.pool_size,
        enabled: config.database.enabled,
    })
    .await
}

fn load_domains(path: &PathBuf) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Domains file not found: {path:?}"))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn save_results(reports: &[ScanReport], output: &PathBuf) -> Result<()> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let body = serde_json::to_string_pretty(reports)?;
    std::fs::write(output, body).with_context(|| format!("Failed to write {output:?}"))?;
    info!("Results saved to {:?}", output);
    Ok(())
}

fn print_report(report: &ScanReport) {
    println!("\n{}", "=".repeat(50));
    println!("Scan results for: {}", report.domain);
    println!("{}", "=".repeat(50));

    if let Some(error) = &report.error {
        println!("Error: {error}");
        return;
    }

    println!("Status: {}", report.status_code);

    if !report.technologies.is_empty() {
        println!("\nTechnologies found:");
        for (category, items) in &report.technologies {
            if !items.is_empty() {
                println!("  {}: {}", category, items.join(", "));
            }
        }
    }

    if !report.cameras().is_empty() {
        println!("\nCameras: {}", report.cameras().join(", "));
    }
    if !report.routers().is_empty() {
        println!("\nRouters: {}", report.routers().join(", "));
    }
    if !report.js_libraries().is_empty() {
        println!("\nJavaScript libraries: {}", report.js_libraries().join(", "));
    }
    if !report.plugins().is_empty() {
        println!("\nPlugins: {}", report.plugins().join(", "));
    }
    if !report.themes().is_empty() {
        println!("\nThemes: {}", report.themes().join(", "));
    }

    if !report.vulnerabilities.is_empty() {
        println!(
            "\nCVEs found ({} affected technologies):",
            report.vulnerabilities.len()
        );
        for (label, records) in &report.vulnerabilities {
            println!("  {}: {} CVE(s)", label, records.len());
            for record in records.iter().take(3) {
                let (severity, score) = record
                    .cvss
                    .as_ref()
                    .map(|cvss| {
                        (
                            cvss.severity.clone().unwrap_or_else(|| "N/A".to_string()),
                            cvss.score.map_or("N/A".to_string(), |s| s.to_string()),
                        )
                    })
                    .unwrap_or_else(|| ("N/A".to_string(), "N/A".to_string()));
                println!("    - {} (Severity: {severity}, Score: {score})", record.id);
            }
            if records.len() > 3 {
                println!("    ... and {} more", records.len() - 3);
            }
        }
    }

    if !report.sensitive_files.is_empty() {
        println!(
            "\nSensitive files found ({}):",
            report.sensitive_files.len()
        );
        for finding in report.sensitive_files.iter().take(5) {
            println!("  - {}", finding.url);
        }
    }
}

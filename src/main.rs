use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ksef_minimal::auth::KsefAuthCoordinator;
use ksef_minimal::config::Settings;
use ksef_minimal::crypto::KsefCryptography;
use ksef_minimal::gateway::KsefClient;
use ksef_minimal::is_valid_nip;
use ksef_minimal::pipeline::{KsefContext, PipelineOptions, SubmissionOutcome};
use ksef_minimal::status::PollPolicy;
use ksef_minimal::template::InvoiceTemplate;

#[derive(Parser)]
#[command(name = "ksef-minimal", version)]
#[command(about = "Submit a template-based FA(3) invoice to KSeF")]
struct Cli {
    /// Settings file.
    #[arg(long, default_value = "appsettings.json")]
    config: PathBuf,
    /// FA(3) invoice template.
    #[arg(long, default_value = "templates/TestFaktura.xml")]
    template: PathBuf,
    /// Upper bound for the whole run, in seconds.
    #[arg(long, default_value_t = 300)]
    timeout: u64,
    #[arg(long, default_value_t = 1000)]
    poll_interval_ms: u64,
    #[arg(long, default_value_t = 60)]
    max_attempts: u32,
    /// Seconds to wait before querying metadata of an accepted invoice.
    #[arg(long, default_value_t = 10)]
    metadata_delay: u64,
    /// Print the outcome as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let settings = Settings::load(&cli.config)
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;
    let nip = settings.seller().vat_id();
    if !is_valid_nip(nip) {
        warn!(%nip, "seller NIP fails the checksum; the gateway will likely reject it");
    }
    info!(
        environment = settings.environment().as_str(),
        base_url = settings.api_base_url(),
        "settings loaded"
    );

    let template = InvoiceTemplate::from_path(&cli.template)
        .with_context(|| format!("loading template {}", cli.template.display()))?;

    let poll = PollPolicy::new(Duration::from_millis(cli.poll_interval_ms), cli.max_attempts);
    let client = KsefClient::from_settings(&settings)?;
    let crypto = KsefCryptography::fetch(&client)
        .await
        .context("fetching gateway public keys")?;
    let auth = KsefAuthCoordinator::new(client.clone(), crypto.clone()).with_poll_policy(poll);
    let ctx = KsefContext::new(client, crypto, auth, settings);

    let options = PipelineOptions {
        poll,
        metadata_delay: Duration::from_secs(cli.metadata_delay),
        run_timeout: Duration::from_secs(cli.timeout),
        ..PipelineOptions::default()
    };
    let outcome = ctx
        .submit_invoice(&template, Utc::now(), &options)
        .await
        .context("invoice submission failed")?;

    if outcome.is_processing() {
        warn!(
            invoice = %outcome.invoice_reference,
            "gateway is still processing the invoice; check its status later"
        );
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_outcome(outcome: &SubmissionOutcome) {
    println!("Invoice number:    {}", outcome.invoice_number);
    println!("Session:           {}", outcome.session_reference);
    println!("Invoice reference: {}", outcome.invoice_reference);
    println!(
        "Status:            {} {}",
        outcome.status.status.code, outcome.status.status.description
    );
    if let Some(ksef_number) = &outcome.ksef_number {
        println!("KSeF number:       {ksef_number}");
    }
    if let Some(summary) = &outcome.summary {
        if let Some(gross) = summary.gross_amount {
            println!("Gross amount:      {gross}");
        }
        if let Some(invoicing_date) = summary.invoicing_date {
            println!("Invoicing date:    {invoicing_date}");
        }
    }
    println!("Invoice hash:      {}", outcome.invoice_hash);
    println!("Verification URL:  {}", outcome.verification_url);
}

//! Verify a gateway callback from the command line.
//!
//! ```text
//! cargo run -p paymob-client --example verify_callback -- webhook payload.json --signature <hmac>
//! cargo run -p paymob-client --example verify_callback -- redirect "id=1&success=true&...&hmac=<hmac>"
//! cargo run -p paymob-client --example verify_callback -- checkout <client_secret>
//! ```
//!
//! Settings come from `PAYMOB_*` variables, optionally through a `.env` file.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use reqwest::Url;

use paymob_client::{PaymobClient, Settings};
use paymob_integrity::IntegrityVerifier;
use paymob_types::RedirectRecord;

#[derive(Parser)]
#[command(name = "verify_callback")]
#[command(about = "Check Paymob callback signatures", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a webhook body against the signature from its `hmac` query parameter
    Webhook {
        /// Path to the JSON body
        file: std::path::PathBuf,
        #[arg(long)]
        signature: String,
    },
    /// Verify a browser redirect query string
    Redirect {
        /// Raw query string, with or without the leading `?`
        query: String,
    },
    /// Print the unified checkout URL for a client secret
    Checkout { client_secret: String },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,paymob_client=debug,paymob_integrity=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env().context("loading PAYMOB_* settings")?;

    match cli.command {
        Commands::Webhook { file, signature } => {
            let verifier = verifier(&settings)?;
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let body: serde_json::Value = serde_json::from_str(&raw)?;
            report(verifier.verify_webhook_json(&body, &signature)?)
        }
        Commands::Redirect { query } => {
            let verifier = verifier(&settings)?;
            let url = Url::parse(&format!("http://localhost/?{}", query.trim_start_matches('?')))?;
            let record = RedirectRecord::from_query_pairs(url.query_pairs())?;
            tracing::info!(id = record.id, order = record.order, success = record.success, "Parsed redirect");
            report(verifier.verify_redirect(&record))
        }
        Commands::Checkout { client_secret } => {
            let client = PaymobClient::from_settings(&settings)?;
            println!("{}", client.checkout_url(&client_secret)?);
            Ok(())
        }
    }
}

fn verifier(settings: &Settings) -> Result<IntegrityVerifier> {
    let secret = settings
        .hmac_secret
        .as_deref()
        .context("PAYMOB_HMAC_SECRET is not set")?;
    Ok(IntegrityVerifier::new(secret)?)
}

fn report(authentic: bool) -> Result<()> {
    if !authentic {
        bail!("signature mismatch");
    }
    println!("authentic");
    Ok(())
}

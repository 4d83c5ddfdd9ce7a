//! g2w - turn a remote repository's directory tree into a wordlist
//!
//! # Usage
//! ```bash
//! g2w https://github.com/owner/repo                    # default branch, web pages
//! g2w https://github.com/owner/repo -b dev -a -o w.txt # branch, URL-encoded output
//! g2w https://github.com/owner/repo -p github-api      # contents API
//! ```

mod error;
mod models;
mod providers;
mod remote;
mod walk;
mod wordlist;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use providers::{ProviderRegistry, WalkTarget, github_api::DEFAULT_API_BASE};
use remote::{HttpTransport, TransportSettings};
use models::WalkSummary;
use walk::WalkOptions;
use wordlist::WordlistFile;

/// Parses a git repository and transforms the directory structure into a wordlist
#[derive(Parser, Debug)]
#[command(name = "g2w", version)]
#[command(about = "Parses a git repository and transforms the directory structure into a wordlist", long_about = None)]
struct Cli {
    /// Repository URL, e.g. https://github.com/owner/repo
    #[arg(value_name = "URL")]
    url: String,

    /// Output file [default: g2w_<timestamp>.txt]
    #[arg(short, long)]
    outfile: Option<PathBuf>,

    /// Branch or other reference to walk instead of the default branch
    #[arg(short, long)]
    branch: Option<String>,

    /// Print progress for every discovered entry
    #[arg(short, long)]
    verbose: bool,

    /// Percent-encode every written path
    #[arg(short, long)]
    auto_url_encode: bool,

    /// Provider to use instead of picking one from the URL (github, github-api)
    #[arg(short, long)]
    provider: Option<String>,

    /// Token sent as a bearer header, lifts API rate limits
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Base URL of the contents API
    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_base: Url,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Do not descend more than this many directories below the root
    #[arg(long)]
    max_depth: Option<usize>,
}

fn default_outfile() -> PathBuf {
    PathBuf::from(format!(
        "g2w_{}.txt",
        Local::now().format("%Y-%m-%d_%H-%M-%S")
    ))
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "g2w=info" } else { "g2w=warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false)
                .with_level(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let url = match Url::parse(&cli.url) {
        Ok(u) => u,
        Err(e) => {
            eprintln!("✗ Invalid URL: {}", e);
            eprintln!("  URL: {}", cli.url);
            std::process::exit(1);
        }
    };

    let registry = ProviderRegistry::default();
    let provider = match registry.select(&url, cli.provider.as_deref()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("✗ Failed to determine version control system");
            eprintln!("  {}", e);
            eprintln!("  Known providers: {}", registry.names().join(", "));
            std::process::exit(1);
        }
    };

    let transport = Arc::new(HttpTransport::new(&TransportSettings {
        timeout: Duration::from_secs(cli.timeout),
        token: cli.token.clone(),
        ..TransportSettings::default()
    })?);

    let mut target = WalkTarget::new(url, cli.api_base.clone());
    if let Some(branch) = &cli.branch {
        target = target.with_reference(branch.clone());
    }
    target.options = WalkOptions {
        max_depth: cli.max_depth,
    };
    let walker = match (provider.construct)(target, transport) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("[+] Using provider: {}", walker.name());

    let outfile = cli.outfile.clone().unwrap_or_else(default_outfile);
    let mut sink = WordlistFile::new(&outfile, cli.auto_url_encode);

    // Set up interrupt handling; lines already written stay in the file
    let outcome = tokio::select! {
        result = walker.walk(&mut sink) => Some(result),
        Ok(()) = tokio::signal::ctrl_c() => None,
    };
    sink.finish()?;

    let code = report(outcome, &sink);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Prints the walk's outcome and returns the process exit code.
///
/// `None` means the walk was interrupted.
fn report(outcome: Option<error::Result<WalkSummary>>, sink: &WordlistFile) -> i32 {
    match outcome {
        None => {
            tracing::error!("[-] Interrupted, stopping walk");
            eprintln!("✗ Interrupted after {} entries", sink.written());
            if sink.written() > 0 {
                eprintln!("  Partial wordlist: {}", sink.path().display());
            }
            130
        }
        Some(Err(e)) => {
            eprintln!("✗ {}", e);
            1
        }
        Some(Ok(summary)) if summary.entries == 0 => {
            eprintln!("✗ No repository entries were discovered");
            eprintln!("  Run with --verbose to see what was requested");
            1
        }
        Some(Ok(summary)) => {
            println!("✓ Wrote {} entries to {}", summary.entries, sink.path().display());
            if !summary.is_complete() {
                println!(
                    "  {} locations skipped ({} rate limited), see the [-] and [!] log lines",
                    summary.skipped.len(),
                    summary.rate_limited()
                );
                for skipped in &summary.skipped {
                    println!("    {} ({})", skipped.location, skipped.reason);
                }
            }
            0
        }
    }
}

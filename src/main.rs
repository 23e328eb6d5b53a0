use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use repowalk::output;
use repowalk::provider::MemoryProvider;
use repowalk::walk::WalkMetrics;
use repowalk::{ContentProvider, ContentWalker, RepoCoordinate, WalkOptions, WalkerConfig};

#[derive(Parser)]
#[command(
    name = "repowalk",
    version,
    about = "Resolve a path inside a repository tree, following submodules",
    long_about = "Resolves PATH inside OWNER/REPO one directory level at a time, \
    the way a directory-listing content API is walked. When a listing contains a \
    submodule, resolution restarts at the root of the linked repository and the \
    rest of PATH is dropped. \
    Repositories are served from a JSON manifest."
)]
struct Cli {
    #[arg(short, long, help = "JSON manifest describing the repositories to serve")]
    manifest: PathBuf,

    #[arg(index = 1, help = "Repository to start in, as OWNER/REPO")]
    repo: RepoCoordinate,

    #[arg(index = 2, help = "Path inside the repository")]
    path: String,

    #[arg(short = 'r', long = "ref", help = "Branch, tag or commit passed through to the provider")]
    reference: Option<String>,

    #[arg(long, help = "Treat submodules as ordinary entries instead of following them")]
    no_follow_submodules: bool,

    #[arg(
        long,
        default_value_t = WalkerConfig::DEFAULT_MAX_SUBMODULE_HOPS,
        help = "Give up after this many submodule redirects"
    )]
    max_submodule_hops: usize,

    #[arg(long, help = "Abort resolution after this many seconds")]
    timeout: Option<u64>,

    #[arg(long, help = "Print the provider call trace to stderr")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let provider = match MemoryProvider::load(&cli.manifest) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    let provider_name = provider.name().to_string();
    let metrics = WalkMetrics::new();
    let walker = ContentWalker::new(provider)
        .with_config(WalkerConfig {
            follow_submodules: !cli.no_follow_submodules,
            max_submodule_hops: cli.max_submodule_hops,
        })
        .with_metrics(Arc::clone(&metrics));

    let cancel = CancellationToken::new();
    spawn_cancellers(&cancel, cli.timeout);

    let options = WalkOptions {
        reference: cli.reference.clone(),
    };
    let result = walker.resolve(&cancel, &cli.repo, &cli.path, &options).await;

    if cli.stats {
        for call in metrics.calls() {
            eprintln!("{}", output::call_line(&call));
        }
        eprintln!(
            "{} calls, {} failed, {} redirects, {:?} waiting on {} provider",
            metrics.call_count(),
            metrics.failed_calls(),
            metrics.redirects(),
            metrics.total_call_time(),
            provider_name
        );
    }

    match result {
        Ok(resolved) => {
            output::write_lines(output::resolved_lines(&resolved))?;
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(if e.is_not_found() { 2 } else { 1 });
        }
    }
}

/// Cancel the walk on Ctrl-C, or once the timeout elapses
fn spawn_cancellers(cancel: &CancellationToken, timeout: Option<u64>) {
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    if let Some(secs) = timeout {
        let on_timeout = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            on_timeout.cancel();
        });
    }
}

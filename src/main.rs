use anyhow::Result;
use awsfind::aws::query::{self, Action};
use awsfind::aws::{credentials, session};
use awsfind::dispatch::{self, DispatchOutcome};
use awsfind::output;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Find an AWS resource across every locally configured account
#[derive(Parser, Debug)]
#[command(name = "awsfind", version, about, long_about = None)]
struct Args {
    /// AWS region to search (defaults to $AWS_REGION)
    #[arg(short, long)]
    region: Option<String>,

    /// Resource identifier to find
    #[arg(long)]
    id: Option<String>,

    /// Kind of resource lookup
    #[arg(long, value_enum, default_value = "instance")]
    action: Action,

    /// Read accounts from the OS keychain store instead of ~/.aws/credentials
    #[arg(long)]
    keyring: bool,

    /// Search timeout in seconds
    #[arg(long, default_value_t = 5.0)]
    timeout: f64,

    /// Override the AWS endpoint (localstack-style setups)
    #[arg(long)]
    endpoint_url: Option<String>,

    /// Verbose diagnostics on stderr. Warning: may disrupt output/pipe processing
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) {
    let default_directive = if verbose { "awsfind=debug" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    setup_logging(args.verbose);
    std::process::exit(run(args).await);
}

async fn run(args: Args) -> i32 {
    let Some(region) = args
        .region
        .or_else(|| std::env::var("AWS_REGION").ok().filter(|r| !r.is_empty()))
    else {
        eprintln!("No region given: pass --region or set AWS_REGION");
        return 1;
    };
    let Some(id) = args.id.filter(|id| !id.is_empty()) else {
        eprintln!("No resource identifier given: pass --id");
        return 1;
    };
    if !args.timeout.is_finite() || args.timeout <= 0.0 {
        eprintln!("Timeout must be a positive number of seconds");
        return 1;
    }

    let accounts = match load_accounts(args.keyring) {
        Ok(accounts) => accounts,
        Err(err) => {
            eprintln!("{err:#}");
            return 1;
        }
    };
    if accounts.is_empty() {
        eprintln!("No accounts configured");
        return 1;
    }

    tracing::info!(
        "Searching {} account(s) in {} for {:?} '{}'",
        accounts.len(),
        region,
        args.action,
        id
    );

    let sessions = futures::future::join_all(
        accounts
            .into_iter()
            .map(|credential| session::make_session(&region, credential, args.endpoint_url.as_deref())),
    )
    .await;

    // The request itself is immutable and shared read-only by every task.
    let id: Arc<str> = Arc::from(id.as_str());
    let action = args.action;
    let tasks = sessions
        .into_iter()
        .map(|session| {
            let id = Arc::clone(&id);
            let name = session.account.clone();
            (name, async move { query::execute(&session, action, &id).await })
        })
        .collect();

    match dispatch::dispatch(tasks, Duration::from_secs_f64(args.timeout)).await {
        DispatchOutcome::Satisfied {
            payload,
            discarded_matches,
        } => {
            if discarded_matches > 0 {
                tracing::warn!(
                    "{} additional match(es) in other accounts were discarded",
                    discarded_matches
                );
            }
            let mut stdout = std::io::stdout();
            if let Err(err) = output::write_payload(&mut stdout, &payload) {
                tracing::error!("{err:#}");
                return 1;
            }
            0
        }
        DispatchOutcome::Exhausted { not_found, errored } => {
            eprintln!(
                "No match in {} account(s) ({} failed to answer)",
                not_found + errored,
                errored
            );
            1
        }
        DispatchOutcome::TimedOut => {
            eprintln!("Timeout waiting for accounts to return");
            1
        }
    }
}

fn load_accounts(keyring: bool) -> Result<Vec<credentials::AccountCredential>> {
    if keyring {
        credentials::from_keyring()
    } else {
        credentials::from_shared_file()
    }
}

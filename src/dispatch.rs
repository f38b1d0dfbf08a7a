//! Fan-out Dispatcher
//!
//! Runs one query task per account, commits to the first `Found` result,
//! and bounds the whole search with a single deadline. Once the outcome is
//! decided, everything still in flight is aborted so no request outlives
//! the dispatcher.

use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{timeout, Instant};

/// Outcome of a single account's lookup.
///
/// A remote failure is its own variant rather than being folded into
/// `NotFound`, so a broken account can never masquerade as an empty one.
#[derive(Debug)]
pub enum QueryOutcome {
    /// The account holds a matching record.
    Found(Value),
    /// The call succeeded but nothing matched.
    NotFound,
    /// The call itself failed.
    Errored(anyhow::Error),
}

/// Terminal state of a fan-out search.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// At least one account matched before the deadline. Extra matches that
    /// had already completed when the winner was picked are counted, not
    /// printed.
    Satisfied {
        payload: Value,
        discarded_matches: usize,
    },
    /// Every account answered and none matched.
    Exhausted { not_found: usize, errored: usize },
    /// The deadline expired with no match.
    TimedOut,
}

/// Run `tasks` concurrently and wait for the first match or the deadline.
///
/// Each entry pairs an account name (for diagnostics) with its query future.
/// All tasks are spawned up front; the first `Found` wins and the rest are
/// aborted. `Errored` results are logged and counted but contribute neither
/// a win nor an early exit.
pub async fn dispatch<F>(tasks: Vec<(String, F)>, deadline: Duration) -> DispatchOutcome
where
    F: Future<Output = QueryOutcome> + Send + 'static,
{
    let mut set: JoinSet<(String, QueryOutcome)> = JoinSet::new();
    for (account, task) in tasks {
        set.spawn(async move {
            let outcome = task.await;
            (account, outcome)
        });
    }

    let started = Instant::now();
    let mut not_found = 0usize;
    let mut errored = 0usize;

    loop {
        let remaining = deadline.saturating_sub(started.elapsed());
        let joined = match timeout(remaining, set.join_next()).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::error!(
                    "Timed out after {:?} with {} account(s) still in flight",
                    deadline,
                    set.len()
                );
                set.abort_all();
                return DispatchOutcome::TimedOut;
            }
        };

        match joined {
            // All accounts answered, none matched.
            None => return DispatchOutcome::Exhausted { not_found, errored },
            Some(Ok((account, QueryOutcome::Found(payload)))) => {
                tracing::debug!("Match found in account {}", account);
                // Count matches that finished in the same beat before the
                // survivors are aborted. First one in stays authoritative.
                let mut discarded = 0usize;
                while let Some(done) = set.try_join_next() {
                    if let Ok((other, QueryOutcome::Found(_))) = done {
                        tracing::warn!("Discarding additional match from account {}", other);
                        discarded += 1;
                    }
                }
                set.abort_all();
                return DispatchOutcome::Satisfied {
                    payload,
                    discarded_matches: discarded,
                };
            }
            Some(Ok((account, QueryOutcome::NotFound))) => {
                tracing::debug!("No match in account {}", account);
                not_found += 1;
            }
            Some(Ok((account, QueryOutcome::Errored(err)))) => {
                tracing::warn!("Query failed for account {}: {:#}", account, err);
                errored += 1;
            }
            Some(Err(join_err)) => {
                // Panics inside a task count as errors; aborts are only
                // triggered after this loop returns, so they never show up.
                tracing::error!("Query task failed: {}", join_err);
                errored += 1;
            }
        }
    }
}

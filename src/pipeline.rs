// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Sequential run pipeline.
//!
//! Runs a selection produced by [`resolve`](crate::op::resolve) in two
//! strictly separated phases. The preparation phase invokes every selected
//! operation's configuration step, folding each partial result into one
//! shared [`RunConfig`] where later contributions overwrite earlier ones.
//! Only once preparation has finished for the whole selection does the
//! execution phase run each action against the accumulated configuration,
//! in registration order, reporting elapsed time per operation and aborting
//! the entire run at the first failure. Hooks registered with
//! `on_all_complete` are queued as their operations succeed and fire only
//! after the whole selection has, in the order they were queued.
//!
//! Failure is fail-fast, not fail-safe: once an action errors, no later
//! action runs and no deferred hook fires. Nothing is retried, and there is
//! no summary beyond the per-operation notices emitted along the way.

use crate::{
    config::RunConfig,
    op::{OpError, Operation},
};

use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Run the whole selection against a seeded configuration.
///
/// # Errors
///
/// - Return [`PipelineError::Prep`] if a preparation step fails; no action
///   will have run yet.
/// - Return [`PipelineError::Action`] if an action fails; earlier operations
///   have completed and reported, later ones never start.
/// - Return [`PipelineError::Hook`] if a completion or deferred hook fails.
pub fn run(selection: &[&Operation], seed: RunConfig) -> Result<()> {
    debug!("preparing {} operations", selection.len());
    let mut config = seed;
    for op in selection {
        if let Some(prep) = &op.prep {
            let patch = match prep(&config) {
                Ok(patch) => patch,
                Err(source) => {
                    warn!("unable to prepare operation {}: {source}", op.name);
                    return Err(PipelineError::Prep {
                        operation: op.name.clone(),
                        source,
                    });
                }
            };
            config = config.merge(patch);
        }
    }

    debug!("executing {} operations", selection.len());
    let mut deferred: Vec<&Operation> = Vec::new();
    for op in selection {
        let start = Instant::now();
        if let Err(source) = (op.action)(&config) {
            warn!("unable to run operation {}: {source}", op.name);
            return Err(PipelineError::Action {
                operation: op.name.clone(),
                source,
            });
        }

        let elapsed = start.elapsed();
        match &op.on_success {
            Some(hook) => {
                if let Err(source) = hook(&config) {
                    warn!("completion hook of operation {} failed: {source}", op.name);
                    return Err(PipelineError::Hook {
                        operation: op.name.clone(),
                        source,
                    });
                }
                debug!("operation {} finished in {elapsed:.2?}", op.name);
            }
            None => info!("completed operation {} in {elapsed:.2?}", op.name),
        }

        if op.on_all_complete.is_some() {
            deferred.push(op);
        }
    }

    for op in &deferred {
        if let Some(hook) = &op.on_all_complete {
            if let Err(source) = hook(&config) {
                error!("deferred hook of operation {} failed: {source}", op.name);
                return Err(PipelineError::Hook {
                    operation: op.name.clone(),
                    source,
                });
            }
        }
    }

    Ok(())
}

/// Pipeline error types.
///
/// Each variant names the operation that sank the run. Failures are reported
/// where they happen, so holders of this error only need to decide the exit
/// status.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A preparation step fails before any action ran.
    #[error("unable to prepare operation {operation}")]
    Prep {
        operation: String,
        #[source]
        source: OpError,
    },

    /// An action fails mid-run.
    #[error("unable to run operation {operation}")]
    Action {
        operation: String,
        #[source]
        source: OpError,
    },

    /// A completion or deferred hook fails.
    #[error("hook of operation {operation} failed")]
    Hook {
        operation: String,
        #[source]
        source: OpError,
    },
}

/// Friendly result alias :3
type Result<T, E = PipelineError> = std::result::Result<T, E>;

// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Checkout cloning through libgit2.
//!
//! Cloning is the one place woodev talks to git as a library instead of
//! shelling out. Going through libgit2 gives per-object transfer progress
//! for the progress bar, and auth-git2 handles whatever credentials the
//! remote demands along the way.

use auth_git2::GitAuthenticator;
use git2::{build::RepoBuilder, Config, FetchOptions, RemoteCallbacks};
use indicatif::{ProgressBar, ProgressStyle};
use std::{path::Path, time};
use tracing::info;

/// Clone target branch of remote repository into target path.
///
/// The progress of the clone is displayed through a progress bar. If any
/// credentials are required for the clone to continue, then the user will be
/// prompted for that information accordingly.
///
/// # Errors
///
/// - Return [`GitError::Git2`] if libgit2 operations fail.
/// - Return [`GitError::StyleTemplate`] if the progress bar style cannot be
///   set.
pub fn clone_branch(url: &str, branch: &str, path: impl AsRef<Path>) -> Result<()> {
    let bar = ProgressBar::no_length();
    let style = ProgressStyle::with_template(
        "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}]",
    )?
    .progress_chars("-Cco.");
    bar.set_style(style);
    bar.set_message(url.to_string());
    bar.enable_steady_tick(time::Duration::from_millis(100));

    let authenticator = GitAuthenticator::default();
    let config = Config::open_default()?;

    let mut throttle = time::Instant::now();
    let mut rc = RemoteCallbacks::new();
    rc.credentials(authenticator.credentials(&config));
    rc.transfer_progress(|progress| {
        let stats = progress.to_owned();
        if throttle.elapsed() > time::Duration::from_millis(10) {
            throttle = time::Instant::now();
            bar.set_length(stats.total_objects() as u64);
            bar.set_position(stats.received_objects() as u64);
        }
        true
    });

    let mut fo = FetchOptions::new();
    fo.remote_callbacks(rc);
    RepoBuilder::new()
        .branch(branch)
        .fetch_options(fo)
        .clone(url, path.as_ref())?;

    bar.finish_and_clear();
    info!("cloned {url} at branch {branch} into {:?}", path.as_ref().display());

    Ok(())
}

/// Checkout cloning error types.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),

    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    StyleTemplate(#[from] indicatif::style::TemplateError),
}

/// Friendly result alias :3
pub type Result<T, E = GitError> = std::result::Result<T, E>;

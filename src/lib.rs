// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Streamline work on WooCommerce checkouts from the command line.
//!
//! Woodev wraps the repetitive parts of plugin development, e.g., cloning
//! and updating checkouts, building, linking and mounting a checkout into a
//! local site, provisioning that site, and running the PHP suite, as a short
//! list of named __operations__. One invocation selects any subset of them
//! by explicit name or by short flag. Selected operations gather their
//! configuration up front, preferring command-line values over interactive
//! prompts, and then run one at a time in a fixed order, stopping at the
//! first failure.
//!
//! # Module Layout
//!
//! The [`op`] and [`pipeline`] modules form the core: operation descriptors,
//! the registry, run selection, and the two-phase runner. The [`catalog`]
//! module declares every operation woodev actually ships. Everything else is
//! plumbing for talking to the outside world: subprocesses ([`syscall`]),
//! libgit2 ([`git`]), compose files ([`compose`]), the terminal ([`prompt`]),
//! and the file system ([`path`], [`config`]).

pub mod catalog;
pub mod compose;
pub mod config;
pub mod git;
pub mod op;
pub mod path;
pub mod pipeline;
pub mod prompt;
pub mod syscall;

// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use woodev::{
    catalog,
    config::{RunConfig, Settings},
    op,
    path::default_settings_path,
    pipeline::{self, PipelineError},
    prompt::InquirePrompter,
};

use anyhow::Result;
use clap::Parser;
use std::{path::PathBuf, process::exit, sync::Arc};
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  woodev [options] [operation]\n  woodev [options] <-u|-i|-b|-w|-l|-m|-p|-t>...",
    version
)]
struct Cli {
    /// Operation to run explicitly by name.
    #[arg(value_name = "operation")]
    operation: Option<String>,

    /// Rebase the checkout onto its upstream branch.
    #[arg(short, long)]
    update: bool,

    /// Install JS and PHP dependencies of the checkout.
    #[arg(short, long)]
    install: bool,

    /// Build the plugin.
    #[arg(short, long)]
    build: bool,

    /// Rebuild the admin client on change.
    #[arg(short, long)]
    watch: bool,

    /// Symlink the plugin into a local site.
    #[arg(short, long)]
    link: bool,

    /// Mount the plugin into a site's web container.
    #[arg(short, long)]
    mount: bool,

    /// Start the site environment.
    #[arg(short, long)]
    provision: bool,

    /// Run the PHP test suite.
    #[arg(short, long)]
    test: bool,

    /// Branch to work against instead of answering the prompt.
    #[arg(long, value_name = "branch")]
    branch: Option<String>,

    /// Local site name instead of answering the prompt.
    #[arg(long, value_name = "site")]
    site: Option<String>,

    /// Test filter for rerunning failing tests.
    #[arg(long, value_name = "target")]
    target: Option<String>,

    /// Checkout to operate on instead of the current directory.
    #[arg(long, value_name = "path")]
    path: Option<PathBuf>,

    /// Settings file to read instead of the default location.
    #[arg(long, value_name = "path")]
    config: Option<PathBuf>,

    /// Only report errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Short flags supplied on this invocation, as the registry knows them.
    fn flag_set(&self) -> Vec<String> {
        let toggles = [
            (self.update, "u"),
            (self.install, "i"),
            (self.build, "b"),
            (self.watch, "w"),
            (self.link, "l"),
            (self.mount, "m"),
            (self.provision, "p"),
            (self.test, "t"),
        ];

        toggles
            .into_iter()
            .filter(|(enabled, _)| *enabled)
            .map(|(_, flag)| flag.to_string())
            .collect()
    }

    /// Seed run configuration from value flags.
    ///
    /// Preparation steps consult these before prompting.
    fn seed(&self) -> RunConfig {
        RunConfig {
            branch: self.branch.clone(),
            directory: None,
            clone_path: self.path.clone(),
            site: self.site.clone(),
            target: self.target.clone(),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let layer = fmt::layer().compact().with_target(false).without_time();
    let default_level = if cli.quiet { "error" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap();
    tracing_subscriber::registry().with(layer).with(filter).init();

    if let Err(error) = run(cli) {
        // Pipeline failures report themselves as they happen.
        if error.downcast_ref::<PipelineError>().is_none() {
            error!("{error:?}");
        }
        exit(1);
    }

    exit(0)
}

fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load(default_settings_path()?)?,
    };

    let registry = catalog::registry(Arc::new(settings), Arc::new(InquirePrompter));
    let selection = op::resolve(&registry, cli.operation.as_deref(), &cli.flag_set())?;
    if selection.is_empty() {
        warn!("nothing to do");
        return Ok(());
    }

    pipeline::run(&selection, cli.seed())?;

    Ok(())
}

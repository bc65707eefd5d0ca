// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! The operation catalog.
//!
//! Every named recipe woodev knows, declared in the order they should run
//! when selected together. Commands follow the WooCommerce monorepo tooling:
//! pnpm and nx for installs and builds, wp-env for the PHP test
//! environment, ddev for local sites. The catalog only describes the work;
//! selection and sequencing live in [`op`](crate::op) and
//! [`pipeline`](crate::pipeline).
//!
//! Operations that share a need, e.g., the PHP test environment, share a
//! plain function instead of looking each other up by name.

use crate::{
    compose,
    config::{RunConfig, Settings},
    git,
    op::{OpError, Operation, Registry},
    prompt::Prompt,
    syscall,
};

use std::{env, ffi::OsStr, path::PathBuf, sync::Arc};
use tracing::info;

#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(not(target_os = "macos"))]
const OPENER: &str = "xdg-open";

/// Relative location of the plugin inside a checkout.
const PLUGIN_SUBDIR: &str = "plugins/woocommerce";

/// Workspace filter selecting the plugin package for pnpm.
const PLUGIN_FILTER: &str = "--filter=@woocommerce/plugin-woocommerce";

/// Build the full operation registry.
///
/// Registration order here is execution order everywhere else, so new
/// operations must be slotted in where they belong in a combined run, not
/// appended.
pub fn registry(settings: Arc<Settings>, prompt: Arc<dyn Prompt>) -> Registry {
    Registry::new([
        clone_op(Arc::clone(&settings), Arc::clone(&prompt)),
        update_op(),
        install_op(),
        build_op(),
        watch_op(),
        link_op(Arc::clone(&settings), Arc::clone(&prompt)),
        mount_op(Arc::clone(&settings), Arc::clone(&prompt)),
        provision_op(settings, prompt),
        test_php_prepare_op(),
        test_php_op(),
        test_php_failing_op(),
    ])
}

fn clone_op(settings: Arc<Settings>, prompt: Arc<dyn Prompt>) -> Operation {
    let prep_settings = Arc::clone(&settings);
    Operation::new("clone", move |config| {
        let branch = config.branch.as_deref().ok_or(OpError::MissingValue { key: "branch" })?;
        let clone_path = config
            .clone_path
            .as_deref()
            .ok_or(OpError::MissingValue { key: "clone_path" })?;
        git::clone_branch(&settings.remote_url, branch, clone_path)?;

        Ok(())
    })
    .prep(move |config| {
        let branch = match &config.branch {
            Some(branch) => branch.clone(),
            None => prompt.text(
                "What branch would you like to checkout?",
                Some(&prep_settings.default_branch),
            )?,
        };

        // Branch names make poor directory names.
        let directory = branch.replace('/', "-");
        let clone_path = match &config.clone_path {
            Some(path) => path.clone(),
            None => current_dir()?.join(&directory),
        };

        Ok(RunConfig {
            branch: Some(branch),
            directory: Some(directory),
            clone_path: Some(clone_path),
            ..RunConfig::default()
        })
    })
}

fn update_op() -> Operation {
    Operation::new("update", |config| {
        syscall::change_dir(checkout_dir(config)?)?;
        let branch = syscall::captured("git", ["rev-parse", "--abbrev-ref", "HEAD"])?;
        info!("rebasing {branch} onto origin/{branch}");
        syscall::interactive(
            "git",
            ["pull", "--rebase", "--autostash", "origin", branch.as_str()],
        )?;

        Ok(())
    })
    .flags(["u"])
}

fn install_op() -> Operation {
    Operation::new("install", |config| {
        syscall::change_dir(checkout_dir(config)?)?;
        syscall::interactive("pnpm", ["install"])?;
        syscall::interactive("pnpm", ["nx", "composer-install", "woocommerce"])?;

        Ok(())
    })
    .flags(["i"])
}

fn build_op() -> Operation {
    Operation::new("build", |config| {
        syscall::change_dir(checkout_dir(config)?)?;
        syscall::interactive("pnpm", ["nx", "composer-install", "woocommerce"])?;
        syscall::interactive("pnpm", ["nx", "build", "woocommerce"])?;

        Ok(())
    })
    .flags(["b"])
}

fn watch_op() -> Operation {
    Operation::new("watch", |config| {
        syscall::change_dir(checkout_dir(config)?)?;
        syscall::interactive("pnpm", ["nx", "build-watch", "woocommerce-admin"])?;

        Ok(())
    })
    .flags(["w"])
}

fn link_op(settings: Arc<Settings>, prompt: Arc<dyn Prompt>) -> Operation {
    Operation::new("link", move |config| {
        let site = config.site.as_deref().ok_or(OpError::MissingValue { key: "site" })?;
        let plugin = checkout_dir(config)?.join(PLUGIN_SUBDIR);
        let target = settings
            .site_dir(site)?
            .join("app/public/wp-content/plugins/woocommerce");
        syscall::interactive("ln", [OsStr::new("-fs"), plugin.as_os_str(), target.as_os_str()])?;

        Ok(())
    })
    .flags(["l"])
    .prep(site_prep(prompt, "Name of Local site to link?"))
    .on_success(|config| {
        if let Some(site) = &config.site {
            info!("linked checkout into site {site}");
        }

        Ok(())
    })
}

fn mount_op(settings: Arc<Settings>, prompt: Arc<dyn Prompt>) -> Operation {
    Operation::new("mount", move |config| {
        let site = config.site.as_deref().ok_or(OpError::MissingValue { key: "site" })?;
        let plugin = checkout_dir(config)?.join(PLUGIN_SUBDIR);
        let compose_path = settings
            .site_dir(site)?
            .join(".ddev")
            .join("docker-compose.mounts.yaml");
        if compose::mount_plugin(&compose_path, &plugin)? {
            info!("mounted {:?} into site {site}", plugin.display());
        } else {
            info!("site {site} already mounts {:?}", plugin.display());
        }

        Ok(())
    })
    .flags(["m"])
    .prep(site_prep(prompt, "Name of site to mount the checkout into?"))
}

fn provision_op(settings: Arc<Settings>, prompt: Arc<dyn Prompt>) -> Operation {
    Operation::new("provision", move |config| {
        let site = config.site.as_deref().ok_or(OpError::MissingValue { key: "site" })?;
        syscall::change_dir(settings.site_dir(site)?)?;
        syscall::interactive("ddev", ["start"])?;

        Ok(())
    })
    .flags(["p"])
    .prep(site_prep(prompt, "Name of site to provision?"))
    .on_all_complete(|config| {
        let site = config.site.as_deref().ok_or(OpError::MissingValue { key: "site" })?;
        let url = format!("https://{site}.ddev.site");
        info!("opening {url}");
        syscall::interactive(OPENER, [url.as_str()])?;

        Ok(())
    })
}

fn test_php_prepare_op() -> Operation {
    Operation::new("test:php:prepare", ensure_php_env)
}

fn test_php_op() -> Operation {
    Operation::new("test:php", |config| {
        ensure_php_env(config)?;
        syscall::interactive("pnpm", [PLUGIN_FILTER, "test:php:env"])?;

        Ok(())
    })
    .flags(["t"])
}

fn test_php_failing_op() -> Operation {
    Operation::new("test:php:failing", |config| {
        // A filter is required; rerunning everything defeats the point.
        let target = config.target.as_deref().ok_or(OpError::MissingValue { key: "target" })?;
        ensure_php_env(config)?;
        syscall::interactive(
            "pnpm",
            [PLUGIN_FILTER, "test:php:env", "--", "--filter", target],
        )?;

        Ok(())
    })
}

/// Bring up the wp-env PHP test environment for the checkout.
///
/// Idempotent, since wp-env reuses a running environment. Shared by every
/// operation that needs the environment ready.
fn ensure_php_env(config: &RunConfig) -> Result<(), OpError> {
    syscall::change_dir(checkout_dir(config)?)?;
    syscall::interactive("pnpm", [PLUGIN_FILTER, "env:test"])?;

    Ok(())
}

/// Ask once for the site name; keep whatever an earlier step already set.
fn site_prep(
    prompt: Arc<dyn Prompt>,
    message: &'static str,
) -> impl Fn(&RunConfig) -> Result<RunConfig, OpError> {
    move |config| {
        if config.site.is_some() {
            return Ok(RunConfig::default());
        }

        let site = prompt.text(message, None)?;

        Ok(RunConfig {
            site: Some(site),
            ..RunConfig::default()
        })
    }
}

fn checkout_dir(config: &RunConfig) -> Result<PathBuf, OpError> {
    match &config.clone_path {
        Some(path) => Ok(path.clone()),
        None => current_dir(),
    }
}

fn current_dir() -> Result<PathBuf, OpError> {
    Ok(env::current_dir().map_err(syscall::SyscallError::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{Prompt, PromptError};
    use pretty_assertions::assert_eq;
    use std::{
        cell::RefCell,
        collections::{HashSet, VecDeque},
    };

    struct ScriptedPrompt(RefCell<VecDeque<&'static str>>);

    impl ScriptedPrompt {
        fn new(answers: impl IntoIterator<Item = &'static str>) -> Self {
            Self(RefCell::new(answers.into_iter().collect()))
        }
    }

    impl Prompt for ScriptedPrompt {
        fn text(&self, _message: &str, _initial: Option<&str>) -> Result<String, PromptError> {
            self.0
                .borrow_mut()
                .pop_front()
                .map(ToString::to_string)
                .ok_or_else(|| PromptError::from(inquire::InquireError::OperationCanceled))
        }
    }

    fn sample_registry(answers: impl IntoIterator<Item = &'static str>) -> Registry {
        registry(
            Arc::new(Settings::default()),
            Arc::new(ScriptedPrompt::new(answers)),
        )
    }

    #[test]
    fn names_are_unique_and_ordered() {
        let registry = sample_registry([]);

        let names: Vec<&str> = registry.iter().map(Operation::name).collect();
        let expect = vec![
            "clone",
            "update",
            "install",
            "build",
            "watch",
            "link",
            "mount",
            "provision",
            "test:php:prepare",
            "test:php",
            "test:php:failing",
        ];
        assert_eq!(names, expect);

        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), registry.len());
        for (index, op) in registry.iter().enumerate() {
            assert_eq!(op.order(), index);
        }
    }

    #[test]
    fn trigger_flags_match_the_cli_surface() {
        let registry = sample_registry([]);

        let expect = [
            ("update", "u"),
            ("install", "i"),
            ("build", "b"),
            ("watch", "w"),
            ("link", "l"),
            ("mount", "m"),
            ("provision", "p"),
            ("test:php", "t"),
        ];
        for (name, flag) in expect {
            assert_eq!(registry.get(name).unwrap().flags, vec![flag.to_string()]);
        }
        for name in ["clone", "test:php:prepare", "test:php:failing"] {
            assert!(registry.get(name).unwrap().flags.is_empty());
        }
    }

    #[test]
    fn clone_prep_derives_paths_from_prompted_branch() {
        let registry = sample_registry(["fix/flaky-totals"]);
        let clone = registry.get("clone").unwrap();

        let patch = (clone.prep.as_ref().unwrap())(&RunConfig::default()).unwrap();

        assert_eq!(patch.branch.as_deref(), Some("fix/flaky-totals"));
        assert_eq!(patch.directory.as_deref(), Some("fix-flaky-totals"));
        assert!(patch.clone_path.unwrap().ends_with("fix-flaky-totals"));
    }

    #[test]
    fn clone_prep_prefers_supplied_branch_over_prompting() {
        // No scripted answers: any prompt would error the preparation.
        let registry = sample_registry([]);
        let clone = registry.get("clone").unwrap();
        let config = RunConfig {
            branch: Some("release/9.6".into()),
            ..RunConfig::default()
        };

        let patch = (clone.prep.as_ref().unwrap())(&config).unwrap();

        assert_eq!(patch.branch.as_deref(), Some("release/9.6"));
        assert_eq!(patch.directory.as_deref(), Some("release-9.6"));
    }

    #[test]
    fn clone_prep_keeps_a_supplied_clone_path() {
        let registry = sample_registry([]);
        let clone = registry.get("clone").unwrap();
        let config = RunConfig {
            branch: Some("trunk".into()),
            clone_path: Some(PathBuf::from("/srv/checkouts/trunk")),
            ..RunConfig::default()
        };

        let patch = (clone.prep.as_ref().unwrap())(&config).unwrap();

        assert_eq!(patch.clone_path, Some(PathBuf::from("/srv/checkouts/trunk")));
    }

    #[test]
    fn site_prompt_skipped_when_site_already_known() {
        let registry = sample_registry([]);
        let config = RunConfig {
            site: Some("woo-dev".into()),
            ..RunConfig::default()
        };

        for name in ["link", "mount", "provision"] {
            let op = registry.get(name).unwrap();
            let patch = (op.prep.as_ref().unwrap())(&config).unwrap();
            assert_eq!(patch, RunConfig::default());
        }
    }

    #[test]
    fn failing_tests_require_a_target() {
        let registry = sample_registry([]);
        let op = registry.get("test:php:failing").unwrap();

        let result = (op.action)(&RunConfig::default());

        assert!(matches!(result, Err(OpError::MissingValue { key: "target" })));
    }
}

// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Compose-file mount management.
//!
//! Local sites run under ddev, which folds any `docker-compose.*.yaml` file
//! placed next to its own configuration into the generated stack. Woodev
//! owns one such file per site and uses it to bind-mount a checkout's plugin
//! directory into the web container. The file is rewritten read-modify-write
//! so that entries added by hand survive a remount.

use serde_yaml::{Mapping, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Where the web container keeps its plugins.
pub const CONTAINER_PLUGINS_DIR: &str = "/var/www/html/wp-content/plugins";

/// Declare a bind mount for target plugin directory in the compose file.
///
/// The mount lands in the volume list of the `web` service, creating the
/// compose file and any missing intermediate nodes along the way. Returns
/// false when an identical mount is already declared, in which case the file
/// is left untouched. Unrelated services and volumes are always preserved.
///
/// # Errors
///
/// - Return [`ComposeError::BadPluginPath`] if the plugin path has no final
///   component to name the mount after.
/// - Return [`ComposeError::Layout`] if an existing compose file does not
///   have the expected mapping/sequence shape.
/// - Return [`ComposeError::Read`] or [`ComposeError::Write`] on file I/O
///   failure.
pub fn mount_plugin(
    compose_path: impl AsRef<Path>,
    plugin_path: impl AsRef<Path>,
) -> Result<bool> {
    let compose_path = compose_path.as_ref();
    let plugin_path = plugin_path.as_ref();
    let name = plugin_path
        .file_name()
        .ok_or_else(|| ComposeError::BadPluginPath {
            path: plugin_path.to_path_buf(),
        })?;
    let mount = format!(
        "{}:{}/{}",
        plugin_path.display(),
        CONTAINER_PLUGINS_DIR,
        name.to_string_lossy()
    );

    let mut doc = read_document(compose_path)?;
    let volumes = {
        let services = submapping(&mut doc, "services", compose_path)?;
        let web = submapping(services, "web", compose_path)?;
        sequence(web, "volumes", compose_path)?
    };

    if volumes.iter().any(|entry| entry.as_str() == Some(mount.as_str())) {
        debug!("{mount} already declared in {:?}", compose_path.display());
        return Ok(false);
    }
    volumes.push(Value::String(mount));

    if let Some(parent) = compose_path.parent() {
        mkdirp::mkdirp(parent).map_err(|source| ComposeError::Write {
            source,
            path: compose_path.to_path_buf(),
        })?;
    }
    let data = serde_yaml::to_string(&doc)?;
    fs::write(compose_path, data).map_err(|source| ComposeError::Write {
        source,
        path: compose_path.to_path_buf(),
    })?;

    Ok(true)
}

fn read_document(path: &Path) -> Result<Mapping> {
    if !path.exists() {
        return Ok(Mapping::new());
    }

    let data = fs::read_to_string(path).map_err(|source| ComposeError::Read {
        source,
        path: path.to_path_buf(),
    })?;
    let doc: Value = serde_yaml::from_str(&data)?;
    match doc {
        Value::Mapping(mapping) => Ok(mapping),
        // An empty file parses to null; treat it as a blank document.
        Value::Null => Ok(Mapping::new()),
        _ => Err(ComposeError::Layout {
            path: path.to_path_buf(),
        }),
    }
}

fn submapping<'a>(parent: &'a mut Mapping, key: &str, path: &Path) -> Result<&'a mut Mapping> {
    if !parent.contains_key(key) {
        parent.insert(Value::from(key), Value::Mapping(Mapping::new()));
    }

    match parent.get_mut(key) {
        Some(Value::Mapping(mapping)) => Ok(mapping),
        _ => Err(ComposeError::Layout {
            path: path.to_path_buf(),
        }),
    }
}

fn sequence<'a>(parent: &'a mut Mapping, key: &str, path: &Path) -> Result<&'a mut Vec<Value>> {
    if !parent.contains_key(key) {
        parent.insert(Value::from(key), Value::Sequence(Vec::new()));
    }

    match parent.get_mut(key) {
        Some(Value::Sequence(sequence)) => Ok(sequence),
        _ => Err(ComposeError::Layout {
            path: path.to_path_buf(),
        }),
    }
}

/// Compose-file manipulation error types.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// Compose file cannot be read from.
    #[error("failed to read compose file at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Compose file cannot be written to.
    #[error("failed to write compose file at {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Existing compose file does not look like a compose document.
    #[error("compose file at {:?} is not laid out like a compose document", path.display())]
    Layout { path: PathBuf },

    /// Plugin path ends without a component to name the mount after.
    #[error("plugin path {:?} has no final component to mount", path.display())]
    BadPluginPath { path: PathBuf },

    /// YAML parsing or serialization fails.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Friendly result alias :3
pub type Result<T, E = ComposeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    const MOUNT: &str = "/srv/woo/plugins/woocommerce:/var/www/html/wp-content/plugins/woocommerce";

    fn declared_mounts(path: &str) -> Vec<String> {
        let data = fs::read_to_string(path).unwrap();
        let doc: Value = serde_yaml::from_str(&data).unwrap();
        doc["services"]["web"]["volumes"]
            .as_sequence()
            .unwrap()
            .iter()
            .map(|entry| entry.as_str().unwrap().to_string())
            .collect()
    }

    #[sealed_test]
    fn mount_creates_missing_compose_file() -> anyhow::Result<()> {
        let added = mount_plugin("docker-compose.mounts.yaml", "/srv/woo/plugins/woocommerce")?;

        assert!(added);
        assert_eq!(declared_mounts("docker-compose.mounts.yaml"), vec![MOUNT.to_string()]);

        Ok(())
    }

    #[sealed_test]
    fn remount_leaves_the_file_untouched() -> anyhow::Result<()> {
        mount_plugin("docker-compose.mounts.yaml", "/srv/woo/plugins/woocommerce")?;
        let before = fs::read_to_string("docker-compose.mounts.yaml")?;

        let added = mount_plugin("docker-compose.mounts.yaml", "/srv/woo/plugins/woocommerce")?;
        let after = fs::read_to_string("docker-compose.mounts.yaml")?;

        assert!(!added);
        assert_eq!(before, after);

        Ok(())
    }

    #[sealed_test]
    fn mount_preserves_unrelated_entries() -> anyhow::Result<()> {
        let existing = indoc! {r#"
            services:
              db:
                image: mariadb:10.11
              web:
                volumes:
                - /srv/handmade:/var/www/html/wp-content/uploads
        "#};
        fs::write("docker-compose.mounts.yaml", existing)?;

        let added = mount_plugin("docker-compose.mounts.yaml", "/srv/woo/plugins/woocommerce")?;

        assert!(added);
        let data = fs::read_to_string("docker-compose.mounts.yaml")?;
        let doc: Value = serde_yaml::from_str(&data)?;
        assert_eq!(doc["services"]["db"]["image"].as_str(), Some("mariadb:10.11"));
        assert_eq!(
            declared_mounts("docker-compose.mounts.yaml"),
            vec![
                "/srv/handmade:/var/www/html/wp-content/uploads".to_string(),
                MOUNT.to_string(),
            ],
        );

        Ok(())
    }

    #[sealed_test]
    fn scalar_document_is_rejected() -> anyhow::Result<()> {
        fs::write("docker-compose.mounts.yaml", "just a string\n")?;

        let result = mount_plugin("docker-compose.mounts.yaml", "/srv/woo/plugins/woocommerce");

        assert!(matches!(result, Err(ComposeError::Layout { .. })));

        Ok(())
    }

    #[test]
    fn plugin_path_must_have_a_final_component() {
        let result = mount_plugin("docker-compose.mounts.yaml", "/");
        assert!(matches!(result, Err(ComposeError::BadPluginPath { .. })));
    }
}

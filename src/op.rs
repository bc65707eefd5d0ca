// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Operation descriptors, the registry, and run selection.
//!
//! Every piece of work woodev can do is declared up front as an
//! [`Operation`]: a named recipe with an optional configuration-gathering
//! step and a required action. Operations live in a [`Registry`] built once
//! at startup and handed to whoever needs it; registration order is the one
//! and only execution order, no matter how an operation was selected.
//! [`resolve`] turns raw command-line input, i.e., an optional explicit
//! operation name plus a set of short flags, into the ordered, deduplicated
//! selection to run.

use crate::config::RunConfig;

use std::collections::HashSet;

/// Configuration-gathering step of an operation.
///
/// Reads the configuration accumulated so far and returns a partial
/// configuration to merge on top of it. May suspend on interactive prompts.
pub type PrepFn = Box<dyn Fn(&RunConfig) -> Result<RunConfig, OpError>>;

/// Effect of an operation, or one of its reporting hooks.
pub type ActionFn = Box<dyn Fn(&RunConfig) -> Result<(), OpError>>;

/// A named, orderable unit of work.
///
/// Built through a small chain of constructors: [`Operation::new`] takes the
/// name and the action, and the remaining pieces are bolted on as needed.
/// The order field is owned by the registry; whatever it holds before
/// registration is meaningless.
pub struct Operation {
    pub(crate) name: String,
    pub(crate) order: usize,
    pub(crate) flags: Vec<String>,
    pub(crate) prep: Option<PrepFn>,
    pub(crate) action: ActionFn,
    pub(crate) on_success: Option<ActionFn>,
    pub(crate) on_all_complete: Option<ActionFn>,
}

impl Operation {
    /// Construct new operation with target name and action.
    pub fn new(
        name: impl Into<String>,
        action: impl Fn(&RunConfig) -> Result<(), OpError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            order: 0,
            flags: Vec::new(),
            prep: None,
            action: Box::new(action),
            on_success: None,
            on_all_complete: None,
        }
    }

    /// Short flags that select this operation.
    ///
    /// Operations without flags can only be selected by explicit name.
    pub fn flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a configuration-gathering step.
    pub fn prep(mut self, prep: impl Fn(&RunConfig) -> Result<RunConfig, OpError> + 'static) -> Self {
        self.prep = Some(Box::new(prep));
        self
    }

    /// Replace the default completion notice with a custom hook.
    pub fn on_success(
        mut self,
        hook: impl Fn(&RunConfig) -> Result<(), OpError> + 'static,
    ) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    /// Attach a hook deferred until every selected operation has succeeded.
    pub fn on_all_complete(
        mut self,
        hook: impl Fn(&RunConfig) -> Result<(), OpError> + 'static,
    ) -> Self {
        self.on_all_complete = Some(Box::new(hook));
        self
    }

    /// Name of this operation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position this operation was registered at.
    pub fn order(&self) -> usize {
        self.order
    }
}

/// The full, ordered collection of operations.
///
/// Immutable once built. Registration order assigns each operation its
/// order, which is never reassigned afterwards, and names are expected to be
/// unique across the whole registry.
pub struct Registry {
    ops: Vec<Operation>,
}

impl Registry {
    /// Construct new registry from operations in registration order.
    pub fn new(ops: impl IntoIterator<Item = Operation>) -> Self {
        let mut ops: Vec<Operation> = ops.into_iter().collect();
        for (order, op) in ops.iter_mut().enumerate() {
            op.order = order;
        }

        debug_assert!(
            ops.iter().map(|op| op.name.as_str()).collect::<HashSet<_>>().len() == ops.len(),
            "operation names must be unique",
        );

        Self { ops }
    }

    /// Look up an operation by name.
    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.ops.iter().find(|op| op.name == name)
    }

    /// Iterate operations in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.ops.iter()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Decide which operations to run from command-line input.
///
/// An explicit name must exist in the registry, and selects exactly that
/// operation. Every operation whose flags intersect the supplied flag set is
/// selected as well. The union is deduplicated by name, first occurrence
/// wins, and sorted by registration order, so the order flags were supplied
/// in never matters. An empty selection is a valid outcome, not an error.
///
/// # Errors
///
/// - Return [`SelectError::UnknownOperation`] if the explicit name does not
///   exist in the registry.
pub fn resolve<'a>(
    registry: &'a Registry,
    explicit: Option<&str>,
    flags: &[String],
) -> Result<Vec<&'a Operation>, SelectError> {
    let mut picked: Vec<&Operation> = Vec::new();
    if let Some(name) = explicit {
        let op = registry
            .get(name)
            .ok_or_else(|| SelectError::UnknownOperation(name.to_owned()))?;
        picked.push(op);
    }
    picked.extend(
        registry
            .iter()
            .filter(|op| op.flags.iter().any(|flag| flags.contains(flag))),
    );

    let mut seen = HashSet::new();
    picked.retain(|op| seen.insert(op.name.clone()));
    picked.sort_by_key(|op| op.order);

    Ok(picked)
}

/// Selection error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum SelectError {
    /// Explicit operation name does not exist in the registry.
    #[error("\"{0}\" is an invalid operation")]
    UnknownOperation(String),
}

/// All possible failure causes inside an operation's prep, action, or hooks.
#[derive(Debug, thiserror::Error)]
pub enum OpError {
    /// Interactive prompting fails.
    #[error(transparent)]
    Prompt(#[from] crate::prompt::PromptError),

    /// External command invocation fails.
    #[error(transparent)]
    Syscall(#[from] crate::syscall::SyscallError),

    /// Checkout cloning fails.
    #[error(transparent)]
    Git(#[from] crate::git::GitError),

    /// Compose-file manipulation fails.
    #[error(transparent)]
    Compose(#[from] crate::compose::ComposeError),

    /// Path resolution fails.
    #[error(transparent)]
    Path(#[from] crate::path::NoWayHome),

    /// A value the operation needs was never supplied nor prepared.
    #[error("no value given for {key}")]
    MissingValue { key: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    fn noop(name: &str, flags: &[&str]) -> Operation {
        Operation::new(name, |_| Ok(())).flags(flags.iter().copied())
    }

    fn sample() -> Registry {
        Registry::new([
            noop("alpha", &[]),
            noop("bravo", &["x"]),
            noop("charlie", &["x"]),
            noop("delta", &["y"]),
        ])
    }

    fn names<'a>(selection: &'a [&'a Operation]) -> Vec<&'a str> {
        selection.iter().map(|op| op.name()).collect()
    }

    #[test]
    fn registration_position_assigns_order() {
        let registry = sample();
        for (index, op) in registry.iter().enumerate() {
            assert_eq!(op.order(), index);
        }
    }

    #[test]
    fn lookup_by_name() {
        let registry = sample();
        assert_eq!(registry.get("charlie").map(Operation::order), Some(2));
        assert!(registry.get("zulu").is_none());
    }

    #[test_case(None, &["x"], &["bravo", "charlie"]; "flags pick every match in registration order")]
    #[test_case(Some("alpha"), &["x"], &["alpha", "bravo", "charlie"]; "explicit name unions with flags")]
    #[test_case(Some("charlie"), &["x"], &["bravo", "charlie"]; "duplicate selection collapses to one")]
    #[test_case(Some("delta"), &[], &["delta"]; "explicit name alone")]
    #[test_case(None, &[], &[]; "no input selects nothing")]
    #[test_case(None, &["y", "x"], &["bravo", "charlie", "delta"]; "flag order never changes execution order")]
    #[test]
    fn resolve_selection(explicit: Option<&str>, flags: &[&str], expect: &[&str]) {
        let registry = sample();
        let flags: Vec<String> = flags.iter().map(ToString::to_string).collect();

        let selection = resolve(&registry, explicit, &flags).unwrap();

        self::assert_eq!(names(&selection), expect);
    }

    #[test]
    fn unknown_explicit_name_fails() {
        let registry = sample();

        let result = resolve(&registry, Some("zulu"), &["x".to_string()]);

        assert!(matches!(result, Err(SelectError::UnknownOperation(name)) if name == "zulu"));
    }
}

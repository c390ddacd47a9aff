//! Module paths inside `client/src` and resolution of the paths a file names.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component, Path};

/// Top-level directories that hold layered modules.
pub(crate) const LAYERS: [&str; 3] = ["domain", "inbound", "outbound"];

/// Absolute module path inside the client crate, without the `crate` root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ModulePath(Vec<String>);

impl ModulePath {
    pub(crate) fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Parse a `::`-separated path such as `outbound::rest`.
    pub(crate) fn parse(path: &str) -> Self {
        Self(path.split("::").map(str::to_owned).collect())
    }

    /// Whether `self` is `prefix` or nested inside it.
    pub(crate) fn starts_with(&self, prefix: &Self) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// The first `depth` segments.
    pub(crate) fn truncated(&self, depth: usize) -> Self {
        Self(self.0.iter().take(depth).cloned().collect())
    }

    pub(crate) fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_owned());
        Self(segments)
    }

    fn joined(&self, tail: &[String]) -> Self {
        let mut segments = self.0.clone();
        segments.extend_from_slice(tail);
        Self(segments)
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("::"))
    }
}

/// How a file under `client/src` takes part in the lint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SourceRole {
    /// `lib.rs`, `main.rs`, `app.rs` and `config.rs` wire every layer
    /// together and are not checked.
    CompositionRoot,
    /// A `tests.rs` file pulled in by `#[cfg(test)] mod tests;`.
    TestOnly,
    /// A module inside one of the layers.
    Layered(ModulePath),
    /// A file outside every known layer.
    Unclassified,
}

impl SourceRole {
    pub(crate) fn of(relative: &Path) -> Self {
        let mut segments = Vec::new();
        for component in relative.components() {
            let Component::Normal(part) = component else {
                return Self::Unclassified;
            };
            segments.push(part.to_string_lossy().into_owned());
        }
        let Some(file_name) = segments.pop() else {
            return Self::Unclassified;
        };
        let Some(stem) = file_name.strip_suffix(".rs") else {
            return Self::Unclassified;
        };
        if segments.is_empty() {
            return Self::CompositionRoot;
        }
        if !segments
            .first()
            .is_some_and(|layer| LAYERS.contains(&layer.as_str()))
        {
            return Self::Unclassified;
        }
        if stem == "tests" {
            return Self::TestOnly;
        }
        if stem != "mod" {
            segments.push(stem.to_owned());
        }
        Self::Layered(ModulePath(segments))
    }
}

/// What a path named in a source file refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// An item of the client crate, as an absolute module path.
    Internal(ModulePath),
    /// An item of another crate, named by that crate's root.
    External(String),
}

/// Resolve `segments` as written inside `current`.
///
/// `children` holds the modules declared directly inside `current`, which
/// 2018-edition paths may name without a `self::` prefix.
pub(crate) fn resolve(
    current: &ModulePath,
    children: &BTreeSet<String>,
    segments: &[String],
) -> Option<Target> {
    let (first, rest) = segments.split_first()?;
    match first.as_str() {
        "crate" | "ledger_client" => Some(Target::Internal(ModulePath::new(rest.to_vec()))),
        "self" => Some(Target::Internal(current.joined(rest))),
        "super" => {
            let supers = segments.iter().take_while(|s| *s == "super").count();
            let depth = current.0.len().checked_sub(supers)?;
            let tail = segments.get(supers..)?;
            Some(Target::Internal(current.truncated(depth).joined(tail)))
        }
        name if children.contains(name) => Some(Target::Internal(current.joined(segments))),
        name if rest.is_empty() || name == "Self" => None,
        name => Some(Target::External(name.to_owned())),
    }
}

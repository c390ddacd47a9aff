//! Layering lint for the ledger client.
//!
//! Every file under `client/src/{domain,inbound,outbound}` is parsed and each
//! path it names is resolved to an absolute module or an external crate. The
//! resolved targets are checked against the client's rule table:
//!
//! - `domain` never reaches adapters, the composition root or settings, and
//!   `domain::ports` never reaches the domain services built on them;
//! - each inbound adapter reaches only itself, `crate::domain` and
//!   `crate::app`; each outbound adapter reaches only itself and
//!   `crate::domain`;
//! - transport and host crates stay with the adapters that own them, so
//!   `reqwest` appears only in the REST, Firestore and identity adapters.
//!
//! The composition root (`lib.rs`, `main.rs`, `app.rs`, `config.rs`) and
//! `#[cfg(test)]` code are exempt. Run it with `cargo run -p architecture-lint`.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

mod imports;
mod module_path;
mod rules;
mod walk;

use module_path::SourceRole;

/// A rule broken at a specific line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File path relative to `client/src`.
    pub file: PathBuf,
    /// 1-based line of the first offending path.
    pub line: usize,
    /// Which rule was broken and how.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file.display(), self.line, self.message)
    }
}

/// Failure modes returned by the architecture lint.
#[derive(Debug, thiserror::Error)]
pub enum ArchitectureLintError {
    /// Reading the source tree failed.
    #[error("failed to read client sources: {0}")]
    Io(#[from] io::Error),
    /// A source file is not valid Rust.
    #[error("failed to parse {}: {message}", file.display())]
    Parse {
        /// File path relative to `client/src`.
        file: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
    /// A source file sits outside the composition root and every layer.
    #[error("{} is outside domain/, inbound/ and outbound/", file.display())]
    Unclassified {
        /// Offending path.
        file: PathBuf,
    },
    /// One or more rules were broken.
    #[error("{}", render_violations(.0))]
    Violations(Vec<Violation>),
}

/// A Rust source file to be linted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSource {
    /// Path relative to `client/src`.
    pub file: PathBuf,
    /// File contents.
    pub contents: String,
}

/// Lint the client crate sources on disk.
///
/// `client_dir` must be the `client/` directory at the repository root.
///
/// # Errors
///
/// Returns [`ArchitectureLintError`] when the tree cannot be read or parsed,
/// or when any rule is broken.
pub fn lint_client_sources(client_dir: &Path) -> Result<(), ArchitectureLintError> {
    let sources = walk::read_sources(&client_dir.join("src"))?;
    lint_sources(&sources)
}

/// Lint in-memory sources whose paths are relative to `client/src`.
///
/// # Errors
///
/// Returns [`ArchitectureLintError`] when a source cannot be classified or
/// parsed, or when any rule is broken.
pub fn lint_sources(sources: &[LintSource]) -> Result<(), ArchitectureLintError> {
    let mut violations = Vec::new();
    for source in sources {
        let module = match SourceRole::of(&source.file) {
            SourceRole::CompositionRoot | SourceRole::TestOnly => continue,
            SourceRole::Unclassified => {
                return Err(ArchitectureLintError::Unclassified {
                    file: source.file.clone(),
                });
            }
            SourceRole::Layered(module) => module,
        };
        let parsed =
            syn::parse_file(&source.contents).map_err(|err| ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: err.to_string(),
            })?;
        violations.extend(file_violations(&source.file, module, &parsed));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ArchitectureLintError::Violations(violations))
    }
}

/// Violations in one file, one per distinct message at its first line.
fn file_violations(
    file: &Path,
    module: module_path::ModulePath,
    parsed: &syn::File,
) -> Vec<Violation> {
    let mut first_seen: BTreeMap<String, usize> = BTreeMap::new();
    for reference in imports::references(module, parsed) {
        for message in rules::violations_for(&reference.module, &reference.target) {
            first_seen
                .entry(message)
                .and_modify(|line| *line = (*line).min(reference.line))
                .or_insert(reference.line);
        }
    }

    let mut violations: Vec<_> = first_seen
        .into_iter()
        .map(|(message, line)| Violation {
            file: file.to_path_buf(),
            line,
            message,
        })
        .collect();
    violations.sort_by_key(|violation| violation.line);
    violations
}

fn render_violations(violations: &[Violation]) -> String {
    let mut by_file: BTreeMap<&Path, Vec<&Violation>> = BTreeMap::new();
    for violation in violations {
        by_file
            .entry(violation.file.as_path())
            .or_default()
            .push(violation);
    }
    let mut out = format!(
        "{} layering violation(s) in {} file(s):",
        violations.len(),
        by_file.len()
    );
    for (file, found) in by_file {
        out.push_str(&format!("\n  {}", file.display()));
        for violation in found {
            out.push_str(&format!("\n    line {}: {}", violation.line, violation.message));
        }
    }
    out
}

#[cfg(test)]
mod tests;

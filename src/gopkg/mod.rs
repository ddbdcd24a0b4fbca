//! gopkg
//!
//! Reading and editing dep's `Gopkg.toml`.
//!
//! # Modules
//!
//! - [`emit`] - Rendering constraints as `[[override]]` blocks
//!
//! # Design
//!
//! A [`GopkgDocument`] keeps two views of the same text: a typed one (via
//! `toml`) for reading constraints, and a `toml_edit` document for edits.
//! Edits go through the second view only, so hand-written entries and
//! comments survive byte for byte.
//!
//! # Metadata keys
//!
//! For a tool named `<tool>` (`gomod` or `govendor`):
//!
//! - `<tool>-override` on a `[[constraint]]` requests expansion;
//! - `<tool>-exclude-prefixes` lists package prefixes to ignore;
//! - `<tool>-overridden` marks an `[[override]]` a previous run injected.

pub mod emit;

use std::io::Write;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use toml_edit::DocumentMut;

use crate::core::types::{Oid, ProjectRoot, TypeError};
use crate::source::{ProjectIdentifier, VersionMatcher};

/// Errors from Gopkg.toml handling.
#[derive(Debug, Error)]
pub enum GopkgError {
    /// The document is not valid TOML or has the wrong shape.
    #[error("error decoding Gopkg.toml: {message}")]
    Parse {
        /// Parser message
        message: String,
    },

    /// No constraint asks for the tool's expansion.
    #[error("no constraint has {key} specified")]
    NoOverrideRequested {
        /// The metadata key that was looked for
        key: String,
    },

    /// A metadata value has the wrong type.
    #[error("constraint {name}: {key} must be an array of strings")]
    InvalidMetadata {
        /// Constraint name
        name: String,
        /// Offending key
        key: String,
    },

    /// A constraint or override names an invalid project.
    #[error("invalid project name {name:?}")]
    InvalidName {
        /// The name
        name: String,
        /// Validation failure
        #[source]
        source: TypeError,
    },

    /// A pin names something other than a full commit hash.
    #[error("invalid revision {revision:?} for {name}")]
    InvalidRevision {
        /// Project name
        name: String,
        /// The rejected revision
        revision: String,
        /// Validation failure
        #[source]
        source: TypeError,
    },

    /// An override does not pin exactly one thing.
    #[error("override {name}: {message}")]
    InvalidOverride {
        /// Override name
        name: String,
        /// What was wrong
        message: String,
    },
}

/// A tool that injects overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideTool {
    /// Overrides derived from a dependency's `go.mod`
    GoMod,
    /// Overrides derived from a dependency's `vendor/vendor.json`
    GoVendor,
}

impl OverrideTool {
    /// The tool's metadata prefix.
    pub fn name(self) -> &'static str {
        match self {
            OverrideTool::GoMod => "gomod",
            OverrideTool::GoVendor => "govendor",
        }
    }

    /// Key requesting expansion on a constraint.
    pub fn request_key(self) -> String {
        format!("{}-override", self.name())
    }

    /// Key marking an injected override.
    pub fn marker_key(self) -> String {
        format!("{}-overridden", self.name())
    }

    /// Key listing excluded package prefixes.
    pub fn exclude_key(self) -> String {
        format!("{}-exclude-prefixes", self.name())
    }

    /// Every key that marks an injected override, including a historical
    /// misspelling still found in old files.
    pub fn marker_keys(self) -> Vec<String> {
        let mut keys = vec![self.marker_key()];
        if self == OverrideTool::GoVendor {
            keys.push("govendor-overriden".to_string());
        }
        keys
    }
}

impl std::fmt::Display for OverrideTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A `[[constraint]]` or `[[override]]` entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GopkgEntry {
    /// Project name
    pub name: String,
    /// Branch pin
    #[serde(default)]
    pub branch: Option<String>,
    /// Revision pin
    #[serde(default)]
    pub revision: Option<String>,
    /// Version pin or range
    #[serde(default)]
    pub version: Option<String>,
    /// Alternate source location
    #[serde(default)]
    pub source: Option<String>,
    /// Free-form metadata
    #[serde(default)]
    pub metadata: Option<toml::Table>,
}

impl GopkgEntry {
    /// Whether metadata holds `key` with any value other than `false`.
    pub fn has_flag(&self, key: &str) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .is_some_and(|v| v.as_bool() != Some(false))
    }

    /// A string-array metadata value; absent means empty.
    pub fn string_list(&self, key: &str) -> Result<Vec<String>, GopkgError> {
        let Some(value) = self.metadata.as_ref().and_then(|m| m.get(key)) else {
            return Ok(Vec::new());
        };
        let invalid = || GopkgError::InvalidMetadata {
            name: self.name.clone(),
            key: key.to_string(),
        };
        value
            .as_array()
            .ok_or_else(invalid)?
            .iter()
            .map(|item| item.as_str().map(String::from).ok_or_else(invalid))
            .collect()
    }

    /// The project this entry names.
    pub fn project(&self) -> Result<ProjectIdentifier, GopkgError> {
        let root = ProjectRoot::new(self.name.as_str()).map_err(|source| GopkgError::InvalidName {
            name: self.name.clone(),
            source,
        })?;
        Ok(ProjectIdentifier::new(root).with_source(self.source.clone()))
    }

    /// The versions this entry accepts.
    pub fn matcher(&self) -> VersionMatcher {
        VersionMatcher::from_constraint(
            self.branch.as_deref(),
            self.version.as_deref(),
            self.revision.as_deref(),
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GopkgTree {
    #[serde(default)]
    constraint: Vec<GopkgEntry>,
    #[serde(default, rename = "override")]
    overrides: Vec<GopkgEntry>,
}

/// A constraint asking for expansion, with its exclusions.
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideRequest {
    /// The requesting constraint
    pub constraint: GopkgEntry,
    /// Package prefixes to ignore
    pub exclude_prefixes: Vec<String>,
}

/// What [`GopkgDocument::pin`] changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinOutcome {
    /// A `[[constraint]]` with the name was removed
    pub removed_constraint: bool,
    /// An existing `[[override]]` was replaced rather than added
    pub replaced_override: bool,
    /// The source written, if any
    pub source: Option<String>,
}

/// A Gopkg.toml document.
#[derive(Debug, Clone)]
pub struct GopkgDocument {
    doc: DocumentMut,
    tree: GopkgTree,
}

impl GopkgDocument {
    /// Parse a document.
    pub fn parse(text: &str) -> Result<Self, GopkgError> {
        let doc = text.parse::<DocumentMut>().map_err(|e| GopkgError::Parse {
            message: e.to_string(),
        })?;
        for key in ["constraint", "override"] {
            if doc.get(key).is_some_and(|item| !item.is_array_of_tables()) {
                return Err(GopkgError::Parse {
                    message: format!("`{key}` must be written as [[{key}]] tables"),
                });
            }
        }
        let tree = toml::from_str::<GopkgTree>(text).map_err(|e| GopkgError::Parse {
            message: e.to_string(),
        })?;
        Ok(Self { doc, tree })
    }

    /// Every `[[constraint]]`, in document order.
    pub fn constraints(&self) -> &[GopkgEntry] {
        &self.tree.constraint
    }

    /// Every `[[override]]`, in document order.
    pub fn overrides(&self) -> &[GopkgEntry] {
        &self.tree.overrides
    }

    /// Every constraint requesting `tool`'s expansion.
    pub fn override_requests(&self, tool: OverrideTool) -> Result<Vec<OverrideRequest>, GopkgError> {
        let request = tool.request_key();
        let exclude = tool.exclude_key();
        self.tree
            .constraint
            .iter()
            .filter(|c| c.has_flag(&request))
            .map(|c| {
                Ok(OverrideRequest {
                    exclude_prefixes: c.string_list(&exclude)?,
                    constraint: c.clone(),
                })
            })
            .collect()
    }

    /// The first constraint requesting `tool`'s expansion.
    ///
    /// # Errors
    ///
    /// [`GopkgError::NoOverrideRequested`] when there is none.
    pub fn first_override_request(&self, tool: OverrideTool) -> Result<OverrideRequest, GopkgError> {
        self.override_requests(tool)?
            .into_iter()
            .next()
            .ok_or_else(|| GopkgError::NoOverrideRequested {
                key: tool.request_key(),
            })
    }

    /// Remove overrides a previous run of `tool` injected.
    ///
    /// Returns the number removed.
    pub fn strip_injected(&mut self, tool: OverrideTool) -> usize {
        let markers = tool.marker_keys();
        let is_marked = |table: &toml_edit::Table| {
            table
                .get("metadata")
                .and_then(|m| m.as_table_like())
                .is_some_and(|m| markers.iter().any(|k| m.contains_key(k)))
        };

        let removed = self.remove_overrides(is_marked);
        if removed > 0 {
            self.tree.overrides.retain(|o| !markers.iter().any(|k| o.has_key(k)));
        }
        removed
    }

    fn remove_overrides<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&toml_edit::Table) -> bool,
    {
        let Some(overrides) = self
            .doc
            .get_mut("override")
            .and_then(|item| item.as_array_of_tables_mut())
        else {
            return 0;
        };

        let doomed: Vec<usize> = overrides
            .iter()
            .enumerate()
            .filter(|(_, table)| predicate(table))
            .map(|(index, _)| index)
            .collect();
        for index in doomed.iter().rev() {
            overrides.remove(*index);
        }

        if overrides.is_empty() {
            self.doc.remove("override");
        }
        doomed.len()
    }

    /// Pin `name` to `revision` as an override.
    ///
    /// The `[[constraint]]` for `name` is removed. An existing override is
    /// replaced by one carrying only the name, revision and source; otherwise
    /// a new override is appended. With a `server_prefix`, the source becomes
    /// the prefix joined with the existing source (or the name).
    ///
    /// # Errors
    ///
    /// [`GopkgError::InvalidName`] or [`GopkgError::InvalidRevision`] when
    /// `name` is not a project path or `revision` is not a full hash. The
    /// document is left untouched.
    pub fn pin(
        &mut self,
        name: &str,
        revision: &str,
        server_prefix: Option<&str>,
    ) -> Result<PinOutcome, GopkgError> {
        ProjectRoot::new(name).map_err(|source| GopkgError::InvalidName {
            name: name.to_string(),
            source,
        })?;
        let oid = Oid::new(revision).map_err(|source| GopkgError::InvalidRevision {
            name: name.to_string(),
            revision: revision.to_string(),
            source,
        })?;
        let revision = oid.as_str();

        let removed_constraint = self.remove_first("constraint", name);
        if removed_constraint {
            if let Some(index) = self.tree.constraint.iter().position(|c| c.name == name) {
                self.tree.constraint.remove(index);
            }
        }

        let existing = self.tree.overrides.iter().find(|o| o.name == name);
        let replaced_override = existing.is_some();
        let base = existing.and_then(|o| o.source.clone());
        let source = match server_prefix {
            Some(prefix) => Some(join_source(prefix, base.as_deref().unwrap_or(name))),
            None => base,
        };

        let mut table = toml_edit::Table::new();
        table.insert("name", toml_edit::value(name));
        table.insert("revision", toml_edit::value(revision));
        if let Some(source) = &source {
            table.insert("source", toml_edit::value(source.as_str()));
        }

        let entry = GopkgEntry {
            name: name.to_string(),
            revision: Some(revision.to_string()),
            source: source.clone(),
            ..Default::default()
        };

        let overrides = self
            .doc
            .entry("override")
            .or_insert_with(|| toml_edit::Item::ArrayOfTables(toml_edit::ArrayOfTables::new()));
        if let Some(array) = overrides.as_array_of_tables_mut() {
            let position = array
                .iter()
                .position(|t| t.get("name").and_then(|n| n.as_str()) == Some(name));
            match position {
                Some(index) => {
                    if let Some(slot) = array.get_mut(index) {
                        *slot = table;
                    }
                }
                None => array.push(table),
            }
        }

        match self.tree.overrides.iter_mut().find(|o| o.name == name) {
            Some(slot) => *slot = entry,
            None => self.tree.overrides.push(entry),
        }

        Ok(PinOutcome {
            removed_constraint,
            replaced_override,
            source,
        })
    }

    fn remove_first(&mut self, key: &str, name: &str) -> bool {
        let Some(array) = self
            .doc
            .get_mut(key)
            .and_then(|item| item.as_array_of_tables_mut())
        else {
            return false;
        };
        let Some(index) = array
            .iter()
            .position(|t| t.get("name").and_then(|n| n.as_str()) == Some(name))
        else {
            return false;
        };
        array.remove(index);
        if array.is_empty() {
            self.doc.remove(key);
        }
        true
    }

    /// The document text, including every edit.
    pub fn render(&self) -> String {
        self.doc.to_string()
    }
}

impl GopkgEntry {
    fn has_key(&self, key: &str) -> bool {
        self.metadata.as_ref().is_some_and(|m| m.contains_key(key))
    }
}

/// Replace `path` with `contents` without exposing a partial file.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::with_prefix_in(".gopin-", dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Join a server prefix and a source path with exactly one `/`.
pub fn join_source(prefix: &str, source: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let source = source.trim_start_matches('/');
    if prefix.is_empty() {
        source.to_string()
    } else {
        format!("{}/{}", prefix, source)
    }
}

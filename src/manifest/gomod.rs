//! manifest::gomod
//!
//! Parser for `go.mod` files.
//!
//! Format:
//! ```text
//! module github.com/acme/app
//!
//! go 1.21
//!
//! require (
//!     github.com/pkg/errors v0.9.1
//!     golang.org/x/net v0.0.0-20200101000000-abc1234 // indirect
//! )
//!
//! replace github.com/old/lib => github.com/fork/lib v1.2.0
//! replace github.com/local/lib v1.0.0 => ../lib
//!
//! exclude github.com/bad/lib v1.0.1
//! ```
//!
//! Directives may be written singly or in parenthesized blocks. Only the
//! directives that affect pinning are kept; `retract`, `toolchain`,
//! `godebug`, `tool` and `ignore` are accepted and skipped.

use std::path::Path;

use super::{is_local_path, ManifestError, Requirement, Requirements, SkippedReplacement};

/// Location of the module file inside a project.
pub const GO_MOD: &str = "go.mod";

/// A module path with an optional version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleVersion {
    /// Module path, or a directory for local replacements
    pub path: String,
    /// Version, absent for wildcard replacements and directories
    pub version: Option<String>,
}

/// A `require` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Require {
    /// Required module path
    pub path: String,
    /// Required version
    pub version: String,
    /// Marked `// indirect`
    pub indirect: bool,
}

/// A `replace` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    /// The module being replaced (version absent means every version)
    pub old: ModuleVersion,
    /// The replacement
    pub new: ModuleVersion,
}

impl Replace {
    /// Whether the replacement is a directory on disk.
    pub fn is_local(&self) -> bool {
        self.new.version.is_none()
    }
}

/// A parsed `go.mod` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoMod {
    /// The module's own path
    pub module: Option<String>,
    /// The `go` language version
    pub go: Option<String>,
    /// Requirements in file order
    pub require: Vec<Require>,
    /// Replacements in file order
    pub replace: Vec<Replace>,
    /// Excluded module versions
    pub exclude: Vec<ModuleVersion>,
}

impl GoMod {
    /// Read the module file of the project exported at `project_dir`.
    pub fn read(project_dir: &Path) -> Result<Self, ManifestError> {
        let path = project_dir.join(GO_MOD);
        let display = path.display().to_string();
        let text = std::fs::read_to_string(&path).map_err(|e| ManifestError::Parse {
            file: display.clone(),
            line: 0,
            message: e.to_string(),
        })?;
        Self::parse(&text, &display)
    }

    /// Parse `go.mod` text; `file` names the source in errors.
    pub fn parse(text: &str, file: &str) -> Result<Self, ManifestError> {
        let mut gomod = GoMod::default();
        let mut block: Option<String> = None;

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let error = |message: String| ManifestError::Parse {
                file: file.to_string(),
                line,
                message,
            };

            let (tokens, comment) = tokenize(raw).map_err(|m| error(m.to_string()))?;
            if tokens.is_empty() {
                continue;
            }

            if let Some(directive) = &block {
                if tokens == [")"] {
                    block = None;
                    continue;
                }
                let directive = directive.clone();
                gomod
                    .apply(&directive, &tokens, comment.as_deref())
                    .map_err(error)?;
                continue;
            }

            if tokens.len() == 2 && tokens[1] == "(" {
                block = Some(tokens[0].clone());
                continue;
            }

            gomod
                .apply(&tokens[0], &tokens[1..], comment.as_deref())
                .map_err(error)?;
        }

        if block.is_some() {
            return Err(ManifestError::Parse {
                file: file.to_string(),
                line: text.lines().count(),
                message: "unterminated block".to_string(),
            });
        }

        Ok(gomod)
    }

    fn apply(
        &mut self,
        directive: &str,
        args: &[String],
        comment: Option<&str>,
    ) -> Result<(), String> {
        match directive {
            "module" => match args {
                [path] => self.module = Some(path.clone()),
                _ => return Err("usage: module module/path".to_string()),
            },
            "go" => match args {
                [version] => self.go = Some(version.clone()),
                _ => return Err("usage: go 1.23".to_string()),
            },
            "require" => match args {
                [path, version] => self.require.push(Require {
                    path: path.clone(),
                    version: version.clone(),
                    indirect: comment.is_some_and(|c| {
                        c.split(';').any(|part| part.trim() == "indirect")
                    }),
                }),
                _ => return Err("usage: require module/path v1.2.3".to_string()),
            },
            "exclude" => match args {
                [path, version] => self.exclude.push(ModuleVersion {
                    path: path.clone(),
                    version: Some(version.clone()),
                }),
                _ => return Err("usage: exclude module/path v1.2.3".to_string()),
            },
            "replace" => self.replace.push(parse_replace(args)?),
            "retract" | "toolchain" | "godebug" | "tool" | "ignore" => {}
            other => return Err(format!("unknown directive: {}", other)),
        }
        Ok(())
    }

    /// Requirements with replacements applied, sorted by module path.
    ///
    /// A replacement pinned to a specific old version takes precedence over
    /// a wildcard one. Replacements by local directories are reported in
    /// [`Requirements::skipped`] instead.
    pub fn effective_requirements(&self) -> Requirements {
        let mut out = Requirements::default();

        for req in &self.require {
            let replacement = self
                .replace
                .iter()
                .filter(|r| r.old.path == req.path)
                .filter(|r| r.old.version.as_deref().map_or(true, |v| v == req.version))
                .max_by_key(|r| r.old.version.is_some());

            match replacement {
                None => out
                    .requirements
                    .push(Requirement::direct(&req.path, &req.version)),
                Some(r) => match &r.new.version {
                    Some(version) => out.requirements.push(Requirement {
                        name: req.path.clone(),
                        target: r.new.path.clone(),
                        version: version.clone(),
                    }),
                    None => out.skipped.push(SkippedReplacement {
                        path: req.path.clone(),
                        directory: r.new.path.clone(),
                    }),
                },
            }
        }

        out.requirements.sort();
        out
    }
}

fn parse_replace(args: &[String]) -> Result<Replace, String> {
    let usage = "usage: replace module/path [v1.2.3] => other/module v1.4 | ../local/directory";
    let arrow = args
        .iter()
        .position(|a| a == "=>")
        .ok_or_else(|| usage.to_string())?;
    let (old, new) = (&args[..arrow], &args[arrow + 1..]);

    let old = match old {
        [path] => ModuleVersion {
            path: path.clone(),
            version: None,
        },
        [path, version] => ModuleVersion {
            path: path.clone(),
            version: Some(version.clone()),
        },
        _ => return Err(usage.to_string()),
    };

    let new = match new {
        [path] if is_local_path(path) => ModuleVersion {
            path: path.clone(),
            version: None,
        },
        [path] => {
            return Err(format!(
                "replacement module without version must be directory path (rooted or starting with ./ or ../): {}",
                path
            ))
        }
        [path, version] if !is_local_path(path) => ModuleVersion {
            path: path.clone(),
            version: Some(version.clone()),
        },
        [path, _] => {
            return Err(format!(
                "replacement directory {} cannot have a version",
                path
            ))
        }
        _ => return Err(usage.to_string()),
    };

    Ok(Replace { old, new })
}

/// Split a line into tokens and its trailing `//` comment.
///
/// Double-quoted tokens may contain escapes; backquoted tokens are raw.
fn tokenize(line: &str) -> Result<(Vec<String>, Option<String>), &'static str> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if line[start..].starts_with("//") {
            return Ok((tokens, Some(line[start + 2..].trim().to_string())));
        }

        match c {
            '"' => {
                chars.next();
                let mut token = String::new();
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, '\\')) => match chars.next() {
                            Some((_, escaped)) => token.push(escaped),
                            None => return Err("unterminated quoted string"),
                        },
                        Some((_, other)) => token.push(other),
                        None => return Err("unterminated quoted string"),
                    }
                }
                tokens.push(token);
            }
            '`' => {
                chars.next();
                let mut token = String::new();
                loop {
                    match chars.next() {
                        Some((_, '`')) => break,
                        Some((_, other)) => token.push(other),
                        None => return Err("unterminated raw string"),
                    }
                }
                tokens.push(token);
            }
            '(' | ')' => {
                chars.next();
                tokens.push(c.to_string());
            }
            _ => {
                let mut token = String::new();
                while let Some(&(at, next)) = chars.peek() {
                    if next.is_whitespace()
                        || next == '('
                        || next == ')'
                        || line[at..].starts_with("//")
                    {
                        break;
                    }
                    token.push(next);
                    chars.next();
                }
                tokens.push(token);
            }
        }
    }

    Ok((tokens, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
// Root module.
module github.com/acme/app

go 1.21

require (
	github.com/pkg/errors v0.9.1
	golang.org/x/net v0.0.0-20200101000000-abc1234 // indirect
	"github.com/quoted/path" v1.0.0
)

require github.com/old/lib v1.0.0
require github.com/local/lib v1.1.0

replace github.com/old/lib => github.com/fork/lib v1.2.0
replace github.com/local/lib v1.1.0 => ../lib

exclude github.com/bad/lib v1.0.1

retract (
	v1.0.0 // published by mistake
	[v1.1.0, v1.1.5]
)
"#;

    mod parsing {
        use super::*;

        #[test]
        fn reads_every_directive() {
            let gomod = GoMod::parse(SAMPLE, "go.mod").unwrap();
            assert_eq!(gomod.module.as_deref(), Some("github.com/acme/app"));
            assert_eq!(gomod.go.as_deref(), Some("1.21"));
            assert_eq!(gomod.require.len(), 5);
            assert_eq!(gomod.replace.len(), 2);
            assert_eq!(gomod.exclude.len(), 1);
        }

        #[test]
        fn indirect_comment_recorded() {
            let gomod = GoMod::parse(SAMPLE, "go.mod").unwrap();
            let net = gomod
                .require
                .iter()
                .find(|r| r.path == "golang.org/x/net")
                .unwrap();
            assert!(net.indirect);
            assert!(!gomod.require[0].indirect);
        }

        #[test]
        fn quoted_paths_unquoted() {
            let gomod = GoMod::parse(SAMPLE, "go.mod").unwrap();
            assert!(gomod
                .require
                .iter()
                .any(|r| r.path == "github.com/quoted/path"));
        }

        #[test]
        fn local_replacement_has_no_version() {
            let gomod = GoMod::parse(SAMPLE, "go.mod").unwrap();
            assert!(gomod.replace[1].is_local());
            assert_eq!(gomod.replace[1].old.version.as_deref(), Some("v1.1.0"));
        }

        #[test]
        fn malformed_require_names_line() {
            let err = GoMod::parse("module x\nrequire github.com/a/b\n", "go.mod").unwrap_err();
            assert!(matches!(err, ManifestError::Parse { line: 2, .. }));
        }

        #[test]
        fn unterminated_block() {
            assert!(GoMod::parse("require (\n\tgithub.com/a/b v1.0.0\n", "go.mod").is_err());
        }

        #[test]
        fn module_replacement_needs_version() {
            assert!(GoMod::parse("replace a.com/x => b.com/y\n", "go.mod").is_err());
        }

        #[test]
        fn unknown_directive_rejected() {
            assert!(GoMod::parse("frobnicate a b\n", "go.mod").is_err());
        }
    }

    mod effective {
        use super::*;

        #[test]
        fn replacements_applied_and_sorted() {
            let reqs = GoMod::parse(SAMPLE, "go.mod")
                .unwrap()
                .effective_requirements();

            let names: Vec<_> = reqs.requirements.iter().map(|r| r.name.as_str()).collect();
            assert_eq!(
                names,
                [
                    "github.com/old/lib",
                    "github.com/pkg/errors",
                    "github.com/quoted/path",
                    "golang.org/x/net",
                ]
            );

            let old = &reqs.requirements[0];
            assert_eq!(old.target, "github.com/fork/lib");
            assert_eq!(old.version, "v1.2.0");
        }

        #[test]
        fn local_replacements_skipped() {
            let reqs = GoMod::parse(SAMPLE, "go.mod")
                .unwrap()
                .effective_requirements();
            assert_eq!(
                reqs.skipped,
                vec![SkippedReplacement {
                    path: "github.com/local/lib".into(),
                    directory: "../lib".into(),
                }]
            );
        }

        #[test]
        fn versioned_replacement_beats_wildcard() {
            let text = "require a.com/x v1.0.0\n\
                        replace a.com/x => b.com/any v2.0.0\n\
                        replace a.com/x v1.0.0 => b.com/exact v3.0.0\n";
            let reqs = GoMod::parse(text, "go.mod").unwrap().effective_requirements();
            assert_eq!(reqs.requirements[0].target, "b.com/exact");
        }

        #[test]
        fn replacement_for_other_version_ignored() {
            let text = "require a.com/x v1.0.0\nreplace a.com/x v0.9.0 => b.com/y v1.0.0\n";
            let reqs = GoMod::parse(text, "go.mod").unwrap().effective_requirements();
            assert!(!reqs.requirements[0].is_replaced());
        }
    }
}

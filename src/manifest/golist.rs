//! manifest::golist
//!
//! The output of `go list -json -m all`: a stream of concatenated JSON
//! objects, one per module in the build list. The first object is the main
//! module itself and is skipped.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::{is_local_path, ManifestError, Requirement, Requirements, SkippedReplacement};
use crate::resolve::fetch::run_timed;

/// One module object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListedModule {
    /// Module path
    pub path: String,
    /// Selected version (absent for the main module and directories)
    #[serde(default)]
    pub version: Option<String>,
    /// Whether this is the main module
    #[serde(default)]
    pub main: bool,
    /// Whether the module is only an indirect dependency
    #[serde(default)]
    pub indirect: bool,
    /// The replacement, when one applies
    #[serde(default)]
    pub replace: Option<Box<ListedModule>>,
}

/// Decode the whole stream.
pub fn parse_stream(data: &[u8], source: &str) -> Result<Vec<ListedModule>, ManifestError> {
    serde_json::Deserializer::from_slice(data)
        .into_iter::<ListedModule>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ManifestError::Json {
            file: source.to_string(),
            source: e,
        })
}

/// Requirements from a decoded stream, sorted by module path.
///
/// The first object and any object marked `Main` are skipped.
pub fn requirements(modules: &[ListedModule]) -> Requirements {
    let mut out = Requirements::default();

    for module in modules.iter().skip(1).filter(|m| !m.main) {
        match &module.replace {
            Some(replacement) => match &replacement.version {
                Some(version) if !is_local_path(&replacement.path) => {
                    out.requirements.push(Requirement {
                        name: module.path.clone(),
                        target: replacement.path.clone(),
                        version: version.clone(),
                    })
                }
                _ => out.skipped.push(SkippedReplacement {
                    path: module.path.clone(),
                    directory: replacement.path.clone(),
                }),
            },
            None => {
                if let Some(version) = &module.version {
                    out.requirements
                        .push(Requirement::direct(&module.path, version));
                }
            }
        }
    }

    out.requirements.sort();
    out
}

/// Run `go list -json -m all` in `dir` with modules enabled.
pub fn run_go_list(go_binary: &str, dir: &Path, timeout: Duration) -> Result<Vec<u8>, ManifestError> {
    let command_line = format!("{} list -json -m all", go_binary);

    let mut command = tokio::process::Command::new(go_binary);
    command
        .args(["list", "-json", "-m", "all"])
        .env("GO111MODULE", "on")
        .current_dir(dir);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ManifestError::Command {
            command: command_line.clone(),
            source: crate::resolve::fetch::FetchError::Runtime(e),
        })?;
    let output = runtime
        .block_on(run_timed(command, timeout, "go list"))
        .map_err(|source| ManifestError::Command {
            command: command_line.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(ManifestError::CommandFailed {
            command: command_line,
            output: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(output.stdout)
}

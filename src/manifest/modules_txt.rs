//! manifest::modules_txt
//!
//! `vendor/modules.txt` as written by `go mod vendor`.
//!
//! Module lines start with `# ` and name a module and its version,
//! optionally followed by `=> replacement [version]`. Lines starting with
//! `## ` are annotations and all other lines list packages.

/// Location of the listing inside a module.
pub const MODULES_TXT: &str = "vendor/modules.txt";

/// One vendored module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendoredModule {
    /// Module path
    pub path: String,
    /// Module version
    pub version: String,
}

/// Every module line, in file order.
pub fn parse(text: &str) -> Vec<VendoredModule> {
    text.lines()
        .filter_map(|line| line.strip_prefix("# "))
        .filter_map(|rest| {
            let mut fields = rest.split_whitespace();
            let path = fields.next()?;
            let version = fields.next()?;
            if version == "=>" {
                return None;
            }
            Some(VendoredModule {
                path: path.to_string(),
                version: version.to_string(),
            })
        })
        .collect()
}

/// The vendored version of `path`, if listed.
pub fn find<'a>(modules: &'a [VendoredModule], path: &str) -> Option<&'a VendoredModule> {
    modules.iter().find(|m| m.path == path)
}

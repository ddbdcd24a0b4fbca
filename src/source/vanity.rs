//! source::vanity
//!
//! Resolving custom import paths through `?go-get=1` meta tags.
//!
//! A host serving a vanity import path answers `GET https://<path>?go-get=1`
//! with a page carrying
//! `<meta name="go-import" content="<prefix> <vcs> <repo-url>">`. The prefix
//! is the project root and the URL is where its repository lives.

use async_trait::async_trait;

use super::traits::SourceError;
use crate::core::types::ImportPath;

/// One `go-import` meta tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoImport {
    /// Import path prefix the tag applies to
    pub prefix: String,
    /// Version control system (`git`, `hg`, ...)
    pub vcs: String,
    /// Repository URL
    pub repo: String,
}

impl GoImport {
    /// Whether this tag covers `path`.
    pub fn covers(&self, path: &str) -> bool {
        path == self.prefix
            || path
                .strip_prefix(self.prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Looks up the `go-import` tag for a path.
#[async_trait]
pub trait VanityLookup: Send + Sync {
    /// Find the tag covering `path`.
    async fn lookup(&self, path: &ImportPath) -> Result<GoImport, SourceError>;
}

/// Looks up tags over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpVanityLookup {
    client: reqwest::Client,
    base_url: Option<String>,
    allow_insecure: bool,
}

impl HttpVanityLookup {
    /// Query each path's own host.
    pub fn new(allow_insecure: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: None,
            allow_insecure,
        }
    }

    /// Query `base_url/<path>` instead of the path's host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn urls(&self, path: &ImportPath) -> Vec<String> {
        match &self.base_url {
            Some(base) => vec![format!("{}/{}?go-get=1", base.trim_end_matches('/'), path)],
            None if self.allow_insecure => vec![
                format!("https://{}?go-get=1", path),
                format!("http://{}?go-get=1", path),
            ],
            None => vec![format!("https://{}?go-get=1", path)],
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("{} returned {}", url, response.status()));
        }
        response.text().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl VanityLookup for HttpVanityLookup {
    async fn lookup(&self, path: &ImportPath) -> Result<GoImport, SourceError> {
        let mut last_error = String::from("no URL to query");
        for url in self.urls(path) {
            match self.fetch_page(&url).await {
                Ok(html) => {
                    return best_import(&parse_go_imports(&html), path.as_str()).ok_or_else(|| {
                        SourceError::Lookup {
                            path: path.to_string(),
                            message: format!("{} has no go-import tag covering the path", url),
                        }
                    })
                }
                Err(message) => last_error = message,
            }
        }
        Err(SourceError::Lookup {
            path: path.to_string(),
            message: last_error,
        })
    }
}

/// The longest tag covering `path`.
pub fn best_import(imports: &[GoImport], path: &str) -> Option<GoImport> {
    imports
        .iter()
        .filter(|i| i.covers(path))
        .max_by_key(|i| i.prefix.len())
        .cloned()
}

/// Extract every `go-import` meta tag from an HTML page.
pub fn parse_go_imports(html: &str) -> Vec<GoImport> {
    let lower = html.to_ascii_lowercase();
    let mut imports = Vec::new();
    let mut offset = 0;

    while let Some(start) = lower[offset..].find("<meta") {
        let tag_start = offset + start;
        let Some(len) = lower[tag_start..].find('>') else {
            break;
        };
        let tag_end = tag_start + len;
        offset = tag_end;

        let tag = &html[tag_start..tag_end];
        if attribute(tag, "name").as_deref() != Some("go-import") {
            continue;
        }
        let Some(content) = attribute(tag, "content") else {
            continue;
        };
        let fields: Vec<&str> = content.split_whitespace().collect();
        if let [prefix, vcs, repo] = fields.as_slice() {
            imports.push(GoImport {
                prefix: prefix.to_string(),
                vcs: vcs.to_string(),
                repo: repo.to_string(),
            });
        }
    }

    imports
}

/// Value of a quoted attribute within one tag.
fn attribute(tag: &str, name: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    let needle = format!("{}=", name);
    let mut search = 0;

    while let Some(found) = lower[search..].find(&needle) {
        let at = search + found;
        search = at + needle.len();
        let preceded_by_space = at == 0 || lower[..at].ends_with(char::is_whitespace);
        if !preceded_by_space {
            continue;
        }

        let rest = &tag[at + needle.len()..];
        let quote = rest.chars().next()?;
        if quote != '"' && quote != '\'' {
            return rest.split_whitespace().next().map(String::from);
        }
        let body = &rest[1..];
        let end = body.find(quote)?;
        return Some(body[..end].to_string());
    }
    None
}

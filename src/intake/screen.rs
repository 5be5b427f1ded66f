//! Content screening for task prompts
//!
//! A [`ContentScreen`] inspects decoded prompt text and reports the first
//! marker it considers unsafe. The only screen shipped is
//! [`DenylistScreen`], a case-insensitive substring scan.
//!
//! This is a best-effort heuristic and not a security boundary. It does not
//! parse HTML, shell or SQL, it is trivially bypassed by encoding or
//! obfuscation, and false negatives are expected. The downstream computation
//! must be sandboxed regardless of what this screen accepts.

/// Markers scanned for by the default denylist, in scan order
pub const DEFAULT_DENYLIST: &[&str] = &[
    "<script>",
    "</script>",
    "javascript:",
    "data:text/html",
    "eval(",
    "exec(",
    "system(",
    "rm -rf",
    "DROP TABLE",
];

/// Pluggable prompt screening stage
pub trait ContentScreen: Send + Sync {
    /// Screen identifier used in logs
    fn name(&self) -> &str;

    /// Return the first offending pattern found in `text`, if any
    fn find_match(&self, text: &str) -> Option<&str>;
}

/// Case-insensitive substring denylist
#[derive(Debug, Clone)]
pub struct DenylistScreen {
    /// (pattern as reported, lowercased pattern used for matching)
    patterns: Vec<(String, String)>,
}

impl DenylistScreen {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| -> String { pattern.into() })
            .filter(|pattern| !pattern.is_empty())
            .map(|pattern| {
                let lowered = pattern.to_lowercase();
                (pattern, lowered)
            })
            .collect();
        Self { patterns }
    }

    /// Default denylist followed by `extra` patterns
    pub fn with_extra_patterns(extra: &[String]) -> Self {
        Self::new(
            DEFAULT_DENYLIST
                .iter()
                .map(|pattern| pattern.to_string())
                .chain(extra.iter().cloned()),
        )
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(pattern, _)| pattern.as_str())
    }
}

impl Default for DenylistScreen {
    fn default() -> Self {
        Self::new(DEFAULT_DENYLIST.iter().copied())
    }
}

impl ContentScreen for DenylistScreen {
    fn name(&self) -> &str {
        "denylist-substring"
    }

    fn find_match(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.patterns
            .iter()
            .find(|(_, needle)| lowered.contains(needle.as_str()))
            .map(|(pattern, _)| pattern.as_str())
    }
}

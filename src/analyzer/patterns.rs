//! Named regex signatures. Tables are data: add a row to detect a new
//! category without touching the passes.

use regex::{Regex, RegexBuilder};
use std::sync::{Arc, LazyLock};

/// Known fault signatures, searched in console text, error messages and URLs.
pub const ERROR_PATTERN_DEFS: &[(&str, &str)] = &[
    ("cors", r"(CORS|Cross-Origin|Access-Control)"),
    (
        "auth",
        r"(401|403|Unauthorized|Forbidden|authentication|authorization)",
    ),
    ("network", r"(Failed to fetch|NetworkError|net::ERR|timeout)"),
    ("react", r"(React|ReactDOM|useState|useEffect|Component)"),
    ("next", r"(Next\.js|getServerSideProps|getStaticProps)"),
    ("supabase", r"(Supabase|PostgrestError|AuthError)"),
    ("typescript", r"(TypeError|ReferenceError|undefined|null)"),
];

/// Sensitive-data shapes, searched in URLs and console text.
pub const SECURITY_PATTERN_DEFS: &[(&str, &str)] = &[
    ("credentials_in_url", r"(password|token|secret|key)=[^&\s]+"),
    (
        "sql_injection",
        r"(SELECT|INSERT|UPDATE|DELETE|DROP|CREATE|ALTER)\s+",
    ),
    ("xss", r"(<script|javascript:|onerror=|onload=)"),
    (
        "sensitive_data",
        r"(api_key|access_token|secret_key|private_key)",
    ),
];

pub static ERROR_PATTERNS: LazyLock<Arc<PatternTable>> = LazyLock::new(|| {
    Arc::new(PatternTable::new(ERROR_PATTERN_DEFS).unwrap())
});

pub static SECURITY_PATTERNS: LazyLock<Arc<PatternTable>> = LazyLock::new(|| {
    Arc::new(PatternTable::new(SECURITY_PATTERN_DEFS).unwrap())
});

#[derive(Debug, Clone)]
pub struct NamedPattern {
    pub name: String,
    pub regex: Regex,
}

/// Ordered, case-insensitive set of named patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    patterns: Vec<NamedPattern>,
}

impl PatternTable {
    pub fn new(defs: &[(&str, &str)]) -> Result<Self, regex::Error> {
        let mut table = Self::default();
        for (name, pattern) in defs {
            table.add(name, pattern)?;
        }
        Ok(table)
    }

    pub fn add(&mut self, name: &str, pattern: &str) -> Result<(), regex::Error> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        self.patterns.push(NamedPattern {
            name: name.to_string(),
            regex,
        });
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedPattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Names of every pattern with at least one match, in table order.
    pub fn matching_names(&self, text: &str) -> Vec<String> {
        self.patterns
            .iter()
            .filter(|p| p.regex.is_match(text))
            .map(|p| p.name.clone())
            .collect()
    }
}

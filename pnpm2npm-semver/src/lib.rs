//! npm range syntax on top of `semver`.
//!
//! `semver::VersionReq` speaks Cargo's dialect: comma separated comparators
//! and no unions. npm ranges written in lockfiles (`>= 4.21.0`,
//! `^16.8.0 || ^17.0.0`, `1.0.0 - 2.0.0`) are rewritten into that dialect
//! one `||` branch at a time.

use semver::VersionReq;
use std::fmt;

pub use semver::Version;

/// An npm range, kept as the union of its `||` branches.
#[derive(Debug, Clone)]
pub struct RangeSet {
    branches: Vec<VersionReq>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub range: String,
    pub reason: String,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid range {:?}: {}", self.range, self.reason)
    }
}

impl std::error::Error for Error {}

impl RangeSet {
    pub fn parse(range: &str) -> Result<Self, Error> {
        let range = match range.trim() {
            "" | "latest" => "*",
            trimmed => trimmed,
        };

        let branches = range
            .split("||")
            .map(str::trim)
            .filter(|branch| !branch.is_empty())
            .map(|branch| {
                VersionReq::parse(&to_cargo_syntax(branch)).map_err(|err| Error {
                    range: range.to_string(),
                    reason: err.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if branches.is_empty() {
            return Ok(RangeSet {
                branches: vec![VersionReq::STAR],
            });
        }

        Ok(RangeSet { branches })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.branches.iter().any(|req| req.matches(version))
    }
}

/// Best-effort check used for peer ranges: anything that cannot be parsed on
/// either side counts as satisfied.
pub fn satisfies(version: &str, range: &str) -> bool {
    let Ok(version) = Version::parse(strip_prefix(version.trim())) else {
        return true;
    };

    RangeSet::parse(range).map_or(true, |set| set.matches(&version))
}

fn strip_prefix(token: &str) -> &str {
    token.trim_start_matches(['v', '='])
}

/// Rewrites one `||` branch: `a - b` becomes `>=a, <=b`, and whitespace
/// between comparators becomes a comma. An operator written apart from its
/// version (`>= 1.2.3`) stays attached to it. Bare versions keep npm's
/// meaning.
fn to_cargo_syntax(branch: &str) -> String {
    let tokens: Vec<&str> = branch.split_whitespace().collect();

    if let [low, "-", high] = tokens.as_slice() {
        return format!(">={}, <={}", strip_prefix(low), strip_prefix(high));
    }

    let mut comparators: Vec<String> = Vec::new();
    let mut pending_operator: Option<&str> = None;

    for token in tokens {
        if matches!(token, "=" | ">" | ">=" | "<" | "<=" | "~" | "^") {
            pending_operator = Some(token);
            continue;
        }

        let comparator = match pending_operator.take() {
            Some(operator) => format!("{operator}{}", strip_prefix(token)),
            None if starts_with_operator(token) => token.to_string(),
            None => exact(strip_prefix(token)),
        };
        comparators.push(comparator);
    }

    comparators.join(", ")
}

fn starts_with_operator(token: &str) -> bool {
    token.starts_with(['>', '<', '~', '^'])
}

/// npm reads `1.2.3` as `=1.2.3` and `1.2` as `1.2.x`; Cargo would read both
/// as caret ranges.
fn exact(version: &str) -> String {
    if Version::parse(version).is_ok() {
        format!("={version}")
    } else if version.starts_with(|c: char| c.is_ascii_digit())
        && version.chars().all(|c| c.is_ascii_digit() || c == '.')
    {
        format!("~{version}")
    } else {
        version.to_string()
    }
}

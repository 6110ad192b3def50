//! Exclusion conditions shared by the source, output and message axes.

use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::Arc;

pub type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// One match condition.
#[derive(Clone)]
pub enum ExcludeCondition {
    /// Candidate starts with the literal. Tried against the raw candidate and
    /// against its `/`-separated form, so `src/vendor` also excludes
    /// `src\vendor\a.js`.
    Prefix(String),
    /// Candidate matches the pattern anywhere.
    Pattern(Regex),
    /// Called with the raw, non-normalized candidate.
    Predicate(Predicate),
}

impl ExcludeCondition {
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(ExcludeCondition::Pattern(Regex::new(pattern)?))
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        ExcludeCondition::Predicate(Arc::new(f))
    }

    fn is_match(&self, raw: &str, normalized: &str) -> bool {
        match self {
            ExcludeCondition::Prefix(prefix) => {
                raw.starts_with(prefix.as_str()) || normalized.starts_with(prefix.as_str())
            }
            ExcludeCondition::Pattern(re) => re.is_match(normalized),
            ExcludeCondition::Predicate(f) => f(raw),
        }
    }
}

impl fmt::Debug for ExcludeCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExcludeCondition::Prefix(p) => f.debug_tuple("Prefix").field(p).finish(),
            ExcludeCondition::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            ExcludeCondition::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<Regex> for ExcludeCondition {
    fn from(re: Regex) -> Self {
        ExcludeCondition::Pattern(re)
    }
}

/// An ordered set of conditions; any match excludes.
#[derive(Debug, Clone, Default)]
pub struct Exclude {
    conditions: Vec<ExcludeCondition>,
}

impl Exclude {
    pub fn new(conditions: Vec<ExcludeCondition>) -> Self {
        Self { conditions }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn push(&mut self, condition: ExcludeCondition) {
        self.conditions.push(condition);
    }

    /// Compile JSON-style pattern strings.
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let conditions = patterns
            .iter()
            .map(|p| ExcludeCondition::pattern(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { conditions })
    }

    /// Patterns see the candidate with `/` separators, prefixes either form,
    /// predicates see the candidate untouched.
    pub fn matches(&self, candidate: &str) -> bool {
        if self.conditions.is_empty() {
            return false;
        }
        let normalized = candidate.replace('\\', "/");
        self.conditions
            .iter()
            .any(|c| c.is_match(candidate, &normalized))
    }
}

impl From<ExcludeCondition> for Exclude {
    fn from(condition: ExcludeCondition) -> Self {
        Self {
            conditions: vec![condition],
        }
    }
}

impl From<Vec<ExcludeCondition>> for Exclude {
    fn from(conditions: Vec<ExcludeCondition>) -> Self {
        Self { conditions }
    }
}

/// Convenience for optional exclusions.
pub fn matches(candidate: &str, exclude: Option<&Exclude>) -> bool {
    exclude.is_some_and(|e| e.matches(candidate))
}

/// Accepts a single pattern string or an array of them.
pub(crate) fn deserialize_patterns<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_never_matches() {
        assert!(!Exclude::default().matches("/src/a.js"));
        assert!(!matches("/src/a.js", None));
    }

    #[test]
    fn test_prefix_condition() {
        let exclude = Exclude::from(ExcludeCondition::Prefix("/project/node_modules".into()));
        assert!(exclude.matches("/project/node_modules/foo/index.js"));
        assert!(!exclude.matches("/project/src/node_modules.js"));
    }

    #[test]
    fn test_prefix_matches_either_separator_form() {
        let exclude = Exclude::from(ExcludeCondition::Prefix("C:/app/vendor".into()));
        assert!(exclude.matches(r"C:\app\vendor\lib.js"));
        assert!(exclude.matches("C:/app/vendor/lib.js"));

        let raw = Exclude::from(ExcludeCondition::Prefix(r"C:\app\vendor".into()));
        assert!(raw.matches(r"C:\app\vendor\lib.js"));
        assert!(!raw.matches(r"C:\app\src\lib.js"));
    }

    #[test]
    fn test_pattern_is_unanchored_and_sees_forward_slashes() {
        let exclude = Exclude::from_patterns(&["node_modules/foo"]).unwrap();
        assert!(exclude.matches(r"C:\project\node_modules\foo\index.js"));
        assert!(exclude.matches("/project/node_modules/foo/index.js"));
        assert!(!exclude.matches("/project/src/foo.js"));
    }

    #[test]
    fn test_predicate_receives_raw_candidate() {
        let exclude = Exclude::from(ExcludeCondition::predicate(|p| p.contains('\\')));
        assert!(exclude.matches(r"src\a.js"));
        assert!(!exclude.matches("src/a.js"));
    }

    #[test]
    fn test_non_matching_condition_does_not_change_outcome() {
        let mut exclude = Exclude::from_patterns(&["legacy"]).unwrap();
        assert!(exclude.matches("/src/legacy/a.js"));
        assert!(!exclude.matches("/src/modern/a.js"));

        exclude.push(ExcludeCondition::Prefix("/nowhere".into()));
        exclude.push(ExcludeCondition::predicate(|_| false));
        assert!(exclude.matches("/src/legacy/a.js"));
        assert!(!exclude.matches("/src/modern/a.js"));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        assert!(Exclude::from_patterns(&["(unclosed"]).is_err());
    }
}

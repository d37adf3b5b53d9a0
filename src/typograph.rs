//! Rule-based typography for user-submitted text.
//!
//! A [`Typograph`] is an ordered list of regex substitution [`Rule`]s. Input
//! is trimmed and padded with a single space on each side so that rules
//! anchored on surrounding whitespace also fire at the edges, every rule is
//! applied in declaration order, and the result is trimmed again.
//!
//! The built-in rule set ([`Typograph::basic`]) does the following, in order:
//!
//! | Rule | Effect |
//! |---|---|
//! | `QUOTES_REPLACE` | `„` `“` `”` `''` → `"` |
//! | `DASH_REPLACE` | every dash variant (soft hyphen, en, em, bar, minus) → `-` |
//! | `SEQUENTIAL_SPACES` | runs of spaces/tabs → one space |
//! | `DASH_EM` | ` - ` or `,- ` → em dash |
//! | `DASH_EN` | `1-2`, `1 -2` → `1–2` |
//! | `HELLIP` | `..` / `...` → `…` |
//! | `COPYRIGHT` | `(c)` → `©` (Latin or Cyrillic `c`) |
//! | `TRADEMARK` | `(tm)` → `™` |
//! | `TRADEMARK_R` | `(r)` → `®` |
//! | `QUOTES_CYR_CLOSE` | `word"` → `word»` |
//! | `QUOTES_CYR_OPEN` | `"word` → `«word` |
//!
//! Dashes are first collapsed to a plain hyphen and then re-expanded by
//! context, which is what makes the rule set idempotent on its own output.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TypographError {
    #[error("invalid pattern for rule '{name}': {source}")]
    Pattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// Built-in rules as `(name, pattern, replacement)`.
const BASIC_RULES: &[(&str, &str, &str)] = &[
    ("QUOTES_REPLACE", r#"„|“|”|''"#, r#"""#),
    (
        "DASH_REPLACE",
        r"[-\x{AD}\x{2013}\x{2014}\x{2015}\x{2212}]",
        "-",
    ),
    ("SEQUENTIAL_SPACES", r"[ \t]+", " "),
    ("DASH_EM", r"([ ,])-[ ]", "${1}— "),
    ("DASH_EN", r"(\d+)[ ]*-[ ]*(\d+)", "${1}–${2}"),
    ("HELLIP", r"\.{2,3}", "…"),
    ("COPYRIGHT", r"\((?:c|с)\)", "©"),
    ("TRADEMARK", r"\(tm\)", "™"),
    ("TRADEMARK_R", r"\(r\)", "®"),
    ("QUOTES_CYR_CLOSE", r#"(\S+)""#, "${1}»"),
    ("QUOTES_CYR_OPEN", r#""(\S+)"#, "«${1}"),
];

static BASIC: LazyLock<Typograph> = LazyLock::new(|| {
    let rules = BASIC_RULES
        .iter()
        .map(|(name, pattern, replacement)| {
            Rule::new(*name, pattern, *replacement).expect("built-in typograph rule should compile")
        })
        .collect();
    Typograph { rules }
});

/// A user-defined rule as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    pub name: String,
    pub pattern: String,
    /// Replacement text; `${1}` refers to the first capture group.
    pub replacement: String,
}

/// A single named substitution.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    regex: Regex,
    replacement: String,
}

impl Rule {
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self, TypographError> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|source| TypographError::Pattern {
            name: name.clone(),
            source,
        })?;
        Ok(Self {
            name,
            regex,
            replacement: replacement.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace every non-overlapping match in `text`.
    pub fn apply(&self, text: &str) -> String {
        self.regex
            .replace_all(text, self.replacement.as_str())
            .into_owned()
    }
}

impl TryFrom<&RuleSpec> for Rule {
    type Error = TypographError;

    fn try_from(entry: &RuleSpec) -> Result<Self, Self::Error> {
        Rule::new(entry.name.clone(), &entry.pattern, entry.replacement.clone())
    }
}

/// An ordered set of typography rules.
#[derive(Debug, Clone)]
pub struct Typograph {
    rules: Vec<Rule>,
}

impl Typograph {
    /// The shared built-in rule set, compiled once per process.
    pub fn basic() -> &'static Typograph {
        &BASIC
    }

    /// Build an engine from an explicit rule list.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The built-in rules followed by `extra` rules from configuration.
    pub fn with_extra(extra: &[RuleSpec]) -> Result<Self, TypographError> {
        let mut rules = BASIC.rules.clone();
        for entry in extra {
            rules.push(Rule::try_from(entry)?);
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn apply(&self, text: &str) -> String {
        let padded = format!(" {} ", text.trim());
        self.rules
            .iter()
            .fold(padded, |acc, rule| rule.apply(&acc))
            .trim()
            .to_string()
    }
}

/// Apply the built-in rule set to `text`.
pub fn apply(text: &str) -> String {
    Typograph::basic().apply(text)
}

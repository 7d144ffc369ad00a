//! Grammar dialects.
//!
//! The rice language grew in three steps: a minimal lexer-level variant, a
//! script variant whose statements run inside an implicit entry point, and
//! the full variant with top-level `def`s, member calls and list literals.
//! A [`Dialect`] captures the differences as feature flags so one lexer and
//! one parser serve all of them.
//!
//! Dialects can be loaded from TOML:
//! ```toml
//! preset = "script"
//! comments = false
//! keywords = ["var", "return"]
//! max_depth = 64
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A reserved word of the rice language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyword {
    Def,
    Class,
    Include,
    Import,
    While,
    Return,
    Var,
}

impl Keyword {
    pub const ALL: [Keyword; 7] = [
        Keyword::Def,
        Keyword::Class,
        Keyword::Include,
        Keyword::Import,
        Keyword::While,
        Keyword::Return,
        Keyword::Var,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Def => "def",
            Keyword::Class => "class",
            Keyword::Include => "include",
            Keyword::Import => "import",
            Keyword::While => "while",
            Keyword::Return => "return",
            Keyword::Var => "var",
        }
    }

    pub fn from_word(word: &str) -> Option<Keyword> {
        Keyword::ALL.into_iter().find(|kw| kw.as_str() == word)
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of keywords a dialect reserves.
///
/// Words outside the set lex as ordinary names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Keyword>", into = "Vec<Keyword>")]
pub struct KeywordSet(u8);

impl KeywordSet {
    pub const EMPTY: KeywordSet = KeywordSet(0);

    pub const fn of(keywords: &[Keyword]) -> KeywordSet {
        let mut bits = 0;
        let mut i = 0;
        while i < keywords.len() {
            bits |= keywords[i].bit();
            i += 1;
        }
        KeywordSet(bits)
    }

    pub const fn with(self, keyword: Keyword) -> KeywordSet {
        KeywordSet(self.0 | keyword.bit())
    }

    pub const fn contains(self, keyword: Keyword) -> bool {
        self.0 & keyword.bit() != 0
    }

    /// Resolve `word` to a keyword if this set reserves it.
    pub fn lookup(self, word: &str) -> Option<Keyword> {
        Keyword::from_word(word).filter(|kw| self.contains(*kw))
    }

    pub fn iter(self) -> impl Iterator<Item = Keyword> {
        Keyword::ALL.into_iter().filter(move |kw| self.contains(*kw))
    }
}

impl From<Vec<Keyword>> for KeywordSet {
    fn from(keywords: Vec<Keyword>) -> Self {
        KeywordSet::of(&keywords)
    }
}

impl From<KeywordSet> for Vec<Keyword> {
    fn from(set: KeywordSet) -> Self {
        set.iter().collect()
    }
}

/// How a program's top level is organised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramForm {
    /// Statements run in order inside an implicit `main`.
    Script,
    /// The top level is a list of `def`s; the program starts at `def main()`.
    Module,
}

/// Named starting points for a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Minimal,
    Script,
    #[default]
    Full,
}

/// Grammar feature flags shared by the lexer and the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub keywords: KeywordSet,
    /// `#` starts a comment running to the end of the line.
    pub comments: bool,
    pub program: ProgramForm,
    /// `receiver.name(args)` postfix calls.
    pub member_calls: bool,
    /// `[a, b]` list literals and `xs[i]` indexing.
    pub lists: bool,
    /// Deepest nesting of blocks and sub-expressions the parser accepts.
    pub max_depth: usize,
}

impl Dialect {
    pub const DEFAULT_MAX_DEPTH: usize = 200;

    pub const MINIMAL: Dialect = Dialect {
        keywords: KeywordSet::of(&[Keyword::Def, Keyword::Var]),
        comments: false,
        program: ProgramForm::Script,
        member_calls: false,
        lists: false,
        max_depth: Self::DEFAULT_MAX_DEPTH,
    };

    pub const SCRIPT: Dialect = Dialect {
        keywords: KeywordSet::of(&[
            Keyword::Class,
            Keyword::Include,
            Keyword::While,
            Keyword::Return,
            Keyword::Var,
        ]),
        comments: true,
        program: ProgramForm::Script,
        member_calls: false,
        lists: false,
        max_depth: Self::DEFAULT_MAX_DEPTH,
    };

    pub const FULL: Dialect = Dialect {
        keywords: KeywordSet::of(&Keyword::ALL),
        comments: true,
        program: ProgramForm::Module,
        member_calls: true,
        lists: true,
        max_depth: Self::DEFAULT_MAX_DEPTH,
    };

    pub fn preset(preset: Preset) -> Dialect {
        match preset {
            Preset::Minimal => Self::MINIMAL,
            Preset::Script => Self::SCRIPT,
            Preset::Full => Self::FULL,
        }
    }

    /// Load a dialect from a TOML document.
    pub fn from_toml(text: &str) -> Result<Dialect, ConfigError> {
        let config: DialectConfig = toml::from_str(text)?;
        config.resolve()
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::FULL
    }
}

/// Error loading a dialect configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid dialect config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("max_depth must be at least 1")]
    ZeroDepth,
}

/// On-disk form of a dialect: a preset plus optional overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DialectConfig {
    preset: Preset,
    keywords: Option<KeywordSet>,
    comments: Option<bool>,
    program: Option<ProgramForm>,
    member_calls: Option<bool>,
    lists: Option<bool>,
    max_depth: Option<usize>,
}

impl DialectConfig {
    fn resolve(self) -> Result<Dialect, ConfigError> {
        let base = Dialect::preset(self.preset);
        let dialect = Dialect {
            keywords: self.keywords.unwrap_or(base.keywords),
            comments: self.comments.unwrap_or(base.comments),
            program: self.program.unwrap_or(base.program),
            member_calls: self.member_calls.unwrap_or(base.member_calls),
            lists: self.lists.unwrap_or(base.lists),
            max_depth: self.max_depth.unwrap_or(base.max_depth),
        };
        if dialect.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        Ok(dialect)
    }
}

use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::debug;
use nom::{
    bytes::complete::{take_till, take_while1},
    character::complete::{char, space0},
    combinator::{all_consuming, opt},
    sequence::{delimited, preceded, separated_pair, terminated},
    IResult,
};

use crate::error::{ExtractError, Result};

pub const DEFAULT_CATEGORY: &str = "X";
pub const DEFAULT_MAX_LENGTH: usize = 5;
pub const DEFAULT_MAX_SPAN: usize = 15;
pub const DEFAULT_MAX_NONTERMINALS: usize = 2;
pub const DEFAULT_MIN_GAP_SIZE: usize = 1;

/// Extraction limits. Spans are counted in source words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Label written as `[C]` and `[C,k]`.
    pub category: String,
    /// Max terminals plus nonterminals on the source side of a rule.
    pub max_length: usize,
    /// Max source span of the phrase a rule is cut from.
    pub max_span: usize,
    pub max_nonterminals: usize,
    /// Min source words separating two nonterminals.
    pub min_gap_size: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            category: DEFAULT_CATEGORY.to_string(),
            max_length: DEFAULT_MAX_LENGTH,
            max_span: DEFAULT_MAX_SPAN,
            max_nonterminals: DEFAULT_MAX_NONTERMINALS,
            min_gap_size: DEFAULT_MIN_GAP_SIZE,
        }
    }
}

impl ExtractorConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("max_length", self.max_length),
            ("max_span", self.max_span),
            ("max_nonterminals", self.max_nonterminals),
            ("min_gap_size", self.min_gap_size),
        ] {
            if value == 0 {
                return Err(ExtractError::Config(format!("{} must be at least 1", name)));
            }
        }
        if self.category.is_empty()
            || self
                .category
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '[' | ']' | ','))
        {
            return Err(ExtractError::Config(format!(
                "category '{}' must be non-empty and contain no whitespace, brackets or commas",
                self.category
            )));
        }
        Ok(())
    }

    /// Applies one `key = value` setting. Keys accept the aliases used by the
    /// older extraction scripts (`max_len`, `max_nt`, `max_size`).
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if key == "category" {
            self.category = value.trim_matches(|c: char| c == '"' || c == '\'').to_string();
            return Ok(());
        }
        let slot = match key {
            "max_len" | "max_length" => &mut self.max_length,
            "max_size" | "max_span" | "max_initial_size" => &mut self.max_span,
            "max_nt" | "max_nonterminals" => &mut self.max_nonterminals,
            "min_gap_size" => &mut self.min_gap_size,
            _ => return Err(ExtractError::Config(format!("unknown key '{}'", key))),
        };
        *slot = value.parse::<usize>().map_err(|e| {
            ExtractError::Config(format!("value '{}' for '{}': {}", value, key, e))
        })?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading extractor configuration from {:?}", path);
        let text = fs::read_to_string(path)?;
        text.parse()
    }
}

/// Parses a whole configuration text on top of the defaults.
impl FromStr for ExtractorConfig {
    type Err = ExtractError;

    fn from_str(text: &str) -> Result<Self> {
        let mut config = ExtractorConfig::default();
        for (line_num, line) in text.lines().enumerate() {
            let setting = parse_config_line(line).map_err(|e| ExtractError::Parse {
                line: line_num + 1,
                message: e.to_string(),
            })?;
            if let Some((key, value)) = setting {
                config.set(key, value).map_err(|e| match e {
                    ExtractError::Config(msg) => {
                        ExtractError::Config(format!("line {}: {}", line_num + 1, msg))
                    }
                    other => other,
                })?;
            }
        }
        config.validate()?;
        Ok(config)
    }
}

// --- Config Line Parsing ---

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn comment(input: &str) -> IResult<&str, &str> {
    preceded(char('#'), take_till(|_: char| false))(input)
}

fn setting(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(
        take_while1(is_key_char),
        delimited(space0, char('='), space0),
        take_while1(|c: char| !c.is_whitespace() && c != '#'),
    )(input)
}

/// `key = value  # comment`, a bare comment, or a blank line.
fn parse_config_line(line: &str) -> std::result::Result<Option<(&str, &str)>, nom::Err<nom::error::Error<&str>>> {
    let (_, parsed) = all_consuming(delimited(
        space0,
        opt(setting),
        terminated(space0, opt(comment)),
    ))(line.trim_end())?;
    Ok(parsed)
}

//! Hierarchical phrase-based (Hiero) grammar extraction from word-aligned
//! sentence pairs.

pub mod alignment;
pub mod config;
pub mod coverage;
pub mod error;
pub mod extractor;
pub mod nonterminal;
pub mod output;
pub mod parser;
pub mod rules;
pub mod structs;


pub use config::ExtractorConfig;
pub use error::{ExtractError, Result};
pub use extractor::{extract_corpus, RuleExtractor};
pub use structs::{Link, Rule, SentencePair, Symbol};

use clap::Parser;
use std::fmt;
use std::path::PathBuf;

// --- Data Structures ---

/// One `source-target` alignment link, 0-based on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Link {
    pub source: usize,
    pub target: usize,
}

impl Link {
    pub fn new(source: usize, target: usize) -> Self {
        Link { source, target }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

/// A word-aligned sentence pair, as read from `f ||| e ||| a` lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SentencePair {
    pub source: Vec<String>,
    pub target: Vec<String>,
    pub alignment: Vec<Link>,
}

impl SentencePair {
    pub fn new<S: Into<String>>(
        source: impl IntoIterator<Item = S>,
        target: impl IntoIterator<Item = S>,
        alignment: impl IntoIterator<Item = Link>,
    ) -> Self {
        SentencePair {
            source: source.into_iter().map(Into::into).collect(),
            target: target.into_iter().map(Into::into).collect(),
            alignment: alignment.into_iter().collect(),
        }
    }
}

/// A right-hand-side symbol of a rule: a word, or the gap `[C,k]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol<'a> {
    Terminal(&'a str),
    Gap(usize),
}

impl Symbol<'_> {
    pub fn is_gap(&self) -> bool {
        matches!(self, Symbol::Gap(_))
    }
}

/// A formed (or re-parsed) synchronous rule with rule-local link indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule<'a> {
    pub category: &'a str,
    pub source: Vec<Symbol<'a>>,
    pub target: Vec<Symbol<'a>>,
    pub links: Vec<Link>,
}

impl Rule<'_> {
    pub fn gap_count(&self) -> usize {
        self.source.iter().filter(|s| s.is_gap()).count()
    }

    fn write_side(&self, f: &mut fmt::Formatter<'_>, side: &[Symbol<'_>]) -> fmt::Result {
        for (i, sym) in side.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match sym {
                Symbol::Terminal(word) => f.write_str(word)?,
                Symbol::Gap(index) => write!(f, "[{},{}]", self.category, index)?,
            }
        }
        Ok(())
    }
}

// [C] ||| f1 [C,1] f3 ||| [C,1] e2 ||| 0-1 2-0
impl fmt::Display for Rule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ||| ", self.category)?;
        self.write_side(f, &self.source)?;
        f.write_str(" ||| ")?;
        self.write_side(f, &self.target)?;
        f.write_str(" |||")?;
        for link in &self.links {
            write!(f, " {}", link)?;
        }
        Ok(())
    }
}

// --- Command Line ---

#[derive(Parser, Debug)]
#[command(name = "hiero-extract", about = "Extracts hierarchical phrase-based grammar rules from word-aligned sentence pairs", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Extract rules from `source ||| target ||| alignment` lines.
    Extract(ExtractArgs),
}

#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// Input file, or `-` for stdin.
    #[arg(default_value = "-")]
    pub input: String,

    /// `key = value` configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Max terminals plus nonterminals on the source side.
    #[arg(long = "max-len")]
    pub max_length: Option<usize>,

    /// Max source span of an extracted phrase.
    #[arg(long = "max-span")]
    pub max_span: Option<usize>,

    /// Max nonterminals per rule.
    #[arg(long = "max-nt")]
    pub max_nonterminals: Option<usize>,

    /// Min source words between two nonterminals.
    #[arg(long = "min-gap")]
    pub min_gap_size: Option<usize>,

    /// Nonterminal category label.
    #[arg(long)]
    pub category: Option<String>,

    /// Write the union grammar here instead of stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Also write one `grammar.<n>` file per input line into this directory.
    #[arg(long = "per-sentence")]
    pub per_sentence: Option<PathBuf>,

    /// Sentence pairs read and extracted per parallel batch.
    #[arg(long = "batch-size", default_value_t = 10000)]
    pub batch_size: usize,

    /// Worker threads (0 lets rayon decide).
    #[arg(short = 'j', long = "threads", default_value_t = 0)]
    pub threads: usize,
}

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

// --- Output Writing ---

/// Sorted, duplicate-free union of sentence grammars, merged batch by batch
/// so per-sentence grammars can be dropped once written.
#[derive(Debug, Default)]
pub struct GrammarUnion {
    rules: BTreeSet<String>,
}

impl GrammarUnion {
    pub fn new() -> Self {
        GrammarUnion::default()
    }

    pub fn add(&mut self, grammars: impl IntoIterator<Item = Vec<String>>) {
        self.rules.extend(grammars.into_iter().flatten());
    }

    /// Writes the union to `output`, or to stdout when `None`.
    pub fn write(&self, output: Option<&Path>) -> io::Result<usize> {
        let rules = self.rules.iter().map(String::as_str);
        let written = if let Some(path) = output {
            let mut writer = BufWriter::new(File::create(path)?);
            let written = write_rules(&mut writer, rules)?;
            writer.flush()?;
            info!("Wrote {} rules to {:?}", written, path);
            written
        } else {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            let written = write_rules(&mut writer, rules)?;
            writer.flush()?;
            info!("Wrote {} rules to standard output", written);
            written
        };
        Ok(written)
    }
}

fn write_rules<'a, W: Write>(
    writer: &mut W,
    rules: impl IntoIterator<Item = &'a str>,
) -> io::Result<usize> {
    let mut written = 0;
    for rule in rules {
        writeln!(writer, "{}", rule)?;
        written += 1;
    }
    Ok(written)
}

/// Path of the grammar for 0-based sentence `n` inside `dir`.
pub fn sentence_grammar_path(dir: &Path, n: usize) -> PathBuf {
    dir.join(format!("grammar.{}", n))
}

/// Writes `grammar.<n>` for every sentence of a batch whose first sentence is
/// input line `first + 1`, creating `dir` if needed.
pub fn write_sentence_grammars(grammars: &[Vec<String>], dir: &Path, first: usize) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    for (n, rules) in grammars.iter().enumerate() {
        let mut writer = BufWriter::new(File::create(sentence_grammar_path(dir, first + n))?);
        write_rules(&mut writer, rules.iter().map(String::as_str))?;
        writer.flush()?;
    }
    debug!(
        "Wrote sentence grammars {}..{} to {:?}",
        first,
        first + grammars.len(),
        dir
    );
    Ok(())
}

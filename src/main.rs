use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use clap::Parser;
use hiero_extract::config::ExtractorConfig;
use hiero_extract::extractor::RuleExtractor;
use hiero_extract::output::{write_sentence_grammars, GrammarUnion};
use hiero_extract::parser::SentencePairs;
use hiero_extract::structs::{Cli, Commands, ExtractArgs};
use log::info;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => run_extract(args)?,
    }
    Ok(())
}

// File values override defaults, flags override both.
fn resolve_config(args: &ExtractArgs) -> hiero_extract::Result<ExtractorConfig> {
    let mut config = match &args.config {
        Some(path) => ExtractorConfig::load(path)?,
        None => ExtractorConfig::default(),
    };
    if let Some(n) = args.max_length {
        config.max_length = n;
    }
    if let Some(n) = args.max_span {
        config.max_span = n;
    }
    if let Some(n) = args.max_nonterminals {
        config.max_nonterminals = n;
    }
    if let Some(n) = args.min_gap_size {
        config.min_gap_size = n;
    }
    if let Some(category) = &args.category {
        config.category = category.clone();
    }
    config.validate()?;
    Ok(config)
}

fn run_extract(args: ExtractArgs) -> Result<(), Box<dyn Error>> {
    let config = resolve_config(&args)?;
    info!("Extracting with {:?}", config);

    if args.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()?;
    }

    let reader: Box<dyn BufRead> = if args.input == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(File::open(&args.input)?))
    };
    let extractor = RuleExtractor::new(config)?;
    let mut union = GrammarUnion::new();

    // Only the union outlives a batch.
    let read = extractor.extract_stream(SentencePairs::new(reader), args.batch_size, |first, grammars| {
        if let Some(dir) = &args.per_sentence {
            write_sentence_grammars(&grammars, dir, first)?;
        }
        union.add(grammars);
        Ok(())
    })?;
    info!("Read {} sentence pairs", read);

    union.write(args.output.as_deref())?;
    Ok(())
}

use std::io::{self, BufRead};

use log::warn;
use nom::{
    bytes::complete::{is_not, tag, take_until},
    character::complete::{char, digit1, multispace0, multispace1},
    combinator::{all_consuming, map, map_res, rest},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, separated_pair, tuple},
    IResult,
};

use crate::error::{ExtractError, Result};
use crate::structs::{Link, Rule, SentencePair, Symbol};

type NomError<'a> = nom::Err<nom::error::Error<&'a str>>;

fn parse_error(line: usize, e: NomError<'_>) -> ExtractError {
    ExtractError::Parse {
        line,
        message: e.to_string(),
    }
}

// --- Alignment Parsing ---

fn index(input: &str) -> IResult<&str, usize> {
    map_res(digit1, |s: &str| s.parse::<usize>())(input)
}

/// `i-j`
fn link(input: &str) -> IResult<&str, Link> {
    map(separated_pair(index, char('-'), index), |(s, t)| Link::new(s, t))(input)
}

fn links(input: &str) -> IResult<&str, Vec<Link>> {
    delimited(multispace0, separated_list0(multispace1, link), multispace0)(input)
}

/// Parses a whitespace separated `i-j i-j ...` alignment. Empty is fine.
pub fn parse_alignment(text: &str, line: usize) -> Result<Vec<Link>> {
    all_consuming(links)(text)
        .map(|(_, links)| links)
        .map_err(|e| parse_error(line, e))
}

// --- Sentence Pair Parsing ---

fn field(input: &str) -> IResult<&str, &str> {
    take_until("|||")(input)
}

/// Parses `source words ||| target words ||| alignment`.
pub fn parse_sentence_pair(text: &str, line: usize) -> Result<SentencePair> {
    let (_, (source, _, target, _, alignment)) =
        tuple((field, tag("|||"), field, tag("|||"), rest))(text)
            .map_err(|e: NomError<'_>| parse_error(line, e))?;

    Ok(SentencePair::new(
        source.split_whitespace(),
        target.split_whitespace(),
        parse_alignment(alignment, line)?,
    ))
}

/// Streams one sentence pair per input line. Blank lines yield an empty pair
/// so that pair `n` always comes from line `n`.
pub struct SentencePairs<R> {
    lines: io::Lines<R>,
    line_num: usize,
}

impl<R: BufRead> SentencePairs<R> {
    pub fn new(reader: R) -> Self {
        SentencePairs {
            lines: reader.lines(),
            line_num: 0,
        }
    }
}

impl<R: BufRead> Iterator for SentencePairs<R> {
    type Item = Result<SentencePair>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.lines.next()? {
            Ok(line) => line,
            Err(e) => return Some(Err(e.into())),
        };
        self.line_num += 1;
        if line.trim().is_empty() {
            warn!("Skipping blank input line {}", self.line_num);
            return Some(Ok(SentencePair::default()));
        }
        Some(parse_sentence_pair(&line, self.line_num))
    }
}

// --- Rule Parsing ---

fn category(input: &str) -> IResult<&str, &str> {
    delimited(char('['), is_not("[],| \t"), char(']'))(input)
}

// [X,3]
fn gap(input: &str) -> IResult<&str, usize> {
    delimited(char('['), preceded(pair(is_not("[],"), char(',')), index), char(']'))(input)
}

fn symbol(token: &str) -> Symbol<'_> {
    match all_consuming(gap)(token) {
        Ok((_, k)) => Symbol::Gap(k),
        Err(_) => Symbol::Terminal(token),
    }
}

fn symbols(side: &str) -> Vec<Symbol<'_>> {
    side.split_whitespace().map(symbol).collect()
}

/// Parses a rule line as written by the formatter back into a [`Rule`].
pub fn parse_rule(text: &str, line: usize) -> Result<Rule<'_>> {
    let (_, (cat, _, source, _, target, _, links)) = all_consuming(tuple((
        delimited(multispace0, category, multispace0),
        tag("|||"),
        field,
        tag("|||"),
        field,
        tag("|||"),
        links,
    )))(text)
    .map_err(|e| parse_error(line, e))?;

    Ok(Rule {
        category: cat,
        source: symbols(source),
        target: symbols(target),
        links,
    })
}

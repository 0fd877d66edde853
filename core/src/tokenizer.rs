use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref STRIP: Regex = Regex::new(r"[^\p{Alphabetic}\s]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Normalize text for indexing: NFD decomposition, everything that is not a
/// letter or whitespace removed, lowercased.
pub fn clean(text: &str) -> String {
    let decomposed: String = text.nfd().collect();
    STRIP.replace_all(&decomposed, "").to_lowercase()
}

/// Split cleaned text into raw word tokens.
pub fn parse(text: &str) -> Vec<String> {
    clean(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Stem a single already-cleaned word.
pub fn stem(word: &str) -> String {
    STEMMER.stem(word).to_string()
}

/// Tokenize and stem a line, dropping empty stems. Order of appearance is
/// preserved; this is what drives position assignment.
pub fn stems(line: &str) -> Vec<String> {
    parse(line)
        .iter()
        .map(|word| stem(word))
        .filter(|s| !s.is_empty())
        .collect()
}

/// The distinct stems of a query line, sorted ascending.
pub fn unique_stems(line: &str) -> BTreeSet<String> {
    parse(line)
        .iter()
        .map(|word| stem(word))
        .filter(|s| !s.is_empty())
        .collect()
}

/// The canonical form of a query: its distinct stems joined by single
/// spaces in sorted order. Used as the memoisation key for search results.
pub fn canonical(stems: &BTreeSet<String>) -> String {
    stems
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

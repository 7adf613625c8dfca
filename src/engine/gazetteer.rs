// Gazetteer engine: looks up phrase lists in the processed text.
//
// Each entity type gets one multi-pattern regex; types are scanned
// independently, so matches of different types may overlap (e.g. "Paris" as a
// Location inside "Paris Hilton" as a Person). Resolving those is the sorter's
// job, not the engine's.

use super::AnnotationEngine;
use crate::annotation::{Annotation, AnnotationSet};
use crate::document::Document;
use anyhow::{Context, Result};
use regex_automata::meta::Regex;
use regex_automata::util::syntax;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Phrase lists keyed by entity type, as read from a TOML file:
///
/// ```toml
/// case_insensitive = false
///
/// [lists]
/// Person = ["Ada Lovelace", "Charles Babbage"]
/// Location = ["London", "Paris"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GazetteerConfig {
    #[serde(default)]
    pub case_insensitive: bool,
    pub lists: BTreeMap<String, Vec<String>>,
}

impl GazetteerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read gazetteer file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid gazetteer file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

impl Default for GazetteerConfig {
    fn default() -> Self {
        let list = |phrases: &[&str]| phrases.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        let mut lists = BTreeMap::new();
        lists.insert(
            "Person".to_string(),
            list(&[
                "Ada Lovelace",
                "Charles Babbage",
                "Alan Turing",
                "Grace Hopper",
                "Marie Curie",
                "Isaac Newton",
                "Albert Einstein",
                "Winston Churchill",
                "Paris Hilton",
            ]),
        );
        lists.insert(
            "Location".to_string(),
            list(&[
                "London",
                "Paris",
                "New York",
                "Berlin",
                "Rome",
                "Tokyo",
                "Sheffield",
                "Manchester",
                "United Kingdom",
                "United States",
                "France",
                "Germany",
                "Europe",
            ]),
        );
        lists.insert(
            "Organization".to_string(),
            list(&["University of Sheffield", "United Nations", "BBC", "IBM"]),
        );
        Self {
            case_insensitive: false,
            lists,
        }
    }
}

struct CompiledList {
    kind: String,
    regex: Regex,
    // Indexed by pattern id
    phrases: Vec<String>,
}

/// Phrase-list recognizer
pub struct GazetteerEngine {
    lists: Vec<CompiledList>,
}

impl GazetteerEngine {
    pub fn new(config: &GazetteerConfig) -> Result<Self> {
        let mut lists = Vec::new();
        for (kind, phrases) in &config.lists {
            let mut phrases: Vec<String> = phrases
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
            if phrases.is_empty() {
                continue;
            }
            // Leftmost-first matching: put longer phrases first so they win at a shared start
            phrases.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
            phrases.dedup();

            let patterns: Vec<String> = phrases.iter().map(|p| phrase_pattern(p)).collect();
            let regex = Regex::builder()
                .syntax(syntax::Config::new().case_insensitive(config.case_insensitive))
                .build_many(&patterns)
                .with_context(|| format!("Failed to compile gazetteer list '{kind}'"))?;

            debug!("Compiled gazetteer list '{}' with {} phrases", kind, phrases.len());
            lists.push(CompiledList {
                kind: kind.clone(),
                regex,
                phrases,
            });
        }
        info!("Gazetteer ready with {} entity types", lists.len());
        Ok(Self { lists })
    }

    /// Entity types this gazetteer can produce
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.lists.iter().map(|list| list.kind.as_str())
    }
}

impl AnnotationEngine for GazetteerEngine {
    fn name(&self) -> &str {
        "gazetteer"
    }

    fn annotate(&self, doc: &Document) -> Result<AnnotationSet> {
        let text = doc.content.as_str();
        let mut set = AnnotationSet::new();
        let mut next_id = 0u64;

        for list in &self.lists {
            let mut offsets = CharOffsets::new(text);
            for found in list.regex.find_iter(text) {
                let start = offsets.char_offset(found.start());
                let end = offsets.char_offset(found.end());
                let phrase = &list.phrases[found.pattern().as_usize()];
                set.insert(
                    Annotation::new(next_id, list.kind.as_str(), start, end)
                        .with_feature("majorType", "gazetteer")
                        .with_feature("phrase", phrase.as_str()),
                )?;
                next_id += 1;
            }
        }

        debug!("Gazetteer found {} annotations in {}", set.len(), doc.locator);
        Ok(set)
    }
}

/// Regex for one phrase: literal text, any whitespace run between words, and
/// word boundaries wherever the phrase starts or ends with a word character
fn phrase_pattern(phrase: &str) -> String {
    let mut pattern = String::with_capacity(phrase.len() + 8);
    if phrase.chars().next().is_some_and(is_word_char) {
        pattern.push_str(r"\b");
    }
    for (i, word) in phrase.split_whitespace().enumerate() {
        if i > 0 {
            pattern.push_str(r"\s+");
        }
        for ch in word.chars() {
            if is_meta_char(ch) {
                pattern.push('\\');
            }
            pattern.push(ch);
        }
    }
    if phrase.chars().last().is_some_and(is_word_char) {
        pattern.push_str(r"\b");
    }
    pattern
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn is_meta_char(ch: char) -> bool {
    matches!(
        ch,
        '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' | '#' | '&' | '-' | '~'
    )
}

/// Converts increasing byte offsets into char offsets in a single pass
struct CharOffsets<'t> {
    text: &'t str,
    byte: usize,
    chars: usize,
}

impl<'t> CharOffsets<'t> {
    fn new(text: &'t str) -> Self {
        Self { text, byte: 0, chars: 0 }
    }

    fn char_offset(&mut self, byte: usize) -> usize {
        if byte < self.byte {
            return self.text[..byte].chars().count();
        }
        self.chars += self.text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }
}

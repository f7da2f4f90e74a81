//! Maps a user question to a canned response.

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use regex::RegexSet;
use serde::Deserialize;
use std::path::Path;

use crate::payload::{ChatResponse, WireResponse};

const BUILTIN_CATALOG: &str = include_str!("../data/responses.json");

/// Source of assistant responses.
pub trait Classifier {
    /// Best response for `query`, or `None` when nothing matches.
    fn classify(&self, query: &str) -> Option<ChatResponse>;

    /// Example questions this classifier can answer.
    fn prompts(&self) -> &[String];

    /// Up to `n` distinct prompts in an order determined by `seed`.
    fn random_prompts(&self, n: usize, seed: u64) -> Vec<String> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.prompts()
            .choose_multiple(&mut rng, n)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    prompt: String,
    keywords: Vec<String>,
    response: WireResponse,
}

#[derive(Debug)]
struct Entry {
    keywords: RegexSet,
    response: ChatResponse,
}

/// Picks the catalog entry whose keywords occur most often in the query.
/// Keywords match case-insensitively on word boundaries; ties go to the
/// entry listed first.
#[derive(Debug)]
pub struct KeywordClassifier {
    entries: Vec<Entry>,
    prompts: Vec<String>,
}

impl KeywordClassifier {
    /// Classifier over the catalog compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG).wrap_err("Built-in response catalog is invalid")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read catalog {}", path.display()))?;
        Self::from_json(&content)
            .wrap_err_with(|| format!("Failed to load catalog {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Vec<CatalogEntry> = serde_json::from_str(json)?;
        if catalog.is_empty() {
            return Err(eyre!("catalog has no entries"));
        }

        let mut entries = Vec::with_capacity(catalog.len());
        let mut prompts = Vec::with_capacity(catalog.len());
        for (i, entry) in catalog.into_iter().enumerate() {
            let patterns = entry
                .keywords
                .iter()
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .map(|k| format!(r"(?i)\b{}\b", regex::escape(k)));
            let keywords = RegexSet::new(patterns)
                .wrap_err_with(|| format!("entry {}: invalid keyword", i + 1))?;
            let response = ChatResponse::try_from(entry.response)
                .wrap_err_with(|| format!("entry {} ('{}')", i + 1, entry.prompt))?;
            prompts.push(entry.prompt);
            entries.push(Entry { keywords, response });
        }

        tracing::debug!(entries = entries.len(), "loaded response catalog");
        Ok(Self { entries, prompts })
    }

    /// Number of keywords of each entry found in `query`.
    fn scores<'a>(&'a self, query: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.entries
            .iter()
            .map(move |e| e.keywords.matches(query).iter().count())
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, query: &str) -> Option<ChatResponse> {
        let (best, hits) = self
            .scores(query)
            .enumerate()
            .fold((None, 0), |(best, top), (i, hits)| {
                if hits > top {
                    (Some(i), hits)
                } else {
                    (best, top)
                }
            });
        let idx = best?;
        tracing::debug!(query, entry = idx, hits, "classified query");
        self.entries.get(idx).map(|e| e.response.clone())
    }

    fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> KeywordClassifier {
        KeywordClassifier::from_json(
            r#"[
            {"prompt": "Headcount by department", "keywords": ["headcount", "department"],
             "response": {"type": "text", "text": "headcount"}},
            {"prompt": "Headcount change", "keywords": ["headcount", "change"],
             "response": {"type": "text", "text": "change"}},
            {"prompt": "Pay ranges", "keywords": ["pay"],
             "response": {"type": "text", "text": "pay"}}
        ]"#,
        )
        .unwrap()
    }

    #[test]
    fn most_hits_wins() {
        let c = catalog();
        assert_eq!(c.classify("How did HEADCOUNT change?").unwrap().text, "change");
        assert_eq!(
            c.classify("headcount per department").unwrap().text,
            "headcount"
        );
    }

    #[test]
    fn ties_go_to_catalog_order() {
        assert_eq!(catalog().classify("headcount").unwrap().text, "headcount");
    }

    #[test]
    fn keywords_match_whole_words_only() {
        let c = catalog();
        assert!(c.classify("what about payroll?").is_none());
        assert_eq!(c.classify("pay, please").unwrap().text, "pay");
    }

    #[test]
    fn invalid_entry_is_reported_with_its_position() {
        let err = KeywordClassifier::from_json(
            r#"[{"prompt": "Bad", "keywords": ["x"], "response": {"type": "chart", "data": {}}}]"#,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("entry 1 ('Bad')"));
    }

    #[test]
    fn builtin_catalog_loads_and_covers_every_kind() {
        let c = KeywordClassifier::builtin().unwrap();
        let mut kinds: Vec<&str> = c.entries.iter().map(|e| e.response.payload.kind()).collect();
        kinds.sort_unstable();
        kinds.dedup();
        for kind in [
            "text", "table", "chart", "gantt", "waterfall", "heatmap", "treemap", "funnel",
            "boxplot", "stackedbar",
        ] {
            assert!(kinds.contains(&kind), "missing {}", kind);
        }
    }

    #[test]
    fn random_prompts_are_distinct_and_seeded() {
        let c = KeywordClassifier::builtin().unwrap();
        let a = c.random_prompts(3, 42);
        assert_eq!(a.len(), 3);
        assert_eq!(a, c.random_prompts(3, 42));
        let mut dedup = a.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), 3);
        assert_eq!(c.random_prompts(100, 7).len(), c.prompts().len());
    }
}

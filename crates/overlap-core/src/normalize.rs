//! Token normalization
//!
//! Turns raw extracted text into a stream of lowercase lemmas with stopwords,
//! punctuation and non-alphabetic tokens removed. The output only feeds the
//! scorer; highlighting works on the original document text.
//!
//! Lemmas come from a small table of irregular English forms, falling back to
//! the English Snowball stemmer. Stems are not always dictionary words
//! ("studies" becomes "studi"), which is fine for set overlap since both
//! documents go through the same reduction.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use stop_words::{get, LANGUAGE};
use tracing::debug;

lazy_static! {
    /// Words, numbers (with inner separators) and single punctuation marks
    static ref TOKEN_RE: Regex = Regex::new(
        r"[\p{L}\p{M}]+(?:['’][\p{L}\p{M}]+)*|\p{N}+(?:[.,]\p{N}+)*|[^\s\p{L}\p{M}\p{N}]"
    )
    .expect("token pattern is valid");

    static ref MODEL: NlpModel = NlpModel::load();
}

const IRREGULAR_FORMS: &[(&str, &str)] = &[
    ("am", "be"),
    ("is", "be"),
    ("are", "be"),
    ("was", "be"),
    ("were", "be"),
    ("been", "be"),
    ("being", "be"),
    ("has", "have"),
    ("had", "have"),
    ("does", "do"),
    ("did", "do"),
    ("done", "do"),
    ("went", "go"),
    ("gone", "go"),
    ("sat", "sit"),
    ("ran", "run"),
    ("ate", "eat"),
    ("eaten", "eat"),
    ("seen", "see"),
    ("took", "take"),
    ("taken", "take"),
    ("gave", "give"),
    ("given", "give"),
    ("wrote", "write"),
    ("written", "write"),
    ("made", "make"),
    ("said", "say"),
    ("got", "get"),
    ("gotten", "get"),
    ("came", "come"),
    ("knew", "know"),
    ("known", "know"),
    ("thought", "think"),
    ("told", "tell"),
    ("became", "become"),
    ("felt", "feel"),
    ("brought", "bring"),
    ("began", "begin"),
    ("begun", "begin"),
    ("kept", "keep"),
    ("held", "hold"),
    ("stood", "stand"),
    ("heard", "hear"),
    ("understood", "understand"),
    ("spoke", "speak"),
    ("spoken", "speak"),
    ("bought", "buy"),
    ("taught", "teach"),
    ("fell", "fall"),
    ("fallen", "fall"),
    ("chose", "choose"),
    ("chosen", "choose"),
    ("drove", "drive"),
    ("driven", "drive"),
    ("rose", "rise"),
    ("risen", "rise"),
    ("grew", "grow"),
    ("grown", "grow"),
    ("drew", "draw"),
    ("drawn", "draw"),
    ("shown", "show"),
    ("broke", "break"),
    ("broken", "break"),
    ("built", "build"),
    ("sent", "send"),
    ("spent", "spend"),
    ("lost", "lose"),
    ("paid", "pay"),
    ("sold", "sell"),
    ("fought", "fight"),
    ("caught", "catch"),
    ("sought", "seek"),
    ("forgot", "forget"),
    ("forgotten", "forget"),
    ("flew", "fly"),
    ("flown", "fly"),
    ("wore", "wear"),
    ("worn", "wear"),
    ("swam", "swim"),
    ("sang", "sing"),
    ("sung", "sing"),
    ("drank", "drink"),
    ("threw", "throw"),
    ("thrown", "throw"),
    ("men", "man"),
    ("women", "woman"),
    ("children", "child"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("people", "person"),
];

/// Process-wide language model: stopwords, irregular forms and a stemmer.
///
/// Built once on first use and read-only afterwards.
pub struct NlpModel {
    stop_words: HashSet<String>,
    irregular: HashMap<&'static str, &'static str>,
    stemmer: Stemmer,
}

impl NlpModel {
    fn load() -> Self {
        let stop_words: HashSet<String> = get(LANGUAGE::English)
            .into_iter()
            .map(|w| w.to_lowercase())
            .collect();
        let irregular: HashMap<_, _> = IRREGULAR_FORMS.iter().copied().collect();

        debug!(
            stop_words = stop_words.len(),
            irregular_forms = irregular.len(),
            "Loaded English NLP model"
        );

        Self {
            stop_words,
            irregular,
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(&token.to_lowercase())
    }

    /// Lowercased base form of an alphabetic token
    pub fn lemma(&self, token: &str) -> String {
        let lower = token.to_lowercase();
        if let Some(base) = self.irregular.get(lower.as_str()) {
            return (*base).to_string();
        }
        self.stemmer.stem(&lower).into_owned()
    }

    /// Whether a token survives filtering: alphabetic and not a stopword.
    fn keeps(&self, token: &str) -> bool {
        is_alpha(token) && !is_punct(token) && !self.is_stop_word(token)
    }
}

/// The shared model, loaded on first call.
pub fn model() -> &'static NlpModel {
    &MODEL
}

/// Split text into word, number and punctuation tokens.
///
/// English clitics are split off the way dictionary tokenizers do it:
/// "don't" becomes `do` + `n't`, "cat's" becomes `cat` + `'s`.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for m in TOKEN_RE.find_iter(text) {
        split_clitic(m.as_str(), &mut tokens);
    }
    tokens
}

fn split_clitic(word: &str, out: &mut Vec<String>) {
    let Some(pos) = word.find(['\'', '’']) else {
        out.push(word.to_string());
        return;
    };

    let lower = word.to_lowercase();
    let negation = ["n't", "n’t"].iter().find(|suffix| lower.ends_with(*suffix));
    if let Some(suffix) = negation {
        let stem_len = word.len() - suffix.len();
        let base = match lower.as_str() {
            "can't" | "can’t" => "can".to_string(),
            "won't" | "won’t" => "will".to_string(),
            "shan't" | "shan’t" => "shall".to_string(),
            _ => word[..stem_len].to_string(),
        };
        if !base.is_empty() {
            out.push(base);
        }
        out.push(word[stem_len..].to_string());
        return;
    }

    out.push(word[..pos].to_string());
    out.push(word[pos..].to_string());
}

fn is_alpha(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}

fn is_punct(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| !c.is_alphanumeric() && !c.is_whitespace())
}

/// Lowercase, lemmatize and filter `text`, joining the survivors with single
/// spaces.
pub fn normalize(text: &str) -> String {
    let model = model();
    tokenize(text)
        .iter()
        .filter(|t| model.keeps(t))
        .map(|t| model.lemma(t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run a single surface word through the same filter and lemma pipeline.
///
/// Returns the lemma of the first surviving token ("Jumping." gives `jump`),
/// or `None` when everything is filtered out.
pub fn lemmatize_word(word: &str) -> Option<String> {
    let model = model();
    tokenize(word)
        .iter()
        .find(|t| model.keeps(t))
        .map(|t| model.lemma(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tokenize_separates_punctuation() {
        assert_eq!(
            tokenize("The cat, sat."),
            vec!["The", "cat", ",", "sat", "."]
        );
    }

    #[test]
    fn test_tokenize_splits_clitics() {
        assert_eq!(tokenize("don't"), vec!["do", "n't"]);
        assert_eq!(tokenize("cat's"), vec!["cat", "'s"]);
        assert_eq!(tokenize("can't"), vec!["can", "n't"]);
    }

    #[test]
    fn test_tokenize_keeps_numbers_together() {
        assert_eq!(tokenize("pay 1,000.50 now"), vec!["pay", "1,000.50", "now"]);
    }

    #[test]
    fn test_normalize_scenario_user_text() {
        assert_eq!(normalize("The cat sat on the mat"), "cat sit mat");
    }

    #[test]
    fn test_normalize_drops_numbers_and_punctuation() {
        let out = normalize("cats! 42 mats?");
        assert_eq!(out, "cat mat");
    }

    #[test]
    fn test_normalize_lowercases() {
        assert_eq!(normalize("CAT Mat"), "cat mat");
    }

    #[test]
    fn test_normalize_reduces_inflections() {
        assert_eq!(normalize("jumping"), "jump");
        assert_eq!(normalize("mice"), "mouse");
    }

    #[test]
    fn test_normalize_empty_text() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("the of and ."), "");
    }

    #[test]
    fn test_normalize_keeps_content_words() {
        assert_eq!(
            normalize("research system problem information"),
            "research system problem inform"
        );
        assert_eq!(normalize("the world of work"), "world work");
        assert_eq!(normalize("to test and run"), "test run");
    }

    #[test]
    fn test_stop_list_is_function_words_only() {
        let model = model();
        for word in ["the", "and", "of", "which", "themselves", "shouldn't"] {
            assert!(model.is_stop_word(word), "{word} should be a stopword");
        }
        for word in ["research", "system", "problem", "information", "world", "work", "test"] {
            assert!(!model.is_stop_word(word), "{word} should be kept");
        }
    }

    #[test]
    fn test_normalize_output_is_single_spaced() {
        let out = normalize("cat\n\n\tmat   hat");
        assert!(!out.contains("  "));
        assert!(!out.contains('\n'));
    }

    #[test]
    fn test_lemmatize_word_strips_trailing_punctuation() {
        assert_eq!(lemmatize_word("Jumping."), Some("jump".to_string()));
        assert_eq!(lemmatize_word("mat,"), Some("mat".to_string()));
    }

    #[test]
    fn test_lemmatize_word_filters_stopwords() {
        assert_eq!(lemmatize_word("The"), None);
        assert_eq!(lemmatize_word("--"), None);
    }

    #[test]
    fn test_model_is_shared() {
        assert!(std::ptr::eq(model(), model()));
    }
}

//! In-memory corpus and feature-channel builders.
//!
//! A [`Corpus`] holds tokenised sentences with every token already mapped to
//! a dense word-type index (first-seen order, after preprocessing). From it
//! the feature channels are derived:
//!
//! - [`Corpus::context_channel`]: counts of the most frequent word types
//!   immediately to the left and right of each type's tokens;
//! - [`Corpus::morphology_channel`]: two-letter suffixes, optionally
//!   followed by the spelling flags;
//! - [`Corpus::orthographic_channel`]: the spelling flags on their own;
//! - [`Corpus::dependency_channel`]: gold tags of dependency heads and
//!   dependents, for CoNLL input that carries a head column.
//!
//! Gold tags, when present, are coded the same way and exposed as a
//! [`GoldStandard`] for evaluation.

use crate::error::{Error, Result};
use crate::features::{Channel, FeatureSet};
use crate::metrics::GoldStandard;
use ndarray::Array2;
use std::collections::HashMap;
use std::io::BufRead;

/// Name of the channel built by [`Corpus::context_channel`].
pub const CONTEXT_CHANNEL: &str = "context";
/// Name of the channel built by [`Corpus::orthographic_channel`].
pub const ORTHOGRAPHIC_CHANNEL: &str = "orthographic";
/// Name of the channel built by [`Corpus::morphology_channel`].
pub const MORPHOLOGY_CHANNEL: &str = "morphology";
/// Name of the channel built by [`Corpus::dependency_channel`].
pub const DEPENDENCY_CHANNEL: &str = "dependency";

/// Only alphabetic word types longer than this get a suffix feature.
const SUFFIX_MIN_LEN: usize = 4;
/// Suffix length in characters.
const SUFFIX_LEN: usize = 2;

const PUNCTUATION: &[&str] = &[
    ":", ",", ".", "?", "!", ";", "...", "\u{2026}", "\u{00BB}", "\u{00AB}", "\u{201C}",
    "\u{201D}", "(", ")", "{", "}", "[", "]", "<", ">", "-", "--", "``", "''", "`", "'", "\"",
];

/// CoNLL column holding the word form.
const WORD_COLUMN: usize = 1;
/// CoNLL column holding the fine-grained tag.
const TAG_COLUMN: usize = 3;
/// CoNLL-X head column.
const HEAD_COLUMN: usize = 6;
/// Head column of files with an extra universal-tag column.
const SHIFTED_HEAD_COLUMN: usize = 7;
/// Placeholder for a missing annotation.
const UNTAGGED: &str = "_";

/// Initial capital, digit, hyphen, non-word character.
fn spelling_flags(word: &str) -> [bool; 4] {
    [
        word.chars().next().is_some_and(|c| c.is_ascii_uppercase()),
        word.chars().any(|c| c.is_ascii_digit()),
        word.contains('-'),
        word.chars().any(|c| !(c.is_ascii_alphanumeric() || c == '_')),
    ]
}

/// Last [`SUFFIX_LEN`] characters of an alphabetic word longer than
/// [`SUFFIX_MIN_LEN`].
fn suffix(word: &str) -> Option<&str> {
    let len = word.chars().count();
    if len <= SUFFIX_MIN_LEN || !word.chars().all(char::is_alphabetic) {
        return None;
    }
    word.char_indices().nth(len - SUFFIX_LEN).map(|(i, _)| &word[i..])
}

/// Whether `word` is one of the recognised punctuation tokens.
pub fn is_punct(word: &str) -> bool {
    PUNCTUATION.contains(&word)
}

/// Preprocessing and feature-extraction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorpusOptions {
    /// Lowercase words before coding them.
    pub lowercase: bool,
    /// Collapse every punctuation token into the single type `"."`.
    pub ignore_punct: bool,
    /// Number of frequent word types used as context features.
    pub context_words: usize,
    /// Append the spelling flags to the morphology channel.
    pub extended_morph: bool,
    /// Add the dependency channel to [`Corpus::feature_set`] when heads and
    /// tags are available.
    pub dependency_features: bool,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            lowercase: false,
            ignore_punct: false,
            context_words: 100,
            extended_morph: true,
            dependency_features: false,
        }
    }
}

impl CorpusOptions {
    /// Set lowercasing.
    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    /// Set punctuation collapsing.
    pub fn with_ignore_punct(mut self, ignore_punct: bool) -> Self {
        self.ignore_punct = ignore_punct;
        self
    }

    /// Set the number of context words.
    pub fn with_context_words(mut self, context_words: usize) -> Self {
        self.context_words = context_words;
        self
    }

    /// Set whether spelling flags follow the suffix features.
    pub fn with_extended_morph(mut self, extended_morph: bool) -> Self {
        self.extended_morph = extended_morph;
        self
    }

    /// Set whether [`Corpus::feature_set`] includes the dependency channel.
    pub fn with_dependency_features(mut self, dependency_features: bool) -> Self {
        self.dependency_features = dependency_features;
        self
    }

    /// Map a raw token to its word-type string.
    pub fn preprocess(&self, word: &str) -> String {
        if self.ignore_punct && is_punct(word) {
            ".".to_string()
        } else if self.lowercase {
            word.to_lowercase()
        } else {
            word.to_string()
        }
    }
}

/// Dense string ↔ index coder, first-seen order.
#[derive(Debug, Clone, Default)]
struct Coder {
    index: HashMap<String, usize>,
    strings: Vec<String>,
}

impl Coder {
    fn encode(&mut self, s: String) -> usize {
        if let Some(&i) = self.index.get(&s) {
            return i;
        }
        let i = self.strings.len();
        self.index.insert(s.clone(), i);
        self.strings.push(s);
        i
    }

    fn get(&self, s: &str) -> Option<usize> {
        self.index.get(s).copied()
    }
}

/// Tokenised corpus with coded word types and optional gold tags.
#[derive(Debug, Clone)]
pub struct Corpus {
    options: CorpusOptions,
    types: Coder,
    tags: Coder,
    sentences: Vec<Vec<usize>>,
    gold: Option<Vec<Vec<usize>>>,
    heads: Option<Vec<Vec<usize>>>,
    type_counts: Vec<usize>,
}

impl Corpus {
    /// Build a corpus from tokenised sentences.
    ///
    /// `tags`, when given, must have one tag sentence per sentence and one
    /// tag per token. Sentences that are empty on both sides are dropped.
    pub fn from_sentences<S, T>(
        sentences: &[Vec<S>],
        tags: Option<&[Vec<T>]>,
        options: CorpusOptions,
    ) -> Result<Self>
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        if sentences.iter().all(|s| s.is_empty()) {
            return Err(Error::EmptyInput);
        }
        if let Some(tags) = tags {
            if tags.len() != sentences.len() {
                return Err(Error::ShapeMismatch {
                    expected: format!("{} tagged sentences", sentences.len()),
                    actual: format!("{}", tags.len()),
                });
            }
            for (i, (sent, sent_tags)) in sentences.iter().zip(tags).enumerate() {
                if sent.len() != sent_tags.len() {
                    return Err(Error::ShapeMismatch {
                        expected: format!("{} tags in sentence {}", sent.len(), i),
                        actual: format!("{}", sent_tags.len()),
                    });
                }
            }
        }

        let mut types = Coder::default();
        let mut tag_coder = Coder::default();
        let mut coded = Vec::with_capacity(sentences.len());
        let mut gold = tags.map(|_| Vec::with_capacity(sentences.len()));
        let mut type_counts = Vec::new();
        for (i, sentence) in sentences.iter().enumerate() {
            if sentence.is_empty() {
                continue;
            }
            let ids: Vec<usize> = sentence
                .iter()
                .map(|w| {
                    let id = types.encode(options.preprocess(w.as_ref()));
                    if id == type_counts.len() {
                        type_counts.push(0);
                    }
                    type_counts[id] += 1;
                    id
                })
                .collect();
            coded.push(ids);
            if let (Some(gold), Some(tags)) = (gold.as_mut(), tags) {
                gold.push(
                    tags[i]
                        .iter()
                        .map(|t| tag_coder.encode(t.as_ref().to_string()))
                        .collect::<Vec<usize>>(),
                );
            }
        }

        Ok(Self {
            options,
            types,
            tags: tag_coder,
            sentences: coded,
            gold,
            heads: None,
            type_counts,
        })
    }

    /// Attach 1-based dependency heads, one per token of every sentence;
    /// `0` marks the root.
    pub fn with_heads(mut self, heads: Vec<Vec<usize>>) -> Result<Self> {
        if heads.len() != self.sentences.len() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} sentences of heads", self.sentences.len()),
                actual: format!("{}", heads.len()),
            });
        }
        for (i, (sent, sent_heads)) in self.sentences.iter().zip(&heads).enumerate() {
            if sent.len() != sent_heads.len() {
                return Err(Error::ShapeMismatch {
                    expected: format!("{} heads in sentence {}", sent.len(), i),
                    actual: format!("{}", sent_heads.len()),
                });
            }
            if let Some(&h) = sent_heads.iter().find(|&&h| h > sent.len()) {
                return Err(Error::ShapeMismatch {
                    expected: format!("heads in 0..={} in sentence {}", sent.len(), i),
                    actual: format!("{h}"),
                });
            }
        }
        self.heads = Some(heads);
        Ok(self)
    }

    /// Read a CoNLL-style corpus: one token per line, whitespace-separated
    /// columns, the word in column 2 and the fine tag in column 4, sentences
    /// separated by blank lines.
    ///
    /// The corpus counts as tagged when its first token's tag is not `_`.
    /// Dependency heads are taken from column 8 when it is numeric, else
    /// column 7; they are kept only if every token has one.
    pub fn read_conll<R: BufRead>(reader: R, options: CorpusOptions) -> Result<Self> {
        let mut sentences: Vec<Vec<String>> = Vec::new();
        let mut tags: Vec<Vec<String>> = Vec::new();
        let mut heads: Vec<Vec<usize>> = Vec::new();
        let mut words = Vec::new();
        let mut sent_tags = Vec::new();
        let mut sent_heads = Vec::new();
        let mut has_heads = true;

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                if !words.is_empty() {
                    sentences.push(std::mem::take(&mut words));
                    tags.push(std::mem::take(&mut sent_tags));
                    heads.push(std::mem::take(&mut sent_heads));
                }
                continue;
            }
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.len() <= TAG_COLUMN {
                return Err(Error::Parse {
                    line: i + 1,
                    message: format!(
                        "expected at least {} columns, found {}",
                        TAG_COLUMN + 1,
                        columns.len()
                    ),
                });
            }
            words.push(columns[WORD_COLUMN].to_string());
            sent_tags.push(columns[TAG_COLUMN].to_string());
            let head = [SHIFTED_HEAD_COLUMN, HEAD_COLUMN]
                .iter()
                .find_map(|&c| columns.get(c).and_then(|h| h.parse::<usize>().ok()));
            match head {
                Some(h) => sent_heads.push(h),
                None => has_heads = false,
            }
        }
        if !words.is_empty() {
            sentences.push(words);
            tags.push(sent_tags);
            heads.push(sent_heads);
        }

        let tagged = tags
            .first()
            .and_then(|s| s.first())
            .is_some_and(|t| t != UNTAGGED);
        let mut corpus =
            Self::from_sentences(&sentences, tagged.then_some(tags.as_slice()), options)?;
        if has_heads {
            corpus = corpus.with_heads(heads)?;
        }
        log::debug!(
            "read {} sentences, {} tokens, {} word types (tagged: {}, heads: {})",
            corpus.num_sentences(),
            corpus.num_tokens(),
            corpus.num_types(),
            tagged,
            has_heads
        );
        Ok(corpus)
    }

    /// Options the corpus was built with.
    pub fn options(&self) -> &CorpusOptions {
        &self.options
    }

    /// Number of word types.
    pub fn num_types(&self) -> usize {
        self.types.strings.len()
    }

    /// Number of tokens.
    pub fn num_tokens(&self) -> usize {
        self.sentences.iter().map(Vec::len).sum()
    }

    /// Number of sentences.
    pub fn num_sentences(&self) -> usize {
        self.sentences.len()
    }

    /// Sentences as word-type indices.
    pub fn sentences(&self) -> &[Vec<usize>] {
        &self.sentences
    }

    /// String of a word type.
    pub fn word(&self, word_type: usize) -> &str {
        &self.types.strings[word_type]
    }

    /// Index of a raw token's word type, if it occurs in the corpus.
    pub fn word_type(&self, raw: &str) -> Option<usize> {
        self.types.get(&self.options.preprocess(raw))
    }

    /// Token count of each word type.
    pub fn type_counts(&self) -> &[usize] {
        &self.type_counts
    }

    /// Whether gold tags are available.
    pub fn has_tags(&self) -> bool {
        self.gold.is_some()
    }

    /// Whether dependency heads are available.
    pub fn has_heads(&self) -> bool {
        self.heads.is_some()
    }

    /// Tag strings, indexed by coded tag.
    pub fn tag_names(&self) -> &[String] {
        &self.tags.strings
    }

    /// The `context_words` most frequent word types, most frequent first.
    /// Ties keep first-seen order.
    pub fn frequent_words(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.num_types()).collect();
        order.sort_by(|&a, &b| self.type_counts[b].cmp(&self.type_counts[a]));
        order.truncate(self.options.context_words.min(order.len()));
        order
    }

    /// Left/right neighbour counts over the frequent word types.
    ///
    /// With `N` frequent words the channel has `2N + 2` features: the left
    /// block `[0, N)` with its NULL at `N`, then the right block at `N + 1`
    /// with its NULL at `2N + 1`. A neighbour that is not a frequent word
    /// counts as NULL; sentence boundaries add nothing.
    pub fn context_channel(&self) -> Result<Channel> {
        let frequent = self.frequent_words();
        let n = frequent.len();
        let mut slot = vec![None; self.num_types()];
        for (i, &t) in frequent.iter().enumerate() {
            slot[t] = Some(i);
        }

        let mut counts = Array2::<u32>::zeros((self.num_types(), 2 * n + 2));
        let right = n + 1;
        for sentence in &self.sentences {
            for (pos, &t) in sentence.iter().enumerate() {
                if pos > 0 {
                    let f = slot[sentence[pos - 1]].unwrap_or(n);
                    counts[[t, f]] += 1;
                }
                if let Some(&next) = sentence.get(pos + 1) {
                    let f = slot[next].unwrap_or(n);
                    counts[[t, right + f]] += 1;
                }
            }
        }
        Channel::new(CONTEXT_CHANNEL, counts)
    }

    /// Spelling features of each word type.
    ///
    /// Columns: initial capital, contains a digit, contains a hyphen,
    /// contains a non-word character, NULL (none of the four).
    pub fn orthographic_channel(&self) -> Result<Channel> {
        let mut counts = Array2::<u32>::zeros((self.num_types(), 5));
        for (t, word) in self.types.strings.iter().enumerate() {
            let flags = spelling_flags(word);
            for (f, &on) in flags.iter().enumerate() {
                if on {
                    counts[[t, f]] = 1;
                }
            }
            if !flags.iter().any(|&on| on) {
                counts[[t, 4]] = 1;
            }
        }
        Channel::new(ORTHOGRAPHIC_CHANNEL, counts)
    }

    /// Suffix features of each word type.
    ///
    /// One column per distinct two-letter suffix (first-seen order), then a
    /// NULL column for types without one. With `extended_morph` the four
    /// spelling flags of [`orthographic_channel`](Self::orthographic_channel)
    /// follow the NULL column.
    pub fn morphology_channel(&self) -> Result<Channel> {
        let mut suffixes = Coder::default();
        let coded: Vec<Option<usize>> = self
            .types
            .strings
            .iter()
            .map(|w| suffix(w).map(|s| suffixes.encode(s.to_string())))
            .collect();
        let null = suffixes.strings.len();
        let width = null + 1 + if self.options.extended_morph { 4 } else { 0 };

        let mut counts = Array2::<u32>::zeros((self.num_types(), width));
        for (t, s) in coded.iter().enumerate() {
            counts[[t, s.unwrap_or(null)]] = 1;
            if self.options.extended_morph {
                let flags = spelling_flags(&self.types.strings[t]);
                for (f, &on) in flags.iter().enumerate() {
                    if on {
                        counts[[t, null + 1 + f]] = 1;
                    }
                }
            }
        }
        Channel::new(MORPHOLOGY_CHANNEL, counts)
    }

    /// Gold tags of each type's dependency neighbours.
    ///
    /// Every token counts its head's tag, or ROOT (the last column) when it
    /// has none; every head counts the tag of each dependent.
    pub fn dependency_channel(&self) -> Result<Channel> {
        let heads = self
            .heads
            .as_ref()
            .ok_or_else(|| Error::Other("corpus has no dependency heads".to_string()))?;
        let gold = self
            .gold
            .as_ref()
            .ok_or_else(|| Error::Other("dependency features need gold tags".to_string()))?;
        let root = self.tags.strings.len();

        let mut counts = Array2::<u32>::zeros((self.num_types(), root + 1));
        for ((sentence, sent_tags), sent_heads) in self.sentences.iter().zip(gold).zip(heads) {
            for (i, (&t, &h)) in sentence.iter().zip(sent_heads).enumerate() {
                if h == 0 {
                    counts[[t, root]] += 1;
                } else {
                    counts[[t, sent_tags[h - 1]]] += 1;
                    counts[[sentence[h - 1], sent_tags[i]]] += 1;
                }
            }
        }
        Channel::new(DEPENDENCY_CHANNEL, counts)
    }

    /// Context and morphology channels, plus the dependency channel when
    /// `dependency_features` is set and heads and tags are present.
    pub fn feature_set(&self) -> Result<FeatureSet> {
        let mut channels = vec![self.context_channel()?, self.morphology_channel()?];
        if self.options.dependency_features && self.has_heads() && self.has_tags() {
            channels.push(self.dependency_channel()?);
        }
        FeatureSet::new(channels)
    }

    /// Expand a per-type assignment to one cluster per token, in corpus order.
    pub fn token_assignments(&self, assignment: &[usize]) -> Result<Vec<usize>> {
        if assignment.len() != self.num_types() {
            return Err(Error::DimensionMismatch {
                expected: self.num_types(),
                found: assignment.len(),
            });
        }
        Ok(self
            .sentences
            .iter()
            .flatten()
            .map(|&t| assignment[t])
            .collect())
    }

    /// Gold tags for evaluation, if the corpus is tagged.
    pub fn gold_standard(&self) -> Option<GoldStandard> {
        let gold = self.gold.as_ref()?;
        let token_types = self.sentences.iter().flatten().copied().collect();
        let tags = gold.iter().flatten().copied().collect();
        GoldStandard::new(token_types, tags).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sentences() -> Vec<Vec<&'static str>> {
        vec![
            vec!["The", "dog", "barks", "."],
            vec!["the", "cat", "sees", "the", "dog", "."],
        ]
    }

    fn lowered() -> CorpusOptions {
        CorpusOptions::default().with_lowercase(true)
    }

    #[test]
    fn test_types_in_first_seen_order() {
        let corpus =
            Corpus::from_sentences::<_, &str>(&sentences(), None, lowered()).unwrap();
        assert_eq!(corpus.num_types(), 6);
        assert_eq!(corpus.num_tokens(), 10);
        assert_eq!(corpus.word(0), "the");
        assert_eq!(corpus.word_type("THE"), Some(0));
        assert_eq!(corpus.type_counts()[0], 3);
        assert!(!corpus.has_tags());
        assert!(corpus.gold_standard().is_none());
    }

    #[test]
    fn test_case_preserved_without_lowercasing() {
        let options = CorpusOptions::default().with_lowercase(false);
        let corpus = Corpus::from_sentences::<_, &str>(&sentences(), None, options).unwrap();
        assert_eq!(corpus.num_types(), 7);
    }

    #[test]
    fn test_punctuation_collapses() {
        let options = CorpusOptions::default().with_ignore_punct(true);
        let sents = vec![vec!["hi", "!"], vec!["hi", "?"]];
        let corpus = Corpus::from_sentences::<_, &str>(&sents, None, options).unwrap();
        assert_eq!(corpus.num_types(), 2);
        assert_eq!(corpus.word(1), ".");
        assert!(is_punct("\u{201C}"));
        assert!(!is_punct("a"));
    }

    #[test]
    fn test_frequent_words_tie_break() {
        let options = lowered().with_context_words(2);
        let corpus = Corpus::from_sentences::<_, &str>(&sentences(), None, options).unwrap();
        // the: 3, dog: 2, .: 2 -> dog wins the tie by appearing first.
        assert_eq!(corpus.frequent_words(), vec![0, 1]);
    }

    #[test]
    fn test_context_channel_layout() {
        let options = lowered().with_context_words(2);
        let corpus = Corpus::from_sentences::<_, &str>(&sentences(), None, options).unwrap();
        let ch = corpus.context_channel().unwrap();
        // N = 2: left [the, dog, NULL], right [the, dog, NULL]
        assert_eq!(ch.num_features(), 6);
        let dog = corpus.word_type("dog").unwrap();
        // "the dog" twice on the left; "barks" and "." (both NULL) on the right.
        assert_eq!(ch.row(dog).to_vec(), vec![2, 0, 0, 0, 0, 2]);
        let the = corpus.word_type("the").unwrap();
        // Left: sentence start, start, "sees" (NULL). Right: dog, cat (NULL), dog.
        assert_eq!(ch.row(the).to_vec(), vec![0, 0, 1, 0, 2, 1]);
    }

    #[test]
    fn test_context_words_capped_by_vocabulary() {
        let corpus =
            Corpus::from_sentences::<_, &str>(&sentences(), None, lowered()).unwrap();
        assert_eq!(corpus.context_channel().unwrap().num_features(), 2 * 6 + 2);
    }

    #[test]
    fn test_orthographic_channel() {
        let options = CorpusOptions::default().with_lowercase(false);
        let sents = vec![vec!["Paris", "x-ray", "42", "plain", "U.S."]];
        let corpus = Corpus::from_sentences::<_, &str>(&sents, None, options).unwrap();
        let ch = corpus.orthographic_channel().unwrap();
        assert_eq!(ch.row(0).to_vec(), vec![1, 0, 0, 0, 0]);
        assert_eq!(ch.row(1).to_vec(), vec![0, 0, 1, 1, 0]);
        assert_eq!(ch.row(2).to_vec(), vec![0, 1, 0, 0, 0]);
        assert_eq!(ch.row(3).to_vec(), vec![0, 0, 0, 0, 1]);
        assert_eq!(ch.row(4).to_vec(), vec![1, 0, 0, 1, 0]);
    }

    #[test]
    fn test_token_assignments() {
        let corpus =
            Corpus::from_sentences::<_, &str>(&sentences(), None, lowered()).unwrap();
        let z = vec![0, 1, 2, 3, 4, 5];
        let tokens = corpus.token_assignments(&z).unwrap();
        assert_eq!(tokens, vec![0, 1, 2, 3, 0, 4, 5, 0, 1, 3]);
        assert!(corpus.token_assignments(&z[..3]).is_err());
    }

    #[test]
    fn test_tag_shape_checked() {
        let sents = vec![vec!["a", "b"]];
        let tags = vec![vec!["X"]];
        let result = Corpus::from_sentences(&sents, Some(tags.as_slice()), CorpusOptions::default());
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_read_conll() {
        let text = "1\tThe\t_\tDT\n2\tdog\t_\tNN\n\n1\tDogs\t_\tNNS\n2\tbark\t_\tVBP\n";
        let corpus = Corpus::read_conll(Cursor::new(text), CorpusOptions::default()).unwrap();
        assert_eq!(corpus.num_sentences(), 2);
        assert_eq!(corpus.num_tokens(), 4);
        assert!(corpus.has_tags());
        assert_eq!(corpus.tag_names(), &["DT", "NN", "NNS", "VBP"]);
        let gold = corpus.gold_standard().unwrap();
        assert_eq!(gold.tags(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_read_conll_untagged() {
        let text = "1 a _ _\n2 b _ _\n\n";
        let corpus = Corpus::read_conll(Cursor::new(text), CorpusOptions::default()).unwrap();
        assert!(!corpus.has_tags());
    }

    #[test]
    fn test_read_conll_short_line() {
        let text = "1\tThe\t_\tDT\n2\tdog\n";
        let err = Corpus::read_conll(Cursor::new(text), CorpusOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_empty_corpus_rejected() {
        let sents: Vec<Vec<&str>> = vec![vec![]];
        let err = Corpus::from_sentences::<_, &str>(&sents, None, CorpusOptions::default())
            .unwrap_err();
        assert_eq!(err, Error::EmptyInput);
        assert_eq!(
            Corpus::read_conll(Cursor::new(""), CorpusOptions::default()).unwrap_err(),
            Error::EmptyInput
        );
    }

    #[test]
    fn test_default_keeps_case() {
        let sents = vec![vec!["Paris", "is", "big"], vec!["London", "is", "big"]];
        let corpus = Corpus::from_sentences::<_, &str>(&sents, None, CorpusOptions::default())
            .unwrap();
        let ortho = corpus.orthographic_channel().unwrap();
        assert_eq!(ortho.row(0).to_vec(), vec![1, 0, 0, 0, 0]);
        assert_eq!(ortho.row(3).to_vec(), vec![1, 0, 0, 0, 0]);
        let morph = corpus.morphology_channel().unwrap();
        // Suffixes "is" and "on", NULL, then the capital flag.
        assert_eq!(morph.num_features(), 3 + 4);
        assert_eq!(morph.row(0).to_vec(), vec![1, 0, 0, 1, 0, 0, 0]);
        assert_eq!(morph.row(3).to_vec(), vec![0, 1, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_morphology_suffixes() {
        let sents = vec![vec!["walking", "talking", "dog", "x-rays", "jumped", "naïve"]];
        let corpus = Corpus::from_sentences::<_, &str>(&sents, None, CorpusOptions::default())
            .unwrap();
        let ch = corpus.morphology_channel().unwrap();
        // Suffixes: ng, ed, ve; then NULL; then four spelling flags.
        assert_eq!(ch.num_features(), 3 + 1 + 4);
        assert_eq!(ch.row(0).to_vec(), vec![1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(ch.row(1).to_vec(), vec![1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(ch.row(2).to_vec(), vec![0, 0, 0, 1, 0, 0, 0, 0]);
        assert_eq!(ch.row(3).to_vec(), vec![0, 0, 0, 1, 0, 0, 1, 1]);
        assert_eq!(ch.row(4).to_vec(), vec![0, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(ch.row(5).to_vec(), vec![0, 0, 1, 0, 0, 0, 0, 1]);

        let plain = CorpusOptions::default().with_extended_morph(false);
        let corpus = Corpus::from_sentences::<_, &str>(&sents, None, plain).unwrap();
        assert_eq!(corpus.morphology_channel().unwrap().num_features(), 4);
    }

    #[test]
    fn test_empty_sentences_pair_with_their_tags() {
        let sents = vec![vec![], vec!["a", "b"]];
        let tags = vec![vec!["X", "Y"], vec![]];
        let result = Corpus::from_sentences(&sents, Some(tags.as_slice()), CorpusOptions::default());
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));

        let sents = vec![vec![], vec!["a", "b"]];
        let tags = vec![vec![], vec!["X", "Y"]];
        let corpus =
            Corpus::from_sentences(&sents, Some(tags.as_slice()), CorpusOptions::default())
                .unwrap();
        assert_eq!(corpus.num_sentences(), 1);
        assert_eq!(corpus.tag_names(), &["X", "Y"]);
    }

    #[test]
    fn test_read_conll_heads() {
        let text = "\
1\tthe\t_\tDT\t_\t_\t2\tdet
2\tdog\t_\tNN\t_\t_\t3\tnsubj
3\tbarks\t_\tVBZ\t_\t_\t0\troot

1\tthe\t_\tDT\t_\t_\t2\tdet
2\tcat\t_\tNN\t_\t_\t0\troot
";
        let corpus = Corpus::read_conll(Cursor::new(text), CorpusOptions::default()).unwrap();
        assert!(corpus.has_heads());
        let ch = corpus.dependency_channel().unwrap();
        // Columns: DT, NN, VBZ, ROOT.
        assert_eq!(ch.num_features(), 4);
        let the = corpus.word_type("the").unwrap();
        let dog = corpus.word_type("dog").unwrap();
        let barks = corpus.word_type("barks").unwrap();
        let cat = corpus.word_type("cat").unwrap();
        assert_eq!(ch.row(the).to_vec(), vec![0, 2, 0, 0]);
        // Head NN's dependent DT, own head VBZ.
        assert_eq!(ch.row(dog).to_vec(), vec![1, 0, 1, 0]);
        assert_eq!(ch.row(barks).to_vec(), vec![0, 1, 0, 1]);
        assert_eq!(ch.row(cat).to_vec(), vec![1, 0, 0, 1]);

        let with_deps = CorpusOptions::default().with_dependency_features(true);
        let corpus = Corpus::read_conll(Cursor::new(text), with_deps).unwrap();
        assert_eq!(corpus.feature_set().unwrap().channels().len(), 3);
    }

    #[test]
    fn test_dependency_channel_needs_heads() {
        let text = "1\tThe\t_\tDT\n2\tdog\t_\tNN\n";
        let corpus = Corpus::read_conll(Cursor::new(text), CorpusOptions::default()).unwrap();
        assert!(!corpus.has_heads());
        assert!(corpus.dependency_channel().is_err());
        assert_eq!(corpus.feature_set().unwrap().channels().len(), 2);
    }

    #[test]
    fn test_head_out_of_range_rejected() {
        let sents = vec![vec!["a", "b"]];
        let corpus = Corpus::from_sentences::<_, &str>(&sents, None, CorpusOptions::default())
            .unwrap();
        assert!(corpus.clone().with_heads(vec![vec![2, 0]]).is_ok());
        assert!(corpus.with_heads(vec![vec![3, 0]]).is_err());
    }
}

use std::collections::{hash_map, HashMap};

use serde::{Deserialize, Serialize};

/// Token frequencies of one sample. Tokens that were never seen read as `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Freqs(HashMap<String, f64>);

impl Freqs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts every token yielded by `tokens`.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut freqs = Self::new();
        for token in tokens {
            *freqs.0.entry(token.into()).or_default() += 1.0;
        }

        freqs
    }

    /// Tokenizes `text` and counts its tokens.
    ///
    /// A run of alphanumeric characters and underscores is one token, every other
    /// non-whitespace character is a token by itself.
    pub fn from_text(text: &str) -> Self {
        Self::from_tokens(tokenize(text))
    }

    pub fn get(&self, token: &str) -> f64 {
        self.0.get(token).copied().unwrap_or_default()
    }

    pub fn insert<S: Into<String>>(&mut self, token: S, freq: f64) {
        self.0.insert(token.into(), freq);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, f64> {
        self.0.iter()
    }

    /// Scales every frequency so they add up to one. A sample without weight is
    /// left as is.
    pub fn normalize(&mut self) {
        let total: f64 = self.0.values().sum();
        if total == 0.0 {
            return;
        }

        self.0.values_mut().for_each(|f| *f /= total);
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Freqs {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(t, f)| (t.into(), f)).collect())
    }
}

fn tokenize(text: &str) -> Vec<&str> {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut tokens = Vec::new();
    let mut word_start = None;

    for (i, c) in text.char_indices() {
        if is_word(c) {
            word_start.get_or_insert(i);
            continue;
        }

        if let Some(start) = word_start.take() {
            tokens.push(&text[start..i]);
        }
        if !c.is_whitespace() {
            tokens.push(&text[i..i + c.len_utf8()]);
        }
    }

    if let Some(start) = word_start {
        tokens.push(&text[start..]);
    }

    tokens
}

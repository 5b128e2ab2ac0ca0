/*! Frequency and n-gram tables

Both tables are sorted by decreasing count. Ties keep the order in which entries were first encountered.
!*/
use std::collections::HashMap;

use itertools::Itertools;

use crate::error::Error;

/// Counts occurrences of keys, remembering the first time each was seen.
#[derive(Default)]
struct Counter {
    counts: HashMap<String, (usize, usize)>,
}

impl Counter {
    fn add(&mut self, key: String) {
        let order = self.counts.len();
        self.counts.entry(key).or_insert((order, 0)).1 += 1;
    }

    /// Entries by decreasing count, then by first occurrence.
    fn ranked(self) -> Vec<(String, usize)> {
        self.counts
            .into_iter()
            .sorted_by_key(|(_, (order, count))| (std::cmp::Reverse(*count), *order))
            .map(|(key, (_, count))| (key, count))
            .collect()
    }
}

/// The `top_n` most frequent words across every sequence.
pub fn word_frequency<S: AsRef<[String]>>(sequences: &[S], top_n: usize) -> Vec<(String, usize)> {
    let mut counter = Counter::default();
    for word in sequences.iter().flat_map(|s| s.as_ref().iter()) {
        counter.add(word.clone());
    }
    let mut ranked = counter.ranked();
    ranked.truncate(top_n);
    ranked
}

/// Contiguous `n`-grams occurring at least `min_freq` times, keyed by their space-joined tokens.
///
/// Sequences shorter than `n` are ignored.
///
/// # Errors
/// `n` has to be at least 1.
pub fn compute_ngrams<S: AsRef<[String]>>(
    sequences: &[S],
    n: usize,
    min_freq: usize,
) -> Result<Vec<(String, usize)>, Error> {
    if n == 0 {
        return Err(Error::Config("n-gram size must be at least 1".to_string()));
    }

    let mut counter = Counter::default();
    for sequence in sequences {
        for window in sequence.as_ref().windows(n) {
            counter.add(window.iter().join(" "));
        }
    }

    Ok(counter
        .ranked()
        .into_iter()
        .filter(|(_, count)| *count >= min_freq)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seqs(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|s| s.iter().map(|w| w.to_string()).collect())
            .collect()
    }

    #[test]
    fn word_frequency_ties() {
        let s = seqs(&[&["war", "army"], &["war", "army"], &["peace"]]);
        let freq = word_frequency(&s, 2);
        assert_eq!(
            freq,
            vec![("war".to_string(), 2), ("army".to_string(), 2)]
        );
    }

    #[test]
    fn word_frequency_first_seen() {
        let s = seqs(&[&["b", "a"], &["c", "a", "c", "b"]]);
        let freq = word_frequency(&s, 10);
        let words: Vec<_> = freq.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(words, vec!["b", "a", "c"]);
        assert!(word_frequency(&s, 0).is_empty());
        assert!(word_frequency::<Vec<String>>(&[], 5).is_empty());
    }

    #[test]
    fn bigrams() {
        let s = seqs(&[
            &["кипр", "нато", "санкция"],
            &["кипр", "нато"],
            &["один"],
            &["нато", "санкция"],
        ]);
        let ngrams = compute_ngrams(&s, 2, 2).unwrap();
        assert_eq!(
            ngrams,
            vec![
                ("кипр нато".to_string(), 2),
                ("нато санкция".to_string(), 2)
            ]
        );
    }

    #[test]
    fn ngram_keys_are_windows() {
        let s = seqs(&[&["a", "b", "c", "d"], &["b", "c", "d"]]);
        let ngrams = compute_ngrams(&s, 3, 1).unwrap();
        assert_eq!(ngrams[0], ("b c d".to_string(), 2));
        for (key, count) in &ngrams {
            assert!(*count >= 1);
            assert_eq!(key.split(' ').count(), 3);
        }
        assert!(compute_ngrams(&s, 5, 1).unwrap().is_empty());
    }

    #[test]
    fn zero_n() {
        let s = seqs(&[&["a"]]);
        assert!(compute_ngrams(&s, 0, 1).is_err());
    }
}

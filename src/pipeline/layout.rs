//! Text-layout recovery: characters → words → lines → plain text.
//!
//! PDF content streams carry positioned glyphs, not text. This module rebuilds
//! reading order with two tolerances:
//!
//! * **y tolerance**: glyphs whose `top` differs by at most this share a line;
//! * **x tolerance**: on a line, a horizontal gap larger than this starts a
//!   new word.
//!
//! Lines are ordered top to bottom and words left to right, which is the
//! reading order of single-column pages and of every table cell.

use crate::pipeline::geometry::{BBox, TextChar};

/// A run of characters with no gap wider than the x tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub bbox: BBox,
    /// Largest font size among the word's characters.
    pub size: f64,
}

/// Words sharing a baseline band, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub words: Vec<Word>,
    pub bbox: BBox,
}

impl TextLine {
    /// Words joined by single spaces.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Largest font size on the line.
    pub fn size(&self) -> f64 {
        self.words.iter().map(|w| w.size).fold(0.0, f64::max)
    }
}

/// Group `items` into clusters whose consecutive keys differ by at most `tolerance`.
///
/// Clusters come back ordered by key; items keep their input order within a
/// cluster when keys tie.
pub(crate) fn cluster_by<T, F>(items: Vec<T>, key: F, tolerance: f64) -> Vec<Vec<T>>
where
    F: Fn(&T) -> f64,
{
    let mut items = items;
    items.sort_by(|a, b| key(a).total_cmp(&key(b)));

    let mut clusters: Vec<Vec<T>> = Vec::new();
    let mut last_key: Option<f64> = None;
    for item in items {
        let k = key(&item);
        let joins = last_key.is_some_and(|prev| k - prev <= tolerance);
        last_key = Some(k);
        match clusters.last_mut() {
            Some(cluster) if joins => cluster.push(item),
            _ => clusters.push(vec![item]),
        }
    }
    clusters
}

/// Build words from characters.
///
/// Whitespace glyphs never become part of a word; they only separate words.
pub fn extract_words(chars: &[TextChar], x_tolerance: f64, y_tolerance: f64) -> Vec<Word> {
    let rows = cluster_by(chars.iter().collect::<Vec<_>>(), |c| c.top, y_tolerance);

    let mut words = Vec::new();
    for mut row in rows {
        row.sort_by(|a, b| a.x0.total_cmp(&b.x0));

        let mut current: Option<Word> = None;
        for ch in row {
            if ch.text.trim().is_empty() {
                if let Some(word) = current.take() {
                    words.push(word);
                }
                continue;
            }
            match current.as_mut() {
                Some(word) if ch.x0 <= word.bbox.x1 + x_tolerance => {
                    word.text.push_str(&ch.text);
                    word.bbox = word.bbox.union(&ch.bbox());
                    word.size = word.size.max(ch.size);
                }
                _ => {
                    if let Some(word) = current.take() {
                        words.push(word);
                    }
                    current = Some(Word {
                        text: ch.text.clone(),
                        bbox: ch.bbox(),
                        size: ch.size,
                    });
                }
            }
        }
        if let Some(word) = current {
            words.push(word);
        }
    }
    words
}

/// Cluster words into lines, top to bottom.
pub fn extract_lines(words: Vec<Word>, y_tolerance: f64) -> Vec<TextLine> {
    cluster_by(words, |w| w.bbox.top, y_tolerance)
        .into_iter()
        .map(|mut words| {
            words.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
            let bbox = words
                .iter()
                .skip(1)
                .fold(words[0].bbox, |acc, w| acc.union(&w.bbox));
            TextLine { words, bbox }
        })
        .collect()
}

/// Lines of text recovered from `chars`.
pub fn text_lines(chars: &[TextChar], x_tolerance: f64, y_tolerance: f64) -> Vec<TextLine> {
    extract_lines(extract_words(chars, x_tolerance, y_tolerance), y_tolerance)
}

/// Plain text of `chars`: one line per recovered text line, joined by `'\n'`.
///
/// Returns an empty string when there are no visible characters.
pub fn extract_text(chars: &[TextChar], x_tolerance: f64, y_tolerance: f64) -> String {
    text_lines(chars, x_tolerance, y_tolerance)
        .iter()
        .map(TextLine::text)
        .collect::<Vec<_>>()
        .join("\n")
}

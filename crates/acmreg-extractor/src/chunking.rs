//! Splitting register text into model-sized chunks

use crate::config::ExtractorConfig;
use crate::patterns::PAGE_MARKER;
use crate::types::Chunk;
use regex::Regex;
use std::sync::LazyLock;

static SECTION_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,3}[ \t]+.+$").expect("section heading pattern"));

/// Splits text by page markers, headings or character windows
#[derive(Debug, Clone)]
pub struct Chunker {
    threshold_tokens: usize,
    chars_per_token: usize,
    overlap_chars: usize,
}

impl Chunker {
    /// Create a chunker with an explicit token budget
    pub fn new(threshold_tokens: usize, chars_per_token: usize, overlap_chars: usize) -> Self {
        Self {
            threshold_tokens: threshold_tokens.max(1),
            chars_per_token: chars_per_token.max(1),
            overlap_chars,
        }
    }

    /// Create a chunker from extractor configuration
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(
            config.threshold_tokens(),
            config.chars_per_token,
            config.chunk_overlap_chars,
        )
    }

    /// Approximate token count, rounded up
    pub fn estimate_tokens(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token)
    }

    /// Chunk the given text
    ///
    /// Text within the budget comes back as a single chunk. Otherwise the
    /// text is cut at `--- Page N ---` markers (oversized pages are cut again
    /// at headings), or into overlapping character windows when there are no
    /// usable markers.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        if self.estimate_tokens(text) <= self.threshold_tokens {
            return vec![Chunk {
                content: text.to_string(),
                page_number: 1,
                chunk_index: 0,
            }];
        }

        // Markers whose page number does not parse are not cut points
        let mut pieces = self.split_pages(text);
        if pieces.is_empty() {
            pieces = self.split_windows(text);
        }

        pieces
            .into_iter()
            .enumerate()
            .map(|(chunk_index, (content, page_number))| Chunk {
                content,
                page_number,
                chunk_index,
            })
            .collect()
    }

    fn split_pages(&self, text: &str) -> Vec<(String, u32)> {
        let markers: Vec<(usize, u32)> = PAGE_MARKER
            .captures_iter(text)
            .filter_map(|caps| {
                let start = caps.get(0)?.start();
                let page = caps[1].parse().ok()?;
                Some((start, page))
            })
            .collect();

        let mut pieces = Vec::new();
        for (i, &(start, page)) in markers.iter().enumerate() {
            // Text before the first marker travels with the first page
            let start = if i == 0 { 0 } else { start };
            let end = markers.get(i + 1).map_or(text.len(), |&(next, _)| next);
            let page_text = &text[start..end];

            if self.estimate_tokens(page_text) > self.threshold_tokens {
                pieces.extend(self.split_sections(page_text).into_iter().map(|s| (s, page)));
            } else {
                pieces.push((page_text.to_string(), page));
            }
        }
        pieces
    }

    /// Group heading-led sections until the budget is reached
    fn split_sections(&self, text: &str) -> Vec<String> {
        let mut cuts: Vec<usize> = SECTION_HEADING
            .find_iter(text)
            .map(|m| m.start())
            .filter(|&s| s > 0)
            .collect();
        cuts.insert(0, 0);
        cuts.push(text.len());

        let mut chunks = Vec::new();
        let mut current = String::new();

        for bounds in cuts.windows(2) {
            let section = &text[bounds[0]..bounds[1]];
            if section.trim().is_empty() {
                continue;
            }
            if !current.is_empty()
                && self.estimate_tokens(&current) + self.estimate_tokens(section)
                    > self.threshold_tokens
            {
                chunks.push(std::mem::take(&mut current));
            }
            current.push_str(section);
        }

        if !current.is_empty() {
            chunks.push(current);
        }
        if chunks.is_empty() {
            chunks.push(text.to_string());
        }
        chunks
    }

    /// Overlapping character windows, preferring to end on a newline
    fn split_windows(&self, text: &str) -> Vec<(String, u32)> {
        let chars: Vec<char> = text.chars().collect();
        let size = self.threshold_tokens * self.chars_per_token;
        let overlap = self.overlap_chars.min(size.saturating_sub(1));

        let mut pieces = Vec::new();
        let mut start = 0;
        let mut page = 1;

        while start < chars.len() {
            let mut end = (start + size).min(chars.len());
            if end < chars.len() {
                let search_from = (start + size - overlap).max(start);
                if let Some(pos) = chars[search_from..end].iter().rposition(|&c| c == '\n') {
                    let newline = search_from + pos;
                    if newline > start {
                        end = newline + 1;
                    }
                }
            }

            pieces.push((chars[start..end].iter().collect(), page));
            page += 1;

            if end >= chars.len() {
                break;
            }
            let next = end.saturating_sub(overlap);
            start = if next > start { next } else { end };
        }

        pieces
    }
}

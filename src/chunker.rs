//! Overlapping window chunker with sentence-boundary snapping.
//!
//! Pages are walked left to right with a character cursor. Each window is at
//! most `chunk_size` characters; when a sentence end or newline falls in the
//! last 30% of the window the window is shrunk to end there, so chunks tend
//! to close on natural boundaries. Consecutive windows share roughly
//! `chunk_overlap` characters of source text, which preserves context across
//! chunk boundaries for retrieval. Windows whose trimmed text is 100
//! characters or shorter are discarded without a trace.
//!
//! All offsets are character offsets, not byte offsets, so multi-byte page
//! text can never split a UTF-8 sequence. The walk ends when a window
//! reaches end-of-text, and the cursor always advances by at least one
//! character, so every page terminates.

use tracing::debug;

use crate::classify::{self, Classification};
use crate::pdf::Page;

/// Window sizing for the chunk walk, in characters.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 150,
        }
    }
}

/// Trimmed windows at or below this length are discarded.
const MIN_CHUNK_CHARS: usize = 100;

/// A bounded, metadata-tagged slice of a page's text: the unit of embedding
/// and retrieval.
///
/// Ids are `chunk-{n}` with `n` strictly increasing across the whole run.
/// Chunks never span two pages; chunks from the same page overlap by design.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub classification: Classification,
    pub page: u32,
}

/// Chunks every page in order, emitting chunks in left-to-right text order
/// within each page.
pub fn chunk_pages(pages: &[Page], config: &ChunkerConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut counter = 0usize;
    for page in pages {
        let before = chunks.len();
        chunk_page(page, config, &mut counter, &mut chunks);
        debug!(
            page = page.number,
            chunks = chunks.len() - before,
            "chunked page"
        );
    }
    chunks
}

fn chunk_page(page: &Page, config: &ChunkerConfig, counter: &mut usize, out: &mut Vec<Chunk>) {
    let chars: Vec<char> = page.text.chars().collect();
    let len = chars.len();
    // Integer-exact form of the 70% boundary threshold.
    let boundary_floor = config.chunk_size * 7 / 10;

    let mut start = 0usize;
    while start < len {
        let tentative_end = (start + config.chunk_size).min(len);
        let mut end = tentative_end;

        // Snap to the last sentence end or newline, whichever is later, but
        // only when the window was cut short of end-of-text and the boundary
        // sits past 70% of the target size.
        if tentative_end < len {
            let window = &chars[start..tentative_end];
            let last_period = window.iter().rposition(|&c| c == '.');
            let last_newline = window.iter().rposition(|&c| c == '\n');
            if let Some(break_point) = last_period.max(last_newline) {
                if break_point > boundary_floor {
                    end = start + break_point + 1;
                }
            }
        }

        let window_text: String = chars[start..end].iter().collect();
        let trimmed = window_text.trim();
        let trimmed_len = trimmed.chars().count();

        if trimmed_len > MIN_CHUNK_CHARS {
            out.push(Chunk {
                id: format!("chunk-{counter}"),
                text: trimmed.to_string(),
                classification: classify::classify(trimmed),
                page: page.number,
            });
            *counter += 1;
        }

        // Once a window reaches end-of-text the page is exhausted; walking on
        // would only re-emit suffixes of this window.
        if end == len {
            break;
        }

        // The cursor advances by the trimmed length minus the overlap, floored
        // at one character: a trimmed window shorter than the overlap would
        // otherwise stall the walk or move it backwards.
        start += trimmed_len.saturating_sub(config.chunk_overlap).max(1);
    }
}

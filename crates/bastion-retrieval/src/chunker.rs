//! Character-window chunking with overlap.
//!
//! Windows are measured in characters, not bytes. A window that would end
//! mid-word backs up to the last whitespace in its final quarter when there
//! is one.

/// A slice of source text and where it starts, in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWindow {
    pub offset: usize,
    pub text: String,
}

pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<TextWindow> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let size = chunk_size.max(1);
    let overlap = overlap.min(size - 1);
    let mut windows = Vec::new();
    let mut start = 0;

    while start < n {
        let mut end = (start + size).min(n);
        if end < n {
            let floor = end - size / 4;
            let lower = floor.max(start + 1);
            if let Some(ws) = (lower..end).rev().find(|&i| chars[i].is_whitespace()) {
                end = ws + 1;
            }
        }

        let window = &chars[start..end];
        if let Some(lead) = window.iter().position(|c| !c.is_whitespace()) {
            let body: String = window[lead..].iter().collect();
            let offset = start + lead;
            // Leading whitespace can push two windows onto the same first
            // character; the later one covers more.
            if windows.last().is_some_and(|w: &TextWindow| w.offset == offset) {
                windows.pop();
            }
            windows.push(TextWindow {
                offset,
                text: body.trim_end().to_string(),
            });
        }

        if end == n {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    // A trailing window that starts inside the previous one adds nothing when
    // its whole text was already covered.
    windows.dedup_by(|later, earlier| {
        later.offset >= earlier.offset
            && later.offset + later.text.chars().count()
                <= earlier.offset + earlier.text.chars().count()
    });
    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_text_yield_nothing() {
        assert!(chunk_text("", 100, 10).is_empty());
        assert!(chunk_text(" \n\t ", 100, 10).is_empty());
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = chunk_text("  CVE-2021-44228 affects log4j  ", 100, 20);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].offset, 2);
        assert_eq!(chunks[0].text, "CVE-2021-44228 affects log4j");
    }

    #[test]
    fn windows_overlap_and_respect_size() {
        let text = "alpha bravo charlie delta echo foxtrot golf hotel india juliet kilo lima";
        let chunks = chunk_text(text, 20, 5);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.text.chars().count() <= 20, "{:?}", c.text);
        }
        for pair in chunks.windows(2) {
            assert!(pair[1].offset > pair[0].offset);
            let prev_end = pair[0].offset + pair[0].text.chars().count();
            assert!(pair[1].offset <= prev_end, "gap between chunks");
        }
    }

    #[test]
    fn prefers_whitespace_boundaries() {
        let chunks = chunk_text("aaaa bbbb cccc dddd", 12, 0);
        assert_eq!(chunks[0].text, "aaaa bbbb");
    }

    #[test]
    fn multibyte_text_is_split_on_char_boundaries() {
        let text = "ü".repeat(30);
        let chunks = chunk_text(&text, 10, 2);
        assert!(chunks.iter().all(|c| c.text.chars().all(|ch| ch == 'ü')));
        assert_eq!(chunks[0].text.chars().count(), 10);
    }
}

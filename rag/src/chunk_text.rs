use crate::read_document::Page;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkConfig {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: 1000,
            overlap: 50,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    pub page: u32,
}

/// Splits every page into windows of `size` chars, consecutive windows on a
/// page sharing `overlap` chars. Indices run across pages in document order.
pub fn chunk_pages(pages: &[Page], cfg: ChunkConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for page in pages {
        for text in chunk_text(&page.text, cfg) {
            chunks.push(Chunk {
                index: chunks.len(),
                text,
                page: page.number,
            });
        }
    }
    chunks
}

pub fn chunk_text(text: &str, cfg: ChunkConfig) -> Vec<String> {
    let size = cfg.size;
    let mut overlap = cfg.overlap;

    if size == 0 {
        return if text.trim().is_empty() {
            vec![]
        } else {
            vec![text.to_string()]
        };
    }
    if overlap >= size {
        overlap = size / 4;
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let chars: Vec<char> = text.chars().collect();
    let len_chars = chars.len();

    while start < len_chars {
        let end = (start + size).min(len_chars);
        let window = &chars[start..end];
        if window.iter().any(|c| !c.is_whitespace()) {
            chunks.push(window.iter().collect());
        }
        if end == len_chars {
            break;
        }
        start = end - overlap;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(len: usize) -> String {
        (0..len)
            .map(|i| char::from(b'a' + (i % 26) as u8))
            .collect()
    }

    fn page(number: u32, text: String) -> Page {
        Page { number, text }
    }

    #[test]
    fn splits_2200_chars_into_three_windows() {
        let pages = vec![page(1, text_of(2200))];
        let chunks = chunk_pages(&pages, ChunkConfig::default());

        let lens: Vec<usize> = chunks.iter().map(|c| c.text.chars().count()).collect();
        assert_eq!(lens, vec![1000, 1000, 300]);
        let ids: Vec<usize> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn consecutive_windows_share_the_overlap() {
        let cfg = ChunkConfig { size: 100, overlap: 10 };
        let text = text_of(457);
        let chunks = chunk_text(&text, cfg);

        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].chars().collect();
            let next: Vec<char> = pair[1].chars().collect();
            assert_eq!(&prev[prev.len() - 10..], &next[..10]);
        }
        assert!(chunks.iter().all(|c| c.chars().count() <= 100));
    }

    #[test]
    fn window_count_follows_stride_formula() {
        let cfg = ChunkConfig { size: 100, overlap: 10 };
        for n in [101usize, 190, 191, 500, 1234] {
            let expected = (n - cfg.overlap).div_ceil(cfg.size - cfg.overlap);
            assert_eq!(chunk_text(&text_of(n), cfg).len(), expected, "n = {n}");
        }
        assert_eq!(chunk_text(&text_of(100), cfg).len(), 1);
        assert_eq!(chunk_text(&text_of(40), cfg).len(), 1);
    }

    #[test]
    fn chunks_per_page_and_keep_global_order() {
        let pages = vec![
            page(1, text_of(1500)),
            page(2, "   \n ".to_string()),
            page(3, "short tail".to_string()),
        ];
        let chunks = chunk_pages(&pages, ChunkConfig::default());

        assert_eq!(chunks.len(), 3);
        assert_eq!((chunks[0].index, chunks[0].page), (0, 1));
        assert_eq!((chunks[1].index, chunks[1].page), (1, 1));
        assert_eq!((chunks[2].index, chunks[2].page), (2, 3));
        assert_eq!(chunks[2].text, "short tail");
    }

    #[test]
    fn counts_chars_not_bytes() {
        let text = "é".repeat(25);
        let chunks = chunk_text(&text, ChunkConfig { size: 10, overlap: 2 });
        assert_eq!(chunks[0].chars().count(), 10);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn degenerate_configs() {
        assert_eq!(chunk_text("abc", ChunkConfig { size: 0, overlap: 0 }), vec!["abc"]);
        assert!(chunk_text("", ChunkConfig::default()).is_empty());
        // overlap is clamped to size / 4
        let chunks = chunk_text(&text_of(20), ChunkConfig { size: 8, overlap: 8 });
        assert_eq!(&chunks[1][..2], &chunks[0][6..]);
    }
}

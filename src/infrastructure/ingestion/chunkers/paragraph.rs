//! Paragraph-based chunking strategy

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::ingestion::{Chunk, ChunkingConfig, ChunkingStrategy};
use crate::domain::DomainError;

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid paragraph regex"));

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("valid sentence regex"));

/// Packs whole paragraphs into chunks up to the character budget.
///
/// Oversized paragraphs fall back to sentence packing, and oversized
/// sentences to word packing, so no chunk ever exceeds the budget.
/// Chunks shorter than `min_chunk_chars` are dropped at the end.
#[derive(Debug, Clone, Default)]
pub struct ParagraphChunker;

impl ParagraphChunker {
    pub fn new() -> Self {
        Self
    }

    fn split_paragraphs(text: &str) -> impl Iterator<Item = &str> {
        PARAGRAPH_BREAK
            .split(text)
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    fn split_sentences(paragraph: &str) -> Vec<String> {
        SENTENCE_END
            .split(paragraph)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("{}.", s))
            .collect()
    }

    /// Sentence packing for a paragraph larger than the budget
    fn pack_sentences(paragraph: &str, budget: usize) -> Vec<String> {
        let mut packer = Packer::new(budget, " ");

        for sentence in Self::split_sentences(paragraph) {
            if char_len(&sentence) > budget {
                packer.flush();
                packer.extend(Self::pack_words(&sentence, budget));
            } else {
                packer.push(&sentence);
            }
        }

        packer.finish()
    }

    /// Word packing for a sentence larger than the budget
    fn pack_words(sentence: &str, budget: usize) -> Vec<String> {
        let mut packer = Packer::new(budget, " ");

        for word in sentence.split_whitespace() {
            if char_len(word) > budget {
                packer.flush();
                let chars: Vec<char> = word.chars().collect();
                packer.extend(chars.chunks(budget).map(|c| c.iter().collect()));
            } else {
                packer.push(word);
            }
        }

        packer.finish()
    }
}

impl ChunkingStrategy for ParagraphChunker {
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>, DomainError> {
        config.validate()?;

        let budget = config.char_budget();
        let mut packer = Packer::new(budget, "\n\n");

        for paragraph in Self::split_paragraphs(content) {
            if char_len(paragraph) > budget {
                packer.flush();
                packer.extend(Self::pack_sentences(paragraph, budget));
            } else {
                packer.push(paragraph);
            }
        }

        let chunks = packer
            .finish()
            .into_iter()
            .filter(|text| char_len(text) >= config.min_chunk_chars)
            .enumerate()
            .map(|(index, text)| {
                let tokens = config.estimate_tokens(&text);
                Chunk::new(index, text, tokens)
            })
            .collect();

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "paragraph"
    }
}

/// Greedy accumulator: joins pieces while the buffer stays within budget
struct Packer {
    budget: usize,
    separator: &'static str,
    buffer: String,
    buffer_chars: usize,
    done: Vec<String>,
}

impl Packer {
    fn new(budget: usize, separator: &'static str) -> Self {
        Self {
            budget,
            separator,
            buffer: String::new(),
            buffer_chars: 0,
            done: Vec::new(),
        }
    }

    /// `piece` must fit the budget on its own
    fn push(&mut self, piece: &str) {
        let piece_chars = char_len(piece);

        if self.buffer.is_empty() {
            self.buffer.push_str(piece);
            self.buffer_chars = piece_chars;
            return;
        }

        let joined = self.buffer_chars + char_len(self.separator) + piece_chars;
        if joined <= self.budget {
            self.buffer.push_str(self.separator);
            self.buffer.push_str(piece);
            self.buffer_chars = joined;
        } else {
            self.flush();
            self.buffer.push_str(piece);
            self.buffer_chars = piece_chars;
        }
    }

    /// Append already-bounded pieces as standalone chunks
    fn extend(&mut self, pieces: impl IntoIterator<Item = String>) {
        self.flush();
        self.done.extend(pieces);
    }

    fn flush(&mut self) {
        if !self.buffer.is_empty() {
            self.done.push(std::mem::take(&mut self.buffer));
            self.buffer_chars = 0;
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.done
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(topic: &str) -> String {
        (0..6)
            .map(|i| format!("Point {} about {} matters.", i, topic))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn three_paragraph_document() -> String {
        [paragraph("pricing"), paragraph("support"), paragraph("billing")].join("\n\n")
    }

    fn words(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_empty_content() {
        let chunker = ParagraphChunker::new();
        let config = ChunkingConfig::default();

        assert!(chunker.chunk("", &config).unwrap().is_empty());
        assert!(chunker.chunk("  \n\n \t\n", &config).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_config_is_chunking_error() {
        let chunker = ParagraphChunker::new();

        let err = chunker.chunk("text", &ChunkingConfig::new(0)).unwrap_err();
        assert!(matches!(err, DomainError::Chunking { .. }));

        let err = chunker
            .chunk("text", &ChunkingConfig::new(10).with_chars_per_token(0))
            .unwrap_err();
        assert!(matches!(err, DomainError::Chunking { .. }));
    }

    #[test]
    fn test_small_document_is_one_chunk() {
        let chunker = ParagraphChunker::new();
        let document = three_paragraph_document();
        assert!((500..=700).contains(&document.len()));

        let chunks = chunker.chunk(&document, &ChunkingConfig::new(500)).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].content, document);
    }

    #[test]
    fn test_tight_budget_splits_by_paragraph() {
        let chunker = ParagraphChunker::new();
        let document = three_paragraph_document();

        let chunks = chunker.chunk(&document, &ChunkingConfig::new(50)).unwrap();

        assert!(chunks.len() >= 3);
        assert_eq!(chunks[0].content, paragraph("pricing"));
        assert_eq!(chunks[2].content, paragraph("billing"));
    }

    #[test]
    fn test_paragraphs_combined_within_budget() {
        let chunker = ParagraphChunker::new();
        let config = ChunkingConfig::new(30).with_min_chunk_chars(10);

        let content = "Short paragraph one.\n\nShort paragraph two.\n   \nShort paragraph three.";
        let chunks = chunker.chunk(content, &config).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(
            chunks[0].content,
            "Short paragraph one.\n\nShort paragraph two.\n\nShort paragraph three."
        );
    }

    #[test]
    fn test_oversized_paragraph_splits_on_sentences() {
        let chunker = ParagraphChunker::new();
        let config = ChunkingConfig::new(15).with_min_chunk_chars(5);

        let content = "The first sentence is here! The second one asks why? \
                       The third sentence ends the paragraph.";
        let chunks = chunker.chunk(content, &config).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[0].content,
            "The first sentence is here. The second one asks why."
        );
        assert_eq!(chunks[1].content, "The third sentence ends the paragraph.");
    }

    #[test]
    fn test_oversized_sentence_splits_on_words() {
        let chunker = ParagraphChunker::new();
        let config = ChunkingConfig::new(5).with_min_chunk_chars(1);

        let content = "one two three four five six seven eight nine ten eleven twelve";
        let chunks = chunker.chunk(content, &config).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.char_len() <= 20);
        }
        let rejoined = chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(words(&rejoined), words(content));
    }

    #[test]
    fn test_giant_word_is_split_on_characters() {
        let chunker = ParagraphChunker::new();
        let config = ChunkingConfig::new(2).with_min_chunk_chars(1);

        let chunks = chunker.chunk(&"x".repeat(20), &config).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].content, "xxxxxxxx");
        assert_eq!(chunks[2].content, "xxxx.");
    }

    #[test]
    fn test_short_fragments_are_dropped() {
        let chunker = ParagraphChunker::new();
        let config = ChunkingConfig::new(47).with_min_chunk_chars(50);

        let content = format!("{}\n\nTiny.", paragraph("pricing"));
        let chunks = chunker.chunk(&content, &config).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, paragraph("pricing"));
    }

    #[test]
    fn test_floor_above_budget_yields_no_chunks() {
        let chunker = ParagraphChunker::new();
        let config = ChunkingConfig::new(10);

        let chunks = chunker
            .chunk(
                "A fairly ordinary paragraph about quarterly pricing. It has two sentences.",
                &config,
            )
            .unwrap();

        assert!(chunks.is_empty());
    }

    #[test]
    fn test_indices_are_sequential_after_filtering() {
        let chunker = ParagraphChunker::new();
        let config = ChunkingConfig::new(47).with_min_chunk_chars(50);

        let content = format!(
            "Tiny.\n\n{}\n\nTiny.\n\n{}",
            paragraph("pricing"),
            paragraph("billing")
        );
        let chunks = chunker.chunk(&content, &config).unwrap();

        let indices: Vec<_> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_ceiling_and_floor_hold() {
        let chunker = ParagraphChunker::new();
        let long_sentence = "word ".repeat(120);
        let document = format!(
            "{}\n\n{}\n\n{}. Closing remark!",
            three_paragraph_document(),
            long_sentence,
            paragraph("renewals")
        );

        for max_tokens in [13, 20, 50, 120, 500] {
            let config = ChunkingConfig::new(max_tokens).with_min_chunk_chars(20);
            let chunks = chunker.chunk(&document, &config).unwrap();

            assert!(!chunks.is_empty());
            for chunk in &chunks {
                assert!(chunk.token_estimate <= max_tokens);
                assert!(chunk.char_len() <= config.char_budget());
                assert!(chunk.char_len() >= 20);
            }
        }
    }

    #[test]
    fn test_rejoined_chunks_preserve_words() {
        let chunker = ParagraphChunker::new();
        let document = three_paragraph_document();

        for max_tokens in [20, 50, 500] {
            let config = ChunkingConfig::new(max_tokens).with_min_chunk_chars(1);
            let chunks = chunker.chunk(&document, &config).unwrap();
            let rejoined = chunks
                .iter()
                .map(|c| c.content.as_str())
                .collect::<Vec<_>>()
                .join(" ");

            assert_eq!(words(&rejoined), words(&document));
        }
    }

    #[test]
    fn test_name() {
        assert_eq!(ParagraphChunker::new().name(), "paragraph");
    }
}

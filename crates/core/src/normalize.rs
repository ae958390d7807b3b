//! Text normalization for extracted document text.
//!
//! Handles Unicode composition, line ending cleanup, stray control
//! characters (tesseract's form feeds, PowerPoint's vertical-tab line
//! breaks) and joining of paragraphs and shape sections.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse three or more consecutive newlines into a blank line.
static BLANK_LINES_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Line separators that should become plain newlines.
const LINE_BREAK_CHARS: &[char] = &['\u{000B}', '\u{2028}', '\u{2029}', '\u{0085}'];

/// Text normalizer for extracted content.
///
/// Line endings and odd breaks are normalized; in-line spacing is kept.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a block of text.
    ///
    /// - Composes Unicode to NFC
    /// - Converts `\r\n`, `\r` and Unicode line separators to `\n`
    /// - Drops control characters other than `\n` and `\t`
    /// - Removes trailing whitespace from every line and squeezes blank runs
    pub fn clean(&self, text: &str) -> String {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");

        let mut output = String::with_capacity(text.len());
        for c in text.nfc() {
            if LINE_BREAK_CHARS.contains(&c) {
                output.push('\n');
            } else if c == '\n' || c == '\t' || !c.is_control() {
                output.push(c);
            }
        }

        let lines: Vec<String> = output
            .lines()
            .map(|line| line.trim_end().to_string())
            .collect();

        let joined = lines.join("\n");
        BLANK_LINES_REGEX
            .replace_all(joined.trim_matches('\n'), "\n\n")
            .to_string()
    }

    /// Join paragraphs of a text frame: each paragraph is trimmed,
    /// empty paragraphs are dropped, the rest joined with newlines.
    pub fn join_paragraphs<I, S>(&self, paragraphs: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        paragraphs
            .into_iter()
            .map(|p| self.clean(p.as_ref()).trim().to_string())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Join independently extracted sections (one per shape) with a blank
/// line between them, skipping whitespace-only sections.
pub fn join_sections<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

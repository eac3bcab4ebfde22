//! Word tokenization shared by answer text and alias strings.

/// Lowercase `text` and split it on every run of non-alphanumeric characters.
///
/// Lowercasing happens before splitting so that characters whose lowercase
/// form is multi-char split the same way on a second pass.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// A sentence of an answer and the token range it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence<'a> {
    /// Trimmed sentence text including its terminator.
    pub text: &'a str,
    /// Index of the first token of this sentence in the full token sequence.
    pub start: usize,
    /// One past the last token.
    pub end: usize,
}

impl Sentence<'_> {
    /// `true` if the 0-based token index falls inside this sentence.
    #[must_use]
    pub fn covers(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }
}

/// An answer and its tokens, computed once.
#[derive(Debug, Clone)]
pub struct TextUnit {
    raw: String,
    tokens: Vec<String>,
}

impl TextUnit {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let tokens = tokenize(&raw);
        Self { raw, tokens }
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    #[must_use]
    pub fn total_words(&self) -> usize {
        self.tokens.len()
    }

    /// Split on `.`, `!` and `?` and map each sentence to its token range.
    ///
    /// The delimiters are token separators, so the per-sentence token counts
    /// add up to [`TextUnit::total_words`]. Sentences without tokens are
    /// skipped.
    #[must_use]
    pub fn sentences(&self) -> Vec<Sentence<'_>> {
        let mut sentences = Vec::new();
        let mut offset = 0;
        for text in split_sentences(&self.raw) {
            let len = tokenize(text).len();
            if len == 0 {
                continue;
            }
            sentences.push(Sentence {
                text,
                start: offset,
                end: offset + len,
            });
            offset += len;
        }
        sentences
    }
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Segments ending at each run of terminators, terminators included.
fn split_sentences(raw: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut chars = raw.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_terminator(c) {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if !is_terminator(next) {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }
        segments.push(raw[start..end].trim());
        start = end;
    }
    if start < raw.len() {
        segments.push(raw[start..].trim());
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits_on_punctuation() {
        assert_eq!(
            tokenize("Acme's NEW-balance, 2024!"),
            vec!["acme", "s", "new", "balance", "2024"]
        );
    }

    #[test]
    fn empty_and_symbol_only_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" -- ... !! ").is_empty());
    }

    #[test]
    fn keeps_unicode_letters() {
        assert_eq!(tokenize("Café Zürich"), vec!["café", "zürich"]);
    }

    #[test]
    fn tokenizing_is_idempotent() {
        for text in [
            "Acme is great. Globex is okay.",
            "  New   Balance\tvs\nNIKE!!",
            "İstanbul Straße ǅemal",
            "a.b,c;d:e",
        ] {
            let once = tokenize(text);
            assert_eq!(tokenize(&once.join(" ")), once, "input: {text:?}");
        }
    }

    #[test]
    fn total_words_counts_tokens() {
        assert_eq!(TextUnit::new("Acme is great. Globex is okay.").total_words(), 6);
    }

    #[test]
    fn sentences_cover_every_token() {
        let unit = TextUnit::new("Acme is great. Globex is okay!? And Initech");
        let sentences = unit.sentences();
        assert_eq!(
            sentences.iter().map(|s| s.text).collect::<Vec<_>>(),
            vec!["Acme is great.", "Globex is okay!?", "And Initech"]
        );
        assert_eq!(sentences[1].start, 3);
        assert_eq!(sentences.last().map(|s| s.end), Some(unit.total_words()));

        let joined: Vec<String> = sentences.iter().flat_map(|s| tokenize(s.text)).collect();
        assert_eq!(joined, unit.tokens());
    }

    #[test]
    fn empty_sentences_are_skipped() {
        let unit = TextUnit::new("... Acme! ?");
        let sentences = unit.sentences();
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].text, "Acme!");
        assert!(sentences[0].covers(0));
        assert!(!sentences[0].covers(1));
    }
}

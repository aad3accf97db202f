//! Whitespace and punctuation tokenizer.
//!
//! Tokens are byte ranges into the line text rather than copies, so a token
//! can be spliced back into the line it came from.

use std::ops::Range;
use thiserror::Error;

/// Characters that always form a single-character token.
pub const DELIMITERS: [char; 8] = [',', '(', ')', '[', ']', '{', '}', ';'];

/// The line produced more tokens than the configured bound.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("more than {limit} tokens on one line")]
pub struct TooManyTokens {
    pub limit: usize,
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

fn is_delimiter(c: char) -> bool {
    DELIMITERS.contains(&c)
}

/// Split `line` into token spans, failing once more than `limit` are found.
pub fn tokenize(line: &str, limit: usize) -> Result<Vec<Range<usize>>, TooManyTokens> {
    let mut spans = Vec::new();
    let mut push = |span: Range<usize>| {
        if spans.len() >= limit {
            return Err(TooManyTokens { limit });
        }
        spans.push(span);
        Ok(())
    };

    let mut start = None;
    for (i, c) in line.char_indices() {
        if is_space(c) || is_delimiter(c) {
            if let Some(s) = start.take() {
                push(s..i)?;
            }
            if is_delimiter(c) {
                push(i..i + c.len_utf8())?;
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        push(s..line.len())?;
    }

    Ok(spans)
}

/// The line being classified together with its token spans.
///
/// Replacing the text drops the spans; they come back only through
/// [`LineBuf::retokenize`], so stale tokens can never be observed.
#[derive(Debug, Clone, Default)]
pub struct LineBuf {
    text: String,
    spans: Vec<Range<usize>>,
}

impl LineBuf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.spans.clear();
    }

    pub fn retokenize(&mut self, limit: usize) -> Result<(), TooManyTokens> {
        self.spans = tokenize(&self.text, limit)?;
        Ok(())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn token(&self, index: usize) -> Option<&str> {
        self.spans.get(index).map(|span| &self.text[span.clone()])
    }

    pub fn span(&self, index: usize) -> Option<Range<usize>> {
        self.spans.get(index).cloned()
    }

    pub fn last_token(&self) -> Option<&str> {
        self.spans.last().map(|span| &self.text[span.clone()])
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.spans.iter().map(|span| &self.text[span.clone()])
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Whether the line starts with exactly these tokens.
    pub fn starts_with(&self, expected: &[&str]) -> bool {
        expected.len() <= self.len()
            && expected
                .iter()
                .enumerate()
                .all(|(i, tok)| self.token(i) == Some(*tok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(line: &str) -> Vec<&str> {
        tokenize(line, 64)
            .unwrap()
            .into_iter()
            .map(|span| &line[span])
            .collect()
    }

    #[test]
    fn test_whitespace_split() {
        assert_eq!(split("  int   value;\n"), vec!["int", "value", ";"]);
        assert_eq!(split("\t\r\n"), Vec::<&str>::new());
    }

    #[test]
    fn test_delimiters_are_tokens() {
        assert_eq!(
            split("VOID Get(INT a,INT b[4]){}"),
            vec!["VOID", "Get", "(", "INT", "a", ",", "INT", "b", "[", "4", "]", ")", "{", "}"]
        );
        assert_eq!(split("};"), vec!["}", ";"]);
    }

    #[test]
    fn test_other_punctuation_sticks() {
        assert_eq!(split("extern \"C\" {"), vec!["extern", "\"C\"", "{"]);
        assert_eq!(split("SizeF operator+(IN const SizeF& sz)"), vec![
            "SizeF", "operator+", "(", "IN", "const", "SizeF&", "sz", ")"
        ]);
        assert_eq!(split("// a comment"), vec!["//", "a", "comment"]);
    }

    #[test]
    fn test_limit() {
        assert_eq!(tokenize("a b c", 3).unwrap().len(), 3);
        assert_eq!(tokenize("a b c d", 3), Err(TooManyTokens { limit: 3 }));
        assert_eq!(tokenize("(((", 2), Err(TooManyTokens { limit: 2 }));
    }

    #[test]
    fn test_line_buf_invalidation() {
        let mut line = LineBuf::new();
        line.set_text("enum Kind {");
        assert!(line.is_empty());

        line.retokenize(16).unwrap();
        assert_eq!(line.len(), 3);
        assert_eq!(line.token(1), Some("Kind"));
        assert_eq!(line.span(1), Some(5..9));
        assert_eq!(line.last_token(), Some("{"));
        assert!(line.starts_with(&["enum", "Kind"]));
        assert!(!line.starts_with(&["enum", "Kind", "{", ";"]));

        line.set_text("};");
        assert_eq!(line.token(0), None);
    }
}

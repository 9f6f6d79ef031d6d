//! HTML tokenizer.
//!
//! Produces a flat stream of start tags, end tags, text and comments. Tag and
//! attribute names are lowercased and character references are decoded in
//! text and attribute values. The contents of `script`, `style`, `textarea`
//! and `title` are read as raw text up to the matching end tag.

use crate::error::{Error, Result};
use html_escape::decode_html_entities;

/// Elements whose content is not parsed as markup.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// A single lexical unit of HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartTag {
        name: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    Text(String),
    Comment(String),
}

impl Token {
    pub fn is_whitespace_text(&self) -> bool {
        matches!(self, Token::Text(text) if text.trim().is_empty())
    }
}

/// Tokenizes `html`, failing on an unterminated tag or comment.
///
/// # Example
/// ```
/// use block_html::{Token, tokenize};
///
/// let tokens = tokenize("<P Class=\"a\">x &amp; y</p>").unwrap();
/// assert_eq!(tokens[1], Token::Text("x & y".into()));
/// ```
pub fn tokenize(html: &str) -> Result<Vec<Token>> {
    Tokenizer::new(html, true).run()
}

/// Tokenizes `html`, reading unterminated constructs as text or running them
/// to the end of the input.
pub fn tokenize_lenient(html: &str) -> Vec<Token> {
    // The lenient tokenizer has no failing paths.
    Tokenizer::new(html, false).run().unwrap_or_default()
}

struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    strict: bool,
    tokens: Vec<Token>,
    text_start: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str, strict: bool) -> Self {
        Self {
            input,
            pos: 0,
            strict,
            tokens: Vec::new(),
            text_start: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn run(mut self) -> Result<Vec<Token>> {
        while let Some(rel) = self.rest().find('<') {
            let lt = self.pos + rel;
            self.pos = lt;
            let after = &self.input[lt + 1..];

            if after.starts_with("!--") {
                self.flush_text(lt);
                self.read_comment(lt)?;
            } else if after.starts_with('!') || after.starts_with('?') {
                self.flush_text(lt);
                self.read_bogus_comment(lt)?;
            } else if after.starts_with('/')
                && after[1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                self.flush_text(lt);
                self.read_end_tag(lt)?;
            } else if after.starts_with(|c: char| c.is_ascii_alphabetic()) {
                self.flush_text(lt);
                self.read_start_tag(lt)?;
            } else {
                // A lone `<` is text.
                self.pos = lt + 1;
                continue;
            }
            self.text_start = self.pos;
        }
        self.flush_text(self.input.len());
        Ok(self.tokens)
    }

    fn flush_text(&mut self, end: usize) {
        if end > self.text_start {
            let raw = &self.input[self.text_start..end];
            self.push_text(decode_html_entities(raw).into_owned());
        }
        self.text_start = end;
    }

    fn push_text(&mut self, text: String) {
        if let Some(Token::Text(prev)) = self.tokens.last_mut() {
            prev.push_str(&text);
        } else {
            self.tokens.push(Token::Text(text));
        }
    }

    /// Handles a construct that ran off the end of the input.
    fn unterminated(&mut self, error: Error, start: usize) -> Result<()> {
        if self.strict {
            return Err(error);
        }
        self.text_start = start;
        self.pos = self.input.len();
        self.flush_text(self.input.len());
        Ok(())
    }

    fn read_comment(&mut self, start: usize) -> Result<()> {
        let body_start = start + 4;
        match self.input[body_start..].find("-->") {
            Some(rel) => {
                let body = &self.input[body_start..body_start + rel];
                self.tokens.push(Token::Comment(body.to_string()));
                self.pos = body_start + rel + 3;
                Ok(())
            }
            None if self.strict => Err(Error::UnterminatedComment { offset: start }),
            None => {
                let body = &self.input[body_start..];
                self.tokens.push(Token::Comment(body.to_string()));
                self.pos = self.input.len();
                Ok(())
            }
        }
    }

    fn read_bogus_comment(&mut self, start: usize) -> Result<()> {
        let body_start = start + 2;
        match self.input[body_start..].find('>') {
            Some(rel) => {
                let body = &self.input[body_start..body_start + rel];
                self.tokens.push(Token::Comment(body.to_string()));
                self.pos = body_start + rel + 1;
                Ok(())
            }
            None => self.unterminated(Error::UnterminatedTag { offset: start }, start),
        }
    }

    fn read_end_tag(&mut self, start: usize) -> Result<()> {
        let name_start = start + 2;
        let Some(rel) = self.input[name_start..].find('>') else {
            return self.unterminated(Error::UnterminatedTag { offset: start }, start);
        };
        let inner = &self.input[name_start..name_start + rel];
        let name = inner
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        self.tokens.push(Token::EndTag { name });
        self.pos = name_start + rel + 1;
        Ok(())
    }

    fn read_start_tag(&mut self, start: usize) -> Result<()> {
        let bytes = self.input.as_bytes();
        let len = bytes.len();
        let mut i = start + 1;

        let name_start = i;
        while i < len && !is_tag_boundary(bytes[i]) {
            i += 1;
        }
        let name = self.input[name_start..i].to_ascii_lowercase();

        let mut attributes: Vec<(String, String)> = Vec::new();
        let mut self_closing = false;
        loop {
            while i < len && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= len {
                return self.unterminated(Error::UnterminatedTag { offset: start }, start);
            }
            match bytes[i] {
                b'>' => {
                    i += 1;
                    break;
                }
                b'/' => {
                    i += 1;
                    if i < len && bytes[i] == b'>' {
                        self_closing = true;
                        i += 1;
                        break;
                    }
                    continue;
                }
                _ => {}
            }

            let attr_start = i;
            while i < len && !is_tag_boundary(bytes[i]) && bytes[i] != b'=' {
                i += 1;
            }
            // A stray `=` with no name is consumed as part of the name.
            if i == attr_start {
                i += 1;
            }
            let attr_name = self.input[attr_start..i].to_ascii_lowercase();

            while i < len && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let mut value = String::new();
            if i < len && bytes[i] == b'=' {
                i += 1;
                while i < len && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                if i < len && (bytes[i] == b'"' || bytes[i] == b'\'') {
                    let quote = bytes[i] as char;
                    let value_start = i + 1;
                    let Some(rel) = self.input[value_start..].find(quote) else {
                        return self.unterminated(Error::UnterminatedTag { offset: start }, start);
                    };
                    value = decode_html_entities(&self.input[value_start..value_start + rel])
                        .into_owned();
                    i = value_start + rel + 1;
                } else {
                    let value_start = i;
                    while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                        i += 1;
                    }
                    value = decode_html_entities(&self.input[value_start..i]).into_owned();
                }
            }
            if !attributes.iter().any(|(existing, _)| *existing == attr_name) {
                attributes.push((attr_name, value));
            }
        }

        self.pos = i;
        let raw_text = RAW_TEXT_ELEMENTS.contains(&name.as_str()) && !self_closing;
        self.tokens.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing,
        });
        if raw_text {
            self.read_raw_text(&name);
        }
        Ok(())
    }

    /// Reads the content of a raw-text element up to its end tag.
    fn read_raw_text(&mut self, name: &str) {
        let body_start = self.pos;
        let closer = format!("</{name}");
        let haystack = self.input[body_start..].to_ascii_lowercase();
        let body_end = haystack
            .find(&closer)
            .map_or(self.input.len(), |rel| body_start + rel);

        let body = &self.input[body_start..body_end];
        if !body.is_empty() {
            let text = if matches!(name, "script" | "style") {
                body.to_string()
            } else {
                decode_html_entities(body).into_owned()
            };
            self.push_text(text);
        }
        self.pos = body_end;
        self.text_start = body_end;
    }
}

fn is_tag_boundary(byte: u8) -> bool {
    byte.is_ascii_whitespace() || byte == b'/' || byte == b'>'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn start(name: &str, attributes: &[(&str, &str)]) -> Token {
        Token::StartTag {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            self_closing: false,
        }
    }

    #[test]
    fn test_tokenize_simple_element() {
        let tokens = tokenize("<p class=\"a b\">Hello</p>").unwrap();
        assert_eq!(
            tokens,
            vec![
                start("p", &[("class", "a b")]),
                Token::Text("Hello".into()),
                Token::EndTag { name: "p".into() },
            ]
        );
    }

    #[test]
    fn test_tokenize_attribute_forms() {
        let tokens = tokenize("<input disabled value=x data-a='1' TYPE = \"text\">").unwrap();
        assert_eq!(
            tokens,
            vec![start(
                "input",
                &[("disabled", ""), ("value", "x"), ("data-a", "1"), ("type", "text")]
            )]
        );
    }

    #[test]
    fn test_tokenize_self_closing() {
        let tokens = tokenize("<br/><img src=\"a.png\" />").unwrap();
        assert!(matches!(&tokens[0], Token::StartTag { name, self_closing: true, .. } if name == "br"));
        assert!(matches!(&tokens[1], Token::StartTag { self_closing: true, .. }));
    }

    #[test]
    fn test_tokenize_comment() {
        let tokens = tokenize("a<!-- note -->b").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Text("a".into()),
                Token::Comment(" note ".into()),
                Token::Text("b".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_decodes_entities() {
        let tokens = tokenize("<a title=\"&quot;x&quot;\">&lt;tag&gt;</a>").unwrap();
        assert_eq!(tokens[0], start("a", &[("title", "\"x\"")]));
        assert_eq!(tokens[1], Token::Text("<tag>".into()));
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        let tokens = tokenize("1 < 2").unwrap();
        assert_eq!(tokens, vec![Token::Text("1 < 2".into())]);
    }

    #[test]
    fn test_raw_text_elements() {
        let tokens = tokenize("<script>if (a < b) {}</script>").unwrap();
        assert_eq!(tokens[1], Token::Text("if (a < b) {}".into()));
        assert_eq!(tokens[2], Token::EndTag { name: "script".into() });
    }

    #[test]
    fn test_strict_rejects_unterminated() {
        assert_eq!(
            tokenize("<p class=\"x"),
            Err(Error::UnterminatedTag { offset: 0 })
        );
        assert_eq!(
            tokenize("x<!-- open"),
            Err(Error::UnterminatedComment { offset: 1 })
        );
    }

    #[test]
    fn test_lenient_keeps_unterminated_as_text() {
        assert_eq!(
            tokenize_lenient("a <p class"),
            vec![Token::Text("a <p class".into())]
        );
    }
}

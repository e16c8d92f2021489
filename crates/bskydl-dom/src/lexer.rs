use crate::entities::decode_entities;
use crate::node::Attribute;
use crate::tokens::Token;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub struct Lexer {
    source: String,
    start: usize,
    current: usize,
    raw_text_end: Option<String>,
}

impl Lexer {
    #[must_use]
    pub fn new(source: &str) -> Self {
        Lexer {
            source: String::from(source),
            start: 0,
            current: 0,
            raw_text_end: None,
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            self.start = self.current;

            if let Some(end) = self.raw_text_end.take() {
                let token = self.lex_raw_text(&end);
                tokens.push(token);
                continue;
            }

            let token = match (self.peek(), self.peek_next()) {
                ('<', '!') if self.rest().starts_with(COMMENT_START) => self.lex_comment(),
                ('<', '!') => self.lex_declaration(),
                ('<', '?') => self.lex_bogus_comment(),
                ('<', '/') if self.peek_at(2).is_ascii_alphabetic() => self.lex_end_tag(),
                ('<', c) if c.is_ascii_alphabetic() => self.lex_start_tag(),
                _ => self.lex_text(),
            };

            if let Token::StartTag {
                name, self_closing, ..
            } = &token
            {
                if !self_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                    self.raw_text_end = Some(format!("</{name}"));
                }
            }

            tokens.push(token);
        }

        tokens.push(Token::Eof);
        tokens
    }

    fn lex_comment(&mut self) -> Token {
        let offset = self.start;
        self.consume_n(COMMENT_START.len());
        let content = self.consume_until(COMMENT_END);
        self.consume_n(COMMENT_END.len());
        Token::Comment { content, offset }
    }

    fn lex_bogus_comment(&mut self) -> Token {
        let offset = self.start;
        self.consume_n(2);
        let content = self.consume_until(">");
        self.consume();
        Token::Comment { content, offset }
    }

    fn lex_declaration(&mut self) -> Token {
        let offset = self.start;
        self.consume_n(2);
        let content = self.consume_until(">").trim().to_string();
        self.consume();
        Token::Doctype { content, offset }
    }

    fn lex_end_tag(&mut self) -> Token {
        let offset = self.start;
        self.consume_n(2);
        let name = self.consume_name();
        self.consume_until(">");
        self.consume();
        Token::EndTag { name, offset }
    }

    fn lex_start_tag(&mut self) -> Token {
        let offset = self.start;
        self.consume(); // <
        let name = self.consume_name();
        let mut attributes: Vec<Attribute> = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            match self.peek() {
                '\0' if self.is_at_end() => break,
                '>' => {
                    self.consume();
                    break;
                }
                '/' => {
                    self.consume();
                    if self.peek() == '>' {
                        self.consume();
                        self_closing = true;
                        break;
                    }
                }
                _ => {
                    let attribute = self.lex_attribute();
                    if attribute.name.is_empty() {
                        // Stray character that cannot start a name.
                        self.consume();
                        continue;
                    }
                    if !attributes
                        .iter()
                        .any(|a| a.name.eq_ignore_ascii_case(&attribute.name))
                    {
                        attributes.push(attribute);
                    }
                }
            }
        }

        Token::StartTag {
            name,
            attributes,
            self_closing,
            offset,
        }
    }

    fn lex_attribute(&mut self) -> Attribute {
        let name_start = self.current;
        while !self.is_at_end() {
            let c = self.peek();
            if c.is_whitespace() || matches!(c, '=' | '>' | '/') {
                break;
            }
            self.consume();
        }
        let name = self.source[name_start..self.current].to_ascii_lowercase();

        self.skip_whitespace();
        if self.peek() != '=' {
            return Attribute::new(name, "");
        }
        self.consume(); // =
        self.skip_whitespace();

        let raw = match self.peek() {
            quote @ ('"' | '\'') => {
                self.consume();
                let value = self.consume_until(&quote.to_string());
                self.consume();
                value
            }
            _ => {
                let value_start = self.current;
                while !self.is_at_end() && !self.peek().is_whitespace() && self.peek() != '>' {
                    self.consume();
                }
                self.source[value_start..self.current].to_string()
            }
        };

        Attribute::new(name, decode_entities(&raw))
    }

    fn lex_text(&mut self) -> Token {
        let offset = self.start;
        // A lone `<` that did not open a tag belongs to the text.
        self.consume();
        while !self.is_at_end() && self.peek() != '<' {
            self.consume();
        }
        let text = &self.source[offset..self.current];
        Token::Text {
            content: decode_entities(text).into_owned(),
            offset,
        }
    }

    fn lex_raw_text(&mut self, end: &str) -> Token {
        let offset = self.start;
        while !self.is_at_end() {
            let rest = self.rest();
            if rest.len() >= end.len()
                && rest.is_char_boundary(end.len())
                && rest[..end.len()].eq_ignore_ascii_case(end)
            {
                break;
            }
            self.consume();
        }
        Token::Text {
            content: self.source[offset..self.current].to_string(),
            offset,
        }
    }

    fn consume_name(&mut self) -> String {
        let name_start = self.current;
        while !self.is_at_end() {
            let c = self.peek();
            if c.is_whitespace() || matches!(c, '/' | '>') {
                break;
            }
            self.consume();
        }
        self.source[name_start..self.current].to_ascii_lowercase()
    }

    #[inline]
    fn rest(&self) -> &str {
        &self.source[self.current..]
    }

    #[inline]
    fn peek(&self) -> char {
        self.peek_at(0)
    }

    #[inline]
    fn peek_next(&self) -> char {
        self.peek_at(1)
    }

    fn peek_at(&self, n: usize) -> char {
        self.rest().chars().nth(n).unwrap_or('\0')
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    #[inline]
    fn consume(&mut self) {
        if let Some(ch) = self.rest().chars().next() {
            self.current += ch.len_utf8();
        }
    }

    fn consume_n(&mut self, count: usize) {
        for _ in 0..count {
            self.consume();
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.consume();
        }
    }

    /// Consume up to (not including) `delimiter`, or to the end of input.
    fn consume_until(&mut self, delimiter: &str) -> String {
        let offset = self.current;
        match self.rest().find(delimiter) {
            Some(pos) => self.current += pos,
            None => self.current = self.source.len(),
        }
        self.source[offset..self.current].to_string()
    }
}

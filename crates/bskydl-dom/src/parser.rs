use crate::node::Document;
use crate::node::NodeId;
use crate::tokens::Token;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Builds a [`Document`] from a token stream.
///
/// The builder never fails. Snapshots of a live page are usually well
/// formed, and when they are not the recovery is simple: an end tag closes
/// the nearest open element with the same name (and everything opened
/// after it), and an end tag with no matching open element is dropped.
pub struct Parser {
    tokens: Vec<Token>,
    document: Document,
    open: Vec<NodeId>,
    pending_text: String,
}

impl Parser {
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        let document = Document::new();
        let root = document.root();
        Self {
            tokens,
            document,
            open: vec![root],
            pending_text: String::new(),
        }
    }

    #[must_use]
    pub fn parse(mut self) -> Document {
        let tokens = std::mem::take(&mut self.tokens);

        for token in tokens {
            match token {
                Token::Text { content, .. } => self.pending_text.push_str(&content),
                Token::StartTag {
                    name,
                    attributes,
                    self_closing,
                    ..
                } => {
                    self.flush_text();
                    let element = self.document.create_element(&name, attributes);
                    self.append(element);
                    if !self_closing && !VOID_ELEMENTS.contains(&name.as_str()) {
                        self.open.push(element);
                    }
                }
                Token::EndTag { name, offset } => {
                    self.flush_text();
                    self.close(&name, offset);
                }
                Token::Comment { content, .. } => {
                    self.flush_text();
                    let comment = self.document.create_comment(content);
                    self.append(comment);
                }
                Token::Doctype { content, .. } => {
                    self.flush_text();
                    let doctype = self.document.create_doctype(content);
                    self.append(doctype);
                }
                Token::Eof => break,
            }
        }

        self.flush_text();
        self.document
    }

    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or_else(|| self.document.root())
    }

    fn append(&mut self, node: NodeId) {
        let parent = self.current();
        // Fresh nodes cannot form a cycle.
        let _ = self.document.append_child(parent, node);
    }

    fn flush_text(&mut self) {
        if self.pending_text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending_text);
        let node = self.document.create_text(text);
        self.append(node);
    }

    fn close(&mut self, name: &str, offset: usize) {
        // Index 0 is the document node and is never popped.
        let position = self
            .open
            .iter()
            .skip(1)
            .rposition(|id| self.document.tag_name(*id) == Some(name));

        match position {
            Some(index) => self.open.truncate(index + 1),
            None => tracing::trace!(tag = name, offset, "dropping unmatched end tag"),
        }
    }
}

use crate::node::Attribute;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    StartTag {
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
        offset: usize,
    },
    EndTag {
        name: String,
        offset: usize,
    },
    Text {
        content: String,
        offset: usize,
    },
    Comment {
        content: String,
        offset: usize,
    },
    Doctype {
        content: String,
        offset: usize,
    },
    Eof,
}

impl Token {
    pub fn offset(&self) -> Option<usize> {
        match self {
            Token::StartTag { offset, .. }
            | Token::EndTag { offset, .. }
            | Token::Text { offset, .. }
            | Token::Comment { offset, .. }
            | Token::Doctype { offset, .. } => Some(*offset),
            Token::Eof => None,
        }
    }
}

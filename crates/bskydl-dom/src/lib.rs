//! In-memory model of a rendered page.
//!
//! The feed we scan is a single-page app that keeps re-rendering under us,
//! so the engine works against a plain arena tree: nodes are addressed by
//! [`NodeId`], attributes can be read and set, and ancestor/descendant
//! walks are cheap. A host fills the tree either programmatically or by
//! parsing an HTML snapshot of the page with [`parse_html`].
//!
//! ## Parsing
//!
//! 1. **Lexing**: markup is split into tags, text, comments and doctypes.
//!    `script`/`style` bodies are kept as raw text.
//! 2. **Tree building**: tokens are folded into a [`Document`], with
//!    forgiving recovery for misnested or stray end tags.

mod entities;
mod error;
mod lexer;
mod node;
mod parser;
mod tokens;

pub use entities::decode_entities;
pub use error::DomError;
pub use lexer::Lexer;
pub use node::Ancestors;
pub use node::Attribute;
pub use node::Descendants;
pub use node::Document;
pub use node::DocumentId;
pub use node::Element;
pub use node::NodeId;
pub use node::NodeKind;
pub use node::DOWNLOAD_LINK_ID;
pub use node::ROOT_CONTAINER_ID;
pub use parser::Parser;
pub use tokens::Token;

/// Parse an HTML snapshot into a [`Document`].
#[must_use]
pub fn parse_html(source: &str) -> Document {
    let tokens = Lexer::new(source).tokenize();
    Parser::new(tokens).parse()
}

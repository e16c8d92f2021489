use std::fmt::Write as _;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::error::DomError;

/// Id of the root container the host page renders into.
pub const ROOT_CONTAINER_ID: &str = "root";
/// Id of the single in-page link used to trigger downloads.
pub const DOWNLOAD_LINK_ID: &str = "img-download-button";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<Attribute>,
}

impl Element {
    pub fn new(name: &str, attributes: Vec<Attribute>) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attributes,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Value of `name`, or `None` when the attribute is absent.
    ///
    /// An attribute written without a value (`<img alt>`) is present with
    /// an empty value, which is distinct from absent.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(existing) = self
            .attributes
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            value.clone_into(&mut existing.value);
        } else {
            self.attributes.push(Attribute::new(name, value));
        }
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Doctype(String),
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Clone, Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

static NEXT_DOCUMENT: AtomicU64 = AtomicU64::new(0);

/// Identity of one [`Document`].
///
/// A `NodeId` only means something in the document that allocated it.
/// Anything that holds ids across calls records this alongside them and
/// checks it before use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    fn next() -> Self {
        Self(NEXT_DOCUMENT.fetch_add(1, Ordering::Relaxed))
    }
}

/// An arena-allocated document tree.
///
/// Nodes are never freed; detaching a node only unlinks it from its
/// parent, so a `NodeId` stays valid (but unreachable from the root) for
/// the lifetime of the document. That matches how a page's renderer
/// drops subtrees: stale references keep working, the scan just stops
/// finding them.
///
/// Ids are not portable between documents. Every document, clones
/// included, gets its own [`DocumentId`].
#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    nodes: Vec<Node>,
}

impl Clone for Document {
    fn clone(&self) -> Self {
        Self {
            id: DocumentId::next(),
            nodes: self.nodes.clone(),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: DocumentId::next(),
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    #[must_use]
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Whether `id` was allocated by this document.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, name: &str, attributes: Vec<Attribute>) -> NodeId {
        self.alloc(NodeKind::Element(Element::new(name, attributes)))
    }

    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(content.into()))
    }

    pub fn create_comment(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Comment(content.into()))
    }

    pub fn create_doctype(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Doctype(content.into()))
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(DomError::Cycle);
        }
        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
        Ok(())
    }

    /// Unlink `id` from its parent. The subtree below `id` stays intact.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|c| *c != id);
        }
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.node(id).kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.index()].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::name)
    }

    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    #[must_use]
    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Set an attribute on an element node. Non-element nodes are left
    /// untouched.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(id) {
            element.set_attr(name, value);
        }
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Parent, but only if it is an element (the document node is not).
    #[must_use]
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.element(*p).is_some())
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Ancestor elements of `id`, nearest first. The document node is not
    /// included.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent_element(id),
        }
    }

    /// All nodes below `id` in document (pre-)order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Elements named `tag` below `scope`, in document order.
    pub fn elements_by_tag<'a>(
        &'a self,
        scope: NodeId,
        tag: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.descendants(scope)
            .filter(move |id| self.tag_name(*id).is_some_and(|n| n.eq_ignore_ascii_case(tag)))
    }

    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .find(|node| self.attr(*node, "id") == Some(id))
    }

    /// Whether `id` is still reachable from the document root. Ids this
    /// document never allocated are not connected.
    #[must_use]
    pub fn is_connected(&self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        if id == self.root() {
            return true;
        }
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if parent == self.root() {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Return the in-page download link, creating it under the root
    /// container the first time.
    pub fn ensure_download_link(&mut self) -> Result<NodeId, DomError> {
        if let Some(existing) = self.get_element_by_id(DOWNLOAD_LINK_ID) {
            return Ok(existing);
        }
        let container = self
            .get_element_by_id(ROOT_CONTAINER_ID)
            .ok_or(DomError::MissingRootContainer)?;
        let link = self.create_element("a", vec![Attribute::new("id", DOWNLOAD_LINK_ID)]);
        self.append_child(container, link)?;
        Ok(link)
    }

    /// Point the in-page download link at a saved file, the way a page
    /// script sets `href` and `download` before clicking it.
    pub fn point_download_link(
        &mut self,
        href: &str,
        download: &str,
    ) -> Result<NodeId, DomError> {
        let link = self.ensure_download_link()?;
        self.set_attr(link, "href", href);
        self.set_attr(link, "download", download);
        Ok(link)
    }

    /// Render the tree as an indented outline, one node per line.
    ///
    /// Whitespace-only text is omitted. Used by tests and the `--dump`
    /// debugging output.
    #[must_use]
    pub fn outline(&self, from: NodeId) -> String {
        let mut out = String::new();
        self.outline_into(from, 0, &mut out);
        out
    }

    fn outline_into(&self, id: NodeId, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let next_depth = match &self.node(id).kind {
            NodeKind::Document => depth,
            NodeKind::Doctype(content) => {
                let _ = writeln!(out, "{indent}<!{content}>");
                depth + 1
            }
            NodeKind::Element(element) => {
                let _ = write!(out, "{indent}<{}", element.name());
                for attr in element.attributes() {
                    let _ = write!(out, " {}=\"{}\"", attr.name, attr.value);
                }
                let _ = writeln!(out, ">");
                depth + 1
            }
            NodeKind::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    let _ = writeln!(out, "{indent}\"{trimmed}\"");
                }
                depth + 1
            }
            NodeKind::Comment(content) => {
                let _ = writeln!(out, "{indent}<!--{content}-->");
                depth + 1
            }
        };
        for child in self.children(id) {
            self.outline_into(*child, next_depth, out);
        }
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent_element(current);
        Some(current)
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(current).iter().rev().copied());
        Some(current)
    }
}

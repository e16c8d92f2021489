use bskydl_dom::Attribute;
use bskydl_dom::Document;
use bskydl_dom::DocumentId;
use bskydl_dom::NodeId;
use rustc_hash::FxHashMap;

use crate::ancestry::resolve_ordinal;
use crate::ancestry::resolve_post;
use crate::classify::classify;
use crate::classify::ImageClass;
use crate::engine::Engine;
use crate::filename::now_millis;
use crate::filename::ImageMetadata;
use crate::post::PostReference;

pub const BUTTON_CLASS: &str = "download-button";

/// A download button attached to one image.
///
/// The URL and filename are captured when the button is attached, so a
/// click keeps working after the image node is gone and clicks on
/// different buttons never share state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Affordance {
    /// The document `button` and `image` belong to.
    pub document: DocumentId,
    pub button: NodeId,
    pub image: NodeId,
    pub image_url: String,
    pub filename: String,
    pub post: PostReference,
    pub ordinal: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Affordances {
    by_button: FxHashMap<NodeId, Affordance>,
    order: Vec<NodeId>,
}

impl Affordances {
    pub(crate) fn get(&self, button: NodeId) -> Option<&Affordance> {
        self.by_button.get(&button)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Affordance> {
        self.order.iter().filter_map(|id| self.by_button.get(id))
    }

    pub(crate) fn insert(&mut self, affordance: Affordance) {
        let button = affordance.button;
        if self.by_button.insert(button, affordance).is_none() {
            self.order.push(button);
        }
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&Affordance) -> bool) {
        self.by_button.retain(|_, affordance| keep(affordance));
        let by_button = &self.by_button;
        self.order.retain(|id| by_button.contains_key(id));
    }

    pub(crate) fn clear(&mut self) {
        self.by_button.clear();
        self.order.clear();
    }
}

/// What happened when the engine tried to put a button on an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachOutcome {
    Attached { button: NodeId },
    /// Only thumbnails can be tied to a post position.
    NotThumbnail(ImageClass),
    /// No post link was found above the image, and the page is not a post
    /// page. Nothing is attached.
    NoPostLink,
    MissingSource,
}

impl Engine {
    /// Resolve `image`'s post and position, and attach a download button
    /// next to it.
    pub fn attach(&mut self, doc: &mut Document, image: NodeId, page_path: &str) -> AttachOutcome {
        let Some(image_url) = doc.attr(image, "src").map(str::to_string) else {
            return AttachOutcome::MissingSource;
        };

        let class = classify(&image_url);
        if !class.is_thumbnail() {
            return AttachOutcome::NotThumbnail(class);
        }

        let Some(post) = resolve_post(doc, image, page_path, self.options.max_link_hops) else {
            tracing::debug!(src = %image_url, "no post link above image");
            return AttachOutcome::NoPostLink;
        };

        let ordinal = resolve_ordinal(doc, image, self.options.ordinal_depth);
        let metadata = ImageMetadata::new(&post, ordinal, now_millis());
        let filename = self.options.template.render(&metadata);

        let button = insert_button(doc, image);

        self.affordances.insert(Affordance {
            document: doc.id(),
            button,
            image,
            image_url,
            filename,
            post,
            ordinal,
        });

        AttachOutcome::Attached { button }
    }

    /// Drop affordances whose button the page has since removed, and any
    /// left over from a document that has been swapped out.
    pub fn prune(&mut self, doc: &Document) -> usize {
        let before = self.affordances.iter().count();
        self.affordances.retain(|affordance| {
            affordance.document == doc.id() && doc.is_connected(affordance.button)
        });
        before - self.affordances.iter().count()
    }
}

/// Append the button to the image's grandparent, the positioned box the
/// image is drawn in. Shallow trees fall back to the nearest ancestor.
fn insert_button(doc: &mut Document, image: NodeId) -> NodeId {
    let host = doc
        .ancestors(image)
        .take(2)
        .last()
        .unwrap_or_else(|| doc.root());
    let button = doc.create_element("div", vec![Attribute::new("class", BUTTON_CLASS)]);
    // `button` is fresh, so this cannot form a cycle.
    let _ = doc.append_child(host, button);
    button
}

//! Tie an image back to its post by walking up the rendered tree.
//!
//! The page gives no stable link between an `<img>` and the post it sits
//! in, so both lookups here are structural heuristics. Each one is a
//! bounded upward walk from the image, and each bound is a setting, so a
//! change in the app's render depth is a configuration change.

use bskydl_dom::Document;
use bskydl_dom::NodeId;

use crate::post::is_post_path;
use crate::post::PostReference;

/// Result of the upward search for a post's permalink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkSearch {
    /// `hops` is how many levels above the image the link was found.
    Found { link: NodeId, hops: usize },
    NotFound,
}

/// Whether `node` is the "time since post" link: an anchor to a post page
/// that carries an `aria-label`.
///
/// Links inside a post's text can point at other posts too, but only the
/// timestamp link is labelled.
#[must_use]
pub fn is_post_link(doc: &Document, node: NodeId) -> bool {
    doc.tag_name(node) == Some("a")
        && doc.attr(node, "href").is_some_and(is_post_path)
        && doc.has_attr(node, "aria-label")
}

fn first_post_link(doc: &Document, scope: NodeId) -> Option<NodeId> {
    doc.elements_by_tag(scope, "a")
        .find(|link| is_post_link(doc, *link))
}

/// Search upward from `start` for the nearest post link.
///
/// Each level checks every link below it in document order before moving
/// one level up. At most `max_hops` levels above `start` are visited.
#[must_use]
pub fn find_post_link(doc: &Document, start: NodeId, max_hops: usize) -> LinkSearch {
    let levels = std::iter::once(start).chain(doc.ancestors(start));

    for (hops, scope) in levels.take(max_hops + 1).enumerate() {
        if let Some(link) = first_post_link(doc, scope) {
            return LinkSearch::Found { link, hops };
        }
    }

    LinkSearch::NotFound
}

/// Work out which post `image` belongs to.
///
/// On a post detail page the location is authoritative: the feed the user
/// navigated from stays mounted in the background and its links would
/// otherwise win the search. Returns `None` when no post link is found.
#[must_use]
pub fn resolve_post(
    doc: &Document,
    image: NodeId,
    page_path: &str,
    max_hops: usize,
) -> Option<PostReference> {
    if is_post_path(page_path) {
        return PostReference::from_path(page_path);
    }

    match find_post_link(doc, image, max_hops) {
        LinkSearch::Found { link, .. } => doc.attr(link, "href").and_then(PostReference::from_path),
        LinkSearch::NotFound => None,
    }
}

/// The element whose subtree holds all the images of `image`'s post.
///
/// Climbs at most `depth` levels, and stops below the first ancestor that
/// contains a post link so the walk never spills into the surrounding
/// feed.
#[must_use]
pub fn post_container(doc: &Document, image: NodeId, depth: usize) -> NodeId {
    let mut container = image;
    for ancestor in doc.ancestors(image).take(depth) {
        if first_post_link(doc, ancestor).is_some() {
            break;
        }
        container = ancestor;
    }
    container
}

/// Zero-based position of `image` among the images of its post.
///
/// Images are matched by `src`, so the first image with the same URL
/// wins. Falls back to 0 when nothing matches.
#[must_use]
pub fn resolve_ordinal(doc: &Document, image: NodeId, depth: usize) -> usize {
    let Some(src) = doc.attr(image, "src") else {
        return 0;
    };
    let container = post_container(doc, image, depth);

    doc.elements_by_tag(container, "img")
        .position(|candidate| doc.attr(candidate, "src") == Some(src))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use bskydl_dom::Attribute;

    use super::*;

    const POST_HREF: &str = "/profile/oh8.bsky.social/post/3krmccyl4722w";

    fn div(doc: &mut Document, parent: NodeId) -> NodeId {
        let node = doc.create_element("div", vec![]);
        doc.append_child(parent, node).unwrap();
        node
    }

    fn nest(doc: &mut Document, parent: NodeId, levels: usize) -> NodeId {
        (0..levels).fold(parent, |p, _| div(doc, p))
    }

    fn img(doc: &mut Document, parent: NodeId, src: &str) -> NodeId {
        let node = doc.create_element(
            "img",
            vec![Attribute::new("src", src), Attribute::new("alt", "")],
        );
        doc.append_child(parent, node).unwrap();
        node
    }

    fn link(doc: &mut Document, parent: NodeId, href: &str, label: Option<&str>) -> NodeId {
        let mut attrs = vec![Attribute::new("href", href)];
        if let Some(label) = label {
            attrs.push(Attribute::new("aria-label", label));
        }
        let node = doc.create_element("a", attrs);
        doc.append_child(parent, node).unwrap();
        node
    }

    /// A post whose permalink hangs off `post` and whose images sit
    /// `depth` levels below `gallery`.
    struct Fixture {
        doc: Document,
        post: NodeId,
        images: Vec<NodeId>,
    }

    fn fixture(srcs: &[&str]) -> Fixture {
        let mut doc = Document::new();
        let root = doc.root();
        let post = div(&mut doc, root);
        link(&mut doc, post, POST_HREF, Some("3h"));
        let body = nest(&mut doc, post, 5);
        let gallery = div(&mut doc, body);
        let images = srcs
            .iter()
            .map(|src| {
                let cell = nest(&mut doc, gallery, 6);
                img(&mut doc, cell, src)
            })
            .collect();
        Fixture { doc, post, images }
    }

    mod post_link {
        use super::*;

        #[test]
        fn test_found_with_hop_count() {
            let f = fixture(&["a"]);
            // image -> 6 cells -> gallery -> 5 body -> post
            let search = find_post_link(&f.doc, f.images[0], 32);
            assert!(matches!(search, LinkSearch::Found { hops: 13, .. }));
        }

        #[test]
        fn test_bound_respected() {
            let f = fixture(&["a"]);
            assert_eq!(find_post_link(&f.doc, f.images[0], 12), LinkSearch::NotFound);
        }

        #[test]
        fn test_unlabelled_link_ignored() {
            let mut doc = Document::new();
            let root = doc.root();
            let post = div(&mut doc, root);
            link(&mut doc, post, "/profile/someone.else/post/zzz", None);
            let image = img(&mut doc, post, "a");
            assert_eq!(find_post_link(&doc, image, 32), LinkSearch::NotFound);
        }

        #[test]
        fn test_labelled_non_post_link_ignored() {
            let mut doc = Document::new();
            let root = doc.root();
            let post = div(&mut doc, root);
            link(&mut doc, post, "/profile/oh8.bsky.social", Some("oh8"));
            let image = img(&mut doc, post, "a");
            assert_eq!(find_post_link(&doc, image, 32), LinkSearch::NotFound);
        }

        #[test]
        fn test_nearest_level_wins() {
            let mut doc = Document::new();
            let root = doc.root();
            let outer = div(&mut doc, root);
            link(&mut doc, outer, "/profile/far.bsky.social/post/far", Some("1d"));
            let inner = div(&mut doc, outer);
            let near = link(&mut doc, inner, "/profile/near.bsky.social/post/near", Some("2h"));
            let image = img(&mut doc, inner, "a");
            assert_eq!(
                find_post_link(&doc, image, 32),
                LinkSearch::Found {
                    link: near,
                    hops: 1
                }
            );
        }
    }

    mod post_reference {
        use super::*;

        #[test]
        fn test_from_link() {
            let f = fixture(&["a"]);
            let post = resolve_post(&f.doc, f.images[0], "/", 32).unwrap();
            assert_eq!(post.username, "oh8.bsky.social");
            assert_eq!(post.short_username, "oh8");
            assert_eq!(post.post_id, "3krmccyl4722w");
        }

        #[test]
        fn test_page_location_wins_over_stale_feed() {
            let f = fixture(&["a"]);
            let post =
                resolve_post(&f.doc, f.images[0], "/profile/other.bsky.social/post/xyz", 32)
                    .unwrap();
            assert_eq!(post.username, "other.bsky.social");
            assert_eq!(post.post_id, "xyz");
        }

        #[test]
        fn test_no_link_is_none() {
            let mut doc = Document::new();
            let root = doc.root();
            let image = img(&mut doc, root, "a");
            assert_eq!(resolve_post(&doc, image, "/", 32), None);
        }
    }

    mod ordinal {
        use super::*;

        #[test]
        fn test_middle_of_three() {
            let f = fixture(&["a", "b", "c"]);
            assert_eq!(resolve_ordinal(&f.doc, f.images[0], 7), 0);
            assert_eq!(resolve_ordinal(&f.doc, f.images[1], 7), 1);
            assert_eq!(resolve_ordinal(&f.doc, f.images[2], 7), 2);
        }

        #[test]
        fn test_container_stops_below_post_boundary() {
            let f = fixture(&["a", "b"]);
            // A generous depth would reach the post element itself, which
            // owns the permalink; the walk must stop below it.
            let container = post_container(&f.doc, f.images[1], 50);
            assert_ne!(container, f.post);
            assert!(f.doc.ancestors(container).any(|a| a == f.post));
            assert_eq!(resolve_ordinal(&f.doc, f.images[1], 50), 1);
        }

        #[test]
        fn test_neighbouring_post_not_counted() {
            let mut doc = Document::new();
            let root = doc.root();
            let feed = div(&mut doc, root);
            for (n, src) in ["x", "y"].iter().enumerate() {
                let post = div(&mut doc, feed);
                link(&mut doc, post, &format!("/profile/p.bsky.social/post/p{n}"), Some("1h"));
                let cell = nest(&mut doc, post, 3);
                img(&mut doc, cell, src);
            }
            let second = doc.elements_by_tag(root, "img").nth(1).unwrap();
            assert_eq!(resolve_ordinal(&doc, second, 7), 0);
        }

        #[test]
        fn test_missing_src_defaults_to_zero() {
            let mut doc = Document::new();
            let root = doc.root();
            let image = doc.create_element("img", vec![]);
            doc.append_child(root, image).unwrap();
            assert_eq!(resolve_ordinal(&doc, image, 7), 0);
        }
    }
}

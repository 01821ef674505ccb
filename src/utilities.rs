//! Footer year and in-page anchor scrolling.

use crate::host::{Host, ScrollBehavior};
use crate::types::ids;

/// Write the current year into `#footerYear` when the page has one.
pub fn stamp_footer_year<H: Host>(host: &mut H) -> Option<i32> {
    let footer = host.by_id(ids::FOOTER_YEAR)?;
    let year = host.current_year();
    host.set_text(&footer, &year.to_string());
    Some(year)
}

/// Smooth scrolling for `a[href^="#"]` links, offset by the fixed navbar.
#[derive(Debug, Clone)]
pub struct SmoothScroll<N> {
    anchors: Vec<(N, String)>,
    navbar_height: f64,
}

impl<N: Clone + PartialEq + std::fmt::Debug> SmoothScroll<N> {
    pub fn bind<H: Host<Node = N>>(host: &H, navbar_height: f64) -> Self {
        let anchors = host
            .by_tag("a")
            .into_iter()
            .filter_map(|a| {
                let href = host.attribute(&a, "href")?;
                href.starts_with('#').then_some((a, href))
            })
            .collect();
        Self {
            anchors,
            navbar_height,
        }
    }

    pub fn anchors(&self) -> impl Iterator<Item = &N> {
        self.anchors.iter().map(|(a, _)| a)
    }

    /// Scroll to the anchor's target. Returns true when the default jump
    /// must be suppressed, i.e. when a scroll was issued.
    pub fn on_click<H: Host<Node = N>>(&self, host: &mut H, node: &N) -> bool {
        let Some((_, href)) = self.anchors.iter().find(|(a, _)| a == node) else {
            return false;
        };
        let id = &href[1..];
        if id.is_empty() {
            return false;
        }
        let Some(target) = host.by_id(id) else {
            return false;
        };
        let top = host.bounding_rect(&target).top + host.scroll_y() - self.navbar_height;
        host.scroll_to(top, ScrollBehavior::Smooth);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, Element, NodeId};
    use crate::types::Rect;

    fn anchored() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::default();
        let root = doc.root();
        let good = doc.append(root, Element::new("a").attr("href", "#contact"));
        let bare = doc.append(root, Element::new("a").attr("href", "#"));
        let dangling = doc.append(root, Element::new("a").attr("href", "#missing"));
        doc.append(root, Element::new("a").attr("href", "https://example.com"));
        doc.append(
            root,
            Element::new("section")
                .id("contact")
                .rect(Rect::new(2000.0, 0.0, 1280.0, 500.0)),
        );
        (doc, good, bare, dangling)
    }

    #[test]
    fn scrolls_below_navbar() {
        let (mut doc, good, _, _) = anchored();
        doc.set_scroll(300.0);
        let scroll = SmoothScroll::bind(&doc, 56.0);
        assert_eq!(scroll.anchors().count(), 3);
        assert!(scroll.on_click(&mut doc, &good));
        assert_eq!(doc.scroll_requests(), &[(1944.0, ScrollBehavior::Smooth)]);
    }

    #[test]
    fn bare_hash_and_missing_target_are_ignored() {
        let (mut doc, _, bare, dangling) = anchored();
        let scroll = SmoothScroll::bind(&doc, 56.0);
        assert!(!scroll.on_click(&mut doc, &bare));
        assert!(!scroll.on_click(&mut doc, &dangling));
        assert!(doc.scroll_requests().is_empty());
    }

    #[test]
    fn footer_year_is_stamped_when_present() {
        let mut doc = Document::default();
        assert_eq!(stamp_footer_year(&mut doc), None);
        let root = doc.root();
        let footer = doc.append(root, Element::new("span").id(ids::FOOTER_YEAR));
        doc.set_year(2031);
        assert_eq!(stamp_footer_year(&mut doc), Some(2031));
        assert_eq!(doc.text(footer), "2031");
    }
}

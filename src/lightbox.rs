//! Modal image gallery.
//!
//! The lightbox is split in two layers:
//!
//! - [`Viewer`] is the pure state machine: gallery registry, current
//!   [`Session`], visibility, scroll lock and swipe tracking. It knows
//!   nothing about elements and is what the navigation properties are
//!   tested against.
//! - [`Lightbox`] binds a `Viewer` to the modal markup, routes clicks, keys
//!   and touches into it, and renders [`LightboxView`] after every mutation.
//!
//! ## Registry
//!
//! Gallery members declare `data-gallery` and `data-index`. Members are
//! grouped by gallery and placed at their declared index, so markup order
//! does not matter, but every gallery must end up dense: indices `0..len`
//! each used exactly once. A gallery that breaks this, or has a member
//! with an unreadable index or no image, is logged and left out together
//! with its triggers; the other galleries still open. The registry is
//! built once at bind time and never re-scanned.
//!
//! ## Navigation
//!
//! `next`/`prev` wrap modulo the gallery length, so every reachable index
//! is valid by construction and a single-item gallery is a fixed point.

use crate::host::{BindError, Host};
use crate::types::{Key, class, ids};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RegistryError {
    #[error("gallery {gallery:?} declares index {index} twice")]
    DuplicateIndex { gallery: String, index: usize },
    #[error("gallery {gallery:?} has no item at index {index}")]
    MissingIndex { gallery: String, index: usize },
}

#[derive(Error, Debug, PartialEq)]
pub enum OpenError {
    #[error("unknown gallery {0:?}")]
    UnknownGallery(String),
    #[error("index {index} out of range for gallery {gallery:?} ({len} items)")]
    IndexOutOfRange {
        gallery: String,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    pub src: String,
    pub alt: String,
}

/// One scanned gallery member before grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryMember {
    pub gallery: String,
    pub index: usize,
    pub item: MediaItem,
}

/// Galleries keyed by identifier. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GalleryRegistry {
    galleries: BTreeMap<String, Vec<MediaItem>>,
}

impl GalleryRegistry {
    /// Build every gallery, failing on the first inconsistent one.
    pub fn build(members: impl IntoIterator<Item = GalleryMember>) -> Result<Self, RegistryError> {
        let (registry, mut rejected) = Self::build_partial(members);
        if rejected.is_empty() {
            Ok(registry)
        } else {
            Err(rejected.remove(0))
        }
    }

    /// Build the consistent galleries and report the others, which are left
    /// out of the registry.
    pub fn build_partial(members: impl IntoIterator<Item = GalleryMember>) -> (Self, Vec<RegistryError>) {
        let mut grouped: BTreeMap<String, Vec<(usize, MediaItem)>> = BTreeMap::new();
        for member in members {
            grouped
                .entry(member.gallery)
                .or_default()
                .push((member.index, member.item));
        }

        let mut galleries = BTreeMap::new();
        let mut rejected = Vec::new();
        for (gallery, members) in grouped {
            match dense(&gallery, members) {
                Ok(items) => {
                    galleries.insert(gallery, items);
                }
                Err(err) => rejected.push(err),
            }
        }
        (Self { galleries }, rejected)
    }

    pub fn gallery(&self, id: &str) -> Option<&[MediaItem]> {
        self.galleries.get(id).map(Vec::as_slice)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.galleries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.galleries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.galleries.is_empty()
    }
}

/// Order one gallery's members by declared index; indices must be `0..len`.
fn dense(gallery: &str, members: Vec<(usize, MediaItem)>) -> Result<Vec<MediaItem>, RegistryError> {
    let mut slots = BTreeMap::new();
    for (index, item) in members {
        if slots.insert(index, item).is_some() {
            return Err(RegistryError::DuplicateIndex {
                gallery: gallery.to_string(),
                index,
            });
        }
    }
    // BTreeMap keys are sorted, so the first key != position is the gap
    if let Some((missing, _)) = slots.keys().enumerate().find(|(pos, idx)| pos != *idx) {
        return Err(RegistryError::MissingIndex {
            gallery: gallery.to_string(),
            index: missing,
        });
    }
    Ok(slots.into_values().collect())
}

/// Which gallery is shown and where. References the registry by id only.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub gallery: String,
    pub index: usize,
}

/// Everything the modal needs to draw itself.
#[derive(Debug, Clone, PartialEq)]
pub struct LightboxView<'a> {
    pub visible: bool,
    /// `None` while closed: the image source is cleared.
    pub item: Option<&'a MediaItem>,
    /// 1-based `"position / total"`.
    pub counter: String,
    pub show_nav: bool,
    pub scroll_locked: bool,
}

#[derive(Debug, Clone)]
pub struct Viewer {
    registry: GalleryRegistry,
    session: Option<Session>,
    touch_start_x: Option<f64>,
    swipe_threshold: f64,
}

impl Viewer {
    pub fn new(registry: GalleryRegistry, swipe_threshold: f64) -> Self {
        Self {
            registry,
            session: None,
            touch_start_x: None,
            swipe_threshold,
        }
    }

    pub fn registry(&self) -> &GalleryRegistry {
        &self.registry
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Scroll lock is held exactly while the modal is open.
    pub fn scroll_locked(&self) -> bool {
        self.is_open()
    }

    /// Show `gallery` at `index`. Re-targets an already open session.
    /// Invalid targets are rejected and leave the state untouched.
    pub fn open(&mut self, gallery: &str, index: usize) -> Result<(), OpenError> {
        let items = self
            .registry
            .gallery(gallery)
            .ok_or_else(|| OpenError::UnknownGallery(gallery.to_string()))?;
        if index >= items.len() {
            return Err(OpenError::IndexOutOfRange {
                gallery: gallery.to_string(),
                index,
                len: items.len(),
            });
        }
        self.session = Some(Session {
            gallery: gallery.to_string(),
            index,
        });
        Ok(())
    }

    pub fn close(&mut self) {
        self.session = None;
        self.touch_start_x = None;
    }

    pub fn next(&mut self) -> bool {
        self.step(1)
    }

    pub fn prev(&mut self) -> bool {
        self.step(-1)
    }

    fn step(&mut self, delta: isize) -> bool {
        let Some(session) = &mut self.session else {
            return false;
        };
        let len = self
            .registry
            .gallery(&session.gallery)
            .map_or(0, <[MediaItem]>::len);
        if len == 0 {
            return false;
        }
        let len = len as isize;
        session.index = ((session.index as isize + delta).rem_euclid(len)) as usize;
        true
    }

    /// Escape closes, arrows navigate. Ignored entirely while closed.
    pub fn handle_key(&mut self, key: &Key) -> bool {
        if !self.is_open() {
            return false;
        }
        match key {
            Key::Escape => {
                self.close();
                true
            }
            Key::ArrowLeft => self.prev(),
            Key::ArrowRight => self.next(),
            Key::Other(_) => false,
        }
    }

    pub fn touch_start(&mut self, x: f64) {
        self.touch_start_x = Some(x);
    }

    /// Finish a gesture. A leftward swipe past the threshold goes forward,
    /// a rightward one goes back; anything shorter is ignored. The start
    /// point is forgotten either way.
    pub fn touch_end(&mut self, x: f64) -> bool {
        let Some(start) = self.touch_start_x.take() else {
            return false;
        };
        let dx = x - start;
        if dx.abs() <= self.swipe_threshold {
            return false;
        }
        if dx < 0.0 { self.next() } else { self.prev() }
    }

    pub fn view(&self) -> LightboxView<'_> {
        let current = self.session.as_ref().and_then(|s| {
            self.registry
                .gallery(&s.gallery)
                .and_then(|items| items.get(s.index).map(|item| (s.index, items.len(), item)))
        });
        match current {
            Some((index, len, item)) => LightboxView {
                visible: true,
                item: Some(item),
                counter: format!("{} / {}", index + 1, len),
                show_nav: len > 1,
                scroll_locked: true,
            },
            None => LightboxView {
                visible: false,
                item: None,
                counter: String::new(),
                show_nav: false,
                scroll_locked: false,
            },
        }
    }
}

/// The modal's elements.
#[derive(Debug, Clone)]
pub struct LightboxElements<N> {
    pub container: N,
    pub backdrop: N,
    pub image: N,
    pub close: N,
    pub prev: N,
    pub next: N,
    pub caption: N,
    pub counter: N,
    pub body: N,
}

enum Control {
    Close,
    Prev,
    Next,
}

#[derive(Debug, Clone)]
struct Trigger<N> {
    node: N,
    gallery: String,
    index: usize,
}

#[derive(Debug, Clone)]
pub struct Lightbox<N> {
    viewer: Viewer,
    elements: LightboxElements<N>,
    triggers: Vec<Trigger<N>>,
}

impl<N: Clone + PartialEq + std::fmt::Debug> Lightbox<N> {
    /// Scan gallery members and bind the modal.
    pub fn bind<H: Host<Node = N>>(host: &H, swipe_threshold: f64) -> Result<Self, BindError> {
        let elements = LightboxElements {
            container: host.require_id(ids::LIGHTBOX)?,
            backdrop: host.require_id(ids::LIGHTBOX_BACKDROP)?,
            image: host.require_id(ids::LIGHTBOX_IMG)?,
            close: host.require_id(ids::LIGHTBOX_CLOSE)?,
            prev: host.require_id(ids::LIGHTBOX_PREV)?,
            next: host.require_id(ids::LIGHTBOX_NEXT)?,
            caption: host.require_id(ids::LIGHTBOX_CAPTION)?,
            counter: host.require_id(ids::LIGHTBOX_COUNTER)?,
            body: host
                .body()
                .ok_or_else(|| BindError::MissingElement("body".into()))?,
        };

        let mut triggers = Vec::new();
        let mut members = Vec::new();
        let mut broken = BTreeSet::new();
        for node in host.by_class(class::GALLERY_ITEM) {
            let Some(gallery) = host.attribute(&node, "data-gallery") else {
                continue;
            };
            let raw = host.attribute(&node, "data-index").unwrap_or_default();
            let Ok(index) = raw.trim().parse::<usize>() else {
                let err = BindError::InvalidIndex {
                    gallery: gallery.clone(),
                    value: raw,
                };
                tracing::warn!(%err, "gallery skipped");
                broken.insert(gallery);
                continue;
            };
            let Some(image) = host.descendants_by_tag(&node, "img").into_iter().next() else {
                let err = BindError::MissingMedia {
                    gallery: gallery.clone(),
                    index,
                };
                tracing::warn!(%err, "gallery skipped");
                broken.insert(gallery);
                continue;
            };
            members.push(GalleryMember {
                gallery: gallery.clone(),
                index,
                item: MediaItem {
                    src: host.attribute(&image, "src").unwrap_or_default(),
                    alt: host.attribute(&image, "alt").unwrap_or_default(),
                },
            });
            triggers.push(Trigger {
                node,
                gallery,
                index,
            });
        }

        let (registry, rejected) = GalleryRegistry::build_partial(
            members
                .into_iter()
                .filter(|member| !broken.contains(&member.gallery)),
        );
        for err in rejected {
            tracing::warn!(err = %BindError::from(err), "gallery skipped");
        }
        triggers.retain(|trigger| registry.gallery(&trigger.gallery).is_some());
        tracing::debug!(galleries = registry.len(), "lightbox bound");
        Ok(Self {
            viewer: Viewer::new(registry, swipe_threshold),
            elements,
            triggers,
        })
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn elements(&self) -> &LightboxElements<N> {
        &self.elements
    }

    pub fn trigger_nodes(&self) -> impl Iterator<Item = &N> {
        self.triggers.iter().map(|t| &t.node)
    }

    pub fn open<H: Host<Node = N>>(&mut self, host: &mut H, gallery: &str, index: usize) -> Result<(), OpenError> {
        self.viewer.open(gallery, index)?;
        tracing::debug!(gallery, index, "lightbox open");
        self.render(host);
        host.focus(&self.elements.close);
        Ok(())
    }

    pub fn close<H: Host<Node = N>>(&mut self, host: &mut H) {
        if self.viewer.is_open() {
            tracing::debug!("lightbox close");
        }
        self.viewer.close();
        self.render(host);
    }

    /// Returns true when the click belonged to the lightbox.
    pub fn on_click<H: Host<Node = N>>(&mut self, host: &mut H, node: &N) -> bool {
        if let Some(trigger) = self.triggers.iter().find(|t| t.node == *node) {
            let (gallery, index) = (trigger.gallery.clone(), trigger.index);
            if let Err(err) = self.open(host, &gallery, index) {
                tracing::warn!(%err, "gallery member could not be opened");
            }
            return true;
        }
        let el = &self.elements;
        let control = if *node == el.close || *node == el.backdrop {
            Control::Close
        } else if *node == el.prev {
            Control::Prev
        } else if *node == el.next {
            Control::Next
        } else {
            return false;
        };
        match control {
            Control::Close => self.close(host),
            Control::Prev => {
                if self.viewer.prev() {
                    self.render(host);
                }
            }
            Control::Next => {
                if self.viewer.next() {
                    self.render(host);
                }
            }
        }
        true
    }

    pub fn on_key<H: Host<Node = N>>(&mut self, host: &mut H, key: &Key) {
        if self.viewer.handle_key(key) {
            self.render(host);
        }
    }

    pub fn on_touch_start(&mut self, x: f64) {
        self.viewer.touch_start(x);
    }

    pub fn on_touch_end<H: Host<Node = N>>(&mut self, host: &mut H, x: f64) {
        if self.viewer.touch_end(x) {
            self.render(host);
        }
    }

    pub fn render<H: Host<Node = N>>(&self, host: &mut H) {
        let view = self.viewer.view();
        let el = &self.elements;
        match view.item {
            Some(item) => {
                host.set_attribute(&el.image, "src", &item.src);
                host.set_attribute(&el.image, "alt", &item.alt);
                host.set_text(&el.caption, &item.alt);
                host.set_text(&el.counter, &view.counter);
            }
            None => host.set_attribute(&el.image, "src", ""),
        }
        let nav_display = if view.show_nav { "" } else { "none" };
        host.set_style(&el.prev, "display", nav_display);
        host.set_style(&el.next, "display", nav_display);
        host.set_class(&el.container, class::IS_OPEN, view.visible);
        host.set_style(
            &el.body,
            "overflow",
            if view.scroll_locked { "hidden" } else { "" },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{add_gallery, gallery_members, portfolio_document, viewer_with};
    use proptest::prelude::*;

    #[test]
    fn registry_places_members_at_declared_index() {
        let members = vec![
            GalleryMember {
                gallery: "a".into(),
                index: 2,
                item: MediaItem {
                    src: "c.jpg".into(),
                    alt: "C".into(),
                },
            },
            GalleryMember {
                gallery: "a".into(),
                index: 0,
                item: MediaItem {
                    src: "a.jpg".into(),
                    alt: "A".into(),
                },
            },
            GalleryMember {
                gallery: "a".into(),
                index: 1,
                item: MediaItem {
                    src: "b.jpg".into(),
                    alt: "B".into(),
                },
            },
        ];
        let registry = GalleryRegistry::build(members).unwrap();
        let srcs: Vec<_> = registry
            .gallery("a")
            .unwrap()
            .iter()
            .map(|i| i.src.as_str())
            .collect();
        assert_eq!(srcs, ["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn registry_rejects_gaps() {
        let mut members = gallery_members("a", 3);
        members.remove(1);
        assert_eq!(
            GalleryRegistry::build(members),
            Err(RegistryError::MissingIndex {
                gallery: "a".into(),
                index: 1
            })
        );
    }

    #[test]
    fn registry_rejects_gallery_not_starting_at_zero() {
        let mut members = gallery_members("a", 2);
        members.remove(0);
        assert!(matches!(
            GalleryRegistry::build(members),
            Err(RegistryError::MissingIndex { index: 0, .. })
        ));
    }

    #[test]
    fn registry_rejects_duplicate_index() {
        let mut members = gallery_members("a", 2);
        members.push(members[0].clone());
        assert_eq!(
            GalleryRegistry::build(members),
            Err(RegistryError::DuplicateIndex {
                gallery: "a".into(),
                index: 0
            })
        );
    }

    #[test]
    fn partial_build_keeps_consistent_galleries() {
        let mut members = gallery_members("good", 2);
        let mut gapped = gallery_members("gapped", 3);
        gapped.remove(1);
        members.extend(gapped);
        let (registry, rejected) = GalleryRegistry::build_partial(members);
        assert_eq!(registry.ids().collect::<Vec<_>>(), ["good"]);
        assert_eq!(
            rejected,
            [RegistryError::MissingIndex {
                gallery: "gapped".into(),
                index: 1
            }]
        );
    }

    #[test]
    fn broken_gallery_does_not_disable_the_others() {
        let mut doc = portfolio_document();
        let stray = add_gallery(&mut doc, "other", &["1"]);
        let unreadable = add_gallery(&mut doc, "loose", &["0", "first"]);
        let lightbox = Lightbox::bind(&doc, 40.0).unwrap();

        assert_eq!(lightbox.viewer().registry().ids().collect::<Vec<_>>(), ["harbour"]);
        assert_eq!(lightbox.trigger_nodes().count(), 3);
        assert!(!lightbox.trigger_nodes().any(|n| *n == stray[0] || unreadable.contains(n)));
    }

    #[test]
    fn single_item_gallery_hides_nav_controls() {
        let mut doc = portfolio_document();
        let solo = add_gallery(&mut doc, "solo", &["0"]);
        let mut lightbox = Lightbox::bind(&doc, 40.0).unwrap();
        assert!(lightbox.on_click(&mut doc, &solo[0]));

        let el = lightbox.elements().clone();
        assert_eq!(doc.style(el.prev, "display"), Some("none"));
        assert_eq!(doc.style(el.next, "display"), Some("none"));
        assert_eq!(doc.text(el.counter), "1 / 1");

        assert!(lightbox.on_click(&mut doc, &el.next));
        assert_eq!(doc.text(el.counter), "1 / 1");
        assert_eq!(doc.attr(el.image, "src"), Some("img/solo-0.jpg"));
    }

    #[test]
    fn counter_walks_and_wraps() {
        let mut viewer = viewer_with(&[("project-a", 3)]);
        viewer.open("project-a", 0).unwrap();
        assert_eq!(viewer.view().counter, "1 / 3");
        viewer.next();
        assert_eq!(viewer.view().counter, "2 / 3");
        viewer.next();
        assert_eq!(viewer.view().counter, "3 / 3");
        viewer.next();
        assert_eq!(viewer.view().counter, "1 / 3");
    }

    #[test]
    fn prev_from_first_wraps_to_last() {
        let mut viewer = viewer_with(&[("g", 4)]);
        viewer.open("g", 0).unwrap();
        viewer.prev();
        assert_eq!(viewer.session().unwrap().index, 3);
    }

    #[test]
    fn single_item_gallery_is_fixed_point_without_nav() {
        let mut viewer = viewer_with(&[("solo", 1)]);
        viewer.open("solo", 0).unwrap();
        assert!(!viewer.view().show_nav);
        viewer.next();
        viewer.prev();
        assert_eq!(viewer.session().unwrap().index, 0);
        assert_eq!(viewer.view().counter, "1 / 1");
    }

    #[test]
    fn open_rejects_invalid_targets_without_state_change() {
        let mut viewer = viewer_with(&[("g", 2)]);
        assert_eq!(
            viewer.open("nope", 0),
            Err(OpenError::UnknownGallery("nope".into()))
        );
        assert!(matches!(
            viewer.open("g", 2),
            Err(OpenError::IndexOutOfRange { len: 2, .. })
        ));
        assert!(!viewer.is_open());
    }

    #[test]
    fn open_retargets_an_open_session() {
        let mut viewer = viewer_with(&[("a", 2), ("b", 3)]);
        viewer.open("a", 1).unwrap();
        viewer.open("b", 2).unwrap();
        assert_eq!(
            viewer.session(),
            Some(&Session {
                gallery: "b".into(),
                index: 2
            })
        );
    }

    #[test]
    fn keys_are_ignored_while_closed() {
        let mut viewer = viewer_with(&[("g", 3)]);
        assert!(!viewer.handle_key(&Key::ArrowRight));
        assert!(!viewer.handle_key(&Key::Escape));
        assert!(viewer.session().is_none());
    }

    #[test]
    fn keys_navigate_and_escape_closes() {
        let mut viewer = viewer_with(&[("g", 3)]);
        viewer.open("g", 1).unwrap();
        viewer.handle_key(&Key::ArrowRight);
        assert_eq!(viewer.session().unwrap().index, 2);
        viewer.handle_key(&Key::ArrowLeft);
        viewer.handle_key(&Key::ArrowLeft);
        assert_eq!(viewer.session().unwrap().index, 0);
        assert!(viewer.handle_key(&Key::Escape));
        assert!(!viewer.is_open());
        assert!(!viewer.scroll_locked());
        assert_eq!(viewer.view().item, None);
    }

    #[test]
    fn swipe_threshold_is_exclusive() {
        let mut viewer = viewer_with(&[("g", 5)]);
        viewer.open("g", 2).unwrap();

        viewer.touch_start(200.0);
        assert!(!viewer.touch_end(160.0));
        viewer.touch_start(200.0);
        assert!(!viewer.touch_end(240.0));
        assert_eq!(viewer.session().unwrap().index, 2);

        viewer.touch_start(200.0);
        assert!(viewer.touch_end(159.0));
        assert_eq!(viewer.session().unwrap().index, 3);

        viewer.touch_start(200.0);
        assert!(viewer.touch_end(241.0));
        assert_eq!(viewer.session().unwrap().index, 2);
    }

    #[test]
    fn touch_end_without_start_is_ignored() {
        let mut viewer = viewer_with(&[("g", 3)]);
        viewer.open("g", 0).unwrap();
        viewer.touch_start(300.0);
        viewer.touch_end(300.0);
        // start point was reset by the previous touch end
        assert!(!viewer.touch_end(0.0));
        assert_eq!(viewer.session().unwrap().index, 0);
    }

    proptest! {
        #[test]
        fn next_len_times_is_identity(len in 2usize..12, start in 0usize..12) {
            let start = start % len;
            let mut viewer = viewer_with(&[("g", len)]);
            viewer.open("g", start).unwrap();
            for _ in 0..len {
                viewer.next();
            }
            prop_assert_eq!(viewer.session().unwrap().index, start);
            for _ in 0..len {
                viewer.prev();
            }
            prop_assert_eq!(viewer.session().unwrap().index, start);
        }

        #[test]
        fn index_stays_in_range(len in 1usize..8, ops in proptest::collection::vec(0u8..3, 0..64)) {
            let mut viewer = viewer_with(&[("g", len)]);
            viewer.open("g", 0).unwrap();
            for op in ops {
                match op {
                    0 => { viewer.next(); }
                    1 => { viewer.prev(); }
                    _ => { viewer.open("g", len - 1).unwrap(); }
                }
                let index = viewer.session().unwrap().index;
                prop_assert!(index < len);
            }
        }
    }
}

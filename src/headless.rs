//! Headless page driver.
//!
//! [`build_document`] lays out the same element tree [`crate::markup`]
//! renders as an in-memory [`Document`] with a simple stacked geometry, and
//! [`Headless`] drives a bound [`Page`] over it: user gestures go in,
//! deferred work (timers, transition ends, intersection batches) is pumped
//! back through [`Page::dispatch`] until the page is quiet again, and a
//! serializable [`Snapshot`] comes out.
//!
//! `lowkey replay` feeds it a [`Script`] of [`Step`]s:
//!
//! ```toml
//! [[steps]]
//! action = "open"
//! gallery = "harbour"
//! index = 0
//!
//! [[steps]]
//! action = "key"
//! key = "ArrowRight"
//!
//! [[steps]]
//! action = "scroll"
//! y = 1200.0
//! ```

use crate::accordion::Phase;
use crate::config::BehaviorConfig;
use crate::document::{Document, Element, NodeId};
use crate::host::Host;
use crate::navigation::NavState;
use crate::page::{Event, Outcome, Page};
use crate::site::{Block, Section, SectionKind, Site};
use crate::types::{Key, Rect, Viewport, class, ids};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

const NAV_HEIGHT: f64 = 56.0;
const HERO_HEIGHT: f64 = 320.0;
const HEADING_HEIGHT: f64 = 96.0;
const INTRO_HEIGHT: f64 = 64.0;
const HEADER_HEIGHT: f64 = 64.0;
const TEXT_HEIGHT: f64 = 120.0;
const CARD_HEIGHT: f64 = 200.0;
const THUMB_HEIGHT: f64 = 140.0;
const THUMBS_PER_ROW: usize = 4;
const VIDEO_HEIGHT: f64 = 360.0;
const GAP: f64 = 16.0;
const SECTION_PADDING: f64 = 64.0;
const FOOTER_HEIGHT: f64 = 120.0;
/// Upper bound on intersection rounds per settle; layouts here are static,
/// so a page is quiet after two.
const MAX_SETTLE_ROUNDS: usize = 8;

#[derive(Error, Debug)]
pub enum HeadlessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("no element with id {0:?}")]
    UnknownElement(String),
    #[error("no link with href {0:?}")]
    UnknownLink(String),
    #[error("no member {index} in gallery {gallery:?}")]
    UnknownMember { gallery: String, index: usize },
    #[error("no accordion block {0}")]
    UnknownBlock(usize),
}

// ============================================================================
// Document construction
// ============================================================================

/// Mirror the rendered page into a [`Document`].
pub fn build_document(site: &Site, viewport: Viewport) -> Document {
    let mut doc = Document::new(viewport);
    let width = viewport.width;
    let root = doc.root();

    build_nav(&mut doc, site, width);

    let main = doc.append(root, Element::new("main"));
    doc.append(
        main,
        Element::new("header")
            .id("top")
            .class("hero")
            .rect(Rect::new(NAV_HEIGHT, 0.0, width, HERO_HEIGHT)),
    );
    let mut y = NAV_HEIGHT + HERO_HEIGHT;
    for section in &site.sections {
        y = build_section(&mut doc, main, section, y, width);
    }

    let footer = doc.append(
        root,
        Element::new("footer")
            .class("site-footer")
            .rect(Rect::new(y, 0.0, width, FOOTER_HEIGHT)),
    );
    doc.append(footer, Element::new("span").id(ids::FOOTER_YEAR));
    build_lightbox(&mut doc, viewport);
    doc
}

fn build_nav(doc: &mut Document, site: &Site, width: f64) {
    let root = doc.root();
    let navbar = doc.append(
        root,
        Element::new("nav")
            .id(ids::NAVBAR)
            .class("navbar")
            .rect(Rect::new(0.0, 0.0, width, NAV_HEIGHT)),
    );
    doc.append(
        navbar,
        Element::new("a").class("brand").attr("href", "#top"),
    );
    doc.append(
        navbar,
        Element::new("button")
            .id(ids::HAMBURGER)
            .class("hamburger")
            .attr("aria-expanded", "false"),
    );
    let list = doc.append(navbar, Element::new("ul").id(ids::NAV_LINKS).class("nav-links"));
    for entry in &site.nav {
        if entry.children.is_empty() {
            let li = doc.append(list, Element::new("li"));
            doc.append(
                li,
                Element::new("a")
                    .class(class::NAV_LINK)
                    .attr("href", &entry.href)
                    .text(&entry.label),
            );
            continue;
        }
        let li = doc.append(list, Element::new("li").class(class::HAS_DROPDOWN));
        doc.append(
            li,
            Element::new("a")
                .class(class::NAV_LINK)
                .class(class::NAV_LINK_DROPDOWN)
                .attr("href", &entry.href)
                .text(&entry.label),
        );
        let menu = doc.append(li, Element::new("ul").class(class::NAV_DROPDOWN));
        for child in &entry.children {
            let item = doc.append(menu, Element::new("li"));
            doc.append(
                item,
                Element::new("a")
                    .attr("href", &child.href)
                    .text(&child.label),
            );
        }
    }
}

/// Append one section starting at `top`; returns the y after it.
fn build_section(doc: &mut Document, main: NodeId, section: &Section, top: f64, width: f64) -> f64 {
    let node = doc.append(main, Element::new("section").id(&section.id).class("section"));
    let mut y = top + HEADING_HEIGHT;
    if section.intro.is_some() {
        y += INTRO_HEIGHT;
    }

    let (wrapper_class, block_class) = match section.kind {
        SectionKind::Projects => ("projects", class::ACCORDION_BLOCK),
        SectionKind::About => (class::ABOUT_GRID, "about-col"),
        SectionKind::Skills => ("skills", class::SKILLS_GROUP),
        SectionKind::Contact => ("contact-cards", class::CONTACT_CARD),
    };
    let wrapper_top = y;
    let wrapper = doc.append(node, Element::new("div").class(wrapper_class));
    for block in &section.blocks {
        y = match section.kind {
            SectionKind::Projects => build_accordion_block(doc, wrapper, block, y, width),
            _ => build_card(doc, wrapper, block_class, block, y, width),
        };
    }
    doc.set_rect(wrapper, Rect::new(wrapper_top, 0.0, width, y - wrapper_top));
    let bottom = y + SECTION_PADDING;
    doc.set_rect(node, Rect::new(top, 0.0, width, bottom - top));
    bottom
}

fn media_height(block: &Block) -> f64 {
    let thumbs = block.gallery.as_ref().map_or(0.0, |g| {
        g.images.len().div_ceil(THUMBS_PER_ROW) as f64 * THUMB_HEIGHT
    });
    let video = if block.video.is_some() { VIDEO_HEIGHT } else { 0.0 };
    thumbs + video
}

fn build_accordion_block(doc: &mut Document, parent: NodeId, block: &Block, top: f64, width: f64) -> f64 {
    let natural = TEXT_HEIGHT + media_height(block);
    let height = HEADER_HEIGHT + if block.open { natural } else { 0.0 };
    let node = doc.append(
        parent,
        Element::new("div")
            .class(class::ACCORDION_BLOCK)
            .rect(Rect::new(top, 0.0, width, height)),
    );
    doc.append(
        node,
        Element::new("button")
            .class(class::ACCORDION_HEADER)
            .attr("aria-expanded", if block.open { "true" } else { "false" })
            .text(&block.title)
            .rect(Rect::new(top, 0.0, width, HEADER_HEIGHT)),
    );
    let body_top = top + HEADER_HEIGHT;
    let body = doc.append(
        node,
        Element::new("div")
            .class(class::ACCORDION_BODY)
            .rect(Rect::new(body_top, 0.0, width, height - HEADER_HEIGHT))
            .scroll_height(natural),
    );
    build_media(doc, body, block, body_top + TEXT_HEIGHT, width);
    top + height + GAP
}

fn build_card(
    doc: &mut Document,
    parent: NodeId,
    block_class: &str,
    block: &Block,
    top: f64,
    width: f64,
) -> f64 {
    let height = CARD_HEIGHT + media_height(block);
    let node = doc.append(
        parent,
        Element::new("div")
            .class(block_class)
            .rect(Rect::new(top, 0.0, width, height)),
    );
    doc.append(node, Element::new("h3").text(&block.title));
    build_media(doc, node, block, top + CARD_HEIGHT, width);
    top + height + GAP
}

fn build_media(doc: &mut Document, parent: NodeId, block: &Block, top: f64, width: f64) {
    let mut y = top;
    if let Some(gallery) = &block.gallery {
        let list = doc.append(parent, Element::new("div").class("gallery"));
        let thumb_width = width / THUMBS_PER_ROW as f64;
        for (index, image) in gallery.images.iter().enumerate() {
            let row = (index / THUMBS_PER_ROW) as f64;
            let col = (index % THUMBS_PER_ROW) as f64;
            let item = doc.append(
                list,
                Element::new("figure")
                    .class(class::GALLERY_ITEM)
                    .attr("data-gallery", &gallery.id)
                    .attr("data-index", &index.to_string())
                    .rect(Rect::new(y + row * THUMB_HEIGHT, col * thumb_width, thumb_width, THUMB_HEIGHT)),
            );
            doc.append(
                item,
                Element::new("img")
                    .attr("src", &image.src)
                    .attr("alt", &image.alt),
            );
        }
        y += gallery.images.len().div_ceil(THUMBS_PER_ROW) as f64 * THUMB_HEIGHT;
    }
    if let Some(video) = &block.video {
        let slot = doc.append(parent, Element::new("div").class(class::MEDIA_SLOT));
        doc.append(
            slot,
            Element::new("video")
                .attr("src", video)
                .rect(Rect::new(y, 0.0, width, VIDEO_HEIGHT)),
        );
    }
}

fn build_lightbox(doc: &mut Document, viewport: Viewport) {
    let root = doc.root();
    let lightbox = doc.append(
        root,
        Element::new("div")
            .id(ids::LIGHTBOX)
            .class("lightbox")
            .rect(Rect::new(0.0, 0.0, viewport.width, viewport.height)),
    );
    doc.append(lightbox, Element::new("div").id(ids::LIGHTBOX_BACKDROP));
    for id in [ids::LIGHTBOX_CLOSE, ids::LIGHTBOX_PREV] {
        doc.append(lightbox, Element::new("button").id(id));
    }
    let figure = doc.append(lightbox, Element::new("figure"));
    doc.append(figure, Element::new("img").id(ids::LIGHTBOX_IMG));
    doc.append(figure, Element::new("span").id(ids::LIGHTBOX_CAPTION));
    doc.append(figure, Element::new("span").id(ids::LIGHTBOX_COUNTER));
    doc.append(lightbox, Element::new("button").id(ids::LIGHTBOX_NEXT));
}

// ============================================================================
// Scripts
// ============================================================================

/// One scripted interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Click the element with this id.
    Click { id: String },
    /// Click the first link with this href.
    Link { href: String },
    /// Click a gallery member.
    Open { gallery: String, index: usize },
    /// Click the header of the n-th accordion block.
    Toggle { block: usize },
    /// Press a key, named as in `KeyboardEvent.key`.
    Key { key: String },
    /// Touch the lightbox at `from` and release at `to` (x coordinates).
    Swipe { from: f64, to: f64 },
    Scroll { y: f64 },
    /// Let time pass; running animations complete.
    Wait { ms: u64 },
    Resize { width: f64, height: f64 },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<Step>,
}

pub fn parse_script(content: &str) -> Result<Script, HeadlessError> {
    Ok(toml::from_str(content)?)
}

pub fn load_script(path: &Path) -> Result<Script, HeadlessError> {
    parse_script(&fs::read_to_string(path)?)
}

// ============================================================================
// Snapshots
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccordionSnapshot {
    pub title: String,
    pub open: bool,
    pub phase: Phase,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightboxSnapshot {
    pub open: bool,
    pub gallery: Option<String>,
    pub index: Option<usize>,
    pub src: Option<String>,
    pub caption: String,
    pub counter: String,
    pub scroll_locked: bool,
}

/// Observable page state after a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub clock_ms: u64,
    pub scroll_y: f64,
    pub viewport: Viewport,
    pub navigation: Option<NavState>,
    pub accordion: Vec<AccordionSnapshot>,
    pub lightbox: Option<LightboxSnapshot>,
    pub revealed: usize,
    pub reveal_candidates: usize,
    pub videos_playing: usize,
    pub footer_year: Option<String>,
    pub focused: Option<String>,
}

// ============================================================================
// Driver
// ============================================================================

pub struct Headless {
    doc: Document,
    page: Page<NodeId>,
    last_scroll: f64,
}

impl Headless {
    /// Build, bind and settle the initial page.
    pub fn new(site: &Site, config: &BehaviorConfig, viewport: Viewport) -> Self {
        Self::from_document(build_document(site, viewport), config)
    }

    pub fn from_document(mut doc: Document, config: &BehaviorConfig) -> Self {
        let page = Page::bind(&mut doc, config);
        let last_scroll = doc.scroll_position();
        let mut headless = Self {
            doc,
            page,
            last_scroll,
        };
        headless.settle();
        headless
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn page(&self) -> &Page<NodeId> {
        &self.page
    }

    pub fn dispatch(&mut self, event: Event<NodeId>) -> Outcome {
        let outcome = self.page.dispatch(&mut self.doc, event);
        self.settle();
        outcome
    }

    pub fn click(&mut self, node: NodeId) -> Outcome {
        self.dispatch(Event::Click(node))
    }

    pub fn click_id(&mut self, id: &str) -> Result<Outcome, HeadlessError> {
        let node = self
            .doc
            .find_id(id)
            .ok_or_else(|| HeadlessError::UnknownElement(id.to_string()))?;
        Ok(self.click(node))
    }

    pub fn click_link(&mut self, href: &str) -> Result<Outcome, HeadlessError> {
        let node = self
            .doc
            .by_tag("a")
            .into_iter()
            .find(|a| self.doc.attr(*a, "href") == Some(href))
            .ok_or_else(|| HeadlessError::UnknownLink(href.to_string()))?;
        Ok(self.click(node))
    }

    pub fn open(&mut self, gallery: &str, index: usize) -> Result<Outcome, HeadlessError> {
        let wanted = index.to_string();
        let node = self
            .doc
            .by_class(class::GALLERY_ITEM)
            .into_iter()
            .find(|n| {
                self.doc.attr(*n, "data-gallery") == Some(gallery)
                    && self.doc.attr(*n, "data-index") == Some(wanted.as_str())
            })
            .ok_or_else(|| HeadlessError::UnknownMember {
                gallery: gallery.to_string(),
                index,
            })?;
        Ok(self.click(node))
    }

    pub fn toggle(&mut self, block: usize) -> Result<Outcome, HeadlessError> {
        let header = self
            .page
            .accordion()
            .blocks()
            .get(block)
            .map(|b| b.header)
            .ok_or(HeadlessError::UnknownBlock(block))?;
        Ok(self.click(header))
    }

    pub fn key(&mut self, key: Key) {
        self.dispatch(Event::KeyDown(key));
    }

    pub fn swipe(&mut self, from: f64, to: f64) {
        self.dispatch(Event::TouchStart { x: from });
        self.dispatch(Event::TouchEnd { x: to });
    }

    /// Jump to `y` the way a user scrolling would.
    pub fn scroll_to(&mut self, y: f64) {
        self.doc.set_scroll(y);
        self.settle();
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.doc.set_viewport(viewport);
        self.settle();
    }

    /// Move the clock, firing due timers in order.
    pub fn advance(&mut self, ms: u64) {
        for task in self.doc.advance(ms) {
            self.page.dispatch(&mut self.doc, Event::Deferred(task));
        }
        self.settle();
    }

    /// Complete every running transition.
    pub fn finish_transitions(&mut self) {
        loop {
            let ends = self.doc.take_transition_ends();
            if ends.is_empty() {
                break;
            }
            for node in ends {
                self.page.dispatch(&mut self.doc, Event::TransitionEnd(node));
            }
        }
        self.settle();
    }

    /// Deliver scroll and intersection consequences of the last change.
    fn settle(&mut self) {
        for _ in 0..MAX_SETTLE_ROUNDS {
            let mut quiet = true;
            let y = self.doc.scroll_position();
            if y != self.last_scroll {
                self.last_scroll = y;
                self.page.dispatch(&mut self.doc, Event::Scroll);
                quiet = false;
            }
            for (channel, entries) in self.doc.take_intersections() {
                self.page
                    .dispatch(&mut self.doc, Event::Intersections { channel, entries });
                quiet = false;
            }
            if quiet {
                return;
            }
        }
        tracing::debug!("page still busy after settling");
    }

    pub fn run(&mut self, step: &Step) -> Result<(), HeadlessError> {
        tracing::debug!(?step, "replay step");
        match step {
            Step::Click { id } => {
                self.click_id(id)?;
            }
            Step::Link { href } => {
                self.click_link(href)?;
            }
            Step::Open { gallery, index } => {
                self.open(gallery, *index)?;
            }
            Step::Toggle { block } => {
                self.toggle(*block)?;
            }
            Step::Key { key } => self.key(Key::from_name(key)),
            Step::Swipe { from, to } => self.swipe(*from, *to),
            Step::Scroll { y } => self.scroll_to(*y),
            Step::Wait { ms } => {
                self.advance(*ms);
                self.finish_transitions();
            }
            Step::Resize { width, height } => self.resize(Viewport::new(*width, *height)),
        }
        Ok(())
    }

    /// Run every step, taking a snapshot after each one.
    pub fn replay(&mut self, script: &Script) -> Result<Vec<(Step, Snapshot)>, HeadlessError> {
        script
            .steps
            .iter()
            .map(|step| {
                self.run(step)?;
                Ok((step.clone(), self.snapshot()))
            })
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        let doc = &self.doc;
        let accordion = self
            .page
            .accordion()
            .blocks()
            .iter()
            .map(|b| AccordionSnapshot {
                title: doc.text(b.header).to_string(),
                open: b.is_open(),
                phase: b.phase(),
            })
            .collect();
        let lightbox = self.page.lightbox().map(|lightbox| {
            let viewer = lightbox.viewer();
            let el = lightbox.elements();
            LightboxSnapshot {
                open: viewer.is_open(),
                gallery: viewer.session().map(|s| s.gallery.clone()),
                index: viewer.session().map(|s| s.index),
                src: doc.attr(el.image, "src").filter(|s| !s.is_empty()).map(str::to_string),
                caption: doc.text(el.caption).to_string(),
                counter: doc.text(el.counter).to_string(),
                scroll_locked: doc.style(el.body, "overflow") == Some("hidden"),
            }
        });
        Snapshot {
            clock_ms: doc.clock(),
            scroll_y: doc.scroll_position(),
            viewport: doc.viewport(),
            navigation: self.page.navigation().map(|n| n.state().clone()),
            accordion,
            lightbox,
            revealed: self.page.reveal().revealed_count(),
            reveal_candidates: self.page.reveal().len(),
            videos_playing: self
                .page
                .media()
                .videos()
                .iter()
                .filter(|v| doc.playback(**v).playing)
                .count(),
            footer_year: doc.find_id(ids::FOOTER_YEAR).map(|n| doc.text(n).to_string()),
            focused: doc.focused().and_then(|n| doc.id_of(n)).map(str::to_string),
        }
    }
}

//! In-memory page used as the native [`Host`].
//!
//! `Document` is a small element arena: tags, ids, classes, attributes,
//! inline styles, text and a page-coordinate rectangle per element, plus
//! the window-level state the controllers touch (scroll offset, viewport,
//! focus, media playback). It records the deferred work a browser would do
//! later instead of doing it:
//!
//! - timers go on a virtual clock and fire from [`Document::advance`];
//! - awaited transition ends queue up until [`Document::take_transition_ends`];
//! - observed targets are re-evaluated by [`Document::take_intersections`]
//!   using the portable [`ViewportObserver`].
//!
//! Whoever drives the document (tests, [`crate::headless::Headless`]) turns
//! those into [`crate::page::Event`]s.

use crate::host::{Channel, Deferred, Host, PlaybackRejected, ScrollBehavior};
use crate::observe::{Intersection, ObserverOptions, ViewportObserver};
use crate::types::{Rect, Viewport};
use chrono::Datelike;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(usize);

/// Element builder for [`Document::append`].
#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    text: String,
    rect: Rect,
    scroll_height: Option<f64>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    /// Natural content height; defaults to the rect height.
    pub fn scroll_height(mut self, height: f64) -> Self {
        self.scroll_height = Some(height);
        self
    }
}

/// Playback flags of a media element.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Playback {
    pub muted: bool,
    pub looped: bool,
    pub inline: bool,
    pub playing: bool,
    pub rejected: u32,
}

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    classes: BTreeSet<String>,
    attrs: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    text: String,
    rect: Rect,
    scroll_height: f64,
    playback: Playback,
}

#[derive(Debug, Clone)]
struct Timer {
    due: u64,
    seq: u64,
    task: Deferred<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    viewport: Viewport,
    scroll_y: f64,
    year: i32,
    focused: Option<NodeId>,
    autoplay_blocked: bool,
    clock_ms: u64,
    timer_seq: u64,
    timers: Vec<Timer>,
    transitions: Vec<NodeId>,
    observers: BTreeMap<Channel, ViewportObserver<NodeId>>,
    scroll_requests: Vec<(f64, ScrollBehavior)>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl Document {
    /// Empty document with a `<body>` root, stamped with the current year.
    pub fn new(viewport: Viewport) -> Self {
        let body = NodeData {
            tag: "body".to_string(),
            parent: None,
            children: Vec::new(),
            classes: BTreeSet::new(),
            attrs: BTreeMap::new(),
            style: BTreeMap::new(),
            text: String::new(),
            rect: Rect::new(0.0, 0.0, viewport.width, viewport.height),
            scroll_height: viewport.height,
            playback: Playback::default(),
        };
        Self {
            nodes: vec![body],
            viewport,
            scroll_y: 0.0,
            year: chrono::Local::now().year(),
            focused: None,
            autoplay_blocked: false,
            clock_ms: 0,
            timer_seq: 0,
            timers: Vec::new(),
            transitions: Vec::new(),
            observers: BTreeMap::new(),
            scroll_requests: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn append(&mut self, parent: NodeId, element: Element) -> NodeId {
        let id = NodeId(self.nodes.len());
        let scroll_height = element.scroll_height.unwrap_or(element.rect.height);
        self.nodes.push(NodeData {
            tag: element.tag,
            parent: Some(parent),
            children: Vec::new(),
            classes: element.classes.into_iter().collect(),
            attrs: element.attrs.into_iter().collect(),
            style: BTreeMap::new(),
            text: element.text,
            rect: element.rect,
            scroll_height,
            playback: Playback::default(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    /// Pre-order walk below `from` (document order).
    fn walk(&self, from: NodeId, include_self: bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id != from || include_self {
                out.push(id);
            }
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        out
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.node(id).tag
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).attrs.get(name).map(String::as_str)
    }

    pub fn style(&self, id: NodeId, property: &str) -> Option<&str> {
        self.node(id).style.get(property).map(String::as_str)
    }

    pub fn text(&self, id: NodeId) -> &str {
        &self.node(id).text
    }

    pub fn classed(&self, id: NodeId, class: &str) -> bool {
        self.node(id).classes.contains(class)
    }

    pub fn playback(&self, id: NodeId) -> &Playback {
        &self.node(id).playback
    }

    pub fn id_of(&self, id: NodeId) -> Option<&str> {
        self.attr(id, "id")
    }

    pub fn find_id(&self, id: &str) -> Option<NodeId> {
        self.walk(self.root(), true)
            .into_iter()
            .find(|n| self.attr(*n, "id") == Some(id))
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn scroll_position(&self) -> f64 {
        self.scroll_y
    }

    /// Jump without animation, as a user dragging the scrollbar would.
    pub fn set_scroll(&mut self, y: f64) {
        self.scroll_y = y.max(0.0);
    }

    pub fn scroll_requests(&self) -> &[(f64, ScrollBehavior)] {
        &self.scroll_requests
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_year(&mut self, year: i32) {
        self.year = year;
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) {
        self.node_mut(id).rect = rect;
    }

    pub fn set_autoplay_blocked(&mut self, blocked: bool) {
        self.autoplay_blocked = blocked;
    }

    pub fn clock(&self) -> u64 {
        self.clock_ms
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn observer(&self, channel: Channel) -> Option<&ViewportObserver<NodeId>> {
        self.observers.get(&channel)
    }

    /// Move the virtual clock forward and return the timers that came due,
    /// earliest first (ties in scheduling order).
    pub fn advance(&mut self, ms: u64) -> Vec<Deferred<NodeId>> {
        self.clock_ms += ms;
        let now = self.clock_ms;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.timers.drain(..).partition(|t| t.due <= now);
        self.timers = pending;
        due.sort_by_key(|t| (t.due, t.seq));
        due.into_iter().map(|t| t.task).collect()
    }

    pub fn take_transition_ends(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.transitions)
    }

    /// Re-evaluate every observer against the current scroll position and
    /// return the non-empty batches.
    pub fn take_intersections(&mut self) -> Vec<(Channel, Vec<Intersection<NodeId>>)> {
        let nodes = &self.nodes;
        let scroll_y = self.scroll_y;
        let viewport = self.viewport;
        self.observers
            .iter_mut()
            .map(|(channel, observer)| {
                let entries = observer.poll(viewport, |n| nodes[n.0].rect.shifted(scroll_y));
                (*channel, entries)
            })
            .filter(|(_, entries)| !entries.is_empty())
            .collect()
    }
}

impl Host for Document {
    type Node = NodeId;

    fn by_id(&self, id: &str) -> Option<NodeId> {
        self.find_id(id)
    }

    fn by_class(&self, class: &str) -> Vec<NodeId> {
        self.walk(self.root(), true)
            .into_iter()
            .filter(|n| self.classed(*n, class))
            .collect()
    }

    fn select_classes(&self, classes: &[&str]) -> Vec<NodeId> {
        self.walk(self.root(), true)
            .into_iter()
            .filter(|n| classes.iter().any(|c| self.classed(*n, c)))
            .collect()
    }

    fn by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.walk(self.root(), true)
            .into_iter()
            .filter(|n| self.tag(*n) == tag)
            .collect()
    }

    fn descendants_by_class(&self, scope: &NodeId, class: &str) -> Vec<NodeId> {
        self.walk(*scope, false)
            .into_iter()
            .filter(|n| self.classed(*n, class))
            .collect()
    }

    fn descendants_by_tag(&self, scope: &NodeId, tag: &str) -> Vec<NodeId> {
        self.walk(*scope, false)
            .into_iter()
            .filter(|n| self.tag(*n) == tag)
            .collect()
    }

    fn closest_class(&self, node: &NodeId, class: &str) -> Option<NodeId> {
        let mut current = Some(*node);
        while let Some(id) = current {
            if self.classed(id, class) {
                return Some(id);
            }
            current = self.node(id).parent;
        }
        None
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.root())
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.attr(*node, name).map(str::to_string)
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.classed(*node, class)
    }

    fn scroll_height(&self, node: &NodeId) -> f64 {
        self.node(*node).scroll_height
    }

    fn bounding_rect(&self, node: &NodeId) -> Rect {
        self.node(*node).rect.shifted(self.scroll_y)
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn current_year(&self) -> i32 {
        self.year
    }

    fn set_class(&mut self, node: &NodeId, class: &str, on: bool) {
        let classes = &mut self.node_mut(*node).classes;
        if on {
            classes.insert(class.to_string());
        } else {
            classes.remove(class);
        }
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        self.node_mut(*node)
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    fn set_style(&mut self, node: &NodeId, property: &str, value: &str) {
        let style = &mut self.node_mut(*node).style;
        if value.is_empty() {
            style.remove(property);
        } else {
            style.insert(property.to_string(), value.to_string());
        }
    }

    fn set_text(&mut self, node: &NodeId, text: &str) {
        self.node_mut(*node).text = text.to_string();
    }

    fn focus(&mut self, node: &NodeId) {
        self.focused = Some(*node);
    }

    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior) {
        self.scroll_requests.push((top, behavior));
        self.set_scroll(top);
    }

    fn reflow(&mut self, _node: &NodeId) {}

    fn prepare_inline_video(&mut self, node: &NodeId) {
        let data = self.node_mut(*node);
        data.playback.muted = true;
        data.playback.looped = true;
        data.playback.inline = true;
        for attr in ["muted", "loop", "playsinline"] {
            data.attrs.insert(attr.to_string(), String::new());
        }
    }

    fn play(&mut self, node: &NodeId) -> Result<(), PlaybackRejected> {
        let blocked = self.autoplay_blocked;
        let playback = &mut self.node_mut(*node).playback;
        if blocked {
            playback.rejected += 1;
            return Err(PlaybackRejected("autoplay blocked".to_string()));
        }
        playback.playing = true;
        Ok(())
    }

    fn pause(&mut self, node: &NodeId) {
        self.node_mut(*node).playback.playing = false;
    }

    fn observe(&mut self, channel: Channel, options: &ObserverOptions, node: &NodeId) {
        self.observers
            .entry(channel)
            .or_insert_with(|| ViewportObserver::new(options.clone()))
            .observe(*node);
    }

    fn unobserve(&mut self, channel: Channel, node: &NodeId) {
        if let Some(observer) = self.observers.get_mut(&channel) {
            observer.unobserve(node);
        }
    }

    fn schedule(&mut self, delay_ms: u32, task: Deferred<NodeId>) {
        self.timer_seq += 1;
        self.timers.push(Timer {
            due: self.clock_ms + u64::from(delay_ms),
            seq: self.timer_seq,
            task,
        });
    }

    fn await_transition_end(&mut self, node: &NodeId) {
        self.transitions.push(*node);
    }
}

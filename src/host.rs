//! The host abstraction every controller is written against.
//!
//! A [`Host`] is the page as seen from the behavior layer: element lookup,
//! class/attribute/style writes, geometry reads, media playback and the
//! three kinds of deferred completion the controllers wait on (viewport
//! intersections, timers, transition ends). Completions never call back
//! into a controller directly; the host turns them into
//! [`crate::page::Event`]s and hands them to the composition root.
//!
//! Two hosts exist: [`crate::document::Document`] (in-memory, native) and
//! `web::WebHost` (browser DOM, wasm32 with the `web` feature).

use crate::lightbox::RegistryError;
use crate::observe::ObserverOptions;
use crate::types::{Rect, Viewport};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Groups observed targets so each controller gets its own observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Page sections tracked by the navigation controller.
    Sections,
    /// Reveal candidates.
    Reveal,
    /// Videos inside media slots.
    MediaSlots,
}

/// Fire-once timer payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum Deferred<N> {
    /// Mark a reveal candidate as revealed.
    Reveal(N),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

/// The platform refused to start playback (e.g. blocked autoplay).
#[derive(Debug, Clone, Error, PartialEq)]
#[error("media playback rejected: {0}")]
pub struct PlaybackRejected(pub String);

#[derive(Error, Debug)]
pub enum BindError {
    #[error("required element #{0} not found")]
    MissingElement(String),
    #[error("gallery {gallery:?} member has invalid index {value:?}")]
    InvalidIndex { gallery: String, value: String },
    #[error("gallery {gallery:?} member {index} has no image")]
    MissingMedia { gallery: String, index: usize },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

pub trait Host {
    type Node: Clone + PartialEq + fmt::Debug;

    fn by_id(&self, id: &str) -> Option<Self::Node>;
    fn by_class(&self, class: &str) -> Vec<Self::Node>;
    /// Elements carrying any of `classes`, in document order.
    fn select_classes(&self, classes: &[&str]) -> Vec<Self::Node>;
    fn by_tag(&self, tag: &str) -> Vec<Self::Node>;
    fn descendants_by_class(&self, scope: &Self::Node, class: &str) -> Vec<Self::Node>;
    fn descendants_by_tag(&self, scope: &Self::Node, tag: &str) -> Vec<Self::Node>;
    /// Nearest inclusive ancestor carrying `class`.
    fn closest_class(&self, node: &Self::Node, class: &str) -> Option<Self::Node>;
    fn body(&self) -> Option<Self::Node>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;
    /// Natural content height, independent of any `max-height` clamp.
    fn scroll_height(&self, node: &Self::Node) -> f64;
    /// Viewport-relative rectangle.
    fn bounding_rect(&self, node: &Self::Node) -> Rect;
    fn scroll_y(&self) -> f64;
    fn viewport(&self) -> Viewport;
    fn current_year(&self) -> i32;

    fn set_class(&mut self, node: &Self::Node, class: &str, on: bool);
    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);
    /// Sets an inline style property; an empty value removes it.
    fn set_style(&mut self, node: &Self::Node, property: &str, value: &str);
    fn set_text(&mut self, node: &Self::Node, text: &str);
    fn focus(&mut self, node: &Self::Node);
    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior);
    /// Flush pending style changes so the next write starts a transition.
    fn reflow(&mut self, node: &Self::Node);

    fn prepare_inline_video(&mut self, node: &Self::Node);
    fn play(&mut self, node: &Self::Node) -> Result<(), PlaybackRejected>;
    fn pause(&mut self, node: &Self::Node);

    fn observe(&mut self, channel: Channel, options: &ObserverOptions, node: &Self::Node);
    fn unobserve(&mut self, channel: Channel, node: &Self::Node);
    fn schedule(&mut self, delay_ms: u32, task: Deferred<Self::Node>);
    fn await_transition_end(&mut self, node: &Self::Node);

    fn require_id(&self, id: &str) -> Result<Self::Node, BindError> {
        self.by_id(id)
            .ok_or_else(|| BindError::MissingElement(id.to_string()))
    }
}

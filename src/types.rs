//! Shared types used by every controller and both hosts.
//!
//! The element ids and class names below are the contract between the
//! rendered markup ([`crate::markup`]), the headless document
//! ([`crate::headless`]) and the controllers that bind to them.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle. Hosts report element rects relative to the
/// viewport; the headless document stores them in page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Same rect moved up by `dy` (page → viewport coordinates).
    pub fn shifted(&self, dy: f64) -> Self {
        Self {
            top: self.top - dy,
            ..*self
        }
    }
}

/// Visible window size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

/// Keys the page reacts to. Everything else collapses into `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Other(String),
}

impl Key {
    /// Map a `KeyboardEvent.key` value.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Key::Escape,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            other => Key::Other(other.to_string()),
        }
    }
}

/// Element ids the controllers look up.
pub mod ids {
    pub const NAVBAR: &str = "navbar";
    pub const HAMBURGER: &str = "hamburger";
    pub const NAV_LINKS: &str = "navLinks";
    pub const LIGHTBOX: &str = "lightbox";
    pub const LIGHTBOX_BACKDROP: &str = "lightboxBackdrop";
    pub const LIGHTBOX_IMG: &str = "lightboxImg";
    pub const LIGHTBOX_CLOSE: &str = "lightboxClose";
    pub const LIGHTBOX_PREV: &str = "lightboxPrev";
    pub const LIGHTBOX_NEXT: &str = "lightboxNext";
    pub const LIGHTBOX_CAPTION: &str = "lightboxCaption";
    pub const LIGHTBOX_COUNTER: &str = "lightboxCounter";
    pub const FOOTER_YEAR: &str = "footerYear";
    pub const CONFIG_SCRIPT: &str = "lowkey-config";
}

/// Class names read or written by the controllers.
pub mod class {
    pub const SCROLLED: &str = "scrolled";
    pub const OPEN: &str = "open";
    pub const IS_OPEN: &str = "is-open";
    pub const MOBILE_OPEN: &str = "mobile-open";
    pub const ACTIVE: &str = "active";
    pub const NAV_LINK: &str = "nav-link";
    pub const NAV_LINK_DROPDOWN: &str = "nav-link--dropdown";
    pub const HAS_DROPDOWN: &str = "has-dropdown";
    pub const NAV_DROPDOWN: &str = "nav-dropdown";
    pub const ACCORDION_BLOCK: &str = "accordion-block";
    pub const ACCORDION_HEADER: &str = "accordion-header";
    pub const ACCORDION_BODY: &str = "accordion-body";
    pub const GALLERY_ITEM: &str = "gallery-item";
    pub const MEDIA_SLOT: &str = "media-slot";
    pub const REVEAL: &str = "reveal";
    pub const REVEALED: &str = "revealed";
    pub const ABOUT_GRID: &str = "about-grid";
    pub const SKILLS_GROUP: &str = "skills-group";
    pub const CONTACT_CARD: &str = "contact-card";
}

//! # Lowkey Folio
//!
//! The interactive behavior of a single-page portfolio: a navbar that
//! reacts to scrolling and collapses into a hamburger panel on small
//! screens, collapsible project blocks, a gallery lightbox with keyboard
//! and swipe navigation, staggered entrance animations, and clips that only
//! play while on screen. Around it sit a page renderer and a headless
//! harness so the same behavior can be checked without a browser.
//!
//! # Architecture: Controllers Over a Host
//!
//! Every controller is written against the [`host::Host`] trait rather than
//! a concrete DOM:
//!
//! ```text
//!             ┌──────────────── page::Page ────────────────┐
//!  Event ───▶ │ navigation  accordion  lightbox  reveal ... │ ───▶ Host writes
//!             └─────────────────────────────────────────────┘
//!                  ▲                                   │
//!                  └── Intersections / Deferred / ◀────┘
//!                      TransitionEnd (host callbacks)
//! ```
//!
//! Two hosts implement it:
//!
//! - [`document::Document`]: an in-memory element arena with a virtual
//!   clock, used by the tests and by [`headless`];
//! - `web::WebHost`: the browser DOM through `web-sys`, compiled for
//!   `wasm32` with the `web` feature.
//!
//! Controllers never block and never hold callbacks. Anything that
//! completes later (a viewport intersection, a stagger timer, the end of a
//! height transition) is requested from the host and comes back as a
//! [`page::Event`] through [`page::Page::dispatch`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`host`] | The `Host` trait, observer channels, deferred tasks, bind errors |
//! | [`observe`] | Root margins, visibility rule, portable polling observer |
//! | [`lightbox`] | Gallery registry, viewer state machine and modal binding |
//! | [`accordion`] | Independently collapsible blocks with animated height |
//! | [`navigation`] | Scrolled navbar, hamburger panel, submenus, active section |
//! | [`reveal`] | One-shot staggered entrance animations |
//! | [`media`] | Play/pause of slot videos by visibility |
//! | [`utilities`] | Footer year and offset smooth scrolling |
//! | [`page`] | Composition root: binding, listeners, event dispatch |
//! | [`document`] | In-memory host |
//! | [`config`] | `behavior.toml` loading, merging, validation, CSS variables |
//! | [`site`] | TOML content model and validation |
//! | [`markup`] | Page rendering with Maud |
//! | [`headless`] | Document layout, page driver, replay scripts, snapshots |
//! | [`output`] | CLI output formatting |
//! | [`types`] | Geometry, keys, element ids and class names |
//!
//! # Design Decisions
//!
//! ## State First, DOM Second
//!
//! Each controller keeps its whole state in a plain struct and re-renders
//! it onto the elements after every mutation. The hamburger's
//! `aria-expanded`, the accordion's `is-open` and the lightbox counter are
//! always derived from that state, never toggled independently, so they
//! cannot drift apart.
//!
//! ## One Visibility Rule
//!
//! Both hosts decide visibility the same way ([`observe::is_visible`]): a
//! positive threshold needs that fraction of the target inside the root,
//! a zero threshold needs any overlap. The in-memory host computes the
//! ratio itself; the browser host takes it from `IntersectionObserver`.
//!
//! ## Config Travels With the Page
//!
//! `lowkey render` embeds the resolved [`config::BehaviorConfig`] as JSON,
//! and the browser build reads it back on start, so thresholds and
//! durations tuned in `behavior.toml` apply without rebuilding the wasm.

pub mod accordion;
pub mod config;
pub mod document;
pub mod headless;
pub mod host;
pub mod lightbox;
pub mod markup;
pub mod media;
pub mod navigation;
pub mod observe;
pub mod output;
pub mod page;
pub mod reveal;
pub mod site;
pub mod types;
pub mod utilities;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

#[cfg(test)]
pub(crate) mod test_helpers;

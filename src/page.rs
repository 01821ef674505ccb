//! Composition root.
//!
//! [`Page::bind`] wires every controller against one [`Host`], and
//! [`Page::dispatch`] routes each platform [`Event`] to the controllers
//! that care about it. Controllers are bound independently: one that cannot
//! find its elements is logged and left out, the rest still work.
//!
//! Hosts never call controllers themselves. A browser host registers the
//! handlers listed by [`Page::listeners`] and forwards every callback,
//! observer batch, timer and transition end as an [`Event`]; the in-memory
//! host is pumped the same way by [`crate::headless::Headless`].

use crate::accordion::Accordion;
use crate::config::BehaviorConfig;
use crate::host::{Channel, Deferred, Host};
use crate::lightbox::Lightbox;
use crate::media::MediaSlots;
use crate::navigation::Navigation;
use crate::observe::Intersection;
use crate::reveal::Reveal;
use crate::types::Key;
use crate::utilities::{SmoothScroll, stamp_footer_year};

#[derive(Debug, Clone, PartialEq)]
pub enum Event<N> {
    Click(N),
    KeyDown(Key),
    Scroll,
    TouchStart { x: f64 },
    TouchEnd { x: f64 },
    TransitionEnd(N),
    Intersections {
        channel: Channel,
        entries: Vec<Intersection<N>>,
    },
    Deferred(Deferred<N>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    pub prevent_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Click,
    Scroll,
    KeyDown,
    TouchStart,
    TouchEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListenTarget<N> {
    Window,
    Document,
    Element(N),
}

/// One handler a host must register.
#[derive(Debug, Clone, PartialEq)]
pub struct Listener<N> {
    pub target: ListenTarget<N>,
    pub kind: EventKind,
}

#[derive(Debug, Clone)]
pub struct Page<N> {
    navigation: Option<Navigation<N>>,
    accordion: Accordion<N>,
    lightbox: Option<Lightbox<N>>,
    reveal: Reveal<N>,
    media: MediaSlots<N>,
    scroll: SmoothScroll<N>,
    footer_year: Option<i32>,
}

impl<N: Clone + PartialEq + std::fmt::Debug> Page<N> {
    pub fn bind<H: Host<Node = N>>(host: &mut H, config: &BehaviorConfig) -> Self {
        let navigation = Navigation::bind(host, &config.navigation)
            .inspect_err(|err| tracing::warn!(%err, "navigation disabled"))
            .ok();
        let accordion = Accordion::bind(host, config.accordion.open_ms, config.accordion.close_ms);
        let lightbox = Lightbox::bind(host, config.lightbox.swipe_threshold)
            .inspect_err(|err| tracing::warn!(%err, "lightbox disabled"))
            .ok();
        let reveal = Reveal::bind(host, &config.reveal);
        let media = MediaSlots::bind(host, &config.media);
        let footer_year = stamp_footer_year(host);
        let scroll = SmoothScroll::bind(host, config.scroll.navbar_height);
        tracing::debug!(
            navigation = navigation.is_some(),
            lightbox = lightbox.is_some(),
            accordion_blocks = accordion.blocks().len(),
            reveal_candidates = reveal.len(),
            videos = media.videos().len(),
            "page bound"
        );
        Self {
            navigation,
            accordion,
            lightbox,
            reveal,
            media,
            scroll,
            footer_year,
        }
    }

    pub fn navigation(&self) -> Option<&Navigation<N>> {
        self.navigation.as_ref()
    }

    pub fn accordion(&self) -> &Accordion<N> {
        &self.accordion
    }

    pub fn lightbox(&self) -> Option<&Lightbox<N>> {
        self.lightbox.as_ref()
    }

    pub fn lightbox_mut(&mut self) -> Option<&mut Lightbox<N>> {
        self.lightbox.as_mut()
    }

    pub fn accordion_mut(&mut self) -> &mut Accordion<N> {
        &mut self.accordion
    }

    pub fn reveal(&self) -> &Reveal<N> {
        &self.reveal
    }

    pub fn media(&self) -> &MediaSlots<N> {
        &self.media
    }

    pub fn footer_year(&self) -> Option<i32> {
        self.footer_year
    }

    /// Handlers to register, with one click handler per distinct element.
    pub fn listeners(&self) -> Vec<Listener<N>> {
        let mut listeners = vec![
            Listener {
                target: ListenTarget::Window,
                kind: EventKind::Scroll,
            },
            Listener {
                target: ListenTarget::Document,
                kind: EventKind::KeyDown,
            },
        ];
        if let Some(lightbox) = &self.lightbox {
            for kind in [EventKind::TouchStart, EventKind::TouchEnd] {
                listeners.push(Listener {
                    target: ListenTarget::Element(lightbox.elements().container.clone()),
                    kind,
                });
            }
        }

        let mut clickable: Vec<&N> = Vec::new();
        if let Some(navigation) = &self.navigation {
            clickable.extend(navigation.click_targets());
        }
        clickable.extend(self.accordion.headers());
        if let Some(lightbox) = &self.lightbox {
            clickable.extend(lightbox.trigger_nodes());
            let el = lightbox.elements();
            clickable.extend([&el.close, &el.backdrop, &el.prev, &el.next]);
        }
        clickable.extend(self.scroll.anchors());

        let mut seen: Vec<&N> = Vec::new();
        for node in clickable {
            if !seen.contains(&node) {
                seen.push(node);
                listeners.push(Listener {
                    target: ListenTarget::Element(node.clone()),
                    kind: EventKind::Click,
                });
            }
        }
        listeners
    }

    pub fn dispatch<H: Host<Node = N>>(&mut self, host: &mut H, event: Event<N>) -> Outcome {
        let mut outcome = Outcome::default();
        match event {
            Event::Click(node) => {
                if let Some(navigation) = &mut self.navigation {
                    outcome.prevent_default |= navigation.on_click(host, &node);
                }
                self.accordion.on_click(host, &node);
                if let Some(lightbox) = &mut self.lightbox {
                    lightbox.on_click(host, &node);
                }
                outcome.prevent_default |= self.scroll.on_click(host, &node);
            }
            Event::KeyDown(key) => {
                if let Some(lightbox) = &mut self.lightbox {
                    lightbox.on_key(host, &key);
                }
            }
            Event::Scroll => {
                if let Some(navigation) = &mut self.navigation {
                    navigation.on_scroll(host);
                }
            }
            Event::TouchStart { x } => {
                if let Some(lightbox) = &mut self.lightbox {
                    lightbox.on_touch_start(x);
                }
            }
            Event::TouchEnd { x } => {
                if let Some(lightbox) = &mut self.lightbox {
                    lightbox.on_touch_end(host, x);
                }
            }
            Event::TransitionEnd(node) => self.accordion.on_transition_end(host, &node),
            Event::Intersections { channel, entries } => match channel {
                Channel::Sections => {
                    if let Some(navigation) = &mut self.navigation {
                        navigation.on_intersections(host, &entries);
                    }
                }
                Channel::Reveal => self.reveal.on_intersections(host, &entries),
                Channel::MediaSlots => self.media.on_intersections(host, &entries),
            },
            Event::Deferred(Deferred::Reveal(node)) => self.reveal.on_deferred(host, &node),
        }
        outcome
    }
}

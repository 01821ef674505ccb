//! Navbar behavior.
//!
//! - the navbar gets `scrolled` once the page is scrolled past a threshold;
//! - the hamburger opens/closes the mobile panel and mirrors the state in
//!   `aria-expanded`;
//! - submenu toggles open on tap only at or below the mobile breakpoint;
//!   above it the tap is left to the browser;
//! - any plain nav link or submenu entry closes the panel and every submenu;
//! - sections with an `id` are observed against a band of the viewport and
//!   the link pointing at the last one reported visible becomes `active`.
//!
//! All of it lives in [`NavState`]; [`Navigation::render`] writes the whole
//! state back to the elements after each change.

use crate::config::NavigationConfig;
use crate::host::{BindError, Channel, Host};
use crate::observe::Intersection;
use crate::types::{class, ids};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NavState {
    pub scrolled: bool,
    pub menu_open: bool,
    /// Open flag per `.has-dropdown` item, in document order.
    pub submenus: Vec<bool>,
    /// Id of the section currently marked active.
    pub active: Option<String>,
}

#[derive(Debug, Clone)]
struct Dropdown<N> {
    toggle: N,
    item: usize,
}

#[derive(Debug, Clone)]
pub struct Navigation<N> {
    state: NavState,
    config: NavigationConfig,
    navbar: N,
    hamburger: N,
    panel: N,
    submenu_items: Vec<N>,
    dropdowns: Vec<Dropdown<N>>,
    closers: Vec<N>,
    links: Vec<(N, String)>,
    sections: Vec<(N, String)>,
}

impl<N: Clone + PartialEq + std::fmt::Debug> Navigation<N> {
    pub fn bind<H: Host<Node = N>>(host: &mut H, config: &NavigationConfig) -> Result<Self, BindError> {
        let navbar = host.require_id(ids::NAVBAR)?;
        let hamburger = host.require_id(ids::HAMBURGER)?;
        let panel = host.require_id(ids::NAV_LINKS)?;

        let submenu_items = host.by_class(class::HAS_DROPDOWN);
        let dropdowns = host
            .by_class(class::NAV_LINK_DROPDOWN)
            .into_iter()
            .filter_map(|toggle| {
                let owner = host.closest_class(&toggle, class::HAS_DROPDOWN)?;
                let item = submenu_items.iter().position(|i| *i == owner)?;
                Some(Dropdown { toggle, item })
            })
            .collect();

        let mut closers: Vec<N> = host
            .by_class(class::NAV_DROPDOWN)
            .iter()
            .flat_map(|menu| host.descendants_by_tag(menu, "a"))
            .collect();
        let links: Vec<(N, String)> = host
            .by_class(class::NAV_LINK)
            .into_iter()
            .filter_map(|link| {
                let href = host.attribute(&link, "href")?;
                Some((link, href))
            })
            .collect();
        for link in host.by_class(class::NAV_LINK) {
            if !host.has_class(&link, class::NAV_LINK_DROPDOWN) && !closers.contains(&link) {
                closers.push(link);
            }
        }

        let sections: Vec<(N, String)> = host
            .by_tag("section")
            .into_iter()
            .filter_map(|section| {
                let id = host.attribute(&section, "id").filter(|id| !id.is_empty())?;
                Some((section, id))
            })
            .collect();
        let options = config.section_observer();
        for (section, _) in &sections {
            host.observe(Channel::Sections, &options, section);
        }

        let mut navigation = Self {
            state: NavState {
                submenus: vec![false; submenu_items.len()],
                ..NavState::default()
            },
            config: config.clone(),
            navbar,
            hamburger,
            panel,
            submenu_items,
            dropdowns,
            closers,
            links,
            sections,
        };
        navigation.state.scrolled = host.scroll_y() > navigation.config.scrolled_threshold;
        navigation.render(host);
        Ok(navigation)
    }

    pub fn state(&self) -> &NavState {
        &self.state
    }

    /// Every element this controller handles clicks for.
    pub fn click_targets(&self) -> Vec<&N> {
        std::iter::once(&self.hamburger)
            .chain(self.dropdowns.iter().map(|d| &d.toggle))
            .chain(self.closers.iter())
            .collect()
    }

    pub fn on_scroll<H: Host<Node = N>>(&mut self, host: &mut H) {
        let scrolled = host.scroll_y() > self.config.scrolled_threshold;
        if scrolled != self.state.scrolled {
            self.state.scrolled = scrolled;
            self.render(host);
        }
    }

    /// Returns true when the browser's default action must be suppressed.
    pub fn on_click<H: Host<Node = N>>(&mut self, host: &mut H, node: &N) -> bool {
        let mut prevent = false;
        let mut changed = false;
        if *node == self.hamburger {
            self.state.menu_open = !self.state.menu_open;
            changed = true;
        }
        if let Some(dropdown) = self.dropdowns.iter().find(|d| d.toggle == *node) {
            if host.viewport().width <= self.config.mobile_breakpoint {
                let open = &mut self.state.submenus[dropdown.item];
                *open = !*open;
                prevent = true;
                changed = true;
            }
        }
        if self.closers.contains(node) {
            self.state.menu_open = false;
            self.state.submenus.iter_mut().for_each(|open| *open = false);
            changed = true;
        }
        if changed {
            self.render(host);
        }
        prevent
    }

    /// Sections entering the tracking band; the last visible one wins.
    pub fn on_intersections<H: Host<Node = N>>(&mut self, host: &mut H, entries: &[Intersection<N>]) {
        let mut changed = false;
        for entry in entries.iter().filter(|e| e.visible) {
            if let Some((_, id)) = self.sections.iter().find(|(s, _)| *s == entry.target) {
                self.state.active = Some(id.clone());
                changed = true;
            }
        }
        if changed {
            self.render(host);
        }
    }

    pub fn render<H: Host<Node = N>>(&self, host: &mut H) {
        let state = &self.state;
        host.set_class(&self.navbar, class::SCROLLED, state.scrolled);
        host.set_class(&self.hamburger, class::OPEN, state.menu_open);
        host.set_attribute(
            &self.hamburger,
            "aria-expanded",
            if state.menu_open { "true" } else { "false" },
        );
        host.set_class(&self.panel, class::IS_OPEN, state.menu_open);
        for (item, open) in self.submenu_items.iter().zip(&state.submenus) {
            host.set_class(item, class::MOBILE_OPEN, *open);
        }
        if let Some(active) = &state.active {
            let target = format!("#{active}");
            for (link, href) in &self.links {
                host.set_class(link, class::ACTIVE, *href == target);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, NodeId};
    use crate::test_helpers::nav_document;
    use crate::types::Viewport;

    fn bound() -> (Document, Navigation<NodeId>) {
        let mut doc = nav_document();
        let nav = Navigation::bind(&mut doc, &NavigationConfig::default()).unwrap();
        (doc, nav)
    }

    fn id(doc: &Document, id: &str) -> NodeId {
        doc.find_id(id).unwrap()
    }

    #[test]
    fn scrolled_state_follows_threshold() {
        let (mut doc, mut nav) = bound();
        let navbar = id(&doc, "navbar");

        doc.set_scroll(41.0);
        nav.on_scroll(&mut doc);
        assert!(nav.state().scrolled);
        assert!(doc.classed(navbar, class::SCROLLED));

        doc.set_scroll(40.0);
        nav.on_scroll(&mut doc);
        assert!(!nav.state().scrolled);

        doc.set_scroll(41.0);
        nav.on_scroll(&mut doc);
        doc.set_scroll(0.0);
        nav.on_scroll(&mut doc);
        assert!(!nav.state().scrolled);
        assert!(!doc.classed(navbar, class::SCROLLED));
    }

    #[test]
    fn bind_reflects_initial_scroll() {
        let mut doc = nav_document();
        doc.set_scroll(300.0);
        let nav = Navigation::bind(&mut doc, &NavigationConfig::default()).unwrap();
        assert!(nav.state().scrolled);
    }

    #[test]
    fn hamburger_toggles_panel_and_aria() {
        let (mut doc, mut nav) = bound();
        let hamburger = id(&doc, "hamburger");
        let panel = id(&doc, "navLinks");

        nav.on_click(&mut doc, &hamburger);
        assert!(doc.classed(panel, class::IS_OPEN));
        assert!(doc.classed(hamburger, class::OPEN));
        assert_eq!(doc.attr(hamburger, "aria-expanded"), Some("true"));

        nav.on_click(&mut doc, &hamburger);
        assert!(!doc.classed(panel, class::IS_OPEN));
        assert_eq!(doc.attr(hamburger, "aria-expanded"), Some("false"));
    }

    #[test]
    fn dropdown_taps_only_on_mobile() {
        let (mut doc, mut nav) = bound();
        let toggle = id(&doc, "work-toggle");
        let item = id(&doc, "work-item");

        assert!(!nav.on_click(&mut doc, &toggle));
        assert!(!doc.classed(item, class::MOBILE_OPEN));

        doc.set_viewport(Viewport::new(768.0, 900.0));
        assert!(nav.on_click(&mut doc, &toggle));
        assert!(doc.classed(item, class::MOBILE_OPEN));
        assert!(nav.on_click(&mut doc, &toggle));
        assert!(!doc.classed(item, class::MOBILE_OPEN));
    }

    #[test]
    fn link_click_closes_panel_and_submenus() {
        let (mut doc, mut nav) = bound();
        doc.set_viewport(Viewport::new(375.0, 700.0));
        let hamburger = id(&doc, "hamburger");
        let toggle = id(&doc, "work-toggle");
        let entry = id(&doc, "work-entry");
        let item = id(&doc, "work-item");

        nav.on_click(&mut doc, &hamburger);
        nav.on_click(&mut doc, &toggle);
        assert!(nav.state().menu_open);

        assert!(!nav.on_click(&mut doc, &entry));
        assert!(!nav.state().menu_open);
        assert!(!doc.classed(item, class::MOBILE_OPEN));
        assert_eq!(doc.attr(hamburger, "aria-expanded"), Some("false"));
    }

    #[test]
    fn last_visible_section_wins() {
        let (mut doc, mut nav) = bound();
        let about = id(&doc, "about");
        let contact = id(&doc, "contact");
        let about_link = id(&doc, "about-link");
        let contact_link = id(&doc, "contact-link");

        let entries = vec![
            Intersection {
                target: about,
                visible: true,
                ratio: 0.2,
            },
            Intersection {
                target: contact,
                visible: true,
                ratio: 0.1,
            },
        ];
        nav.on_intersections(&mut doc, &entries);
        assert_eq!(nav.state().active.as_deref(), Some("contact"));
        assert!(doc.classed(contact_link, class::ACTIVE));
        assert!(!doc.classed(about_link, class::ACTIVE));
    }

    #[test]
    fn invisible_entries_do_not_change_active() {
        let (mut doc, mut nav) = bound();
        let about = id(&doc, "about");
        nav.on_intersections(
            &mut doc,
            &[Intersection {
                target: about,
                visible: false,
                ratio: 0.0,
            }],
        );
        assert_eq!(nav.state().active, None);
    }

    #[test]
    fn missing_navbar_fails_to_bind() {
        let mut doc = Document::default();
        assert!(matches!(
            Navigation::bind(&mut doc, &NavigationConfig::default()),
            Err(BindError::MissingElement(id)) if id == "navbar"
        ));
    }
}

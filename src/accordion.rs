//! Collapsible content blocks.
//!
//! Each `.accordion-block` holds an `.accordion-header` (the trigger,
//! carrying `aria-expanded`) and an `.accordion-body`. Blocks are fully
//! independent; any number may be open at once.
//!
//! Expanding and collapsing animate `max-height` between zero and the
//! body's measured natural height. The block's logical state flips
//! immediately on click; the body's final resting style is applied when
//! the transition completes, according to whichever phase is current at
//! that moment. A completion that arrives after the block was toggled
//! again mid-flight therefore finalizes the newer direction, and a second
//! completion for the same animation is ignored.

use crate::host::Host;
use crate::types::class;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Expanding,
    Collapsing,
}

/// Inline styles of a body at rest or at the start/end of an animation.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyStyle {
    pub display: &'static str,
    pub overflow: &'static str,
    pub max_height: String,
    pub transition: String,
}

impl BodyStyle {
    fn at_rest(open: bool) -> Self {
        Self {
            display: if open { "block" } else { "none" },
            overflow: "",
            max_height: String::new(),
            transition: String::new(),
        }
    }

    fn clipped(max_height: f64, transition: String) -> Self {
        Self {
            display: "block",
            overflow: "hidden",
            max_height: format!("{max_height}px"),
            transition,
        }
    }

    fn apply<H: Host>(&self, host: &mut H, node: &H::Node) {
        host.set_style(node, "display", self.display);
        host.set_style(node, "overflow", self.overflow);
        host.set_style(node, "transition", &self.transition);
        host.set_style(node, "max-height", &self.max_height);
    }
}

#[derive(Debug, Clone)]
pub struct Block<N> {
    pub block: N,
    pub header: N,
    pub body: N,
    open: bool,
    phase: Phase,
}

impl<N> Block<N> {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

#[derive(Debug, Clone)]
pub struct Accordion<N> {
    blocks: Vec<Block<N>>,
    open_ms: u32,
    close_ms: u32,
}

impl<N: Clone + PartialEq + std::fmt::Debug> Accordion<N> {
    /// Bind every block and render its initial state from `aria-expanded`.
    /// Blocks missing a header or body are skipped.
    pub fn bind<H: Host<Node = N>>(host: &mut H, open_ms: u32, close_ms: u32) -> Self {
        let mut blocks = Vec::new();
        for block in host.by_class(class::ACCORDION_BLOCK) {
            let header = host
                .descendants_by_class(&block, class::ACCORDION_HEADER)
                .into_iter()
                .next();
            let body = host
                .descendants_by_class(&block, class::ACCORDION_BODY)
                .into_iter()
                .next();
            let (Some(header), Some(body)) = (header, body) else {
                tracing::debug!(?block, "accordion block without header/body skipped");
                continue;
            };
            let open = host.attribute(&header, "aria-expanded").as_deref() == Some("true");
            blocks.push(Block {
                block,
                header,
                body,
                open,
                phase: Phase::Idle,
            });
        }
        let accordion = Self {
            blocks,
            open_ms,
            close_ms,
        };
        for block in &accordion.blocks {
            render_flags(host, block);
            BodyStyle::at_rest(block.open).apply(host, &block.body);
        }
        accordion
    }

    pub fn blocks(&self) -> &[Block<N>] {
        &self.blocks
    }

    pub fn headers(&self) -> impl Iterator<Item = &N> {
        self.blocks.iter().map(|b| &b.header)
    }

    /// Toggle the block whose header was clicked.
    pub fn on_click<H: Host<Node = N>>(&mut self, host: &mut H, node: &N) -> bool {
        match self.blocks.iter().position(|b| b.header == *node) {
            Some(index) => {
                self.toggle(host, index);
                true
            }
            None => false,
        }
    }

    pub fn toggle<H: Host<Node = N>>(&mut self, host: &mut H, index: usize) {
        let (open_ms, close_ms) = (self.open_ms, self.close_ms);
        let Some(block) = self.blocks.get_mut(index) else {
            return;
        };
        block.open = !block.open;
        render_flags(host, block);

        // Measure before clamping so the target is the natural height.
        host.set_style(&block.body, "display", "block");
        let natural = host.scroll_height(&block.body);
        let (start, end, phase) = if block.open {
            let transition = format!("max-height {open_ms}ms ease");
            (
                BodyStyle::clipped(0.0, transition.clone()),
                BodyStyle::clipped(natural, transition),
                Phase::Expanding,
            )
        } else {
            let transition = format!("max-height {close_ms}ms ease");
            (
                BodyStyle::clipped(natural, transition.clone()),
                BodyStyle::clipped(0.0, transition),
                Phase::Collapsing,
            )
        };
        start.apply(host, &block.body);
        host.reflow(&block.body);
        end.apply(host, &block.body);
        block.phase = phase;
        host.await_transition_end(&block.body);
    }

    /// A body finished animating: settle it at rest.
    pub fn on_transition_end<H: Host<Node = N>>(&mut self, host: &mut H, node: &N) {
        let Some(block) = self.blocks.iter_mut().find(|b| b.body == *node) else {
            return;
        };
        if block.phase == Phase::Idle {
            return;
        }
        block.phase = Phase::Idle;
        BodyStyle::at_rest(block.open).apply(host, &block.body);
    }
}

fn render_flags<H: Host>(host: &mut H, block: &Block<H::Node>) {
    host.set_class(&block.block, class::IS_OPEN, block.open);
    host.set_attribute(
        &block.header,
        "aria-expanded",
        if block.open { "true" } else { "false" },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, Element, NodeId};

    fn page(expanded: &[bool]) -> (Document, Vec<(NodeId, NodeId, NodeId)>) {
        let mut doc = Document::default();
        let body = doc.root();
        let mut parts = Vec::new();
        for &open in expanded {
            let block = doc.append(body, Element::new("div").class(class::ACCORDION_BLOCK));
            let header = doc.append(
                block,
                Element::new("button")
                    .class(class::ACCORDION_HEADER)
                    .attr("aria-expanded", if open { "true" } else { "false" }),
            );
            let content = doc.append(
                block,
                Element::new("div")
                    .class(class::ACCORDION_BODY)
                    .scroll_height(240.0),
            );
            parts.push((block, header, content));
        }
        (doc, parts)
    }

    #[test]
    fn initial_state_follows_aria_expanded() {
        let (mut doc, parts) = page(&[false, true]);
        let accordion = Accordion::bind(&mut doc, 350, 300);
        assert!(!accordion.blocks()[0].is_open());
        assert!(accordion.blocks()[1].is_open());
        assert_eq!(doc.style(parts[0].2, "display"), Some("none"));
        assert_eq!(doc.style(parts[1].2, "display"), Some("block"));
        assert!(doc.classed(parts[1].0, class::IS_OPEN));
    }

    #[test]
    fn click_expands_then_second_click_collapses() {
        let (mut doc, parts) = page(&[false]);
        let (block, header, body) = parts[0];
        let mut accordion = Accordion::bind(&mut doc, 350, 300);

        assert!(accordion.on_click(&mut doc, &header));
        assert_eq!(doc.attr(header, "aria-expanded"), Some("true"));
        assert!(doc.classed(block, class::IS_OPEN));
        assert_eq!(doc.style(body, "max-height"), Some("240px"));
        assert_eq!(doc.style(body, "transition"), Some("max-height 350ms ease"));
        assert_eq!(accordion.blocks()[0].phase(), Phase::Expanding);

        for node in doc.take_transition_ends() {
            accordion.on_transition_end(&mut doc, &node);
        }
        assert_eq!(doc.style(body, "max-height"), None);
        assert_eq!(doc.style(body, "display"), Some("block"));

        accordion.on_click(&mut doc, &header);
        assert_eq!(doc.attr(header, "aria-expanded"), Some("false"));
        assert_eq!(doc.style(body, "max-height"), Some("0px"));
        assert_eq!(doc.style(body, "display"), Some("block"));
        for node in doc.take_transition_ends() {
            accordion.on_transition_end(&mut doc, &node);
        }
        assert_eq!(doc.style(body, "display"), Some("none"));
        assert!(!doc.classed(block, class::IS_OPEN));
    }

    #[test]
    fn blocks_toggle_independently() {
        let (mut doc, parts) = page(&[false, false]);
        let mut accordion = Accordion::bind(&mut doc, 350, 300);
        accordion.on_click(&mut doc, &parts[0].1);
        accordion.on_click(&mut doc, &parts[1].1);
        assert!(accordion.blocks().iter().all(Block::is_open));
    }

    #[test]
    fn late_completion_settles_latest_direction() {
        let (mut doc, parts) = page(&[false]);
        let (_, header, body) = parts[0];
        let mut accordion = Accordion::bind(&mut doc, 350, 300);

        accordion.on_click(&mut doc, &header);
        accordion.on_click(&mut doc, &header);
        let ends = doc.take_transition_ends();
        assert_eq!(ends.len(), 2);
        for node in ends {
            accordion.on_transition_end(&mut doc, &node);
        }
        assert!(!accordion.blocks()[0].is_open());
        assert_eq!(doc.style(body, "display"), Some("none"));
        assert_eq!(accordion.blocks()[0].phase(), Phase::Idle);
    }

    #[test]
    fn unrelated_clicks_are_ignored() {
        let (mut doc, parts) = page(&[false]);
        let mut accordion = Accordion::bind(&mut doc, 350, 300);
        assert!(!accordion.on_click(&mut doc, &parts[0].2));
        assert!(!accordion.blocks()[0].is_open());
    }
}

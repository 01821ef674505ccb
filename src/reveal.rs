//! Scroll-triggered entrance animations.
//!
//! Candidates are tagged `reveal` at bind time and observed. The first time
//! one is reported visible it is unobserved and a fire-once timer adds
//! `revealed` after a short stagger, so blocks that appear together cascade
//! instead of popping in at once. Nothing ever removes `revealed`.
//!
//! The stagger position is the entry's position inside the delivered
//! batch, counting entries that were not visible too.

use crate::config::RevealConfig;
use crate::host::{Channel, Deferred, Host};
use crate::observe::Intersection;
use crate::types::class;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Waiting,
    Scheduled,
    Revealed,
}

#[derive(Debug, Clone)]
pub struct Reveal<N> {
    candidates: Vec<(N, RevealState)>,
    config: RevealConfig,
}

impl<N: Clone + PartialEq + std::fmt::Debug> Reveal<N> {
    pub fn bind<H: Host<Node = N>>(host: &mut H, config: &RevealConfig) -> Self {
        let classes: Vec<&str> = config.targets.iter().map(String::as_str).collect();
        let candidates: Vec<_> = host
            .select_classes(&classes)
            .into_iter()
            .map(|node| (node, RevealState::Waiting))
            .collect();
        let options = config.observer();
        for (node, _) in &candidates {
            host.set_class(node, class::REVEAL, true);
            host.observe(Channel::Reveal, &options, node);
        }
        tracing::debug!(candidates = candidates.len(), "reveal bound");
        Self {
            candidates,
            config: config.clone(),
        }
    }

    pub fn state_of(&self, node: &N) -> Option<RevealState> {
        self.candidates
            .iter()
            .find(|(n, _)| n == node)
            .map(|(_, s)| *s)
    }

    pub fn revealed_count(&self) -> usize {
        self.candidates
            .iter()
            .filter(|(_, s)| *s == RevealState::Revealed)
            .count()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn on_intersections<H: Host<Node = N>>(&mut self, host: &mut H, entries: &[Intersection<N>]) {
        for (position, entry) in entries.iter().enumerate() {
            if !entry.visible {
                continue;
            }
            let Some((node, state)) = self
                .candidates
                .iter_mut()
                .find(|(n, _)| *n == entry.target)
            else {
                continue;
            };
            if *state != RevealState::Waiting {
                continue;
            }
            *state = RevealState::Scheduled;
            host.schedule(self.config.delay_for(position), Deferred::Reveal(node.clone()));
            host.unobserve(Channel::Reveal, node);
        }
    }

    pub fn on_deferred<H: Host<Node = N>>(&mut self, host: &mut H, node: &N) {
        if let Some((node, state)) = self.candidates.iter_mut().find(|(n, _)| n == node) {
            if *state != RevealState::Revealed {
                *state = RevealState::Revealed;
                host.set_class(node, class::REVEALED, true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, Element, NodeId};
    use crate::types::Rect;

    fn cards(n: usize) -> (Document, Vec<NodeId>) {
        let mut doc = Document::default();
        let root = doc.root();
        let nodes = (0..n)
            .map(|i| {
                doc.append(
                    root,
                    Element::new("div")
                        .class(class::CONTACT_CARD)
                        .rect(Rect::new(100.0 + i as f64 * 50.0, 0.0, 300.0, 40.0)),
                )
            })
            .collect();
        (doc, nodes)
    }

    fn visible(target: NodeId) -> Intersection<NodeId> {
        Intersection {
            target,
            visible: true,
            ratio: 1.0,
        }
    }

    #[test]
    fn bind_tags_and_observes_candidates() {
        let (mut doc, nodes) = cards(3);
        let reveal = Reveal::bind(&mut doc, &RevealConfig::default());
        assert_eq!(reveal.len(), 3);
        assert!(nodes.iter().all(|n| doc.classed(*n, class::REVEAL)));
        assert_eq!(doc.observer(Channel::Reveal).map(|o| o.len()), Some(3));
    }

    #[test]
    fn batch_positions_stagger_and_cycle() {
        let (mut doc, nodes) = cards(6);
        let mut reveal = Reveal::bind(&mut doc, &RevealConfig::default());
        let entries: Vec<_> = nodes.iter().copied().map(visible).collect();
        reveal.on_intersections(&mut doc, &entries);
        assert_eq!(doc.observer(Channel::Reveal).map(|o| o.len()), Some(0));

        // positions 0 and 4 share the zero delay
        for task in doc.advance(0) {
            let Deferred::Reveal(node) = task;
            reveal.on_deferred(&mut doc, &node);
        }
        assert!(doc.classed(nodes[0], class::REVEALED));
        assert!(doc.classed(nodes[4], class::REVEALED));
        assert!(!doc.classed(nodes[1], class::REVEALED));

        for task in doc.advance(180) {
            let Deferred::Reveal(node) = task;
            reveal.on_deferred(&mut doc, &node);
        }
        assert_eq!(reveal.revealed_count(), 6);
    }

    #[test]
    fn invisible_entries_still_count_for_position() {
        let (mut doc, nodes) = cards(2);
        let mut reveal = Reveal::bind(&mut doc, &RevealConfig::default());
        let entries = vec![
            Intersection {
                target: nodes[0],
                visible: false,
                ratio: 0.0,
            },
            visible(nodes[1]),
        ];
        reveal.on_intersections(&mut doc, &entries);
        assert!(doc.advance(59).is_empty());
        assert_eq!(doc.advance(1), vec![Deferred::Reveal(nodes[1])]);
        assert_eq!(reveal.state_of(&nodes[0]), Some(RevealState::Waiting));
    }

    #[test]
    fn reveals_at_most_once() {
        let (mut doc, nodes) = cards(1);
        let mut reveal = Reveal::bind(&mut doc, &RevealConfig::default());
        reveal.on_intersections(&mut doc, &[visible(nodes[0])]);
        reveal.on_intersections(&mut doc, &[visible(nodes[0])]);
        assert_eq!(doc.pending_timers(), 1);
        reveal.on_deferred(&mut doc, &nodes[0]);
        reveal.on_intersections(&mut doc, &[visible(nodes[0])]);
        assert_eq!(doc.pending_timers(), 1);
        assert_eq!(reveal.state_of(&nodes[0]), Some(RevealState::Revealed));
    }
}

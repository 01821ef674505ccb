//! Viewport observation.
//!
//! Controllers never poll the layout themselves: they hand targets to the
//! host together with [`ObserverOptions`] and receive [`Intersection`]
//! batches later. In a browser the host maps this onto a native
//! `IntersectionObserver`; the headless document uses the portable
//! [`ViewportObserver`] below.
//!
//! ## Visibility Rule
//!
//! Both hosts use [`is_visible`]: with a positive threshold a target is
//! visible once at least that fraction of it lies inside the root; with a
//! zero threshold any geometric overlap counts (edge contact included).

use crate::types::{Rect, Viewport};
use serde::{Deserialize, Serialize};

/// One side of a root margin. Percentages are relative to the viewport
/// height for top/bottom and to its width for left/right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Margin {
    Px(f64),
    Percent(f64),
}

impl Margin {
    fn resolve(&self, extent: f64) -> f64 {
        match *self {
            Margin::Px(px) => px,
            Margin::Percent(pct) => extent * pct / 100.0,
        }
    }

    fn to_css(self) -> String {
        match self {
            Margin::Px(px) => format!("{px}px"),
            Margin::Percent(pct) => format!("{pct}%"),
        }
    }
}

/// Grows (positive) or shrinks (negative) the viewport before intersecting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootMargin {
    pub top: Margin,
    pub right: Margin,
    pub bottom: Margin,
    pub left: Margin,
}

impl Default for RootMargin {
    fn default() -> Self {
        Self {
            top: Margin::Px(0.0),
            right: Margin::Px(0.0),
            bottom: Margin::Px(0.0),
            left: Margin::Px(0.0),
        }
    }
}

impl RootMargin {
    /// CSS `rootMargin` string, e.g. `"-40% 0px -55% 0px"`.
    pub fn to_css(&self) -> String {
        format!(
            "{} {} {} {}",
            self.top.to_css(),
            self.right.to_css(),
            self.bottom.to_css(),
            self.left.to_css()
        )
    }

    /// The root rectangle (viewport coordinates) after applying the margins.
    pub fn resolve(&self, viewport: Viewport) -> Rect {
        let top = -self.top.resolve(viewport.height);
        let left = -self.left.resolve(viewport.width);
        let bottom = viewport.height + self.bottom.resolve(viewport.height);
        let right = viewport.width + self.right.resolve(viewport.width);
        Rect::new(top, left, (right - left).max(0.0), (bottom - top).max(0.0))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObserverOptions {
    /// Fraction of the target (0.0–1.0) that must be inside the root.
    pub threshold: f64,
    pub root_margin: RootMargin,
}

/// A visibility change reported for one observed target.
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection<N> {
    pub target: N,
    pub visible: bool,
    pub ratio: f64,
}

/// Whether `target` overlaps `root` and by what fraction of its own area.
///
/// Zero-area targets count as fully inside when they touch the root.
pub fn intersect(target: &Rect, root: &Rect) -> (bool, f64) {
    let top = target.top.max(root.top);
    let bottom = target.bottom().min(root.bottom());
    let left = target.left.max(root.left);
    let right = target.right().min(root.right());
    if bottom < top || right < left {
        return (false, 0.0);
    }
    let area = target.width * target.height;
    if area <= 0.0 {
        return (true, 1.0);
    }
    (true, ((bottom - top) * (right - left) / area).clamp(0.0, 1.0))
}

pub fn is_visible(intersects: bool, ratio: f64, threshold: f64) -> bool {
    if threshold > 0.0 {
        intersects && ratio >= threshold
    } else {
        intersects
    }
}

/// Portable observer: remembers the last visibility of every target and
/// reports only the ones that changed since the previous [`poll`].
///
/// [`poll`]: ViewportObserver::poll
#[derive(Debug, Clone)]
pub struct ViewportObserver<N> {
    options: ObserverOptions,
    targets: Vec<(N, Option<bool>)>,
}

impl<N: Clone + PartialEq> ViewportObserver<N> {
    pub fn new(options: ObserverOptions) -> Self {
        Self {
            options,
            targets: Vec::new(),
        }
    }

    pub fn options(&self) -> &ObserverOptions {
        &self.options
    }

    pub fn observe(&mut self, target: N) {
        if !self.targets.iter().any(|(t, _)| *t == target) {
            self.targets.push((target, None));
        }
    }

    pub fn unobserve(&mut self, target: &N) {
        self.targets.retain(|(t, _)| t != target);
    }

    pub fn is_observing(&self, target: &N) -> bool {
        self.targets.iter().any(|(t, _)| t == target)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Compute the next batch. Newly observed targets always produce an
    /// entry; known ones only when their visibility flipped. Entries keep
    /// observation order.
    pub fn poll(&mut self, viewport: Viewport, rect_of: impl Fn(&N) -> Rect) -> Vec<Intersection<N>> {
        let root = self.options.root_margin.resolve(viewport);
        let threshold = self.options.threshold;
        let mut entries = Vec::new();
        for (target, last) in &mut self.targets {
            let (intersects, ratio) = intersect(&rect_of(target), &root);
            let visible = is_visible(intersects, ratio, threshold);
            if *last != Some(visible) {
                *last = Some(visible);
                entries.push(Intersection {
                    target: target.clone(),
                    visible,
                    ratio,
                });
            }
        }
        entries
    }
}

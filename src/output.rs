//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every entity (section, block, nav entry, replay step) leads with its
//! positional index and title. Details such as galleries, anchors and
//! observed state follow as indented context lines.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Sections
//! 001 Selected work (#work, projects)
//!     001 Harbour [open]
//!         Gallery: harbour (3 images)
//!     002 Tide
//!         Video: media/tide.mp4
//!
//! Navigation
//! 001 Work → #work
//!     001 Harbour → #work
//!
//! site.toml: 4 sections, 2 galleries, 1 video
//! ```
//!
//! ## Replay
//!
//! ```text
//! 001 open harbour[2]
//!     Lightbox: 3 / 3 "Fog over the basin"
//!     Navigation: scrolled, active #work
//!     Accordion: Harbour
//!     Revealed: 3/8, playing 1
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::headless::{Snapshot, Step};
use crate::site::{Block, NavEntry, SectionKind, Site};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max).collect::<String>())
    }
}

fn kind_name(kind: SectionKind) -> &'static str {
    match kind {
        SectionKind::About => "about",
        SectionKind::Projects => "projects",
        SectionKind::Skills => "skills",
        SectionKind::Contact => "contact",
    }
}

// ============================================================================
// Check
// ============================================================================

fn block_lines(index: usize, block: &Block, kind: SectionKind) -> Vec<String> {
    let mut lines = Vec::new();
    let marker = if kind == SectionKind::Projects && block.open {
        " [open]"
    } else {
        ""
    };
    lines.push(format!(
        "{}{} {}{}",
        indent(1),
        format_index(index),
        block.title,
        marker
    ));
    if let Some(first) = block.body.lines().find(|l| !l.trim().is_empty()) {
        lines.push(format!("{}{}", indent(2), truncate_desc(first.trim(), 60)));
    }
    if let Some(gallery) = &block.gallery {
        lines.push(format!(
            "{}Gallery: {} ({})",
            indent(2),
            gallery.id,
            plural(gallery.images.len(), "image", "images")
        ));
    }
    if let Some(video) = &block.video {
        lines.push(format!("{}Video: {}", indent(2), video));
    }
    lines
}

fn nav_lines(entries: &[NavEntry], depth: usize, lines: &mut Vec<String>) {
    for (i, entry) in entries.iter().enumerate() {
        lines.push(format!(
            "{}{} {} → {}",
            indent(depth),
            format_index(i + 1),
            entry.label,
            entry.href
        ));
        nav_lines(&entry.children, depth + 1, lines);
    }
}

/// Inventory of a validated site.
pub fn format_check_output(site: &Site, source: &Path) -> Vec<String> {
    let mut lines = vec!["Sections".to_string()];
    for (i, section) in site.sections.iter().enumerate() {
        lines.push(format!(
            "{} {} (#{}, {})",
            format_index(i + 1),
            section.heading,
            section.id,
            kind_name(section.kind)
        ));
        for (j, block) in section.blocks.iter().enumerate() {
            lines.extend(block_lines(j + 1, block, section.kind));
        }
    }

    if !site.nav.is_empty() {
        lines.push(String::new());
        lines.push("Navigation".to_string());
        nav_lines(&site.nav, 0, &mut lines);
    }

    lines.push(String::new());
    lines.push(format!(
        "{}: {}, {}, {}",
        source.display(),
        plural(site.sections.len(), "section", "sections"),
        plural(site.galleries().count(), "gallery", "galleries"),
        plural(site.videos().count(), "video", "videos"),
    ));
    lines
}

pub fn print_check_output(site: &Site, source: &Path) {
    for line in format_check_output(site, source) {
        println!("{}", line);
    }
}

// ============================================================================
// Replay
// ============================================================================

fn describe_step(step: &Step) -> String {
    match step {
        Step::Click { id } => format!("click #{id}"),
        Step::Link { href } => format!("link {href}"),
        Step::Open { gallery, index } => format!("open {gallery}[{index}]"),
        Step::Toggle { block } => format!("toggle block {block}"),
        Step::Key { key } => format!("key {key}"),
        Step::Swipe { from, to } => format!("swipe {from} → {to}"),
        Step::Scroll { y } => format!("scroll {y}"),
        Step::Wait { ms } => format!("wait {ms}ms"),
        Step::Resize { width, height } => format!("resize {width}x{height}"),
    }
}

/// One replay step and the state it left behind.
pub fn format_replay_frame(index: usize, step: &Step, snapshot: &Snapshot) -> Vec<String> {
    let mut lines = vec![format!("{} {}", format_index(index), describe_step(step))];

    if let Some(lightbox) = snapshot.lightbox.as_ref().filter(|l| l.open) {
        lines.push(format!(
            "{}Lightbox: {} \"{}\"",
            indent(1),
            lightbox.counter,
            lightbox.caption
        ));
    }

    if let Some(nav) = &snapshot.navigation {
        let mut parts = Vec::new();
        if nav.scrolled {
            parts.push("scrolled".to_string());
        }
        if nav.menu_open {
            parts.push("menu open".to_string());
        }
        let submenus = nav.submenus.iter().filter(|open| **open).count();
        if submenus > 0 {
            parts.push(plural(submenus, "submenu open", "submenus open"));
        }
        if let Some(active) = &nav.active {
            parts.push(format!("active #{active}"));
        }
        if !parts.is_empty() {
            lines.push(format!("{}Navigation: {}", indent(1), parts.join(", ")));
        }
    }

    let open: Vec<&str> = snapshot
        .accordion
        .iter()
        .filter(|b| b.open)
        .map(|b| b.title.as_str())
        .collect();
    if !open.is_empty() {
        lines.push(format!("{}Accordion: {}", indent(1), open.join(", ")));
    }

    lines.push(format!(
        "{}Revealed: {}/{}, playing {}, scroll {}",
        indent(1),
        snapshot.revealed,
        snapshot.reveal_candidates,
        snapshot.videos_playing,
        snapshot.scroll_y
    ));
    lines
}

pub fn print_replay_output(frames: &[(Step, Snapshot)]) {
    for (i, (step, snapshot)) in frames.iter().enumerate() {
        for line in format_replay_frame(i + 1, step, snapshot) {
            println!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BehaviorConfig;
    use crate::headless::Headless;
    use crate::test_helpers::fixture_site;
    use crate::types::Viewport;

    #[test]
    fn truncate_desc_short() {
        assert_eq!(truncate_desc("Short text", 40), "Short text");
    }

    #[test]
    fn truncate_desc_counts_chars() {
        let text = "é".repeat(50);
        assert_eq!(truncate_desc(&text, 40), format!("{}...", "é".repeat(40)));
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "gallery", "galleries"), "1 gallery");
        assert_eq!(plural(2, "gallery", "galleries"), "2 galleries");
    }

    #[test]
    fn check_lists_sections_blocks_and_nav() {
        let lines = format_check_output(&fixture_site(), Path::new("site.toml"));
        assert_eq!(lines[0], "Sections");
        assert_eq!(lines[1], "001 Selected work (#work, projects)");
        assert_eq!(lines[2], "    001 Harbour [open]");
        assert_eq!(lines[3], "        Night exposures along the old harbour front.");
        assert!(lines.contains(&"        Gallery: harbour (3 images)".to_string()));
        assert!(lines.contains(&"        Gallery: interiors (1 image)".to_string()));
        assert!(lines.contains(&"        Video: media/tide.mp4".to_string()));
        assert!(lines.contains(&"001 Work → #work".to_string()));
        assert!(lines.contains(&"    002 Interiors → #work".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            "site.toml: 4 sections, 2 galleries, 1 video"
        );
    }

    #[test]
    fn replay_frame_reports_lightbox_and_reveal() {
        let mut page = Headless::new(&fixture_site(), &BehaviorConfig::default(), Viewport::default());
        let step = Step::Open {
            gallery: "harbour".into(),
            index: 0,
        };
        page.run(&step).unwrap();
        let lines = format_replay_frame(1, &step, &page.snapshot());
        assert_eq!(lines[0], "001 open harbour[0]");
        assert_eq!(lines[1], "    Lightbox: 1 / 3 \"Pier at dusk\"");
        assert!(lines.iter().any(|l| l == "    Accordion: Harbour"));
        assert!(lines.last().unwrap().starts_with("    Revealed: 0/"));
    }

    #[test]
    fn closed_lightbox_is_not_reported() {
        let page = Headless::new(&fixture_site(), &BehaviorConfig::default(), Viewport::default());
        let lines = format_replay_frame(2, &Step::Wait { ms: 10 }, &page.snapshot());
        assert_eq!(lines[0], "002 wait 10ms");
        assert!(!lines.iter().any(|l| l.contains("Lightbox")));
    }
}

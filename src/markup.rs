//! Portfolio page rendering.
//!
//! Renders a [`Site`] into one self-contained `index.html`: navbar, the
//! content sections, the lightbox modal and the footer. The markup carries
//! every hook the behavior layer binds to (ids, classes, `aria-expanded`,
//! `data-gallery`/`data-index`), so the page is fully functional once the
//! wasm package is loaded next to it.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html      # the page, stylesheet and behavior config inlined
//! └── pkg/            # wasm-pack output, built separately
//!     └── lowkey_folio.js
//! ```
//!
//! ## CSS and Config
//!
//! `static/style.css` is embedded at compile time and prefixed with custom
//! properties derived from the [`BehaviorConfig`] (nav height, animation
//! durations). The config itself is embedded as JSON in
//! `<script id="lowkey-config">` and read back by the browser build.

use crate::config::{self, BehaviorConfig};
use crate::site::{Block, Gallery, NavEntry, Section, SectionKind, Site};
use crate::types::{class, ids};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

const CSS_STATIC: &str = include_str!("../static/style.css");
const BOOTSTRAP: &str = "import init from './pkg/lowkey_folio.js';\ninit();";

/// Render the page and write it to `output_dir/index.html`.
pub fn render_site(
    site: &Site,
    config: &BehaviorConfig,
    year: i32,
    output_dir: &Path,
) -> Result<PathBuf, RenderError> {
    let page = render_page(site, config, year)?;
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join("index.html");
    fs::write(&path, page.into_string())?;
    tracing::info!(path = %path.display(), "page rendered");
    Ok(path)
}

pub fn render_page(site: &Site, config: &BehaviorConfig, year: i32) -> Result<Markup, RenderError> {
    let css = format!("{}\n\n{}", config::generate_behavior_css(config), CSS_STATIC);
    let config_json = embed_json(&serde_json::to_string(config)?);

    let content = html! {
        (render_nav(site))
        main {
            header.hero id="top" {
                h1 { (site.owner) }
                @if let Some(tagline) = &site.tagline {
                    p.tagline { (tagline) }
                }
            }
            @for section in &site.sections {
                (render_section(section))
            }
        }
        (render_footer(&site.owner, year))
        (render_lightbox())
    };
    Ok(base_document(&site.title, &css, &config_json, content))
}

/// `</` inside an inline script would end it early.
fn embed_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn markdown(source: &str) -> Markup {
    let mut out = String::new();
    md_html::push_html(&mut out, Parser::new(source));
    PreEscaped(out)
}

// ============================================================================
// HTML Components
// ============================================================================

fn base_document(title: &str, css: &str, config_json: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(css)) }
                script id=(ids::CONFIG_SCRIPT) type="application/json" { (PreEscaped(config_json)) }
            }
            body {
                (content)
                script type="module" { (PreEscaped(BOOTSTRAP)) }
            }
        }
    }
}

pub fn render_nav(site: &Site) -> Markup {
    html! {
        nav.navbar id=(ids::NAVBAR) {
            a.brand href="#top" { (site.owner) }
            button.hamburger id=(ids::HAMBURGER) type="button"
                aria-label="Menu" aria-expanded="false" aria-controls=(ids::NAV_LINKS) {
                span {}
                span {}
                span {}
            }
            ul.nav-links id=(ids::NAV_LINKS) {
                @for entry in &site.nav {
                    (render_nav_entry(entry))
                }
            }
        }
    }
}

fn render_nav_entry(entry: &NavEntry) -> Markup {
    html! {
        @if entry.children.is_empty() {
            li { a.(class::NAV_LINK) href=(entry.href) { (entry.label) } }
        } @else {
            li.(class::HAS_DROPDOWN) {
                a.(class::NAV_LINK).(class::NAV_LINK_DROPDOWN) href=(entry.href) { (entry.label) }
                ul.(class::NAV_DROPDOWN) {
                    @for child in &entry.children {
                        li { a href=(child.href) { (child.label) } }
                    }
                }
            }
        }
    }
}

fn render_section(section: &Section) -> Markup {
    html! {
        section.section id=(section.id) {
            h2 { (section.heading) }
            @if let Some(intro) = &section.intro {
                div.section-intro { (markdown(intro)) }
            }
            @match section.kind {
                SectionKind::Projects => {
                    div.projects {
                        @for block in &section.blocks {
                            (render_accordion_block(block))
                        }
                    }
                }
                SectionKind::About => {
                    div.(class::ABOUT_GRID) {
                        @for block in &section.blocks {
                            div.about-col { (render_block_content(block)) }
                        }
                    }
                }
                SectionKind::Skills => {
                    div.skills {
                        @for block in &section.blocks {
                            div.(class::SKILLS_GROUP) { (render_block_content(block)) }
                        }
                    }
                }
                SectionKind::Contact => {
                    div.contact-cards {
                        @for block in &section.blocks {
                            div.(class::CONTACT_CARD) { (render_block_content(block)) }
                        }
                    }
                }
            }
        }
    }
}

fn render_accordion_block(block: &Block) -> Markup {
    html! {
        div.(class::ACCORDION_BLOCK) {
            button.(class::ACCORDION_HEADER) type="button"
                aria-expanded=(if block.open { "true" } else { "false" }) {
                span.accordion-title { (block.title) }
                span.accordion-icon aria-hidden="true" {}
            }
            div.(class::ACCORDION_BODY) {
                div.accordion-content {
                    (markdown(&block.body))
                    (render_block_media(block))
                }
            }
        }
    }
}

fn render_block_content(block: &Block) -> Markup {
    html! {
        h3 { (block.title) }
        (markdown(&block.body))
        (render_block_media(block))
    }
}

fn render_block_media(block: &Block) -> Markup {
    html! {
        @if let Some(gallery) = &block.gallery {
            (render_gallery(gallery))
        }
        @if let Some(video) = &block.video {
            div.(class::MEDIA_SLOT) {
                video src=(video) muted loop playsinline preload="metadata" {}
            }
        }
    }
}

pub fn render_gallery(gallery: &Gallery) -> Markup {
    html! {
        div.gallery {
            @for (index, image) in gallery.images.iter().enumerate() {
                figure.(class::GALLERY_ITEM) data-gallery=(gallery.id) data-index=(index) tabindex="0" {
                    img src=(image.src) alt=(image.alt) loading="lazy";
                }
            }
        }
    }
}

fn render_footer(owner: &str, year: i32) -> Markup {
    html! {
        footer.site-footer {
            p {
                "© "
                span id=(ids::FOOTER_YEAR) { (year) }
                " " (owner)
            }
        }
    }
}

fn render_lightbox() -> Markup {
    html! {
        div.lightbox id=(ids::LIGHTBOX) role="dialog" aria-modal="true" aria-label="Image viewer" {
            div.lightbox-backdrop id=(ids::LIGHTBOX_BACKDROP) {}
            button.lightbox-close id=(ids::LIGHTBOX_CLOSE) type="button" aria-label="Close" { "×" }
            button.lightbox-prev id=(ids::LIGHTBOX_PREV) type="button" aria-label="Previous" { "‹" }
            figure.lightbox-figure {
                img id=(ids::LIGHTBOX_IMG) src="" alt="";
                figcaption {
                    span.lightbox-caption id=(ids::LIGHTBOX_CAPTION) {}
                    span.lightbox-counter id=(ids::LIGHTBOX_COUNTER) {}
                }
            }
            button.lightbox-next id=(ids::LIGHTBOX_NEXT) type="button" aria-label="Next" { "›" }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

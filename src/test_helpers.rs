//! Shared test utilities.
//!
//! Fixture loading plus small hand-built documents for controller tests.
//! Element ids used by the documents are fixed so tests can look nodes up
//! with [`Document::find_id`]:
//!
//! | id | element |
//! |----|---------|
//! | `work-item` | `li.has-dropdown` |
//! | `work-toggle` | `a.nav-link.nav-link--dropdown[href="#work"]` |
//! | `work-entry` | `.nav-dropdown a[href="#work"]` |
//! | `about-link`, `contact-link` | plain `a.nav-link` |
//! | `work`, `about`, `contact` | `section` |
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut doc = portfolio_document();
//! let page = Page::bind(&mut doc, &BehaviorConfig::default());
//! let toggle = doc.find_id("work-toggle").unwrap();
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::document::{Document, Element, NodeId};
use crate::lightbox::{GalleryMember, GalleryRegistry, MediaItem, Viewer};
use crate::site::{Site, load_site};
use crate::types::{Rect, class, ids};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/` to a temp directory and return it.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// `fixtures/site.toml`, parsed and validated.
pub fn fixture_site() -> Site {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site.toml");
    load_site(&path).unwrap_or_else(|e| panic!("fixture site invalid: {e}"))
}

// =========================================================================
// Galleries
// =========================================================================

/// `len` members of `gallery` with indices `0..len`.
pub fn gallery_members(gallery: &str, len: usize) -> Vec<GalleryMember> {
    (0..len)
        .map(|index| GalleryMember {
            gallery: gallery.to_string(),
            index,
            item: MediaItem {
                src: format!("img/{gallery}-{index}.jpg"),
                alt: format!("{gallery} {index}"),
            },
        })
        .collect()
}

/// A viewer over the given `(gallery, len)` pairs, swipe threshold 40px.
pub fn viewer_with(galleries: &[(&str, usize)]) -> Viewer {
    let members = galleries
        .iter()
        .flat_map(|(gallery, len)| gallery_members(gallery, *len));
    Viewer::new(GalleryRegistry::build(members).unwrap(), 40.0)
}

// =========================================================================
// Documents
// =========================================================================

/// Navbar with one dropdown item and two plain links, followed by the
/// `work`, `about` and `contact` sections stacked 800px apart.
pub fn nav_document() -> Document {
    let mut doc = Document::default();
    let root = doc.root();
    let navbar = doc.append(
        root,
        Element::new("nav")
            .id(ids::NAVBAR)
            .rect(Rect::new(0.0, 0.0, 1280.0, 56.0)),
    );
    doc.append(
        navbar,
        Element::new("button")
            .id(ids::HAMBURGER)
            .attr("aria-expanded", "false"),
    );
    let list = doc.append(navbar, Element::new("ul").id(ids::NAV_LINKS));

    let item = doc.append(
        list,
        Element::new("li").id("work-item").class(class::HAS_DROPDOWN),
    );
    doc.append(
        item,
        Element::new("a")
            .id("work-toggle")
            .class(class::NAV_LINK)
            .class(class::NAV_LINK_DROPDOWN)
            .attr("href", "#work"),
    );
    let menu = doc.append(item, Element::new("ul").class(class::NAV_DROPDOWN));
    let entry = doc.append(menu, Element::new("li"));
    doc.append(
        entry,
        Element::new("a").id("work-entry").attr("href", "#work"),
    );

    for target in ["about", "contact"] {
        let li = doc.append(list, Element::new("li"));
        doc.append(
            li,
            Element::new("a")
                .id(&format!("{target}-link"))
                .class(class::NAV_LINK)
                .attr("href", &format!("#{target}")),
        );
    }

    for (i, section) in ["work", "about", "contact"].into_iter().enumerate() {
        doc.append(
            root,
            Element::new("section")
                .id(section)
                .rect(Rect::new(56.0 + i as f64 * 800.0, 0.0, 1280.0, 800.0)),
        );
    }
    doc
}

/// [`nav_document`] plus an accordion block holding a three-image gallery,
/// a media slot, a contact card, the lightbox modal and the footer year.
pub fn portfolio_document() -> Document {
    let mut doc = nav_document();
    let root = doc.root();
    let work = doc.find_id("work").unwrap();

    let block = doc.append(
        work,
        Element::new("div")
            .class(class::ACCORDION_BLOCK)
            .rect(Rect::new(120.0, 0.0, 1280.0, 300.0)),
    );
    doc.append(
        block,
        Element::new("button")
            .class(class::ACCORDION_HEADER)
            .attr("aria-expanded", "true"),
    );
    let body = doc.append(
        block,
        Element::new("div")
            .class(class::ACCORDION_BODY)
            .scroll_height(240.0),
    );
    for index in 0..3 {
        let item = doc.append(
            body,
            Element::new("figure")
                .class(class::GALLERY_ITEM)
                .attr("data-gallery", "harbour")
                .attr("data-index", &index.to_string()),
        );
        doc.append(
            item,
            Element::new("img")
                .attr("src", &format!("img/harbour-{index}.jpg"))
                .attr("alt", &format!("Harbour {index}")),
        );
    }
    let slot = doc.append(body, Element::new("div").class(class::MEDIA_SLOT));
    doc.append(
        slot,
        Element::new("video").rect(Rect::new(400.0, 0.0, 640.0, 360.0)),
    );

    let contact = doc.find_id("contact").unwrap();
    doc.append(
        contact,
        Element::new("div")
            .class(class::CONTACT_CARD)
            .rect(Rect::new(1700.0, 0.0, 400.0, 200.0)),
    );

    let lightbox = doc.append(root, Element::new("div").id(ids::LIGHTBOX));
    for id in [
        ids::LIGHTBOX_BACKDROP,
        ids::LIGHTBOX_CLOSE,
        ids::LIGHTBOX_PREV,
        ids::LIGHTBOX_NEXT,
        ids::LIGHTBOX_CAPTION,
        ids::LIGHTBOX_COUNTER,
    ] {
        doc.append(lightbox, Element::new("div").id(id));
    }
    doc.append(lightbox, Element::new("img").id(ids::LIGHTBOX_IMG));

    let footer = doc.append(root, Element::new("footer"));
    doc.append(footer, Element::new("span").id(ids::FOOTER_YEAR));
    doc
}

/// Append `gallery` members declaring the given `data-index` values to the
/// end of the document, each wrapping one image.
pub fn add_gallery(doc: &mut Document, gallery: &str, indices: &[&str]) -> Vec<NodeId> {
    let root = doc.root();
    indices
        .iter()
        .map(|index| {
            let item = doc.append(
                root,
                Element::new("figure")
                    .class(class::GALLERY_ITEM)
                    .attr("data-gallery", gallery)
                    .attr("data-index", index),
            );
            doc.append(
                item,
                Element::new("img")
                    .attr("src", &format!("img/{gallery}-{index}.jpg"))
                    .attr("alt", &format!("{gallery} {index}")),
            );
            item
        })
        .collect()
}

/// Node by id. Panics if not found.
pub fn node(doc: &Document, id: &str) -> NodeId {
    doc.find_id(id)
        .unwrap_or_else(|| panic!("no element with id {id:?}"))
}

//! Portfolio content model.
//!
//! A site is one TOML file: page title, owner, the navigation tree and an
//! ordered list of sections. Each section has a kind that decides how its
//! blocks are rendered (accordion entries for projects, cards for contact,
//! and so on). Block bodies are markdown.
//!
//! ```toml
//! title = "Ada Example | Portfolio"
//! owner = "Ada Example"
//!
//! [[nav]]
//! label = "Work"
//! href = "#work"
//! children = [{ label = "Harbour", href = "#work" }]
//!
//! [[sections]]
//! id = "work"
//! heading = "Selected work"
//! kind = "projects"
//!
//! [[sections.blocks]]
//! title = "Harbour"
//! body = "Long-exposure series."
//! gallery = { id = "harbour", images = [{ src = "img/h1.jpg", alt = "Pier" }] }
//! ```
//!
//! [`validate`] checks the cross references the page behavior relies on:
//! unique section and gallery ids, non-empty galleries, and nav anchors
//! that point at an existing section.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("duplicate section id {0:?}")]
    DuplicateSection(String),
    #[error("duplicate gallery id {0:?}")]
    DuplicateGallery(String),
    #[error("gallery {0:?} has no images")]
    EmptyGallery(String),
    #[error("nav entry {label:?} points at missing section {href:?}")]
    UnknownAnchor { label: String, href: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Site {
    pub title: String,
    pub owner: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub nav: Vec<NavEntry>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavEntry {
    pub label: String,
    pub href: String,
    /// Submenu entries; a non-empty list turns the entry into a dropdown.
    #[serde(default)]
    pub children: Vec<NavEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    About,
    Projects,
    Skills,
    Contact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Section {
    pub id: String,
    pub heading: String,
    pub kind: SectionKind,
    /// Markdown shown above the blocks.
    #[serde(default)]
    pub intro: Option<String>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    pub title: String,
    /// Markdown.
    #[serde(default)]
    pub body: String,
    /// Accordion entries only: start expanded.
    #[serde(default)]
    pub open: bool,
    #[serde(default)]
    pub gallery: Option<Gallery>,
    /// Autoplaying clip shown in a media slot.
    #[serde(default)]
    pub video: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Gallery {
    pub id: String,
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Image {
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

impl Site {
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn galleries(&self) -> impl Iterator<Item = &Gallery> {
        self.sections
            .iter()
            .flat_map(|s| &s.blocks)
            .filter_map(|b| b.gallery.as_ref())
    }

    pub fn videos(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .flat_map(|s| &s.blocks)
            .filter_map(|b| b.video.as_deref())
    }
}

pub fn parse_site(content: &str) -> Result<Site, SiteError> {
    let site: Site = toml::from_str(content)?;
    validate(&site)?;
    Ok(site)
}

pub fn load_site(path: &Path) -> Result<Site, SiteError> {
    let content = fs::read_to_string(path)?;
    parse_site(&content)
}

pub fn validate(site: &Site) -> Result<(), SiteError> {
    let mut sections = HashSet::new();
    for section in &site.sections {
        if !sections.insert(section.id.as_str()) {
            return Err(SiteError::DuplicateSection(section.id.clone()));
        }
    }

    let mut galleries = HashSet::new();
    for gallery in site.galleries() {
        if !galleries.insert(gallery.id.as_str()) {
            return Err(SiteError::DuplicateGallery(gallery.id.clone()));
        }
        if gallery.images.is_empty() {
            return Err(SiteError::EmptyGallery(gallery.id.clone()));
        }
    }

    let entries = site.nav.iter().flat_map(|e| std::iter::once(e).chain(&e.children));
    for entry in entries {
        let Some(anchor) = entry.href.strip_prefix('#') else {
            continue;
        };
        if !anchor.is_empty() && !sections.contains(anchor) {
            return Err(SiteError::UnknownAnchor {
                label: entry.label.clone(),
                href: entry.href.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{fixture_site, setup_fixtures};

    const MINIMAL: &str = r##"
title = "T"
owner = "O"

[[nav]]
label = "About"
href = "#about"

[[sections]]
id = "about"
heading = "About"
kind = "about"
"##;

    #[test]
    fn fixture_site_loads() {
        let site = fixture_site();
        assert!(site.section("work").is_some());
        assert!(site.galleries().count() >= 2);
        assert_eq!(site.videos().count(), 1);
    }

    #[test]
    fn load_from_disk() {
        let tmp = setup_fixtures();
        let site = load_site(&tmp.path().join("site.toml")).unwrap();
        assert_eq!(site, fixture_site());
    }

    #[test]
    fn minimal_site_parses() {
        let site = parse_site(MINIMAL).unwrap();
        assert_eq!(site.sections[0].kind, SectionKind::About);
        assert!(site.sections[0].blocks.is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let content = format!("{MINIMAL}\ncolour = \"red\"\n");
        assert!(matches!(parse_site(&content), Err(SiteError::Toml(_))));
    }

    #[test]
    fn nav_anchor_must_exist() {
        let content = MINIMAL.replace("href = \"#about\"", "href = \"#nowhere\"");
        assert!(matches!(
            parse_site(&content),
            Err(SiteError::UnknownAnchor { href, .. }) if href == "#nowhere"
        ));
    }

    #[test]
    fn bare_hash_and_external_links_are_fine() {
        let mut site = parse_site(MINIMAL).unwrap();
        site.nav[0].children = vec![
            NavEntry {
                label: "Top".into(),
                href: "#".into(),
                children: vec![],
            },
            NavEntry {
                label: "Blog".into(),
                href: "https://example.com".into(),
                children: vec![],
            },
        ];
        assert!(validate(&site).is_ok());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut site = fixture_site();
        let copy = site.sections[0].clone();
        site.sections.push(copy);
        assert!(matches!(validate(&site), Err(SiteError::DuplicateSection(_))));

        let mut site = fixture_site();
        let gallery = site.galleries().next().unwrap().clone();
        site.sections[0].blocks.push(Block {
            title: "again".into(),
            body: String::new(),
            open: false,
            gallery: Some(gallery),
            video: None,
        });
        assert!(matches!(validate(&site), Err(SiteError::DuplicateGallery(_))));
    }

    #[test]
    fn empty_gallery_is_rejected() {
        let mut site = fixture_site();
        site.sections[0].blocks.push(Block {
            title: "empty".into(),
            body: String::new(),
            open: false,
            gallery: Some(Gallery {
                id: "nothing".into(),
                images: vec![],
            }),
            video: None,
        });
        assert!(matches!(validate(&site), Err(SiteError::EmptyGallery(id)) if id == "nothing"));
    }
}

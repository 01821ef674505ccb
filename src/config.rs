//! Behavior configuration.
//!
//! Every tunable the controllers use (scroll thresholds, breakpoints,
//! animation durations, observer thresholds, stagger timing) lives in
//! [`BehaviorConfig`]. The stock values reproduce the reference page; a
//! `behavior.toml` overrides any subset of them.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [navigation]
//! scrolled_threshold = 40.0   # px of scroll before the navbar turns "scrolled"
//! mobile_breakpoint = 768.0   # viewport width at or below which submenus open on tap
//! active_band_top = 40.0      # % trimmed from the top of the viewport for section tracking
//! active_band_bottom = 55.0   # % trimmed from the bottom
//!
//! [accordion]
//! open_ms = 350
//! close_ms = 300
//!
//! [lightbox]
//! swipe_threshold = 40.0      # px; shorter horizontal swipes are ignored
//!
//! [reveal]
//! targets = ["accordion-block", "about-grid", "contact-card", "skills-group"]
//! threshold = 0.08
//! bottom_offset = 40.0        # px the trigger line sits above the viewport bottom
//! stagger_ms = 60
//! stagger_groups = 4
//!
//! [media]
//! visibility_threshold = 0.3
//!
//! [scroll]
//! navbar_height = 56.0
//! ```
//!
//! ## Partial Configuration
//!
//! Files are sparse. The loader merges the user table over the stock
//! defaults key by key, then deserializes with unknown keys rejected so a
//! typo fails loudly instead of being silently ignored.
//!
//! The same struct is embedded as JSON in the rendered page so the browser
//! build runs with exactly the values the page was rendered with.

use crate::observe::{Margin, ObserverOptions, RootMargin};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BehaviorConfig {
    pub navigation: NavigationConfig,
    pub accordion: AccordionConfig,
    pub lightbox: LightboxConfig,
    pub reveal: RevealConfig,
    pub media: MediaConfig,
    pub scroll: ScrollConfig,
}

impl BehaviorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fraction = |name: &str, value: f64| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::Validation(format!("{name} must be 0.0-1.0")))
            }
        };
        fraction("reveal.threshold", self.reveal.threshold)?;
        fraction("media.visibility_threshold", self.media.visibility_threshold)?;

        let distance = |name: &str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Validation(format!(
                    "{name} must be a finite, non-negative number"
                )))
            }
        };
        distance("navigation.scrolled_threshold", self.navigation.scrolled_threshold)?;
        distance("navigation.mobile_breakpoint", self.navigation.mobile_breakpoint)?;
        distance("navigation.active_band_top", self.navigation.active_band_top)?;
        distance("navigation.active_band_bottom", self.navigation.active_band_bottom)?;
        distance("lightbox.swipe_threshold", self.lightbox.swipe_threshold)?;
        distance("scroll.navbar_height", self.scroll.navbar_height)?;

        let band = self.navigation.active_band_top + self.navigation.active_band_bottom;
        if band >= 100.0 {
            return Err(ConfigError::Validation(
                "navigation.active_band_top + active_band_bottom must leave part of the viewport (< 100)".into(),
            ));
        }
        if self.reveal.stagger_groups == 0 {
            return Err(ConfigError::Validation(
                "reveal.stagger_groups must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Navbar state, mobile menu and active-section tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavigationConfig {
    /// Scroll offset (px) beyond which the navbar gets the `scrolled` class.
    pub scrolled_threshold: f64,
    /// Viewport widths at or below this use tap-to-open submenus.
    pub mobile_breakpoint: f64,
    /// Percent of the viewport height excluded above the tracking band.
    pub active_band_top: f64,
    /// Percent of the viewport height excluded below the tracking band.
    pub active_band_bottom: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            scrolled_threshold: 40.0,
            mobile_breakpoint: 768.0,
            active_band_top: 40.0,
            active_band_bottom: 55.0,
        }
    }
}

impl NavigationConfig {
    pub fn section_observer(&self) -> ObserverOptions {
        ObserverOptions {
            threshold: 0.0,
            root_margin: RootMargin {
                top: Margin::Percent(-self.active_band_top),
                right: Margin::Px(0.0),
                bottom: Margin::Percent(-self.active_band_bottom),
                left: Margin::Px(0.0),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccordionConfig {
    /// Expand transition duration.
    pub open_ms: u32,
    /// Collapse transition duration.
    pub close_ms: u32,
}

impl Default for AccordionConfig {
    fn default() -> Self {
        Self {
            open_ms: 350,
            close_ms: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightboxConfig {
    /// Horizontal travel (px) a touch must exceed to count as a swipe.
    pub swipe_threshold: f64,
}

impl Default for LightboxConfig {
    fn default() -> Self {
        Self {
            swipe_threshold: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RevealConfig {
    /// Class names of the blocks that animate in.
    pub targets: Vec<String>,
    /// Visible fraction that triggers the reveal.
    pub threshold: f64,
    /// Distance (px) the trigger line is raised from the viewport bottom.
    pub bottom_offset: f64,
    /// Delay step between items revealed in the same batch.
    pub stagger_ms: u32,
    /// Batch positions cycle through this many delay steps.
    pub stagger_groups: usize,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            targets: vec![
                "accordion-block".to_string(),
                "about-grid".to_string(),
                "contact-card".to_string(),
                "skills-group".to_string(),
            ],
            threshold: 0.08,
            bottom_offset: 40.0,
            stagger_ms: 60,
            stagger_groups: 4,
        }
    }
}

impl RevealConfig {
    pub fn observer(&self) -> ObserverOptions {
        ObserverOptions {
            threshold: self.threshold,
            root_margin: RootMargin {
                bottom: Margin::Px(-self.bottom_offset),
                ..RootMargin::default()
            },
        }
    }

    /// Delay for the entry at `position` within one intersection batch.
    pub fn delay_for(&self, position: usize) -> u32 {
        (position % self.stagger_groups.max(1)) as u32 * self.stagger_ms
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaConfig {
    /// Visible fraction above which slot videos play.
    pub visibility_threshold: f64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.3,
        }
    }
}

impl MediaConfig {
    pub fn observer(&self) -> ObserverOptions {
        ObserverOptions {
            threshold: self.visibility_threshold,
            root_margin: RootMargin::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScrollConfig {
    /// Height of the fixed navbar subtracted from anchor scroll targets.
    pub navbar_height: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            navbar_height: 56.0,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Stock defaults as a TOML table, the base layer for user overrides.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(BehaviorConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<BehaviorConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BehaviorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a behavior config file. `None` yields the stock defaults.
pub fn load_config(path: Option<&Path>) -> Result<BehaviorConfig, ConfigError> {
    let overlay = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    resolve_config(overlay)
}

/// CSS custom properties derived from the config, prepended to the
/// stylesheet so the CSS animations agree with the controllers' timing.
pub fn generate_behavior_css(config: &BehaviorConfig) -> String {
    format!(
        r#":root {{
    --nav-height: {nav_height}px;
    --accordion-open: {open}ms;
    --accordion-close: {close}ms;
    --reveal-step: {step}ms;
}}"#,
        nav_height = config.scroll.navbar_height,
        open = config.accordion.open_ms,
        close = config.accordion.close_ms,
        step = config.reveal.stagger_ms,
    )
}

/// Fully commented stock `behavior.toml`, printed by `lowkey gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Lowkey Behavior Configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Navigation bar
# ---------------------------------------------------------------------------
[navigation]
# Scroll offset (px) past which the navbar gets its "scrolled" shadow.
scrolled_threshold = 40.0

# Viewport widths at or below this open submenus on tap.
mobile_breakpoint = 768.0

# The active nav link follows the section inside a horizontal band of the
# viewport. These trim the band from the top and bottom (percent of height).
active_band_top = 40.0
active_band_bottom = 55.0

# ---------------------------------------------------------------------------
# Accordion blocks
# ---------------------------------------------------------------------------
[accordion]
# Expand / collapse animation durations (ms).
open_ms = 350
close_ms = 300

# ---------------------------------------------------------------------------
# Lightbox
# ---------------------------------------------------------------------------
[lightbox]
# Minimum horizontal swipe distance (px). Swipes of exactly this length
# are ignored.
swipe_threshold = 40.0

# ---------------------------------------------------------------------------
# Scroll reveal
# ---------------------------------------------------------------------------
[reveal]
# Class names of blocks that fade in when scrolled into view.
targets = ["accordion-block", "about-grid", "contact-card", "skills-group"]

# Fraction of a block that must be visible (0.0-1.0).
threshold = 0.08

# The trigger line sits this many px above the bottom of the viewport.
bottom_offset = 40.0

# Blocks revealed together are staggered by stagger_ms, cycling every
# stagger_groups blocks.
stagger_ms = 60
stagger_groups = 4

# ---------------------------------------------------------------------------
# Media slots
# ---------------------------------------------------------------------------
[media]
# Fraction of a video that must be visible for it to play (0.0-1.0).
visibility_threshold = 0.3

# ---------------------------------------------------------------------------
# Anchor scrolling
# ---------------------------------------------------------------------------
[scroll]
# Fixed navbar height (px) kept clear above anchor targets.
navbar_height = 56.0
"##
}

//! Autoplaying videos inside `.media-slot` containers.
//!
//! Each video is made muted, looping and inline at bind time, then plays
//! while enough of it is on screen and pauses otherwise. A refused `play`
//! is expected (autoplay policies) and only traced.

use crate::config::MediaConfig;
use crate::host::{Channel, Host};
use crate::observe::Intersection;
use crate::types::class;

#[derive(Debug, Clone)]
pub struct MediaSlots<N> {
    videos: Vec<N>,
}

impl<N: Clone + PartialEq + std::fmt::Debug> MediaSlots<N> {
    pub fn bind<H: Host<Node = N>>(host: &mut H, config: &MediaConfig) -> Self {
        let videos: Vec<N> = host
            .by_class(class::MEDIA_SLOT)
            .iter()
            .flat_map(|slot| host.descendants_by_tag(slot, "video"))
            .collect();
        let options = config.observer();
        for video in &videos {
            host.prepare_inline_video(video);
            host.observe(Channel::MediaSlots, &options, video);
        }
        Self { videos }
    }

    pub fn videos(&self) -> &[N] {
        &self.videos
    }

    pub fn on_intersections<H: Host<Node = N>>(&mut self, host: &mut H, entries: &[Intersection<N>]) {
        for entry in entries {
            if !self.videos.contains(&entry.target) {
                continue;
            }
            if entry.visible {
                if let Err(err) = host.play(&entry.target) {
                    tracing::trace!(%err, video = ?entry.target, "playback refused");
                }
            } else {
                host.pause(&entry.target);
            }
        }
    }
}

//! Track metadata snapshots
//!
//! A `TrackInfo` is an immutable snapshot of the stream currently loaded in
//! the engine. Its identity key is `stream_url`. Inbound requests carry a
//! `TrackPatch`; applying a patch yields a new snapshot only when at least
//! one field actually differs, which is what gates metadata-changed events.

use serde::{Deserialize, Serialize};

/// Details about one media stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Title of the media stream
    pub title: Option<String>,
    /// Short description of the media stream
    pub description: Option<String>,
    /// Icon/art image URI, local file or URL
    pub art_uri: Option<String>,
    /// Media stream URL (identity key)
    pub stream_url: String,
}

impl TrackInfo {
    /// True when `url` names the same stream as this snapshot.
    pub fn same_stream(&self, url: &str) -> bool {
        self.stream_url.eq_ignore_ascii_case(url)
    }
}

/// Partial track update carried by Play and notification-style requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub art_uri: Option<String>,
    pub stream_url: Option<String>,
}

impl TrackPatch {
    /// Apply this patch to the current snapshot.
    ///
    /// Returns the replacement snapshot when anything changed, `None` when
    /// the patch is a no-op. A patch that names a stream URL replaces the
    /// whole snapshot (absent metadata fields become `None`, which counts as
    /// a change against a non-`None` value). A patch without a URL updates
    /// only the fields it provides, and cannot create a snapshot from
    /// nothing.
    pub fn apply(&self, current: Option<&TrackInfo>) -> Option<TrackInfo> {
        let candidate = match (&self.stream_url, current) {
            (Some(url), _) => TrackInfo {
                title: self.title.clone(),
                description: self.description.clone(),
                art_uri: self.art_uri.clone(),
                stream_url: url.clone(),
            },
            (None, Some(existing)) => TrackInfo {
                title: self.title.clone().or_else(|| existing.title.clone()),
                description: self
                    .description
                    .clone()
                    .or_else(|| existing.description.clone()),
                art_uri: self.art_uri.clone().or_else(|| existing.art_uri.clone()),
                stream_url: existing.stream_url.clone(),
            },
            (None, None) => return None,
        };

        if current != Some(&candidate) {
            Some(candidate)
        } else {
            None
        }
    }
}

//! Media descriptors shared by the session and its control surface
//!
//! - `MediaInfo`: source + metadata + duration of a loaded (or pending) source
//! - `MediaMetadata`: fields extracted from the controller's metadata JSON
//! - `MediaKind`: video/audio/image resolution from the MIME hint or URI extension

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "3gp", "m4v"];
const AUDIO_EXTENSIONS: &[&str] = &["m4a", "mp3", "ogg", "wav", "aac", "wma", "flac"];
const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "bmp"];

/// Descriptor of the currently (or about-to-be) loaded source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Source URI as given by the controller
    pub source: String,
    /// Raw metadata JSON as given by the controller
    pub metadata: String,
    /// Duration in milliseconds, `None` until the decoder reports it
    pub duration_ms: Option<i64>,
}

impl MediaInfo {
    pub fn pending(source: &str, metadata: &str) -> Self {
        Self {
            source: source.to_string(),
            metadata: metadata.to_string(),
            duration_ms: None,
        }
    }

    /// Copy of this info with a known duration
    pub fn with_duration(&self, duration_ms: i64) -> Self {
        Self {
            duration_ms: Some(duration_ms),
            ..self.clone()
        }
    }
}

/// Fields consumed from the metadata JSON object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    pub title: String,
    /// MIME-like hint (`video/mp4`, `image/png`, ...)
    #[serde(rename = "type", default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Rest period after this item, in seconds
    #[serde(default)]
    pub rest_period_after: Option<i64>,
}

impl MediaMetadata {
    /// Parse the controller's metadata JSON
    ///
    /// `title` is required; everything else is optional.
    pub fn parse(metadata_json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(metadata_json)?;
        if !value.is_object() {
            return Err(Error::InvalidInput(
                "metadata must be a JSON object".to_string(),
            ));
        }
        if !value.get("title").map(|t| t.is_string()).unwrap_or(false) {
            return Err(Error::InvalidInput(
                "metadata is missing required string field 'title'".to_string(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Kind of media a source resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
}

impl MediaKind {
    /// Resolve the media kind of a source
    ///
    /// An explicit `video/`, `audio/` or `image/` prefix in the type hint wins;
    /// otherwise the extension of the URI path is looked up. Query strings and
    /// fragments are ignored for the extension lookup.
    pub fn resolve(media_type: Option<&str>, uri: &str) -> Result<Self> {
        if let Some(kind) = media_type.and_then(Self::from_mime) {
            return Ok(kind);
        }

        uri_extension(uri)
            .and_then(|ext| Self::from_extension(&ext))
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Wrong media type for '{}', expected video/, audio/ or image/",
                    uri
                ))
            })
    }

    /// Kind from a MIME type prefix
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        if mime.starts_with("video/") {
            Some(MediaKind::Video)
        } else if mime.starts_with("audio/") {
            Some(MediaKind::Audio)
        } else if mime.starts_with("image/") {
            Some(MediaKind::Image)
        } else {
            None
        }
    }

    /// Kind from a lowercase file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        if VIDEO_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Video)
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Audio)
        } else if IMAGE_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Image)
        } else {
            None
        }
    }

    pub fn is_image(self) -> bool {
        self == MediaKind::Image
    }
}

/// Lowercase extension of the last path segment of a URI
pub fn uri_extension(uri: &str) -> Option<String> {
    let without_fragment = uri.split('#').next().unwrap_or(uri);
    let path = without_fragment.split('?').next().unwrap_or(without_fragment);
    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_requires_title() {
        let meta = MediaMetadata::parse(r#"{"title":"A"}"#).unwrap();
        assert_eq!(meta.title, "A");
        assert!(meta.media_type.is_none());

        assert!(MediaMetadata::parse(r#"{"description":"no title"}"#).is_err());
        assert!(MediaMetadata::parse(r#"{"title":5}"#).is_err());
        assert!(MediaMetadata::parse("not json").is_err());
        assert!(MediaMetadata::parse(r#"["title"]"#).is_err());
    }

    #[test]
    fn test_metadata_optional_fields() {
        let meta = MediaMetadata::parse(
            r#"{"title":"Squats","type":"video/mp4","description":"Set 1","restPeriodAfter":30}"#,
        )
        .unwrap();
        assert_eq!(meta.media_type.as_deref(), Some("video/mp4"));
        assert_eq!(meta.description.as_deref(), Some("Set 1"));
        assert_eq!(meta.rest_period_after, Some(30));
    }

    #[test]
    fn test_resolve_prefers_mime_prefix() {
        // Extension says audio, explicit type says video
        assert_eq!(
            MediaKind::resolve(Some("video/mp4"), "http://x/a.mp3").unwrap(),
            MediaKind::Video
        );
        assert_eq!(
            MediaKind::resolve(Some("image/png"), "http://x/stream").unwrap(),
            MediaKind::Image
        );
    }

    #[test]
    fn test_resolve_falls_back_to_extension() {
        assert_eq!(MediaKind::resolve(None, "http://x/a.mp4").unwrap(), MediaKind::Video);
        assert_eq!(MediaKind::resolve(Some(""), "http://x/a.FLAC").unwrap(), MediaKind::Audio);
        assert_eq!(
            MediaKind::resolve(Some("application/octet-stream"), "http://x/pic.jpg").unwrap(),
            MediaKind::Image
        );
        assert_eq!(
            MediaKind::resolve(None, "http://x/a.m4a?token=abc#t=10").unwrap(),
            MediaKind::Audio
        );
    }

    #[test]
    fn test_resolve_rejects_unknown() {
        assert!(MediaKind::resolve(None, "http://x/playlist.m3u8").is_err());
        assert!(MediaKind::resolve(None, "http://x/noextension").is_err());
        assert!(MediaKind::resolve(Some("text/html"), "http://x.example/").is_err());
    }

    #[test]
    fn test_uri_extension() {
        assert_eq!(uri_extension("http://x/a.mp4").as_deref(), Some("mp4"));
        assert_eq!(uri_extension("http://x.example/dir/").as_deref(), None);
        assert_eq!(uri_extension("file:///tmp/clip.3GP").as_deref(), Some("3gp"));
        assert_eq!(uri_extension("http://x/a.").as_deref(), None);
    }

    #[test]
    fn test_media_info_with_duration() {
        let pending = MediaInfo::pending("http://x/a.mp4", r#"{"title":"A"}"#);
        assert_eq!(pending.duration_ms, None);
        let current = pending.with_duration(120_000);
        assert_eq!(current.source, "http://x/a.mp4");
        assert_eq!(current.duration_ms, Some(120_000));
    }
}

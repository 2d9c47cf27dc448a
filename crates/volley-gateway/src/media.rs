// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media inference from a bare URL: file name, MIME type, and media kind.

use url::Url;
use volley_core::MediaKind;

/// Name used when the URL path has no usable final segment.
pub const FALLBACK_FILE_NAME: &str = "file";

/// MIME type used when the extension is unknown.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

const MIME_TYPES: &[(&str, &str)] = &[
    // images
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("svg", "image/svg+xml"),
    ("ico", "image/vnd.microsoft.icon"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    // video
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("mpeg", "video/mpeg"),
    ("mpg", "video/mpeg"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    ("webm", "video/webm"),
    ("mkv", "video/x-matroska"),
    ("3gp", "video/3gpp"),
    // audio
    ("mp3", "audio/mpeg"),
    ("ogg", "audio/ogg"),
    ("oga", "audio/ogg"),
    ("opus", "audio/opus"),
    ("wav", "audio/wav"),
    ("m4a", "audio/mp4"),
    ("aac", "audio/aac"),
    ("amr", "audio/amr"),
    ("flac", "audio/flac"),
    // documents
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("zip", "application/zip"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("html", "text/html"),
    ("htm", "text/html"),
];

/// URL-decoded final path segment of `media_url`, or [`FALLBACK_FILE_NAME`].
///
/// Query strings and fragments are ignored. Inputs that do not parse as an
/// absolute URL are treated as a bare path.
pub fn file_name_from_url(media_url: &str) -> String {
    let path = match Url::parse(media_url) {
        Ok(url) => url.path().to_string(),
        Err(_) => media_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    let segment = path.rsplit('/').next().unwrap_or_default();
    let bytes = urlencoding::decode_binary(segment.as_bytes());
    let decoded = String::from_utf8_lossy(&bytes);
    if decoded.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        decoded.into_owned()
    }
}

/// Guesses a MIME type from the file name's extension.
pub fn guess_mime_type(file_name: &str) -> &'static str {
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return FALLBACK_MIME_TYPE;
    };
    let ext = ext.to_ascii_lowercase();
    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(FALLBACK_MIME_TYPE)
}

/// Coarse media kind for a MIME type, falling back to the declared kind and
/// then to [`MediaKind::Document`].
///
/// The octet-stream fallback contains `application` and therefore classifies
/// as a document before the declared kind is consulted.
pub fn classify_media_kind(mime_type: &str, declared: Option<MediaKind>) -> MediaKind {
    if ["pdf", "application", "text"]
        .iter()
        .any(|needle| mime_type.contains(needle))
    {
        MediaKind::Document
    } else if mime_type.contains("video") {
        MediaKind::Video
    } else if mime_type.contains("audio") {
        MediaKind::Audio
    } else if mime_type.contains("image") {
        MediaKind::Image
    } else {
        declared.unwrap_or(MediaKind::Document)
    }
}

/// Everything the media-send request needs to know about an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    pub file_name: String,
    pub mime_type: String,
    pub kind: MediaKind,
}

impl MediaInfo {
    pub fn infer(media_url: &str, declared: Option<MediaKind>) -> Self {
        let file_name = file_name_from_url(media_url);
        let mime_type = guess_mime_type(&file_name);
        Self {
            kind: classify_media_kind(mime_type, declared),
            mime_type: mime_type.to_string(),
            file_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_decoded_basename() {
        assert_eq!(
            file_name_from_url("https://cdn.example.com/docs/report%20final.pdf"),
            "report final.pdf"
        );
        assert_eq!(
            file_name_from_url("https://cdn.example.com/a/b/photo.JPG?sig=abc#frag"),
            "photo.JPG"
        );
    }

    #[test]
    fn file_name_falls_back() {
        assert_eq!(file_name_from_url("https://cdn.example.com/"), "file");
        assert_eq!(file_name_from_url("https://cdn.example.com"), "file");
        assert_eq!(file_name_from_url(""), "file");
        assert_eq!(file_name_from_url("relative/clip.mp4?x=1"), "clip.mp4");
    }

    #[test]
    fn mime_type_from_extension() {
        assert_eq!(guess_mime_type("report final.pdf"), "application/pdf");
        assert_eq!(guess_mime_type("photo.JPG"), "image/jpeg");
        assert_eq!(guess_mime_type("clip.mp4"), "video/mp4");
        assert_eq!(guess_mime_type("note.ogg"), "audio/ogg");
        assert_eq!(guess_mime_type("notes.txt"), "text/plain");
        assert_eq!(guess_mime_type("file"), FALLBACK_MIME_TYPE);
        assert_eq!(guess_mime_type("archive.weird"), FALLBACK_MIME_TYPE);
    }

    #[test]
    fn classification_order() {
        assert_eq!(classify_media_kind("application/pdf", None), MediaKind::Document);
        assert_eq!(classify_media_kind("text/csv", Some(MediaKind::Image)), MediaKind::Document);
        assert_eq!(classify_media_kind("video/mp4", None), MediaKind::Video);
        assert_eq!(classify_media_kind("audio/mpeg", None), MediaKind::Audio);
        assert_eq!(classify_media_kind("image/svg+xml", None), MediaKind::Image);
        assert_eq!(
            classify_media_kind("chemical/x-pdb", Some(MediaKind::Audio)),
            MediaKind::Audio
        );
        assert_eq!(classify_media_kind("chemical/x-pdb", None), MediaKind::Document);
    }

    #[test]
    fn unknown_extension_is_a_document_even_when_declared_otherwise() {
        let info = MediaInfo::infer("https://x.test/download", Some(MediaKind::Image));
        assert_eq!(info.file_name, "download");
        assert_eq!(info.mime_type, FALLBACK_MIME_TYPE);
        assert_eq!(info.kind, MediaKind::Document);
    }
}

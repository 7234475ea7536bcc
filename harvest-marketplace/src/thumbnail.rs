//! Collection thumbnails: downloaded bytes plus the detected image format.
//!
//! The bytes are uploaded exactly as served, so the format tag only drives the
//! multipart file name and mime type. Detection looks at magic bytes first,
//! then the `content-type` header, then the URL's file extension.
use bytes::Bytes;
use harvest_http::RawResponse;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    /// Lowercase tag used for the file extension and mime subtype.
    pub fn tag(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
        }
    }

    pub fn mime(self) -> String {
        format!("image/{}", self.tag())
    }

    /// Recognise the format from the leading bytes of the image.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else {
            None
        }
    }

    /// Map an `image/<subtype>` mime type onto a supported format.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next()?.trim().to_ascii_lowercase();
        match essence.strip_prefix("image/")? {
            "png" => Some(ImageFormat::Png),
            "jpeg" | "jpg" | "pjpeg" => Some(ImageFormat::Jpeg),
            "gif" => Some(ImageFormat::Gif),
            "webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ThumbnailError {
    #[error("image element `{selector}` has no src")]
    MissingSource { selector: String },
    #[error("thumbnail at {url} is empty")]
    Empty { url: String },
    #[error("thumbnail at {url} is not a supported image (content-type: {content_type})")]
    UnsupportedFormat { url: String, content_type: String },
}

#[derive(Debug, Clone)]
pub struct Thumbnail {
    bytes: Bytes,
    format: ImageFormat,
}

impl Thumbnail {
    pub fn new(bytes: impl Into<Bytes>, format: ImageFormat) -> Self {
        Self {
            bytes: bytes.into(),
            format,
        }
    }

    /// Build a thumbnail from a downloaded image.
    pub fn from_response(url: &str, resp: RawResponse) -> Result<Self, ThumbnailError> {
        if resp.body.is_empty() {
            return Err(ThumbnailError::Empty { url: url.to_string() });
        }
        let format = ImageFormat::sniff(&resp.body)
            .or_else(|| resp.content_type().and_then(ImageFormat::from_mime))
            .or_else(|| format_from_url(url))
            .ok_or_else(|| ThumbnailError::UnsupportedFormat {
                url: url.to_string(),
                content_type: resp.content_type().unwrap_or("-").to_string(),
            })?;
        Ok(Self::new(resp.body, format))
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Multipart file name, e.g. `thumbnail.png`.
    pub fn file_name(&self) -> String {
        format!("thumbnail.{}", self.format)
    }
}

fn format_from_url(url: &str) -> Option<ImageFormat> {
    let path = url::Url::parse(url).ok()?.path().to_string();
    mime_guess::from_path(path)
        .iter()
        .find_map(|mime| ImageFormat::from_mime(mime.essence_str()))
}

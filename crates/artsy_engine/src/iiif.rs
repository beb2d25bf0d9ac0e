use std::fmt;
use std::str::FromStr;

use crate::Artwork;

/// IIIF size parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    /// Full resolution.
    #[default]
    Max,
    /// Fit within a `W x H` box, keeping the aspect ratio (`!W,H`).
    Fit { width: u32, height: u32 },
    /// Fixed width, proportional height (`W,`).
    Width(u32),
    /// Fixed height, proportional width (`,H`).
    Height(u32),
    /// Percentage of the original size (`pct:N`).
    Percent(u32),
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSize::Max => write!(f, "max"),
            ImageSize::Fit { width, height } => write!(f, "!{width},{height}"),
            ImageSize::Width(width) => write!(f, "{width},"),
            ImageSize::Height(height) => write!(f, ",{height}"),
            ImageSize::Percent(pct) => write!(f, "pct:{pct}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid IIIF size token {0:?}")]
pub struct ParseImageSizeError(String);

impl FromStr for ImageSize {
    type Err = ParseImageSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let invalid = || ParseImageSizeError(s.to_string());
        let number = |text: &str| text.parse::<u32>().map_err(|_| invalid());

        if token == "max" || token == "full" {
            return Ok(ImageSize::Max);
        }
        if let Some(pct) = token.strip_prefix("pct:") {
            return Ok(ImageSize::Percent(number(pct)?));
        }
        if let Some(rest) = token.strip_prefix('!') {
            let (width, height) = rest.split_once(',').ok_or_else(invalid)?;
            return Ok(ImageSize::Fit {
                width: number(width)?,
                height: number(height)?,
            });
        }
        match token.split_once(',') {
            Some((width, "")) => Ok(ImageSize::Width(number(width)?)),
            Some(("", height)) => Ok(ImageSize::Height(number(height)?)),
            _ => Err(invalid()),
        }
    }
}

/// `{base}{identifier}/full/{size}/0/default.jpg`
pub fn iiif_url(base: &str, image_id: &str, size: ImageSize) -> String {
    let separator = if base.ends_with('/') { "" } else { "/" };
    format!("{base}{separator}{image_id}/full/{size}/0/default.jpg")
}

impl Artwork {
    /// Primary image first, then the alternates.
    pub fn image_urls(&self, base: &str, size: ImageSize) -> Vec<String> {
        self.image_id
            .iter()
            .chain(self.alt_image_ids.iter())
            .map(|id| iiif_url(base, id, size))
            .collect()
    }
}

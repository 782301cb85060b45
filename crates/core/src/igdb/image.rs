//! IGDB image CDN URLs.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Default IGDB image host.
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://images.igdb.com";

const HIGH_DENSITY_SUFFIX: &str = "_2x";

/// Named image presets served by the CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    CoverSmall,
    ScreenshotMed,
    #[default]
    CoverBig,
    LogoMed,
    ScreenshotBig,
    ScreenshotHuge,
    Thumb,
    Micro,
    Hd720,
    Hd1080,
}

impl ImageSize {
    pub const ALL: [ImageSize; 10] = [
        ImageSize::CoverSmall,
        ImageSize::ScreenshotMed,
        ImageSize::CoverBig,
        ImageSize::LogoMed,
        ImageSize::ScreenshotBig,
        ImageSize::ScreenshotHuge,
        ImageSize::Thumb,
        ImageSize::Micro,
        ImageSize::Hd720,
        ImageSize::Hd1080,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::CoverSmall => "cover_small",
            ImageSize::ScreenshotMed => "screenshot_med",
            ImageSize::CoverBig => "cover_big",
            ImageSize::LogoMed => "logo_med",
            ImageSize::ScreenshotBig => "screenshot_big",
            ImageSize::ScreenshotHuge => "screenshot_huge",
            ImageSize::Thumb => "thumb",
            ImageSize::Micro => "micro",
            ImageSize::Hd720 => "720p",
            ImageSize::Hd1080 => "1080p",
        }
    }

    /// The double-density (`_2x`) variant of this preset.
    pub fn retina(self) -> ImageVariant {
        ImageVariant {
            size: self,
            high_density: true,
        }
    }
}

/// A preset plus its optional high-density suffix, e.g. `cover_big_2x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageVariant {
    pub size: ImageSize,
    pub high_density: bool,
}

impl From<ImageSize> for ImageVariant {
    fn from(size: ImageSize) -> Self {
        Self {
            size,
            high_density: false,
        }
    }
}

impl fmt::Display for ImageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.high_density {
            write!(f, "{}{}", self.size.as_str(), HIGH_DENSITY_SUFFIX)
        } else {
            f.write_str(self.size.as_str())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown image size '{0}'")]
pub struct UnknownImageSize(pub String);

impl FromStr for ImageVariant {
    type Err = UnknownImageSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, high_density) = match s.strip_suffix(HIGH_DENSITY_SUFFIX) {
            Some(name) => (name, true),
            None => (s, false),
        };
        ImageSize::ALL
            .iter()
            .find(|size| size.as_str() == name)
            .map(|size| ImageVariant {
                size: *size,
                high_density,
            })
            .ok_or_else(|| UnknownImageSize(s.to_string()))
    }
}

/// `{base_url}/igdb/image/upload/t_{size}/{image_id}.jpg`
pub fn image_url(base_url: &str, image_id: &str, variant: impl Into<ImageVariant>) -> String {
    format!(
        "{}/igdb/image/upload/t_{}/{}.jpg",
        base_url.trim_end_matches('/'),
        variant.into(),
        image_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_cdn_url() {
        assert_eq!(
            image_url(DEFAULT_IMAGE_BASE_URL, "co5vmg", ImageSize::CoverBig),
            "https://images.igdb.com/igdb/image/upload/t_cover_big/co5vmg.jpg"
        );
        assert_eq!(
            image_url("https://images.igdb.com/", "ar1x", ImageSize::CoverBig.retina()),
            "https://images.igdb.com/igdb/image/upload/t_cover_big_2x/ar1x.jpg"
        );
        assert_eq!(
            image_url(DEFAULT_IMAGE_BASE_URL, "sc1", ImageSize::Hd1080),
            "https://images.igdb.com/igdb/image/upload/t_1080p/sc1.jpg"
        );
    }

    #[test]
    fn default_is_cover_big() {
        assert_eq!(ImageVariant::default().to_string(), "cover_big");
    }

    #[test]
    fn parses_names_with_and_without_suffix() {
        assert_eq!(
            "720p_2x".parse::<ImageVariant>(),
            Ok(ImageSize::Hd720.retina())
        );
        assert_eq!(
            "thumb".parse::<ImageVariant>(),
            Ok(ImageVariant::from(ImageSize::Thumb))
        );
        assert!("poster".parse::<ImageVariant>().is_err());
        for size in ImageSize::ALL {
            assert_eq!(size.retina().to_string().parse::<ImageVariant>(), Ok(size.retina()));
        }
    }

    #[test]
    fn unknown_size_names_the_input() {
        let err = "poster_2x".parse::<ImageVariant>().unwrap_err();
        assert_eq!(err, UnknownImageSize("poster_2x".to_string()));
        assert_eq!(err.to_string(), "unknown image size 'poster_2x'");
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }
}

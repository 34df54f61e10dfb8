use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::layer::{Layer, LayerId, LayerKind};

/// Base imagery style served by the remote imagery service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum ImageryStyle {
    #[default]
    AerialWithLabels,
    Aerial,
    Road,
}

impl ImageryStyle {
    pub const ALL: [ImageryStyle; 3] = [Self::AerialWithLabels, Self::Aerial, Self::Road];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AerialWithLabels => "aerial-with-labels",
            Self::Aerial => "aerial",
            Self::Road => "road",
        }
    }

    /// Asset that backs this style on the imagery service.
    pub fn asset_id(self) -> u64 {
        match self {
            Self::AerialWithLabels => 3,
            Self::Aerial => 2,
            Self::Road => 4,
        }
    }
}

impl fmt::Display for ImageryStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown imagery style `{0}` (expected aerial-with-labels, aerial or road)")]
pub struct UnknownImageryStyle(pub String);

impl FromStr for ImageryStyle {
    type Err = UnknownImageryStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == key)
            .ok_or_else(|| UnknownImageryStyle(s.to_string()))
    }
}

/// A resolved imagery source, ready to be attached as a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageryProvider {
    pub style: ImageryStyle,
    pub url: String,
    pub attributions: Vec<String>,
}

impl ImageryProvider {
    pub fn new(style: ImageryStyle, url: impl Into<String>) -> Self {
        Self {
            style,
            url: url.into(),
            attributions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterLayer {
    id: LayerId,
    pub provider: ImageryProvider,
    pub alpha: f32,
    pub show: bool,
}

impl RasterLayer {
    pub fn new(id: u64, provider: ImageryProvider) -> Self {
        Self {
            id: LayerId(id),
            provider,
            alpha: 1.0,
            show: true,
        }
    }
}

impl Layer for RasterLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Imagery
    }
}

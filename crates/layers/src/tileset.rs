use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Numeric identifier of a high-detail tileset on the asset service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TilesetAssetId(u64);

impl TilesetAssetId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Strict parse of a configuration value: surrounding whitespace is
    /// ignored, then the value must be plain decimal digits that fit a `u64`.
    ///
    /// Anything else (empty, signs, fractions, exponents) disables the
    /// tileset, so it yields `None` rather than an error.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        raw.parse::<u64>().ok().map(Self)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TilesetAssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Endpoint returned when resolving an asset id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilesetResource {
    pub asset_id: TilesetAssetId,
    pub url: String,
    pub access_token: Option<String>,
}

/// Subset of the tileset root document the viewer cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct TilesetMetadata {
    pub version: String,
    pub geometric_error: f64,
}

/// Loaded high-detail 3D content.
///
/// Destruction releases the content; it happens at most once and a destroyed
/// tileset must not be attached again. Clones refer to the same content, so
/// destroying any of them releases it for all.
#[derive(Debug, Clone, PartialEq)]
pub struct Tileset {
    asset_id: TilesetAssetId,
    url: String,
    metadata: TilesetMetadata,
    pub show: bool,
    released: Rc<Cell<bool>>,
}

impl Tileset {
    pub fn new(resource: &TilesetResource, metadata: TilesetMetadata) -> Self {
        Self {
            asset_id: resource.asset_id,
            url: resource.url.clone(),
            metadata,
            show: true,
            released: Rc::new(Cell::new(false)),
        }
    }

    pub fn asset_id(&self) -> TilesetAssetId {
        self.asset_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn metadata(&self) -> &TilesetMetadata {
        &self.metadata
    }

    pub fn is_destroyed(&self) -> bool {
        self.released.get()
    }

    /// Returns `true` only for the call that actually destroyed the content.
    pub fn destroy(&mut self) -> bool {
        !self.released.replace(true)
    }
}

#[cfg(test)]
mod tests {
    use super::{Tileset, TilesetAssetId, TilesetMetadata, TilesetResource};

    #[test]
    fn invalid_asset_ids_disable_the_tileset() {
        for raw in ["", "   ", "abc", "-1.5", "-3", "+7", "1e3", "12.0", "99999999999999999999999"] {
            assert_eq!(TilesetAssetId::parse(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn valid_asset_ids_parse() {
        assert_eq!(TilesetAssetId::parse("2275207").map(|id| id.get()), Some(2275207));
        assert_eq!(TilesetAssetId::parse(" 42\n").map(|id| id.get()), Some(42));
        assert_eq!(TilesetAssetId::parse("0").map(|id| id.get()), Some(0));
    }

    #[test]
    fn destroy_is_reported_once() {
        let resource = TilesetResource {
            asset_id: TilesetAssetId::new(1),
            url: "https://assets.example/1/tileset.json".into(),
            access_token: None,
        };
        let mut tileset = Tileset::new(
            &resource,
            TilesetMetadata {
                version: "1.0".into(),
                geometric_error: 512.0,
            },
        );
        let shared = tileset.clone();
        assert!(tileset.destroy());
        assert!(!tileset.destroy());
        assert!(tileset.is_destroyed());
        assert!(shared.is_destroyed());
    }
}

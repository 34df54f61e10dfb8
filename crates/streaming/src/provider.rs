use futures_util::future::LocalBoxFuture;
use layers::raster::{ImageryProvider, ImageryStyle};
use layers::tileset::{Tileset, TilesetAssetId, TilesetResource};
use scene::OverlayDataset;

use crate::error::LoadError;

/// Remote resources the orchestrator loads.
///
/// Futures are `'static` so they can be spawned onto the local task set
/// without borrowing the provider; implementations clone what they need.
/// Methods return boxed futures for dyn-compatibility.
pub trait ResourceProvider {
    /// Styled base imagery.
    fn imagery(&self, style: ImageryStyle) -> LocalBoxFuture<'static, Result<ImageryProvider, LoadError>>;

    /// The vector overlay feature collection at the configured path.
    fn overlay(&self) -> LocalBoxFuture<'static, Result<OverlayDataset, LoadError>>;

    /// Resolve a numeric asset id into a fetchable tileset endpoint.
    fn resolve_tileset(
        &self,
        asset_id: TilesetAssetId,
    ) -> LocalBoxFuture<'static, Result<TilesetResource, LoadError>>;

    /// Fetch the tileset root and construct the tileset.
    fn load_tileset(&self, resource: TilesetResource) -> LocalBoxFuture<'static, Result<Tileset, LoadError>>;
}

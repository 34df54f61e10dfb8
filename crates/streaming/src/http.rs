use std::path::{Path, PathBuf};

use formats::load_overlay_geojson;
use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use layers::raster::{ImageryProvider, ImageryStyle};
use layers::tileset::{Tileset, TilesetAssetId, TilesetMetadata, TilesetResource};
use scene::OverlayDataset;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::provider::ResourceProvider;

pub const DEFAULT_API_URL: &str = "https://api.cesium.com";

/// Where the overlay feature collection lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlaySource {
    File(PathBuf),
    Url(String),
}

impl OverlaySource {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Self::Url(raw.to_string())
        } else {
            Self::File(PathBuf::from(raw))
        }
    }

    /// Dataset name: the file stem, or the last URL segment.
    pub fn dataset_name(&self) -> String {
        let last = match self {
            Self::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            Self::Url(url) => url
                .split(['?', '#'])
                .next()
                .and_then(|u| u.rsplit('/').next())
                .unwrap_or_default()
                .to_string(),
        };
        let name = last
            .strip_suffix(".geojson")
            .or_else(|| last.strip_suffix(".json"))
            .unwrap_or(&last);
        if name.is_empty() {
            "overlay".to_string()
        } else {
            name.to_string()
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    pub api_url: String,
    /// Bearer token for the asset service. Empty means anonymous.
    pub access_token: String,
    pub overlay: OverlaySource,
}

/// Asset-service backed provider.
///
/// Imagery and tilesets are resolved through
/// `{api_url}/v1/assets/{id}/endpoint`; the overlay comes from a local file
/// or a plain HTTP URL.
#[derive(Debug, Clone)]
pub struct HttpResourceProvider {
    client: reqwest::Client,
    config: HttpProviderConfig,
}

impl HttpResourceProvider {
    pub fn new(config: HttpProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &HttpProviderConfig {
        &self.config
    }

    fn endpoint(&self, asset_id: u64) -> LocalBoxFuture<'static, Result<AssetEndpoint, LoadError>> {
        let client = self.client.clone();
        let url = endpoint_url(&self.config.api_url, asset_id);
        let token = bearer(&self.config.access_token);
        async move { get_json(&client, &url, token.as_deref(), "asset endpoint").await }.boxed_local()
    }
}

impl ResourceProvider for HttpResourceProvider {
    fn imagery(&self, style: ImageryStyle) -> LocalBoxFuture<'static, Result<ImageryProvider, LoadError>> {
        let endpoint = self.endpoint(style.asset_id());
        async move {
            let endpoint = endpoint.await?;
            imagery_from_endpoint(style, endpoint)
        }
        .boxed_local()
    }

    fn overlay(&self) -> LocalBoxFuture<'static, Result<OverlayDataset, LoadError>> {
        let client = self.client.clone();
        let source = self.config.overlay.clone();
        async move {
            let bytes = match &source {
                OverlaySource::File(path) => read_file(path).await?,
                OverlaySource::Url(url) => get_bytes(&client, url, None).await?,
            };
            let (dataset, report) = load_overlay_geojson(&source.dataset_name(), &bytes)?;
            info!(
                features = report.features,
                entities = report.entities,
                skipped = report.skipped,
                "overlay decoded"
            );
            Ok(dataset)
        }
        .boxed_local()
    }

    fn resolve_tileset(
        &self,
        asset_id: TilesetAssetId,
    ) -> LocalBoxFuture<'static, Result<TilesetResource, LoadError>> {
        let endpoint = self.endpoint(asset_id.get());
        async move {
            let endpoint = endpoint.await?;
            tileset_resource_from_endpoint(asset_id, endpoint)
        }
        .boxed_local()
    }

    fn load_tileset(&self, resource: TilesetResource) -> LocalBoxFuture<'static, Result<Tileset, LoadError>> {
        let client = self.client.clone();
        async move {
            let doc: TilesetDocument =
                get_json(&client, &resource.url, resource.access_token.as_deref(), "tileset").await?;
            debug!(asset_id = %resource.asset_id, version = %doc.asset.version, "tileset root fetched");
            Ok(Tileset::new(
                &resource,
                TilesetMetadata {
                    version: doc.asset.version,
                    geometric_error: doc.geometric_error,
                },
            ))
        }
        .boxed_local()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetEndpoint {
    #[serde(rename = "type")]
    kind: String,
    url: Option<String>,
    access_token: Option<String>,
    #[serde(default)]
    attributions: Vec<Attribution>,
    external_type: Option<String>,
    options: Option<ExternalOptions>,
}

#[derive(Debug, Deserialize)]
struct Attribution {
    html: String,
}

#[derive(Debug, Deserialize)]
struct ExternalOptions {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TilesetDocument {
    asset: TilesetAsset,
    #[serde(default)]
    geometric_error: f64,
}

#[derive(Debug, Deserialize)]
struct TilesetAsset {
    version: String,
}

fn endpoint_url(api_url: &str, asset_id: u64) -> String {
    format!("{}/v1/assets/{asset_id}/endpoint", api_url.trim_end_matches('/'))
}

fn bearer(token: &str) -> Option<String> {
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn imagery_from_endpoint(style: ImageryStyle, endpoint: AssetEndpoint) -> Result<ImageryProvider, LoadError> {
    if endpoint.kind != "IMAGERY" {
        return Err(LoadError::Invalid(format!(
            "asset {} is {}, not imagery",
            style.asset_id(),
            endpoint.kind
        )));
    }
    let url = endpoint
        .options
        .and_then(|o| o.url)
        .or(endpoint.url)
        .ok_or_else(|| LoadError::Invalid(format!("imagery asset {} has no url", style.asset_id())))?;
    if let Some(external) = &endpoint.external_type {
        debug!(style = %style, external = external.as_str(), "external imagery endpoint");
    }
    let mut provider = ImageryProvider::new(style, url);
    provider.attributions = endpoint.attributions.into_iter().map(|a| a.html).collect();
    Ok(provider)
}

fn tileset_resource_from_endpoint(
    asset_id: TilesetAssetId,
    endpoint: AssetEndpoint,
) -> Result<TilesetResource, LoadError> {
    if endpoint.kind != "3DTILES" {
        return Err(LoadError::Invalid(format!(
            "asset {asset_id} is {}, not a 3D tileset",
            endpoint.kind
        )));
    }
    let url = endpoint
        .url
        .ok_or_else(|| LoadError::Invalid(format!("tileset asset {asset_id} has no url")))?;
    Ok(TilesetResource {
        asset_id,
        url,
        access_token: endpoint.access_token,
    })
}

async fn read_file(path: &Path) -> Result<Vec<u8>, LoadError> {
    tokio::fs::read(path).await.map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

async fn get_bytes(client: &reqwest::Client, url: &str, token: Option<&str>) -> Result<Vec<u8>, LoadError> {
    let mut request = client.get(url);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let resp = request.send().await.map_err(|source| LoadError::Http {
        url: url.to_string(),
        source,
    })?;
    if !resp.status().is_success() {
        return Err(LoadError::Status {
            url: url.to_string(),
            status: resp.status().as_u16(),
        });
    }
    let bytes = resp.bytes().await.map_err(|source| LoadError::Http {
        url: url.to_string(),
        source,
    })?;
    Ok(bytes.to_vec())
}

async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    token: Option<&str>,
    what: &'static str,
) -> Result<T, LoadError> {
    let bytes = get_bytes(client, url, token).await?;
    serde_json::from_slice(&bytes).map_err(|e| LoadError::Decode {
        what,
        reason: e.to_string(),
    })
}

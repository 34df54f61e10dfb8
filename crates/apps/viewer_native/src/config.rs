use std::env;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, ValueEnum};
use layers::raster::ImageryStyle;
use layers::tileset::TilesetAssetId;
use streaming::{DEFAULT_API_URL, HttpProviderConfig, OrchestratorConfig, OverlaySource};
use tracing::info;
use viewer::{InitialView, default_initial_view};

pub const DEFAULT_OVERLAY_PATH: &str = "data/targets.kochi.geojson";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, ValueEnum)]
pub enum InitialViewMode {
    /// Top-down overview of Japan.
    #[default]
    Fixed,
    /// Whatever the engine considers home.
    EngineDefault,
}

impl InitialViewMode {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim() {
            "" | "fixed" => Ok(Self::Fixed),
            "engine-default" => Ok(Self::EngineDefault),
            other => bail!("GLOBE_INITIAL_VIEW must be `fixed` or `engine-default`, got {other:?}"),
        }
    }
}

/// Command-line overrides; each wins over its environment variable.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Bearer token for the asset service
    #[arg(long)]
    pub access_token: Option<String>,

    /// Numeric tileset asset id; anything else disables the tileset
    #[arg(long)]
    pub tileset_asset_id: Option<String>,

    /// Asset service base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Overlay GeoJSON file path or http(s) URL
    #[arg(long)]
    pub overlay: Option<String>,

    /// Base imagery style (aerial-with-labels, aerial, road)
    #[arg(long)]
    pub imagery_style: Option<String>,

    /// Per-load timeout in seconds, 0 disables it
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long, value_enum)]
    pub initial_view: Option<InitialViewMode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub access_token: String,
    pub api_url: String,
    pub tileset: Option<TilesetAssetId>,
    pub overlay: OverlaySource,
    pub imagery_style: ImageryStyle,
    pub load_timeout: Option<Duration>,
    pub initial_view: InitialViewMode,
}

impl ViewerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from `GLOBE_*` variables as returned by `var`.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let access_token = var("GLOBE_ACCESS_TOKEN").unwrap_or_default();
        let api_url = var("GLOBE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let tileset = var("GLOBE_TILESET_ASSET_ID")
            .as_deref()
            .and_then(TilesetAssetId::parse);
        let overlay = OverlaySource::parse(
            &var("GLOBE_OVERLAY_PATH").unwrap_or_else(|| DEFAULT_OVERLAY_PATH.to_string()),
        );
        let imagery_style = match var("GLOBE_IMAGERY_STYLE") {
            Some(raw) => raw.parse().context("invalid GLOBE_IMAGERY_STYLE")?,
            None => ImageryStyle::default(),
        };
        let timeout_secs = match var("GLOBE_LOAD_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("invalid GLOBE_LOAD_TIMEOUT_SECS {raw:?}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let initial_view = match var("GLOBE_INITIAL_VIEW") {
            Some(raw) => InitialViewMode::parse(&raw)?,
            None => InitialViewMode::default(),
        };

        Ok(Self {
            access_token,
            api_url,
            tileset,
            overlay,
            imagery_style,
            load_timeout: timeout(timeout_secs),
            initial_view,
        })
    }

    pub fn apply_args(&mut self, args: &ConfigArgs) -> anyhow::Result<()> {
        if let Some(token) = &args.access_token {
            self.access_token = token.clone();
        }
        if let Some(raw) = &args.tileset_asset_id {
            self.tileset = TilesetAssetId::parse(raw);
        }
        if let Some(url) = &args.api_url {
            self.api_url = url.clone();
        }
        if let Some(overlay) = &args.overlay {
            self.overlay = OverlaySource::parse(overlay);
        }
        if let Some(style) = &args.imagery_style {
            self.imagery_style = style.parse().context("invalid --imagery-style")?;
        }
        if let Some(secs) = args.timeout_secs {
            self.load_timeout = timeout(secs);
        }
        if let Some(mode) = args.initial_view {
            self.initial_view = mode;
        }
        Ok(())
    }

    pub fn initial_view(&self) -> InitialView {
        match self.initial_view {
            InitialViewMode::Fixed => InitialView::Fixed(default_initial_view()),
            InitialViewMode::EngineDefault => InitialView::EngineDefault,
        }
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            imagery_style: self.imagery_style,
            tileset: self.tileset,
            load_timeout: self.load_timeout,
        }
    }

    pub fn provider(&self) -> HttpProviderConfig {
        HttpProviderConfig {
            api_url: self.api_url.clone(),
            access_token: self.access_token.clone(),
            overlay: self.overlay.clone(),
        }
    }

    /// Startup summary; never prints the token itself.
    pub fn log_startup(&self) {
        info!(
            token_set = !self.access_token.trim().is_empty(),
            tileset_asset_id = ?self.tileset.map(|id| id.get()),
            overlay = ?self.overlay,
            imagery = %self.imagery_style,
            "viewer configuration"
        );
    }
}

fn timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use layers::raster::ImageryStyle;
    use layers::tileset::TilesetAssetId;
    use pretty_assertions::assert_eq;
    use streaming::OverlaySource;
    use viewer::InitialView;

    use super::{ConfigArgs, InitialViewMode, ViewerConfig};

    fn from_vars(vars: &[(&str, &str)]) -> anyhow::Result<ViewerConfig> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ViewerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = from_vars(&[]).expect("config");
        assert_eq!(config.access_token, "");
        assert_eq!(config.tileset, None);
        assert_eq!(
            config.overlay,
            OverlaySource::File(PathBuf::from("data/targets.kochi.geojson"))
        );
        assert_eq!(config.imagery_style, ImageryStyle::AerialWithLabels);
        assert_eq!(config.load_timeout, Some(Duration::from_secs(30)));
        assert!(matches!(config.initial_view(), InitialView::Fixed(_)));
    }

    #[test]
    fn invalid_asset_ids_disable_the_tileset_silently() {
        for raw in ["", "abc", "-1.5"] {
            let config = from_vars(&[("GLOBE_TILESET_ASSET_ID", raw)]).expect("config");
            assert_eq!(config.tileset, None, "{raw:?}");
        }
        let config = from_vars(&[("GLOBE_TILESET_ASSET_ID", "2275207")]).expect("config");
        assert_eq!(config.tileset, Some(TilesetAssetId::new(2275207)));
    }

    #[test]
    fn unreadable_values_are_errors() {
        assert!(from_vars(&[("GLOBE_IMAGERY_STYLE", "satellite")]).is_err());
        assert!(from_vars(&[("GLOBE_LOAD_TIMEOUT_SECS", "soon")]).is_err());
        assert!(from_vars(&[("GLOBE_INITIAL_VIEW", "orbit")]).is_err());
    }

    #[test]
    fn flags_override_environment() {
        let mut config = from_vars(&[
            ("GLOBE_ACCESS_TOKEN", "env-token"),
            ("GLOBE_TILESET_ASSET_ID", "1"),
            ("GLOBE_LOAD_TIMEOUT_SECS", "5"),
        ])
        .expect("config");
        config
            .apply_args(&ConfigArgs {
                access_token: Some("flag-token".into()),
                tileset_asset_id: Some("not-a-number".into()),
                timeout_secs: Some(0),
                initial_view: Some(InitialViewMode::EngineDefault),
                imagery_style: Some("road".into()),
                ..ConfigArgs::default()
            })
            .expect("apply");
        assert_eq!(config.access_token, "flag-token");
        assert_eq!(config.tileset, None);
        assert_eq!(config.load_timeout, None);
        assert_eq!(config.initial_view(), InitialView::EngineDefault);
        assert_eq!(config.orchestrator().imagery_style, ImageryStyle::Road);
    }
}

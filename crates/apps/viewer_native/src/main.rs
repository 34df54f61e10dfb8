mod config;
mod session;
mod store;

use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use render::Viewport;
use scene::selection::SelectedFeature;
use streaming::HttpResourceProvider;
use tokio::task::LocalSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigArgs, ViewerConfig};
use crate::session::ViewerSession;
use crate::store::{AppStore, City, FilterUpdate};

#[derive(Debug, Parser)]
#[command(name = "viewer_native")]
#[command(about = "Load the infrastructure overlay into a headless globe and inspect it")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[arg(long, value_enum, default_value_t = City::Kochi)]
    city: City,

    /// Name search, case-insensitive
    #[arg(long, default_value = "")]
    search: String,

    /// Feature types to show (bridge, road, facility); repeatable
    #[arg(long = "type")]
    types: Vec<String>,

    /// Statuses to show (pending, inspecting, done); repeatable
    #[arg(long)]
    status: Vec<String>,

    /// Fly here before clicking
    #[arg(long, num_args = 3, value_names = ["LON", "LAT", "HEIGHT"], allow_hyphen_values = true)]
    fly_to: Option<Vec<String>>,

    /// Click where this feature is drawn; repeatable
    #[arg(long)]
    click_feature: Vec<String>,

    /// Click at screen coordinates `X,Y`; repeatable
    #[arg(long, value_parser = parse_point)]
    click: Vec<(f64, f64)>,

    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    #[arg(long, default_value_t = 720.0)]
    height: f64,

    /// Print the selected feature as JSON
    #[arg(long)]
    json: bool,
}

fn parse_point(raw: &str) -> Result<(f64, f64), String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {raw:?}"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x {x:?}: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y {y:?}: {e}"))?;
    Ok((x, y))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = ViewerConfig::from_env()?;
    config.apply_args(&cli.config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the event loop")?;
    LocalSet::new().block_on(&runtime, run(config, cli))
}

async fn run(config: ViewerConfig, cli: Cli) -> anyhow::Result<()> {
    let store = Rc::new(AppStore::new());
    store.set_city(cli.city);
    store.set_search_text(cli.search.as_str());
    store.set_filters(FilterUpdate {
        types: Some(cli.types.clone()),
        status: Some(cli.status.clone()),
    });

    let provider = Rc::new(HttpResourceProvider::new(config.provider()));
    let mut session = ViewerSession::start(
        &config,
        store.clone(),
        provider,
        Viewport::new(cli.width, cli.height),
    )
    .context("viewer failed to start")?;
    session.settled().await;

    for (kind, outcome) in session.orchestrator().outcomes() {
        info!(resource = kind.as_str(), ?outcome, "load finished");
    }

    if let Some(fields) = &cli.fly_to {
        if let [lon, lat, height] = fields.as_slice() {
            match session.fly_to(lon, lat, height) {
                Ok(dest) => println!(
                    "camera: lon {:.4} lat {:.4} height {:.0} m",
                    dest.lon_deg(),
                    dest.lat_deg(),
                    dest.height_m()
                ),
                Err(err) => match err.field() {
                    Some(field) => eprintln!("{field}: {err}"),
                    None => eprintln!("{err}"),
                },
            }
        }
    }

    for feature_id in &cli.click_feature {
        if session.click_feature(feature_id).is_none() {
            warn!(feature_id = feature_id.as_str(), "feature is not on screen");
        }
    }
    for (x, y) in &cli.click {
        session.click(*x, *y);
    }

    let selected = store.selected_feature();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&selected)?);
    } else {
        print_feature(selected.as_ref());
    }

    let summary = session.summary();
    println!(
        "scene: {} imagery layer(s), terrain {}, {} overlay(s) with {}/{} visible ({} drawn), {} tileset(s), {} render request(s) at {}x{}",
        summary.imagery_layers,
        summary.terrain.unwrap_or("none"),
        summary.overlays,
        summary.visible_entities,
        summary.entities,
        summary.drawn_points,
        summary.primitives,
        summary.renders,
        summary.viewport.width,
        summary.viewport.height,
    );

    session.dispose();
    Ok(())
}

fn print_feature(feature: Option<&SelectedFeature>) {
    let Some(feature) = feature else {
        println!("no feature selected");
        return;
    };
    let p = &feature.properties;
    println!("ID: {}", feature.id);
    println!("name: {}", p.name);
    println!("type: {}", p.kind);
    println!("status: {}", p.status);
    println!("last updated: {}", p.last_updated);
    println!("owner: {}", p.owner);
    println!("notes: {}", p.notes);
}

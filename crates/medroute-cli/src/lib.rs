//! medroute CLI - file loading, output and logging setup for the `medroute`
//! binary.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use medroute_core::{LngLat, PlanRequest, RestrictedArea};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the stderr subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("medroute_core=info,medroute_cli=info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Load a planning request snapshot from disk.
pub fn read_request(path: &Path) -> Result<PlanRequest> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    PlanRequest::from_json(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// A polygon file holds either a bare vertex list or a named area.
#[derive(Deserialize)]
#[serde(untagged)]
enum PolygonFile {
    Area(RestrictedArea),
    Vertices(Vec<LngLat>),
}

/// Load polygon vertices from disk.
pub fn read_polygon(path: &Path) -> Result<Vec<LngLat>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let polygon: PolygonFile = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse polygon in {}", path.display()))?;
    Ok(match polygon {
        PolygonFile::Area(area) => area.vertices,
        PolygonFile::Vertices(vertices) => vertices,
    })
}

pub fn render<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use mapserver::{ClientConfig, Extent};
use serde::Deserialize;

use crate::core::DEFAULT_ZOOM_STEP;
use crate::utils::debounce::DEFAULT_DELAY;

/// View maps served by a MapServer/WMS endpoint.
#[derive(Debug, Parser)]
#[command(name = "mapview", version)]
pub struct Args {
    /// Map URL, optionally carrying the initial extent as `mapext` parameter
    pub url: Option<String>,

    /// Initial extent, overrides the one given by the URL
    #[arg(long, value_name = "\"MINX MINY MAXX MAXY\"")]
    pub extent: Option<Extent>,

    /// URL answering with the map extent as plain text
    #[arg(long, value_name = "URL")]
    pub extent_url: Option<String>,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Delay before requesting a new map image after a change
    #[arg(long, value_name = "MS")]
    pub redraw_delay: Option<u64>,

    /// Fraction of the extent to zoom by per step
    #[arg(long, value_name = "FACTOR")]
    pub zoom_step: Option<f64>,

    /// HTTP request timeout, 0 disables it
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    map: MapSection,
    view: ViewSection,
    http: HttpSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct MapSection {
    url: Option<String>,
    extent: Option<[f64; 4]>,
    extent_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ViewSection {
    redraw_delay_ms: Option<u64>,
    zoom_step: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct HttpSection {
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

impl FileConfig {
    fn read(path: &Path) -> Result<FileConfig> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        toml::from_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))
    }
}

/// Application configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub url: Option<String>,
    pub extent: Option<Extent>,
    pub extent_url: Option<String>,
    pub redraw_delay: Duration,
    pub zoom_step: f64,
    pub client: ClientConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            extent: None,
            extent_url: None,
            redraw_delay: DEFAULT_DELAY,
            zoom_step: DEFAULT_ZOOM_STEP,
            client: ClientConfig::default(),
        }
    }
}

impl Config {
    /// Build the configuration from command line arguments and the config
    /// file they name. Arguments take precedence over the file.
    pub fn load(args: Args) -> Result<Config> {
        let file = match args.config.as_deref() {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };

        Ok(Config::merge(args, file))
    }

    fn merge(args: Args, file: FileConfig) -> Config {
        let defaults = Config::default();

        let file_extent = file
            .map
            .extent
            .map(|[minx, miny, maxx, maxy]| Extent::new(minx, miny, maxx, maxy));

        let timeout = args
            .timeout
            .or(file.http.timeout_secs)
            .map(|secs| (secs > 0).then(|| Duration::from_secs(secs)))
            .unwrap_or(defaults.client.timeout);

        let redraw_delay = args
            .redraw_delay
            .or(file.view.redraw_delay_ms)
            .map(Duration::from_millis)
            .unwrap_or(defaults.redraw_delay);

        Config {
            url: args.url.or(file.map.url),
            extent: args.extent.or(file_extent),
            extent_url: args.extent_url.or(file.map.extent_url),
            redraw_delay,
            zoom_step: args
                .zoom_step
                .or(file.view.zoom_step)
                .unwrap_or(defaults.zoom_step),
            client: ClientConfig {
                timeout,
                user_agent: file.http.user_agent.unwrap_or(defaults.client.user_agent),
            },
        }
    }
}

//! OGC service inspector
//!
//! Command-line front end over the WMS and WFS clients: list a service's
//! layers, build GetMap URLs, resolve feature types and fetch features.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use ogc_common::{BoundingBox, WfsVersion, WmsVersion};
use ogc_inspect::{commands, InspectConfig};
use wfs_client::{FeatureTypeRequest, Filter};
use wms_client::{MapRequest, WmsMapConfig};

/// OGC WMS/WFS inspector
#[derive(Parser, Debug)]
#[command(name = "ogc-inspect")]
#[command(about = "Inspect WMS and WFS services from the command line")]
struct Cli {
    /// YAML configuration file; environment variables are used when absent
    #[arg(long, global = true, env = "OGC_INSPECT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "warn", env = "RUST_LOG")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Print single-line JSON instead of pretty-printed output
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize a WMS capabilities document
    WmsCapabilities {
        /// Service base URL
        url: String,

        /// Protocol version to request (1.0.0, 1.1.0, 1.1.1, 1.3.0)
        #[arg(long)]
        version: Option<WmsVersion>,
    },

    /// Print the GetMap URL for a layer selection
    GetMapUrl {
        /// Service base URL
        url: String,

        /// Layer name (repeatable)
        #[arg(short, long = "layer", required = true)]
        layers: Vec<String>,

        /// Style name per layer (repeatable)
        #[arg(short, long = "style")]
        styles: Vec<String>,

        /// CRS code, e.g. EPSG:4326
        #[arg(long)]
        crs: Option<String>,

        /// Extent as minx,miny,maxx,maxy
        #[arg(long, value_parser = parse_bbox)]
        bbox: BoundingBox,

        #[arg(long, default_value = "256")]
        width: u32,

        #[arg(long, default_value = "256")]
        height: u32,

        /// Image format
        #[arg(long, default_value = "image/png")]
        format: String,

        #[arg(long)]
        version: Option<WmsVersion>,

        /// Vendor parameter as KEY=VALUE (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// Resolve and print feature type metadata
    WfsDescribe {
        #[command(flatten)]
        feature_type: FeatureTypeArgs,
    },

    /// Fetch and decode features
    WfsFeatures {
        #[command(flatten)]
        feature_type: FeatureTypeArgs,

        /// Extent as minx,miny,maxx,maxy in the feature type's CRS
        #[arg(long, value_parser = parse_bbox)]
        bbox: Option<BoundingBox>,

        /// File holding a complete ogc:Filter element; wins over --bbox
        #[arg(long)]
        filter: Option<PathBuf>,

        #[arg(long)]
        max_features: Option<u32>,

        /// Send GetFeature as an XML POST body
        #[arg(long)]
        post: bool,

        /// Property used as the feature label (repeatable)
        #[arg(long = "label")]
        labels: Vec<String>,

        /// Decode only the first member of multi-geometries
        #[arg(long)]
        single_geometries: bool,

        /// Skip attribute collection and strict ring checks
        #[arg(long)]
        quick: bool,
    },
}

/// Feature type selection shared by the WFS commands.
#[derive(Args, Debug)]
struct FeatureTypeArgs {
    /// Service base URL
    url: String,

    /// Feature type name, optionally prefixed (topp:states)
    type_name: String,

    /// Protocol version (1.0.0, 1.1.0)
    #[arg(long)]
    version: Option<WfsVersion>,

    /// SRID overriding the advertised default CRS
    #[arg(long)]
    srid: Option<String>,

    /// Axis order override as two indices, e.g. 1,0
    #[arg(long, value_delimiter = ',')]
    axis_order: Option<Vec<usize>>,

    /// Namespace as PREFIX=URI
    #[arg(long, value_parser = parse_param)]
    namespace: Option<(String, String)>,
}

impl FeatureTypeArgs {
    fn to_request(&self, default_version: Option<WfsVersion>) -> Result<FeatureTypeRequest> {
        let mut request = FeatureTypeRequest::new(&self.url, &self.type_name);
        if let Some(version) = self.version.or(default_version) {
            request = request.version(version);
        }
        if let Some(srid) = &self.srid {
            request = request.srid(srid);
        }
        if let Some(order) = &self.axis_order {
            request = request.axis_order(order).context("Invalid --axis-order")?;
        }
        if let Some((prefix, uri)) = &self.namespace {
            request = request.namespace(prefix, uri);
        }
        Ok(request)
    }
}

fn parse_bbox(s: &str) -> Result<BoundingBox, String> {
    BoundingBox::from_kvp(s).map_err(|e| e.to_string())
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    // stdout carries the command output.
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);

    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", json);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli);

    let config = InspectConfig::load(cli.config.as_deref())?;
    debug!(
        timeout_secs = config.http.timeout_secs,
        proxy = config.http.proxy.is_some(),
        cache = config.http.cache_enabled(),
        "Resolved HTTP configuration"
    );
    let fetcher = ogc_http::build_fetcher(&config.http).context("Failed to build HTTP client")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::WmsCapabilities { url, version } => {
            let report =
                commands::wms_capabilities(fetcher, &url, version.or(config.wms_version), &cancel)
                    .await?;
            print(&report, cli.compact)?;
        }
        Commands::GetMapUrl {
            url,
            layers,
            styles,
            crs,
            bbox,
            width,
            height,
            format,
            version,
            params,
        } => {
            let map_config = WmsMapConfig {
                layers,
                styles,
                crs,
                format,
                version: version.or(config.wms_version),
                extra_params: params,
            };
            let request = MapRequest::new(bbox, width, height);
            let url = commands::get_map_url(fetcher, &url, &map_config, &request, &cancel).await?;
            println!("{}", url);
        }
        Commands::WfsDescribe { feature_type } => {
            let request = feature_type.to_request(config.wfs_version)?;
            let info = commands::wfs_describe(fetcher, &request, &cancel).await?;
            print(&info, cli.compact)?;
        }
        Commands::WfsFeatures {
            feature_type,
            bbox,
            filter,
            max_features,
            post,
            labels,
            single_geometries,
            quick,
        } => {
            let mut request = feature_type
                .to_request(config.wfs_version)?
                .use_post(post)
                .multi_geometries(!single_geometries)
                .quick_geometries(quick);
            for label in labels {
                request = request.label_field(label);
            }
            if let Some(count) = max_features {
                request = request.max_features(count);
            }
            if let Some(path) = filter {
                let xml = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read filter {}", path.display()))?;
                request = request.filter(Filter::new(xml.trim()));
            }

            let report = commands::wfs_features(fetcher, &request, bbox, &cancel).await?;
            print(&report, cli.compact)?;
        }
    }

    Ok(())
}

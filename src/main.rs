//! # Tide Frame Application Entry Point
//!
//! One refresh cycle: load the configuration, fetch predictions (falling back
//! to the offline model) alongside the weather, build the frame, and write it
//! out. The page goes to
//! a PBM file by default; `--stdout` prints an ASCII preview and `--json`
//! prints the frame model instead.


use anyhow::Context;
use chrono::Utc;
use std::env;
use std::fs;
use std::path::PathBuf;
use tide_frame_lib::config::{Config, CONFIG_FILE};
use tide_frame_lib::framebuffer::FrameBuffer;
use tide_frame_lib::render_model::{build_frame, FrameOptions};
use tide_frame_lib::weather::{self, WeatherPanel};
use tide_frame_lib::{fallback, noaa, renderer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_OUTPUT: &str = "tide-frame.pbm";

#[derive(Debug, PartialEq)]
enum Output {
    Page(PathBuf),
    Ascii,
    Json,
}

#[derive(Debug, PartialEq)]
struct Args {
    config: PathBuf,
    output: Output,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Args> {
    let mut config = PathBuf::from(CONFIG_FILE);
    let mut out = PathBuf::from(DEFAULT_OUTPUT);
    let mut mode = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--stdout" => mode = Some(Output::Ascii),
            "--json" => mode = Some(Output::Json),
            "--config" => config = args.next().context("--config needs a path")?.into(),
            "--out" => out = args.next().context("--out needs a path")?.into(),
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(Args {
        config,
        output: mode.unwrap_or(Output::Page(out)),
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(env::args().skip(1))?;
    let config = Config::load_from_path(&args.config);
    let now = Utc::now();

    let rt = tokio::runtime::Runtime::new()?;

    // Network errors are expected; the offline model keeps the frame alive
    let (data, forecast) = rt.block_on(async {
        let tides = async {
            noaa::fetch(&config, now).await.unwrap_or_else(|error| {
                warn!(%error, "tide data fetch failed, using offline model");
                fallback::approximate(now)
            })
        };
        let forecast = async {
            if !config.weather.enabled {
                return None;
            }
            weather::fetch(&config.weather)
                .await
                .inspect_err(|error| warn!(%error, "weather fetch failed"))
                .ok()
        };
        tokio::join!(tides, forecast)
    });

    let options = FrameOptions::from(&config);
    let panel = config.weather.enabled.then(|| {
        WeatherPanel::resolve(
            forecast.as_ref(),
            &config.weather.city,
            now,
            options.display_zone,
        )
    });
    let frame = build_frame(&data, now, &options)
        .context("predictions could not be charted")?
        .with_weather(panel);

    match args.output {
        Output::Ascii => renderer::draw_ascii(&frame),
        Output::Json => println!("{}", serde_json::to_string_pretty(&frame)?),
        Output::Page(path) => {
            let mut page = FrameBuffer::page();
            renderer::draw_frame(&frame, &config.station.name, &mut page)
                .unwrap_or_else(|never| match never {});
            fs::write(&path, page.to_pbm())
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), offline = frame.offline, "frame written");
        }
    }

    Ok(())
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use prism_renderer::RenderConfig;

/// Log levels accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "prism")]
#[command(about = "Progressive path tracer for sphere scenes")]
pub struct Args {
    /// JSON scene file (defaults to the built-in demo scene)
    #[arg(long)]
    pub scene: Option<PathBuf>,

    /// JSON render settings; individual flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Image width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Paths per pixel per frame
    #[arg(long, short = 's')]
    pub spp: Option<u32>,

    /// Maximum bounce depth
    #[arg(long, short = 'd')]
    pub depth: Option<u32>,

    /// Number of frames to accumulate
    #[arg(long, short = 'f')]
    pub frames: Option<u32>,

    /// Overwrite the image every frame instead of averaging frames
    #[arg(long)]
    pub no_progressive: bool,

    /// Output PNG path
    #[arg(short, long, default_value = "output.png")]
    pub output: PathBuf,

    /// Also dump the raw float backbuffer (RGBA f32, native-endian, bottom row first)
    #[arg(long)]
    pub raw: Option<PathBuf>,

    /// Rewrite the PNG every N frames while rendering
    #[arg(long, value_name = "N")]
    pub preview_every: Option<u32>,

    /// Logging level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

impl Args {
    /// Render settings: config file (or defaults) with flag overrides applied.
    pub fn render_config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
            }
            None => RenderConfig::default(),
        };

        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(spp) = self.spp {
            config.samples_per_pixel = spp;
        }
        if let Some(depth) = self.depth {
            config.max_depth = depth;
        }
        if let Some(frames) = self.frames {
            config.frame_count = frames;
        }
        if self.no_progressive {
            config.progressive = false;
        }

        Ok(config)
    }

    /// Whether a preview PNG is due after `frame` (0-based) finishes.
    pub fn preview_due(&self, frame: u32, frame_count: u32) -> bool {
        match self.preview_every {
            Some(every) if every > 0 => {
                let done = frame + 1;
                done % every == 0 && done < frame_count
            }
            _ => false,
        }
    }
}

//! Puzzle configuration
//!
//! Accepted either as JSON or as a component attribute string
//! (`"image: cat.jpg; reward: prize.png; pieces: 9"`). Everything except
//! `image` has a default. Validation runs before any session exists.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{PuzzleError, PuzzleResult};
use crate::sim::grid::grid_dimension;

/// When the completion signal fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// First transition into the solved state only
    #[default]
    Once,
    /// Every snap that leaves the board solved, including redundant ones
    EverySnap,
}

impl CompletionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionPolicy::Once => "once",
            CompletionPolicy::EverySnap => "every_snap",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "once" => Some(CompletionPolicy::Once),
            "every_snap" | "every" => Some(CompletionPolicy::EverySnap),
            _ => None,
        }
    }
}

fn default_pieces() -> u32 {
    DEFAULT_PIECES
}

fn default_surface_width() -> f32 {
    SURFACE_WIDTH
}

fn default_surface_height() -> f32 {
    SURFACE_HEIGHT
}

fn default_snap_tolerance() -> f32 {
    SNAP_TOLERANCE
}

fn default_reward_display_ms() -> u32 {
    REWARD_DISPLAY_MS
}

/// Puzzle configuration surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleConfig {
    /// Puzzle image source (URL or path)
    pub image: String,
    /// Image shown once the puzzle is solved
    #[serde(default)]
    pub reward: String,
    /// Number of pieces; must be a perfect square
    #[serde(default = "default_pieces")]
    pub pieces: u32,
    #[serde(default = "default_surface_width")]
    pub surface_width: f32,
    #[serde(default = "default_surface_height")]
    pub surface_height: f32,
    #[serde(default = "default_snap_tolerance")]
    pub snap_tolerance: f32,
    #[serde(default = "default_reward_display_ms")]
    pub reward_display_ms: u32,
    #[serde(default)]
    pub completion: CompletionPolicy,
    /// Scatter seed; the host picks one from the clock when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            image: String::new(),
            reward: String::new(),
            pieces: DEFAULT_PIECES,
            surface_width: SURFACE_WIDTH,
            surface_height: SURFACE_HEIGHT,
            snap_tolerance: SNAP_TOLERANCE,
            reward_display_ms: REWARD_DISPLAY_MS,
            completion: CompletionPolicy::Once,
            seed: None,
        }
    }
}

impl PuzzleConfig {
    pub fn new(image: impl Into<String>, reward: impl Into<String>, pieces: u32) -> Self {
        Self {
            image: image.into(),
            reward: reward.into(),
            pieces,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> PuzzleResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PuzzleError::config(format!("bad config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a `key: value; key: value` attribute string
    pub fn from_attribute(attr: &str) -> PuzzleResult<Self> {
        let mut config = Self::default();
        for entry in attr.split(';') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let Some((key, value)) = entry.split_once(':') else {
                return Err(PuzzleError::config(format!("expected `key: value`, got `{entry}`")));
            };
            let value = value.trim();
            match key.trim() {
                "image" => config.image = value.to_string(),
                "reward" => config.reward = value.to_string(),
                "pieces" => config.pieces = parse_number(key, value)?,
                "width" => config.surface_width = parse_number(key, value)?,
                "height" => config.surface_height = parse_number(key, value)?,
                "tolerance" => config.snap_tolerance = parse_number(key, value)?,
                "rewardMs" | "reward_ms" => config.reward_display_ms = parse_number(key, value)?,
                "seed" => config.seed = Some(parse_number(key, value)?),
                "completion" => {
                    config.completion = CompletionPolicy::from_str(value).ok_or_else(|| {
                        PuzzleError::config(format!("unknown completion policy `{value}`"))
                    })?
                }
                other => log::warn!("Ignoring unknown puzzle attribute `{}`", other),
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Check every invariant; returns the grid dimension N on success
    pub fn validate(&self) -> PuzzleResult<u32> {
        if self.image.trim().is_empty() {
            return Err(PuzzleError::config("`image` is required"));
        }
        if !(self.surface_width.is_finite() && self.surface_width > 0.0)
            || !(self.surface_height.is_finite() && self.surface_height > 0.0)
        {
            return Err(PuzzleError::config(format!(
                "surface must be positive, got {}x{}",
                self.surface_width, self.surface_height
            )));
        }
        if !(self.snap_tolerance.is_finite() && self.snap_tolerance > 0.0) {
            return Err(PuzzleError::config(format!(
                "snap tolerance must be positive, got {}",
                self.snap_tolerance
            )));
        }
        if self.reward.trim().is_empty() {
            log::warn!("No reward image configured; completion will only be announced");
        }
        grid_dimension(self.pieces)
    }

    pub fn surface_size(&self) -> Vec2 {
        Vec2::new(self.surface_width, self.surface_height)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> PuzzleResult<T> {
    value
        .parse()
        .map_err(|_| PuzzleError::config(format!("`{}` is not a valid number: `{}`", key.trim(), value)))
}

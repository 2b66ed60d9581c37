// SPDX-License-Identifier: GPL-3.0-only

use cosmic_config::{Config, ConfigGet, ConfigSet, CosmicConfigEntry};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::capture::{Normalizer, AUTO, DEFAULT_OUTPUT_SIZE};
use crate::preview::DEFAULT_PREVIEW_SIZE;

pub const APP_ID: &str = "io.github.batchshot";

/// Defaults read from cosmic-config on start. Command line flags win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Region grabber name, or `auto`
    pub grabber: String,
    /// Fit every capture to the output size
    pub normalize: bool,
    /// Resize in-process instead of calling `convert`
    pub builtin_normalize: bool,
    pub output_width: u32,
    pub output_height: u32,
    pub preview_width: u32,
    pub preview_height: u32,
    /// Pause between hiding the window and starting the grabber
    pub hide_delay_ms: u32,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            grabber: AUTO.to_string(),
            normalize: true,
            builtin_normalize: false,
            output_width: DEFAULT_OUTPUT_SIZE.0,
            output_height: DEFAULT_OUTPUT_SIZE.1,
            preview_width: DEFAULT_PREVIEW_SIZE.0,
            preview_height: DEFAULT_PREVIEW_SIZE.1,
            hide_delay_ms: 200,
        }
    }
}

impl CosmicConfigEntry for BatchSettings {
    const VERSION: u64 = 1;

    fn write_entry(&self, config: &Config) -> Result<(), cosmic_config::Error> {
        config.set("grabber", &self.grabber)?;
        config.set("normalize", self.normalize)?;
        config.set("builtin_normalize", self.builtin_normalize)?;
        config.set("output_width", self.output_width)?;
        config.set("output_height", self.output_height)?;
        config.set("preview_width", self.preview_width)?;
        config.set("preview_height", self.preview_height)?;
        config.set("hide_delay_ms", self.hide_delay_ms)?;
        Ok(())
    }

    fn get_entry(config: &Config) -> Result<Self, (Vec<cosmic_config::Error>, Self)> {
        let mut errors = Vec::new();
        let default = Self::default();

        let grabber = config.get("grabber")
            .unwrap_or_else(|e| { errors.push(e); default.grabber.clone() });

        let normalize = config.get("normalize")
            .unwrap_or_else(|e| { errors.push(e); default.normalize });

        let builtin_normalize = config.get("builtin_normalize")
            .unwrap_or_else(|e| { errors.push(e); default.builtin_normalize });

        let output_width = config.get("output_width")
            .unwrap_or_else(|e| { errors.push(e); default.output_width });

        let output_height = config.get("output_height")
            .unwrap_or_else(|e| { errors.push(e); default.output_height });

        let preview_width = config.get("preview_width")
            .unwrap_or_else(|e| { errors.push(e); default.preview_width });

        let preview_height = config.get("preview_height")
            .unwrap_or_else(|e| { errors.push(e); default.preview_height });

        let hide_delay_ms = config.get("hide_delay_ms")
            .unwrap_or_else(|e| { errors.push(e); default.hide_delay_ms });

        let settings = Self {
            grabber,
            normalize,
            builtin_normalize,
            output_width,
            output_height,
            preview_width,
            preview_height,
            hide_delay_ms,
        };

        if errors.is_empty() {
            Ok(settings)
        } else {
            Err((errors, settings))
        }
    }

    fn update_keys<T>(&mut self, config: &Config, _keys: &[T]) -> (Vec<cosmic_config::Error>, Vec<&'static str>)
    where
        T: AsRef<str>
    {
        match Self::get_entry(config) {
            Ok(new_settings) => {
                *self = new_settings;
                (vec![], vec![])
            }
            Err((errors, new_settings)) => {
                *self = new_settings;
                (errors, vec![])
            }
        }
    }
}

impl BatchSettings {
    /// Load the stored defaults, falling back to built-in values for
    /// anything missing or unreadable.
    #[must_use]
    pub fn load() -> Self {
        match Config::new(APP_ID, Self::VERSION) {
            Ok(config) => match Self::get_entry(&config) {
                Ok(settings) => settings,
                Err((errors, settings)) => {
                    // Missing keys on first run land here too
                    for e in &errors {
                        log::debug!("config: {e}");
                    }
                    settings
                }
            },
            Err(e) => {
                log::warn!("failed to open config {APP_ID}: {e}");
                Self::default()
            }
        }
    }
}

/// Everything the application needs to know at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    pub grabber: String,
    pub normalizer: Normalizer,
    pub preview_size: (u32, u32),
    pub hide_delay_ms: u32,
    /// Save here without asking for a folder
    pub save_dir: Option<PathBuf>,
    /// Open the exported folder after saving
    pub open_after_save: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::from(BatchSettings::default())
    }
}

impl From<BatchSettings> for BatchConfig {
    fn from(settings: BatchSettings) -> Self {
        let size = (settings.output_width.max(1), settings.output_height.max(1));
        let normalizer = match (settings.normalize, settings.builtin_normalize) {
            (false, _) => Normalizer::None,
            (true, false) => Normalizer::External { size },
            (true, true) => Normalizer::Builtin { size },
        };
        Self {
            grabber: settings.grabber,
            normalizer,
            preview_size: (settings.preview_width.max(1), settings.preview_height.max(1)),
            hide_delay_ms: settings.hide_delay_ms,
            save_dir: None,
            open_after_save: false,
        }
    }
}

/// Parse a `WIDTHxHEIGHT` geometry such as `1280x720`
///
/// # Errors
/// Returns a message suitable for clap if the value is malformed or zero
pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{value}`"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("bad width `{w}`: {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("bad height `{h}`: {e}"))?;
    if w == 0 || h == 0 {
        return Err(format!("size must be non-zero, got `{value}`"));
    }
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_normalise_with_convert() {
        let config = BatchConfig::default();
        assert_eq!(config.grabber, "auto");
        assert_eq!(config.normalizer, Normalizer::External { size: (1280, 720) });
        assert_eq!(config.preview_size, (640, 360));
        assert_eq!(config.save_dir, None);
    }

    #[test]
    fn settings_select_normaliser() {
        let raw = BatchSettings { normalize: false, ..BatchSettings::default() };
        assert_eq!(BatchConfig::from(raw).normalizer, Normalizer::None);

        let builtin = BatchSettings {
            builtin_normalize: true,
            output_width: 800,
            output_height: 600,
            ..BatchSettings::default()
        };
        assert_eq!(
            BatchConfig::from(builtin).normalizer,
            Normalizer::Builtin { size: (800, 600) }
        );
    }

    #[test]
    fn zero_sizes_are_clamped() {
        let settings = BatchSettings {
            preview_width: 0,
            output_height: 0,
            ..BatchSettings::default()
        };
        let config = BatchConfig::from(settings);
        assert_eq!(config.preview_size, (1, 360));
        assert_eq!(config.normalizer.output_size(), Some((1280, 1)));
    }

    #[test]
    fn parses_geometry() {
        assert_eq!(parse_size("1280x720"), Ok((1280, 720)));
        assert_eq!(parse_size("640X360"), Ok((640, 360)));
        assert!(parse_size("1280").is_err());
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("axb").is_err());
    }
}

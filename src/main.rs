// SPDX-License-Identifier: GPL-3.0-only

use batchshot::capture::{Normalizer, AUTO};
use batchshot::settings::{parse_size, BatchConfig, BatchSettings};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Default, Debug, Clone, PartialEq, Eq)]
#[command(
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("VERGEN_GIT_SHA"), ")"),
    about,
    long_about = None
)]
struct Args {
    /// Region capture tool: auto, gm, import, maim or scrot
    #[clap(long)]
    grabber: Option<String>,
    /// Keep captures at their selected size instead of fitting them to the output size
    #[clap(long, conflicts_with_all = ["builtin_normalize", "output_size"])]
    no_normalize: bool,
    /// Fit captures in-process instead of calling ImageMagick `convert`
    #[clap(long)]
    builtin_normalize: bool,
    /// Output resolution for every capture, e.g. 1280x720
    #[clap(long, value_parser = parse_size)]
    output_size: Option<(u32, u32)>,
    /// Preview canvas size, e.g. 640x360
    #[clap(long, value_parser = parse_size)]
    preview_size: Option<(u32, u32)>,
    /// Milliseconds to wait after hiding the window before the selection starts
    #[clap(long)]
    hide_delay: Option<u32>,
    /// Save into this directory without asking
    #[clap(short, long)]
    save_dir: Option<PathBuf>,
    /// Open the exported folder after saving
    #[clap(long)]
    open: bool,
}

impl Args {
    fn into_config(self, settings: BatchSettings) -> BatchConfig {
        let mut config = BatchConfig::from(settings);

        if let Some(grabber) = self.grabber {
            config.grabber = grabber;
        }
        if self.no_normalize {
            config.normalizer = Normalizer::None;
        } else {
            let size = self
                .output_size
                .or(config.normalizer.output_size())
                .unwrap_or(batchshot::capture::DEFAULT_OUTPUT_SIZE);
            config.normalizer = match config.normalizer {
                Normalizer::Builtin { .. } => Normalizer::Builtin { size },
                _ if self.builtin_normalize => Normalizer::Builtin { size },
                Normalizer::External { .. } => Normalizer::External { size },
                // Only an explicit size turns normalising back on
                Normalizer::None if self.output_size.is_some() => Normalizer::External { size },
                Normalizer::None => Normalizer::None,
            };
        }
        if let Some(size) = self.preview_size {
            config.preview_size = size;
        }
        if let Some(delay) = self.hide_delay {
            config.hide_delay_ms = delay;
        }
        config.save_dir = self.save_dir.filter(|dir| {
            let usable = dir.is_dir();
            if !usable {
                log::warn!("--save-dir {} is not a directory, asking instead", dir.display());
            }
            usable
        });
        config.open_after_save = self.open;
        config
    }
}

fn main() -> cosmic::iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    log::debug!("batchshot {} ({})", batchshot::VERSION, env!("VERGEN_GIT_SHA"));

    let args = Args::parse();
    let config = args.into_config(BatchSettings::load());
    log::debug!("starting with {config:?}");
    if config.grabber != AUTO {
        log::info!("requested grabber `{}`", config.grabber);
    }

    batchshot::app::run(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn version_names_git_revision() {
        let version = Args::command().render_version();
        assert!(version.contains(env!("CARGO_PKG_VERSION")));
        assert!(version.contains(env!("VERGEN_GIT_SHA")));
    }

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("batchshot").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_follow_settings() {
        let config = parse(&[]).into_config(BatchSettings::default());
        assert_eq!(config, BatchConfig::default());
    }

    #[test]
    fn raw_mode_disables_normaliser() {
        let config = parse(&["--no-normalize"]).into_config(BatchSettings::default());
        assert_eq!(config.normalizer, Normalizer::None);
    }

    #[test]
    fn output_size_and_builtin_combine() {
        let config = parse(&["--builtin-normalize", "--output-size", "800x600"])
            .into_config(BatchSettings::default());
        assert_eq!(config.normalizer, Normalizer::Builtin { size: (800, 600) });
    }

    #[test]
    fn output_size_reenables_normaliser_from_settings() {
        let settings = BatchSettings { normalize: false, ..BatchSettings::default() };
        let config = parse(&["--output-size", "320x240"]).into_config(settings);
        assert_eq!(config.normalizer, Normalizer::External { size: (320, 240) });
    }

    #[test]
    fn no_normalize_conflicts_with_output_size() {
        assert!(Args::try_parse_from(["batchshot", "--no-normalize", "--output-size", "1x1"]).is_err());
    }

    #[test]
    fn missing_save_dir_falls_back_to_dialog() {
        let config = parse(&["--save-dir", "/nonexistent/batchshot/out", "--grabber", "maim"])
            .into_config(BatchSettings::default());
        assert_eq!(config.save_dir, None);
        assert_eq!(config.grabber, "maim");

        let dir = tempfile::tempdir().unwrap();
        let config = parse(&["-s", dir.path().to_str().unwrap(), "--open"])
            .into_config(BatchSettings::default());
        assert_eq!(config.save_dir.as_deref(), Some(dir.path()));
        assert!(config.open_after_save);
    }
}

// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::ConfigError;
use crate::glyph::{parse_alphabet, parse_char_range, Alphabet};
use crate::lanes::lane_count;

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  katarain --cell-size 14 --frame-delay 30 --max-tail-length 62 --max-raindrops 200 --alphabet katakana --color-bg black";

/// Canvas used when there is no terminal to measure (headless runs).
pub const REFERENCE_CANVAS: (i32, i32) = (1400, 700);

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        DEFAULT_PARAMS_USAGE.replacen(
            "DEFAULT PARAMS USAGE:",
            "\x1b[1;36mDEFAULT PARAMS USAGE:\x1b[0m",
            1,
        )
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBg {
    #[value(name = "black")]
    Black,
    #[value(name = "default-background")]
    DefaultBackground,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "katarain", version, disable_version_flag = true)]
pub struct Args {
    #[arg(
        short = 'W',
        long = "screen-width",
        help_heading = "CANVAS",
        help = "Canvas width in pixels (default: fill the terminal)"
    )]
    pub screen_width: Option<i32>,

    #[arg(
        short = 'H',
        long = "screen-height",
        help_heading = "CANVAS",
        help = "Canvas height in pixels (default: fill the terminal)"
    )]
    pub screen_height: Option<i32>,

    #[arg(
        short = 'c',
        long = "cell-size",
        default_value_t = 14,
        allow_negative_numbers = true,
        help_heading = "CANVAS",
        help = "Glyph cell size in pixels (min 1)"
    )]
    pub cell_size: i32,

    #[arg(
        short = 'd',
        long = "frame-delay",
        default_value_t = 30,
        help_heading = "RAIN",
        help = "Delay between frames in milliseconds"
    )]
    pub frame_delay: u64,

    #[arg(
        short = 't',
        long = "max-tail-length",
        default_value_t = 62,
        help_heading = "RAIN",
        help = "Longest raindrop tail in glyphs (min 1)"
    )]
    pub max_tail_length: usize,

    #[arg(
        short = 'o',
        long = "overlap",
        help_heading = "RAIN",
        help = "Let raindrops share a lane"
    )]
    pub overlap: bool,

    #[arg(
        short = 'n',
        long = "max-raindrops",
        default_value_t = 200,
        help_heading = "RAIN",
        help = "Raindrop pool size; forced to the lane count unless --overlap"
    )]
    pub max_raindrops: usize,

    #[arg(
        long = "color-ratio",
        help_heading = "APPEARANCE",
        help = "Tails shorter than this use the darker palette (default: max tail length / 2)"
    )]
    pub color_ratio: Option<usize>,

    #[arg(
        short = 'a',
        long = "alphabet",
        default_value = "katakana",
        help_heading = "APPEARANCE",
        help = "Glyph alphabet (see --list-alphabets)"
    )]
    pub alphabet: String,

    #[arg(
        long = "chars",
        help_heading = "APPEARANCE",
        help = "Custom glyph range as hex code points: FIRST,LAST"
    )]
    pub chars: Option<String>,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,16,8/256,24/32). Default: 24-bit if COLORTERM says so, else 8-bit"
    )]
    pub colormode: Option<u16>,

    #[arg(
        long = "color-bg",
        default_value_t = ColorBg::Black,
        value_enum,
        help_heading = "APPEARANCE",
        help = "Background mode (black, default-background)"
    )]
    pub color_bg: ColorBg,

    #[arg(
        long = "no-bold",
        help_heading = "APPEARANCE",
        help = "Draw glyphs without the bold attribute"
    )]
    pub no_bold: bool,

    #[arg(
        long = "seed",
        help_heading = "GENERAL",
        help = "Seed the random generator for a reproducible rain"
    )]
    pub seed: Option<u64>,

    #[arg(
        long = "duration",
        allow_negative_numbers = true,
        help_heading = "GENERAL",
        help = "Stop after N seconds (<=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        long = "headless",
        value_name = "FRAMES",
        help_heading = "GENERAL",
        help = "Simulate FRAMES frames off-screen, print a summary and exit"
    )]
    pub headless: Option<u64>,

    #[arg(
        long = "log-file",
        value_name = "PATH",
        help_heading = "GENERAL",
        help = "Write logs to PATH (filter with RUST_LOG)"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(
        long = "check-bitcolor",
        help_heading = "HELP",
        help = "Print detected terminal color capability and exit"
    )]
    pub check_bitcolor: bool,

    #[arg(
        long = "list-alphabets",
        help_heading = "HELP",
        help = "List available alphabets and exit"
    )]
    pub list_alphabets: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

/// Upper bounds on the grid and pool, so a stray argument is rejected
/// instead of sizing allocations by it.
pub const MAX_LANES: usize = 2048;
pub const MAX_ROWS: usize = 2048;
pub const MAX_RAINDROPS: usize = 65_535;
pub const MAX_TAIL_LENGTH: usize = 1024;

fn at_most(option: &'static str, value: usize, max: usize) -> Result<(), ConfigError> {
    if value > max {
        return Err(ConfigError::OutOfRange {
            option,
            value: value as u64,
            max: max as u64,
        });
    }
    Ok(())
}

/// Fixed startup parameters of the rain. All sizes are pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RainConfig {
    pub screen_width: i32,
    pub screen_height: i32,
    pub cell_size: i32,
    pub max_tail_length: usize,
    pub overlap_allowed: bool,
    pub max_raindrops: usize,
    pub color_ratio: usize,
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            screen_width: REFERENCE_CANVAS.0,
            screen_height: REFERENCE_CANVAS.1,
            cell_size: 14,
            max_tail_length: 62,
            overlap_allowed: false,
            max_raindrops: 200,
            color_ratio: 31,
        }
    }
}

impl RainConfig {
    pub fn lane_count(&self) -> usize {
        lane_count(self.screen_width, self.cell_size)
    }

    /// With exclusive lanes the pool is exactly one raindrop per lane.
    /// Returns the previous size when it had to change.
    pub fn force_lane_pool(&mut self) -> Option<usize> {
        if self.overlap_allowed {
            return None;
        }
        let lanes = self.lane_count();
        if self.max_raindrops == lanes {
            return None;
        }
        Some(std::mem::replace(&mut self.max_raindrops, lanes))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cell = self.cell_size;
        if cell <= 0 {
            return Err(ConfigError::ZeroCellSize(cell));
        }
        if self.max_tail_length == 0 {
            return Err(ConfigError::ZeroTailLength(self.max_tail_length));
        }
        if self.screen_width < cell || self.screen_height < cell {
            return Err(ConfigError::CanvasTooSmall {
                width: self.screen_width,
                height: self.screen_height,
                cell,
            });
        }
        // y runs up to height + (tail + 1) cells before a recycle
        let reach = (self.max_tail_length as i64)
            .saturating_add(1)
            .saturating_mul(i64::from(cell))
            .saturating_add(i64::from(self.screen_height));
        if reach > i64::from(i32::MAX) {
            return Err(ConfigError::CanvasTooLarge {
                width: self.screen_width,
                height: self.screen_height,
                cell,
                tail: self.max_tail_length,
            });
        }
        at_most("--max-tail-length", self.max_tail_length, MAX_TAIL_LENGTH)?;
        let lanes = self.lane_count();
        at_most("lane count (--screen-width / --cell-size)", lanes, MAX_LANES)?;
        let rows = (self.screen_height / cell) as usize;
        at_most("row count (--screen-height / --cell-size)", rows, MAX_ROWS)?;
        if self.max_raindrops == 0 {
            return Err(ConfigError::NoRaindrops(self.max_raindrops));
        }
        at_most("--max-raindrops", self.max_raindrops, MAX_RAINDROPS)?;
        if !self.overlap_allowed && self.max_raindrops > lanes {
            return Err(ConfigError::LaneOverflow {
                requested: self.max_raindrops,
                lanes,
            });
        }
        Ok(())
    }
}

impl Args {
    /// `--chars` wins over `--alphabet`.
    pub fn glyph_alphabet(&self) -> Result<Alphabet, ConfigError> {
        match &self.chars {
            Some(range) => parse_char_range(range),
            None => parse_alphabet(&self.alphabet),
        }
    }

    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay)
    }

    /// Resolves the canvas against `viewport` (terminal columns and rows),
    /// falling back to the reference canvas when there is none. The pool is
    /// not forced here so the caller can report it.
    pub fn rain_config(
        &self,
        viewport: Option<(u16, u16)>,
        glyph_columns: u16,
    ) -> Result<RainConfig, ConfigError> {
        let cell = self.cell_size;
        if cell <= 0 {
            return Err(ConfigError::ZeroCellSize(cell));
        }
        let (fit_w, fit_h) = match viewport {
            Some((cols, rows)) => {
                let lanes = i64::from(cols / glyph_columns.max(1));
                let clamp = |v: i64| v.min(i64::from(i32::MAX)) as i32;
                (
                    clamp(lanes * i64::from(cell)),
                    clamp(i64::from(rows) * i64::from(cell)),
                )
            }
            None => REFERENCE_CANVAS,
        };
        Ok(RainConfig {
            screen_width: self.screen_width.unwrap_or(fit_w),
            screen_height: self.screen_height.unwrap_or(fit_h),
            cell_size: cell,
            max_tail_length: self.max_tail_length,
            overlap_allowed: self.overlap,
            max_raindrops: self.max_raindrops,
            color_ratio: self
                .color_ratio
                .unwrap_or(self.max_tail_length / 2),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["katarain"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_match_the_reference_rain() {
        let a = args(&[]);
        let cfg = a.rain_config(None, 2).unwrap();
        assert_eq!(cfg, RainConfig::default());
        assert_eq!(a.frame_delay(), Duration::from_millis(30));
        assert_eq!(a.glyph_alphabet().unwrap(), Alphabet::KATAKANA);
    }

    #[test]
    fn canvas_fills_the_terminal() {
        let cfg = args(&[]).rain_config(Some((81, 24)), 2).unwrap();
        assert_eq!(cfg.screen_width, 40 * 14);
        assert_eq!(cfg.screen_height, 24 * 14);
        assert_eq!(cfg.lane_count(), 40);

        let cfg = args(&["-W", "280", "-H", "140"])
            .rain_config(Some((200, 60)), 1)
            .unwrap();
        assert_eq!((cfg.screen_width, cfg.screen_height), (280, 140));
    }

    #[test]
    fn exclusive_lanes_force_the_pool_size() {
        let mut cfg = RainConfig::default();
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::LaneOverflow {
                requested: 200,
                lanes: 100
            })
        );
        assert_eq!(cfg.force_lane_pool(), Some(200));
        assert_eq!(cfg.max_raindrops, 100);
        assert_eq!(cfg.force_lane_pool(), None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn overlap_keeps_the_requested_pool() {
        let mut cfg = args(&["--overlap", "-n", "500"])
            .rain_config(None, 2)
            .unwrap();
        assert_eq!(cfg.force_lane_pool(), None);
        assert_eq!(cfg.max_raindrops, 500);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert_eq!(
            args(&["--cell-size", "0"]).rain_config(None, 1),
            Err(ConfigError::ZeroCellSize(0))
        );
        assert_eq!(
            args(&["--cell-size", "-3"]).rain_config(None, 1),
            Err(ConfigError::ZeroCellSize(-3))
        );

        let mut cfg = args(&["-t", "0"]).rain_config(None, 1).unwrap();
        cfg.force_lane_pool();
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroTailLength(0)));

        let mut cfg = args(&["-W", "10"]).rain_config(None, 1).unwrap();
        cfg.force_lane_pool();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::CanvasTooSmall { .. })
        ));

        let cfg = args(&["--overlap", "-n", "0"]).rain_config(None, 1).unwrap();
        assert_eq!(cfg.validate(), Err(ConfigError::NoRaindrops(0)));

        let mut cfg = args(&["-H", "2147483000"]).rain_config(None, 1).unwrap();
        cfg.force_lane_pool();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::CanvasTooLarge { .. })
        ));
    }

    #[test]
    fn oversized_grids_and_pools_are_rejected() {
        let mut cfg = args(&["-W", "2147483647", "-c", "1"])
            .rain_config(None, 1)
            .unwrap();
        cfg.force_lane_pool();
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::OutOfRange {
                option: "lane count (--screen-width / --cell-size)",
                value: 2_147_483_647,
                max: MAX_LANES as u64,
            })
        );

        let cfg = args(&["-H", "100000", "-c", "1", "-W", "100", "--overlap"])
            .rain_config(None, 1)
            .unwrap();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange { option, .. }) if option.starts_with("row count")
        ));

        let cfg = args(&["--overlap", "-n", "10000000000"])
            .rain_config(None, 1)
            .unwrap();
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::OutOfRange {
                option: "--max-raindrops",
                value: 10_000_000_000,
                max: MAX_RAINDROPS as u64,
            })
        );

        let mut cfg = args(&["-t", "100000"]).rain_config(None, 1).unwrap();
        cfg.force_lane_pool();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange { option: "--max-tail-length", .. })
        ));

        // the limits themselves are accepted
        let cfg = RainConfig {
            screen_width: MAX_LANES as i32,
            screen_height: MAX_ROWS as i32,
            cell_size: 1,
            max_tail_length: MAX_TAIL_LENGTH,
            overlap_allowed: true,
            max_raindrops: MAX_RAINDROPS,
            color_ratio: 0,
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn color_ratio_defaults_to_half_the_tail() {
        let cfg = args(&["-t", "20"]).rain_config(None, 1).unwrap();
        assert_eq!(cfg.color_ratio, 10);
        let cfg = args(&["--color-ratio", "3"]).rain_config(None, 1).unwrap();
        assert_eq!(cfg.color_ratio, 3);
    }

    #[test]
    fn chars_override_the_alphabet() {
        let a = args(&["--alphabet", "latin", "--chars", "30,31"]);
        assert_eq!(a.glyph_alphabet().unwrap(), Alphabet::BINARY);
    }
}

// Copyright (c) 2026 rezky_nightky

mod cell;
mod config;
mod error;
mod field;
mod frame;
mod glyph;
mod lanes;
mod raindrop;
mod render;
mod runtime;
mod shade;
mod terminal;

use std::env;
use std::fs::OpenOptions;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::config::{color_enabled_stdout, default_params_usage_for_help, Args, ColorBg};
use crate::error::{AppError, ConfigError};
use crate::field::RainField;
use crate::frame::Frame;
use crate::glyph::print_list_alphabets;
use crate::render::{CellStyle, CellSurface};
use crate::runtime::ColorMode;
use crate::terminal::{restore_terminal_best_effort, Terminal};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn detect_color_mode(args: &Args) -> Result<ColorMode, ConfigError> {
    match args.colormode {
        Some(bits) => ColorMode::from_bits(bits).ok_or(ConfigError::ColorMode(bits)),
        None => Ok(ColorMode::detect(
            &env::var("COLORTERM").unwrap_or_default(),
            &env::var("TERM").unwrap_or_default(),
        )),
    }
}

const DURATION_RANGE_S: (f64, f64) = (0.1, 86_400.0);

fn stop_time(args: &Args, start: Instant) -> Result<Option<Instant>, ConfigError> {
    let (lo, hi) = DURATION_RANGE_S;
    match args.duration {
        Some(s) if !s.is_finite() => Err(ConfigError::Duration(format!(
            "{} (must be a finite number)",
            s
        ))),
        Some(s) if s > 0.0 && (s < lo || s > hi) => Err(ConfigError::Duration(format!(
            "{} (allowed: {}..{} seconds, <=0 disables)",
            s, lo, hi
        ))),
        Some(s) if s > 0.0 => Ok(Some(start + Duration::from_secs_f64(s))),
        _ => Ok(None),
    }
}

fn is_quit(k: &KeyEvent) -> bool {
    match k.code {
        KeyCode::Esc | KeyCode::Char('q') => true,
        KeyCode::Char('c') => k.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

fn init_logging(path: &Path) -> Result<(), AppError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))
}

fn print_check_bitcolor(args: &Args) -> Result<(), AppError> {
    let colorterm = env::var("COLORTERM").unwrap_or_default();
    let term = env::var("TERM").unwrap_or_default();
    let auto = ColorMode::detect(&colorterm, &term);
    let effective = detect_color_mode(args)?;
    let or_unset = |v: &str| {
        if v.is_empty() {
            "(unset)".to_string()
        } else {
            v.to_string()
        }
    };

    println!("BITCOLOR CHECK:");
    println!("  COLORTERM: {}", or_unset(&colorterm));
    println!("  TERM: {}", or_unset(&term));
    println!("  auto_detected: {}", auto.label());
    if args.colormode.is_some() {
        println!("  forced: {}", effective.label());
    }
    println!("  effective: {}", effective.label());
    Ok(())
}

fn print_info() {
    println!("Version: v{}", env!("CARGO_PKG_VERSION"));
    let sha = env!("KATARAIN_GIT_SHA");
    if sha.is_empty() {
        println!("Build: {}", env!("KATARAIN_BUILD"));
    } else {
        println!("Build: {} ({})", env!("KATARAIN_BUILD"), sha);
    }
    println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
    println!("License: {}", env!("CARGO_PKG_LICENSE"));
    println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
}

/// Character grid big enough to show the whole canvas.
fn canvas_cells(field: &RainField, glyph_columns: u16) -> (u16, u16) {
    let cfg = field.config();
    let cols = cfg.lane_count().saturating_mul(glyph_columns.max(1) as usize);
    let rows = (cfg.screen_height / cfg.cell_size.max(1)).max(0) as usize;
    (
        cols.min(u16::MAX as usize) as u16,
        rows.min(u16::MAX as usize) as u16,
    )
}

fn run_headless(field: &mut RainField, frames: u64, style: CellStyle) -> Result<(), AppError> {
    let (cols, rows) = canvas_cells(field, style.glyph_columns);
    let mut frame = Frame::new(cols, rows, None);
    let start = Instant::now();
    let mut changed_cells: u64 = 0;
    let mut glyphs_last: usize = 0;

    for _ in 0..frames {
        field.advance_frame()?;
        field.render(&mut CellSurface::new(&mut frame, style));
        changed_cells += frame.dirty_indices().len() as u64;
        frame.clear_dirty();
        glyphs_last = field.glyphs().count();
    }

    let elapsed_s = start.elapsed().as_secs_f64().max(0.000_001);
    let cfg = field.config();
    info!(
        frames = field.frame_count(),
        recycles = field.recycle_count(),
        "headless run finished"
    );

    println!("HEADLESS RUN:");
    println!(
        "  canvas: {}x{} px, cell {} px ({}x{} cells)",
        cfg.screen_width, cfg.screen_height, cfg.cell_size, cols, rows
    );
    let alphabet = field.alphabet();
    println!(
        "  alphabet: U+{:04X}..U+{:04X} ({} glyphs)",
        alphabet.first() as u32,
        alphabet.last() as u32,
        alphabet.len()
    );
    println!(
        "  raindrops: {} ({})",
        field.raindrops().len(),
        if cfg.overlap_allowed {
            "lanes shared"
        } else {
            "one per lane"
        }
    );
    println!("  frames: {}", field.frame_count());
    println!("  recycles: {}", field.recycle_count());
    println!("  glyphs_last_frame: {}", glyphs_last);
    println!("  changed_cells: {}", changed_cells);
    if let Some(lanes) = field.lanes() {
        println!("  free_lanes: {} of {}", lanes.free_count(), lanes.lane_count());
    }
    println!(
        "  sim_fps: {:.1}",
        field.frame_count() as f64 / elapsed_s
    );
    Ok(())
}

fn run_terminal(
    args: &Args,
    field: &mut RainField,
    style: CellStyle,
    end_time: Option<Instant>,
) -> Result<(), AppError> {
    let mut term = Terminal::new()?;
    let (w, h) = term.size()?;
    let mut frame = Frame::new(w, h, None);

    let period = args.frame_delay();
    let mut next_frame = Instant::now();

    'rain: loop {
        loop {
            while Terminal::poll_event(Duration::from_millis(0))? {
                match Terminal::read_event()? {
                    Event::Resize(nw, nh) => {
                        frame = Frame::new(nw, nh, frame.background());
                    }
                    Event::Key(k) if k.kind == KeyEventKind::Press && is_quit(&k) => {
                        break 'rain;
                    }
                    _ => {}
                }
            }

            let now = Instant::now();
            if end_time.is_some_and(|end| now >= end) {
                break 'rain;
            }
            if now >= next_frame {
                break;
            }

            let mut timeout = next_frame - now;
            if let Some(end) = end_time {
                timeout = timeout.min(end - now);
            }
            let _ = Terminal::poll_event(timeout)?;
        }

        field.advance_frame()?;
        field.render(&mut CellSurface::new(&mut frame, style));
        if frame.is_dirty_all() || !frame.dirty_indices().is_empty() {
            term.draw(&mut frame)?;
        }

        next_frame += period;
        let now = Instant::now();
        if now > next_frame {
            next_frame = now;
        }
    }

    info!(
        frames = field.frame_count(),
        recycles = field.recycle_count(),
        "rain stopped"
    );
    Ok(())
}

fn run(args: Args) -> Result<(), AppError> {
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let start = Instant::now();
    let end_time = stop_time(&args, start)?;
    let color_mode = detect_color_mode(&args)?;
    let alphabet = args.glyph_alphabet()?;
    let glyph_columns = alphabet.columns();

    let viewport = if args.headless.is_some() {
        None
    } else {
        crossterm::terminal::size().ok()
    };
    let mut config = args.rain_config(viewport, glyph_columns)?;
    if let Some(requested) = config.force_lane_pool() {
        warn!(
            requested,
            lanes = config.max_raindrops,
            "raindrops cannot overlap; pool sized to one per lane"
        );
    }
    config.validate()?;

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    info!(
        width = config.screen_width,
        height = config.screen_height,
        cell = config.cell_size,
        raindrops = config.max_raindrops,
        overlap = config.overlap_allowed,
        max_tail = config.max_tail_length,
        color_mode = color_mode.label(),
        "starting rain"
    );
    let mut field = RainField::new(config, alphabet, rng)?;

    let style = CellStyle {
        cell_size: config.cell_size,
        glyph_columns,
        color_mode,
        default_background: args.color_bg == ColorBg::DefaultBackground,
        bold: !args.no_bold,
    };

    match args.headless {
        Some(frames) => run_headless(&mut field, frames, style),
        None => run_terminal(&args, &mut field, style, end_time),
    }
}

fn main() -> ExitCode {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }

    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    cmd = cmd.help_template(if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    });
    cmd.build();
    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }

    let matches = cmd.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if args.list_alphabets {
        print_list_alphabets(color_enabled_stdout());
        return ExitCode::SUCCESS;
    }

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    if args.info {
        print_info();
        return ExitCode::SUCCESS;
    }

    let result = if args.check_bitcolor {
        print_check_bitcolor(&args)
    } else {
        run(args)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::config::RainConfig;
    use crate::glyph::Alphabet;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn quit_keys() {
        assert!(is_quit(&key(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit(&key(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit(&key(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit(&key(KeyCode::Char(' '), KeyModifiers::NONE)));
    }

    #[test]
    fn duration_zero_or_less_disables_the_timer() {
        let start = Instant::now();
        let args = Args::try_parse_from(["katarain", "--duration", "0"]).unwrap();
        assert_eq!(stop_time(&args, start), Ok(None));
        let args = Args::try_parse_from(["katarain", "--duration", "1.5"]).unwrap();
        assert_eq!(
            stop_time(&args, start),
            Ok(Some(start + Duration::from_millis(1500)))
        );
        let args = Args::try_parse_from(["katarain", "--duration", "-2"]).unwrap();
        assert_eq!(stop_time(&args, start), Ok(None));
        let args = Args::try_parse_from(["katarain", "--duration", "86400"]).unwrap();
        assert_eq!(
            stop_time(&args, start),
            Ok(Some(start + Duration::from_secs(86_400)))
        );
        for bad in ["NaN", "inf", "1e30", "86400.5", "0.05"] {
            let args = Args::try_parse_from(["katarain", "--duration", bad]).unwrap();
            assert!(
                matches!(stop_time(&args, start), Err(ConfigError::Duration(_))),
                "--duration {} accepted",
                bad
            );
        }
    }

    #[test]
    fn forced_colormode_is_checked() {
        let args = Args::try_parse_from(["katarain", "--colormode", "24"]).unwrap();
        assert_eq!(detect_color_mode(&args), Ok(ColorMode::TrueColor));
        let args = Args::try_parse_from(["katarain", "--colormode", "7"]).unwrap();
        assert_eq!(detect_color_mode(&args), Err(ConfigError::ColorMode(7)));
    }

    #[test]
    fn headless_grid_covers_the_canvas() {
        let field = RainField::new(
            RainConfig::default(),
            Alphabet::KATAKANA,
            StdRng::seed_from_u64(1),
        )
        .unwrap();
        assert_eq!(canvas_cells(&field, 2), (200, 50));
        assert_eq!(canvas_cells(&field, 1), (100, 50));
    }

    #[test]
    fn headless_run_advances_the_requested_frames() {
        let mut field = RainField::new(
            RainConfig::default(),
            Alphabet::HALFWIDTH,
            StdRng::seed_from_u64(2),
        )
        .unwrap();
        let style = CellStyle {
            cell_size: 14,
            glyph_columns: 1,
            color_mode: ColorMode::Color256,
            default_background: false,
            bold: true,
        };
        run_headless(&mut field, 120, style).unwrap();
        assert_eq!(field.frame_count(), 120);
        assert!(field.recycle_count() > 0);
    }
}

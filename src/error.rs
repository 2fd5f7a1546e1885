// Copyright (c) 2026 rezky_nightky

use thiserror::Error;

/// Startup rejections. Nothing here is recoverable once the rain is running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("--cell-size {0} (must be at least 1 pixel)")]
    ZeroCellSize(i32),
    #[error("--max-tail-length {0} (must be at least 1)")]
    ZeroTailLength(usize),
    #[error("--max-raindrops {0} (must be at least 1)")]
    NoRaindrops(usize),
    #[error("canvas {width}x{height} (must fit at least one {cell}px cell each way)")]
    CanvasTooSmall { width: i32, height: i32, cell: i32 },
    #[error("canvas {width}x{height} (too large for a {cell}px cell and tail length {tail})")]
    CanvasTooLarge {
        width: i32,
        height: i32,
        cell: i32,
        tail: usize,
    },
    #[error("--max-raindrops {requested} (only {lanes} lanes when raindrops cannot overlap)")]
    LaneOverflow { requested: usize, lanes: usize },
    #[error("--chars {0}")]
    InvalidRange(String),
    #[error("--alphabet {0} (see --list-alphabets)")]
    UnknownAlphabet(String),
    #[error("--colormode {0} (allowed: 0,16,8/256,24/32)")]
    ColorMode(u16),
    #[error("--duration {0}")]
    Duration(String),
    #[error("{option} {value} (must be at most {max})")]
    OutOfRange {
        option: &'static str,
        value: u64,
        max: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LaneError {
    #[error("no free lane left among {lanes} lanes")]
    Exhausted { lanes: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Lane(#[from] LaneError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to apply {0}")]
    Config(#[from] ConfigError),
    #[error("lane allocator invariant violated: {0}")]
    Lane(#[from] LaneError),
    #[error("failed to install log subscriber: {0}")]
    Logging(String),
}

impl From<FieldError> for AppError {
    fn from(e: FieldError) -> Self {
        match e {
            FieldError::Config(c) => AppError::Config(c),
            FieldError::Lane(l) => AppError::Lane(l),
        }
    }
}

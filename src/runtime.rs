// Copyright (c) 2025 rezk_nightky

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Color16,
    Color256,
    TrueColor,
}

impl ColorMode {
    /// Guess from `COLORTERM` and `TERM`. Unknown terminals get 256 colors.
    pub fn detect(colorterm: &str, term: &str) -> ColorMode {
        let colorterm = colorterm.to_ascii_lowercase();
        if colorterm.contains("truecolor") || colorterm.contains("24bit") {
            return ColorMode::TrueColor;
        }

        let term = term.to_ascii_lowercase();
        if term == "dumb" {
            return ColorMode::Mono;
        }
        ColorMode::Color256
    }

    pub fn from_bits(bits: u16) -> Option<ColorMode> {
        match bits {
            0 => Some(ColorMode::Mono),
            16 => Some(ColorMode::Color16),
            8 | 256 => Some(ColorMode::Color256),
            24 | 32 => Some(ColorMode::TrueColor),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorMode::TrueColor => "24-bit truecolor",
            ColorMode::Color256 => "8-bit (256-color)",
            ColorMode::Color16 => "16-color",
            ColorMode::Mono => "mono",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ColorMode;

    #[test]
    fn detect_prefers_colorterm() {
        assert_eq!(
            ColorMode::detect("truecolor", "xterm-256color"),
            ColorMode::TrueColor
        );
        assert_eq!(ColorMode::detect("", "dumb"), ColorMode::Mono);
        assert_eq!(ColorMode::detect("", "xterm"), ColorMode::Color256);
    }

    #[test]
    fn from_bits_accepts_aliases_only() {
        assert_eq!(ColorMode::from_bits(32), Some(ColorMode::TrueColor));
        assert_eq!(ColorMode::from_bits(256), Some(ColorMode::Color256));
        assert_eq!(ColorMode::from_bits(12), None);
    }
}

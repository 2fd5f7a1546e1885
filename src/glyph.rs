// Copyright (c) 2026 rezky_nightky

use rand::{
    distr::{Distribution, Uniform},
    Rng,
};
use unicode_width::UnicodeWidthChar;

use crate::error::ConfigError;

/// A contiguous run of code points glyphs are drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Alphabet {
    start: u32,
    len: u32,
}

impl Alphabet {
    pub const KATAKANA: Alphabet = Alphabet {
        start: 0x30A0,
        len: 96,
    };
    pub const HALFWIDTH: Alphabet = Alphabet {
        start: 0xFF66,
        len: 56,
    };
    pub const DIGITS: Alphabet = Alphabet {
        start: 0x30,
        len: 10,
    };
    pub const BINARY: Alphabet = Alphabet {
        start: 0x30,
        len: 2,
    };
    pub const LATIN: Alphabet = Alphabet {
        start: 0x41,
        len: 26,
    };

    pub fn from_range(first: char, last: char) -> Result<Self, ConfigError> {
        let (start, end) = (first as u32, last as u32);
        if end < start {
            return Err(ConfigError::InvalidRange(format!(
                "{:X},{:X} (first must not exceed last)",
                start, end
            )));
        }
        if start <= 0xD7FF && end >= 0xE000 {
            return Err(ConfigError::InvalidRange(format!(
                "{:X},{:X} (range crosses the surrogate block)",
                start, end
            )));
        }
        Ok(Self {
            start,
            len: end - start + 1,
        })
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn first(&self) -> char {
        self.get(0)
    }

    pub fn last(&self) -> char {
        self.get(self.len.saturating_sub(1))
    }

    pub fn get(&self, offset: u32) -> char {
        char::from_u32(self.start + offset.min(self.len.saturating_sub(1))).unwrap_or('0')
    }

    #[allow(dead_code)]
    pub fn contains(&self, ch: char) -> bool {
        let v = ch as u32;
        v >= self.start && v - self.start < self.len
    }

    /// Terminal columns one glyph needs: 2 when any member is a wide character.
    pub fn columns(&self) -> u16 {
        let wide = (0..self.len).any(|o| self.get(o).width().unwrap_or(1) >= 2);
        if wide {
            2
        } else {
            1
        }
    }
}

pub fn parse_alphabet(name: &str) -> Result<Alphabet, ConfigError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "katakana" | "kana" => Ok(Alphabet::KATAKANA),
        "halfwidth" | "half-width" | "half_width" => Ok(Alphabet::HALFWIDTH),
        "digits" | "dec" | "decimal" => Ok(Alphabet::DIGITS),
        "binary" | "bin" | "01" => Ok(Alphabet::BINARY),
        "latin" | "english" => Ok(Alphabet::LATIN),
        other => Err(ConfigError::UnknownAlphabet(other.to_string())),
    }
}

/// Parses `FIRST,LAST` hex code points into an alphabet.
pub fn parse_char_range(range: &str) -> Result<Alphabet, ConfigError> {
    let mut bounds = Vec::with_capacity(2);
    for (i, part) in range.split(',').enumerate() {
        let part = part.trim();
        let v = u32::from_str_radix(part, 16).map_err(|_| {
            ConfigError::InvalidRange(format!("{} (invalid hex char at index {})", range, i + 1))
        })?;
        let ch = char::from_u32(v).ok_or_else(|| {
            ConfigError::InvalidRange(format!(
                "{} (invalid unicode scalar at index {})",
                range,
                i + 1
            ))
        })?;
        bounds.push(ch);
    }
    match bounds.as_slice() {
        [first, last] => Alphabet::from_range(*first, *last),
        _ => Err(ConfigError::InvalidRange(format!(
            "{} (expected: FIRST,LAST)",
            range
        ))),
    }
}

pub fn print_list_alphabets(color: bool) {
    if color {
        println!("\x1b[1;36mAVAILABLE ALPHABETS:\x1b[0m");
    } else {
        println!("AVAILABLE ALPHABETS:");
    }
    println!();
    println!("VALUE        RANGE          DESCRIPTION");
    println!("katakana     30A0..30FF     Katakana block, 96 symbols (default)");
    println!("halfwidth    FF66..FF9D     Half-width katakana, one column each");
    println!("digits       30..39         Digits (aliases: dec, decimal)");
    println!("binary       30..31         0 and 1 (aliases: bin, 01)");
    println!("latin        41..5A         Upper-case letters (alias: english)");
}

/// Random symbols and tail lengths. Holds no generator of its own; callers
/// share one so a seeded run is reproducible end to end.
#[derive(Clone, Debug)]
pub struct GlyphSource {
    alphabet: Alphabet,
    rand_offset: Uniform<u32>,
    rand_tail: Uniform<usize>,
}

impl GlyphSource {
    pub fn new(alphabet: Alphabet, max_tail_length: usize) -> Result<Self, ConfigError> {
        if max_tail_length == 0 {
            return Err(ConfigError::ZeroTailLength(max_tail_length));
        }
        let rand_offset = Uniform::new(0, alphabet.len()).map_err(|_| {
            ConfigError::InvalidRange(format!("{:X} (empty alphabet)", alphabet.start))
        })?;
        let rand_tail = Uniform::new_inclusive(1, max_tail_length)
            .map_err(|_| ConfigError::ZeroTailLength(max_tail_length))?;
        Ok(Self {
            alphabet,
            rand_offset,
            rand_tail,
        })
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    pub fn next_glyph<R: Rng + ?Sized>(&self, rng: &mut R) -> char {
        self.alphabet.get(self.rand_offset.sample(rng))
    }

    pub fn next_tail_length<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.rand_tail.sample(rng)
    }

    /// Replaces `tail` with a freshly sized run of glyphs, keeping its allocation.
    pub fn fill_tail<R: Rng + ?Sized>(&self, rng: &mut R, tail: &mut Vec<char>) {
        let len = self.next_tail_length(rng);
        tail.clear();
        for _ in 0..len {
            tail.push(self.next_glyph(rng));
        }
    }
}

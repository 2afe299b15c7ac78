//! Codel colors and the color grid a geometric program runs on.

use super::image::PixelGrid;
use serde::Serialize;
use std::fmt;

/// Hue cycle, in the order hue steps are counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Hue {
    Red,
    Yellow,
    Green,
    Cyan,
    Blue,
    Magenta,
}

impl Hue {
    pub const ALL: [Hue; 6] = [Hue::Red, Hue::Yellow, Hue::Green, Hue::Cyan, Hue::Blue, Hue::Magenta];

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Lightness cycle, in the order lightness steps are counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lightness {
    Light,
    Normal,
    Dark,
}

impl Lightness {
    pub const ALL: [Lightness; 3] = [Lightness::Light, Lightness::Normal, Lightness::Dark];

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// A codel color: one of the 18 chromatic colors, white, or black
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Chromatic(Hue, Lightness),
    White,
    Black,
}

/// RGB of each chromatic color, indexed `[lightness][hue]`
const PALETTE: [[[u8; 3]; 6]; 3] = [
    [
        [0xFF, 0xC0, 0xC0],
        [0xFF, 0xFF, 0xC0],
        [0xC0, 0xFF, 0xC0],
        [0xC0, 0xFF, 0xFF],
        [0xC0, 0xC0, 0xFF],
        [0xFF, 0xC0, 0xFF],
    ],
    [
        [0xFF, 0x00, 0x00],
        [0xFF, 0xFF, 0x00],
        [0x00, 0xFF, 0x00],
        [0x00, 0xFF, 0xFF],
        [0x00, 0x00, 0xFF],
        [0xFF, 0x00, 0xFF],
    ],
    [
        [0xC0, 0x00, 0x00],
        [0xC0, 0xC0, 0x00],
        [0x00, 0xC0, 0x00],
        [0x00, 0xC0, 0xC0],
        [0x00, 0x00, 0xC0],
        [0xC0, 0x00, 0xC0],
    ],
];

impl Color {
    /// Classify a pixel. Colors outside the palette behave as white.
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        match rgb {
            [0xFF, 0xFF, 0xFF] => return Color::White,
            [0x00, 0x00, 0x00] => return Color::Black,
            _ => {}
        }
        for lightness in Lightness::ALL {
            for hue in Hue::ALL {
                if PALETTE[lightness.index()][hue.index()] == rgb {
                    return Color::Chromatic(hue, lightness);
                }
            }
        }
        Color::White
    }

    pub fn to_rgb(&self) -> [u8; 3] {
        match self {
            Color::Chromatic(hue, lightness) => PALETTE[lightness.index()][hue.index()],
            Color::White => [0xFF, 0xFF, 0xFF],
            Color::Black => [0x00, 0x00, 0x00],
        }
    }

    pub fn is_white(&self) -> bool {
        matches!(self, Color::White)
    }

    pub fn is_black(&self) -> bool {
        matches!(self, Color::Black)
    }

    /// (hue steps, lightness steps) from `self` to `to`, if both are chromatic
    pub fn steps_to(&self, to: &Color) -> Option<(usize, usize)> {
        match (self, to) {
            (Color::Chromatic(h1, l1), Color::Chromatic(h2, l2)) => Some((
                (h2.index() + 6 - h1.index()) % 6,
                (l2.index() + 3 - l1.index()) % 3,
            )),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Chromatic(hue, lightness) => write!(f, "{:?} {:?}", lightness, hue),
            Color::White => f.write_str("white"),
            Color::Black => f.write_str("black"),
        }
    }
}

/// Grid of codels, one color per codel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorGrid {
    width: usize,
    height: usize,
    cells: Vec<Color>,
}

impl ColorGrid {
    /// Build from rows of colors. Short rows are padded with white.
    pub fn from_rows(rows: Vec<Vec<Color>>) -> Self {
        let height = rows.len();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut cells = Vec::with_capacity(width * height);
        for mut row in rows {
            row.resize(width, Color::White);
            cells.extend(row);
        }
        Self { width, height, cells }
    }

    /// Sample the top-left pixel of every `codel_size` square
    pub fn from_pixels(pixels: &PixelGrid, codel_size: u32) -> Self {
        let size = codel_size.max(1) as usize;
        let width = (pixels.width() + size - 1) / size;
        let height = (pixels.height() + size - 1) / size;
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let rgb = pixels.get(x * size, y * size).unwrap_or([0xFF, 0xFF, 0xFF]);
                cells.push(Color::from_rgb(rgb));
            }
        }
        Self { width, height, cells }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Color at `(x, y)`, None off the grid
    pub fn get(&self, x: i64, y: i64) -> Option<Color> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.cells[y as usize * self.width + x as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgb() {
        assert_eq!(Color::from_rgb([0xFF, 0x00, 0x00]), Color::Chromatic(Hue::Red, Lightness::Normal));
        assert_eq!(Color::from_rgb([0xC0, 0xC0, 0xFF]), Color::Chromatic(Hue::Blue, Lightness::Light));
        assert_eq!(Color::from_rgb([0x00, 0xC0, 0xC0]), Color::Chromatic(Hue::Cyan, Lightness::Dark));
        assert_eq!(Color::from_rgb([0, 0, 0]), Color::Black);
        assert_eq!(Color::from_rgb([0x12, 0x34, 0x56]), Color::White);
    }

    #[test]
    fn test_palette_round_trips() {
        for lightness in Lightness::ALL {
            for hue in Hue::ALL {
                let color = Color::Chromatic(hue, lightness);
                assert_eq!(Color::from_rgb(color.to_rgb()), color);
            }
        }
    }

    #[test]
    fn test_steps_wrap() {
        let magenta_dark = Color::Chromatic(Hue::Magenta, Lightness::Dark);
        let red_normal = Color::Chromatic(Hue::Red, Lightness::Normal);
        assert_eq!(red_normal.steps_to(&magenta_dark), Some((5, 1)));
        assert_eq!(magenta_dark.steps_to(&red_normal), Some((1, 2)));
        assert_eq!(red_normal.steps_to(&Color::White), None);
    }

    #[test]
    fn test_from_pixels_samples_codels() {
        let red = [0xFF, 0x00, 0x00];
        let mut pixels = PixelGrid::new(4, 2, [0xFF, 0xFF, 0xFF]);
        pixels.set(2, 0, red);
        pixels.set(3, 1, [0, 0, 0]);
        let grid = ColorGrid::from_pixels(&pixels, 2);
        assert_eq!((grid.width(), grid.height()), (2, 1));
        assert_eq!(grid.get(0, 0), Some(Color::White));
        assert_eq!(grid.get(1, 0), Some(Color::Chromatic(Hue::Red, Lightness::Normal)));
        assert_eq!(grid.get(2, 0), None);
    }
}

//! Color blocks and exit selection.

use super::color::{Color, ColorGrid};
use crate::pointer::Direction;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Which side of the DP the exit codel is chosen on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodelChooser {
    Left,
    Right,
}

impl CodelChooser {
    pub fn toggled(&self) -> Self {
        match self {
            CodelChooser::Left => CodelChooser::Right,
            CodelChooser::Right => CodelChooser::Left,
        }
    }

    /// The absolute direction this chooser points to, relative to `dp`
    pub fn absolute(&self, dp: Direction) -> Direction {
        match self {
            CodelChooser::Left => dp.counter_clockwise(),
            CodelChooser::Right => dp.clockwise(),
        }
    }
}

impl fmt::Display for CodelChooser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CodelChooser::Left => "left",
            CodelChooser::Right => "right",
        })
    }
}

/// A maximal 4-connected set of same-colored codels
#[derive(Debug, Clone)]
pub struct Block {
    pub color: Color,
    pub codels: Vec<(i64, i64)>,
}

impl Block {
    /// Flood fill from `seed`. Recomputed on every call, never cached.
    pub fn flood_fill(grid: &ColorGrid, seed: (i64, i64)) -> Option<Self> {
        let color = grid.get(seed.0, seed.1)?;
        let mut seen = HashSet::from([seed]);
        let mut pending = vec![seed];
        let mut codels = Vec::new();
        while let Some((x, y)) = pending.pop() {
            codels.push((x, y));
            for direction in Direction::ALL {
                let (dx, dy) = direction.delta();
                let next = (x + dx, y + dy);
                if grid.get(next.0, next.1) == Some(color) && seen.insert(next) {
                    pending.push(next);
                }
            }
        }
        Some(Self { color, codels })
    }

    pub fn size(&self) -> usize {
        self.codels.len()
    }

    /// The codel the pointer leaves from: farthest along `dp`, then farthest
    /// toward the side `cc` selects
    pub fn exit_codel(&self, dp: Direction, cc: CodelChooser) -> (i64, i64) {
        let along = |codel: &(i64, i64), direction: Direction| {
            let (dx, dy) = direction.delta();
            codel.0 * dx + codel.1 * dy
        };
        let side = cc.absolute(dp);
        self.codels
            .iter()
            .copied()
            .max_by_key(|codel| (along(codel, dp), along(codel, side)))
            .unwrap_or_default()
    }
}

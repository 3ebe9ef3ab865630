//! Dashboard widget placement.
//!
//! The first widget spans the whole row. The rest are tiled left to right
//! and wrap to a new row when the next tile would overflow the row width.

use serde::{Deserialize, Serialize};

/// Grid dimensions in dashboard units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub row_width: u32,
    pub row_height: u32,
    /// Width of every widget after the first.
    pub tile_width: u32,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            row_width: 12,
            row_height: 4,
            tile_width: 6,
        }
    }
}

/// Position and size of one widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Grid {
    /// Place a full-width header followed by `tiles` widgets.
    pub fn place(&self, tiles: usize) -> Vec<Placement> {
        let tile_width = self.tile_width.clamp(1, self.row_width.max(1));

        let mut placements = Vec::with_capacity(tiles + 1);
        placements.push(Placement {
            x: 0,
            y: 0,
            width: self.row_width,
            height: self.row_height,
        });

        let mut x = 0;
        let mut y = self.row_height;
        for _ in 0..tiles {
            if x + tile_width > self.row_width {
                x = 0;
                y += self.row_height;
            }
            placements.push(Placement {
                x,
                y,
                width: tile_width,
                height: self.row_height,
            });
            x += tile_width;
        }

        placements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Number of distinct rows the placements occupy.
    fn rows(placements: &[Placement]) -> usize {
        let mut ys: Vec<u32> = placements.iter().map(|p| p.y).collect();
        ys.sort_unstable();
        ys.dedup();
        ys.len()
    }

    #[test]
    fn test_header_spans_row() {
        let placements = Grid::default().place(0);
        assert_eq!(
            placements,
            vec![Placement {
                x: 0,
                y: 0,
                width: 12,
                height: 4
            }]
        );
    }

    #[test]
    fn test_tiles_wrap() {
        let placements = Grid::default().place(3);
        let coords: Vec<(u32, u32)> = placements.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(coords, vec![(0, 0), (0, 4), (6, 4), (0, 8)]);
    }

    #[test]
    fn test_row_count_matches_formula() {
        for (row_width, tile_width) in [(12, 6), (12, 4), (12, 5), (10, 3), (12, 12), (7, 1)] {
            let grid = Grid {
                row_width,
                row_height: 4,
                tile_width,
            };
            let per_row = (row_width / tile_width) as usize;
            for n in 0..20_usize {
                let expected = 1 + n.div_ceil(per_row);
                assert_eq!(
                    rows(&grid.place(n)),
                    expected,
                    "R={row_width} w={tile_width} N={n}"
                );
            }
        }
    }

    #[test]
    fn test_oversized_tile_is_clamped() {
        let grid = Grid {
            row_width: 4,
            row_height: 2,
            tile_width: 9,
        };
        let placements = grid.place(2);
        assert!(placements.iter().all(|p| p.x + p.width <= 4));
        assert_eq!(rows(&placements), 3);
    }
}

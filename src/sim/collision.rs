//! Map Collision
//!
//! Tile grid collider used by the headless runner and tests. World positions
//! are in units, `UNITS_PER_TILE` to a tile. Anything outside the grid is wall.

use bevy::prelude::*;

use super::constants::UNITS_PER_TILE;
use super::services::MapCollider;

/// Walkability grid built from ASCII rows (`#` is wall).
#[derive(Resource, Debug, Clone, Default)]
pub struct MapCollision {
    width: i32,
    height: i32,
    walls: Vec<bool>,
}

impl MapCollision {
    /// An open map with no interior walls.
    pub fn open(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            walls: vec![false; (width * height) as usize],
        }
    }

    /// Build from ASCII rows. Short rows are padded with wall.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, String> {
        if rows.is_empty() {
            return Err("Map has no rows".to_string());
        }
        let width = rows
            .iter()
            .map(|row| row.as_ref().chars().count())
            .max()
            .unwrap_or(0);
        if width == 0 {
            return Err("Map rows are empty".to_string());
        }

        let mut walls = Vec::with_capacity(width * rows.len());
        for row in rows {
            let row = row.as_ref();
            let len = row.chars().count();
            walls.extend(row.chars().map(|c| c == '#'));
            walls.extend(std::iter::repeat(true).take(width - len));
        }

        Ok(Self {
            width: width as i32,
            height: rows.len() as i32,
            walls,
        })
    }

    pub fn size(&self) -> IVec2 {
        IVec2::new(self.width, self.height)
    }

    /// Tile containing a world position.
    pub fn tile_of(pos: IVec2) -> IVec2 {
        pos.div_euclid(IVec2::splat(UNITS_PER_TILE))
    }

    /// World position of a tile's center.
    pub fn tile_center(tile: IVec2) -> IVec2 {
        tile * UNITS_PER_TILE + IVec2::splat(UNITS_PER_TILE / 2)
    }

    pub fn is_wall_tile(&self, tile: IVec2) -> bool {
        if tile.x < 0 || tile.y < 0 || tile.x >= self.width || tile.y >= self.height {
            return true;
        }
        self.walls[(tile.y * self.width + tile.x) as usize]
    }

    /// Take one unit step, sliding along an axis when a diagonal is blocked.
    fn unit_step(&self, pos: IVec2, step: IVec2) -> Option<IVec2> {
        let candidates = [step, IVec2::new(step.x, 0), IVec2::new(0, step.y)];
        let tries = if step.x != 0 && step.y != 0 { 3 } else { 1 };

        candidates[..tries]
            .iter()
            .map(|delta| pos + *delta)
            .find(|next| !self.is_wall(*next))
    }
}

impl MapCollider for MapCollision {
    fn step(&self, pos: &mut IVec2, step: IVec2, distance: i32) -> bool {
        let step = step.signum();
        if distance <= 0 || step == IVec2::ZERO {
            return false;
        }

        let mut moved = false;
        for _ in 0..distance {
            match self.unit_step(*pos, step) {
                Some(next) => {
                    *pos = next;
                    moved = true;
                }
                None => break,
            }
        }
        moved
    }

    fn line_of_sight(&self, from: IVec2, to: IVec2) -> bool {
        line_points(from, to).all(|point| !self.is_wall(point))
    }

    fn is_wall(&self, pos: IVec2) -> bool {
        self.is_wall_tile(Self::tile_of(pos))
    }
}

/// Every unit point from `a` to `b`, both ends included.
fn line_points(a: IVec2, b: IVec2) -> impl Iterator<Item = IVec2> {
    let delta = b - a;
    let step = delta.signum();
    let d = delta.abs() * IVec2::new(1, -1);
    let mut p = a;
    let mut err = d.x + d.y;
    let mut done = false;

    std::iter::from_fn(move || {
        if done {
            return None;
        }
        let ret = p;
        if p == b {
            done = true;
        } else {
            let e2 = 2 * err;
            if e2 >= d.y {
                err += d.y;
                p.x += step.x;
            }
            if e2 <= d.x {
                err += d.x;
                p.y += step.y;
            }
        }
        Some(ret)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> MapCollision {
        MapCollision::from_rows(&[
            "#####", //
            "#...#", //
            "#.#.#", //
            "#...#", //
            "#####",
        ])
        .unwrap()
    }

    #[test]
    fn test_parse_rows() {
        let map = room();
        assert_eq!(map.size(), IVec2::new(5, 5));
        assert!(map.is_wall_tile(IVec2::new(0, 0)));
        assert!(!map.is_wall_tile(IVec2::new(1, 1)));
        assert!(map.is_wall_tile(IVec2::new(2, 2)));
        assert!(map.is_wall_tile(IVec2::new(-1, 3)), "Outside the grid is wall");
    }

    #[test]
    fn test_ragged_rows_pad_with_wall() {
        let map = MapCollision::from_rows(&["...", "."]).unwrap();
        assert!(!map.is_wall_tile(IVec2::new(0, 1)));
        assert!(map.is_wall_tile(IVec2::new(2, 1)));
        assert!(MapCollision::from_rows::<&str>(&[]).is_err());
    }

    #[test]
    fn test_step_moves_full_distance_in_open() {
        let map = room();
        let mut pos = MapCollision::tile_center(IVec2::new(1, 1));
        assert!(map.step(&mut pos, IVec2::new(1, 0), 10));
        assert_eq!(pos, IVec2::new(106, 96));
    }

    #[test]
    fn test_step_stops_at_wall() {
        let map = room();
        // Last unit of tile (1,1) before the wall at x = 0
        let mut pos = IVec2::new(64, 96);
        assert!(!map.step(&mut pos, IVec2::new(-1, 0), 5));
        assert_eq!(pos, IVec2::new(64, 96));

        let mut pos = IVec2::new(67, 96);
        assert!(map.step(&mut pos, IVec2::new(-1, 0), 5), "Partial moves succeed");
        assert_eq!(pos, IVec2::new(64, 96));
    }

    #[test]
    fn test_zero_length_step_is_refused() {
        let map = room();
        let start = MapCollision::tile_center(IVec2::new(1, 1));
        let mut pos = start;
        assert!(!map.step(&mut pos, IVec2::new(1, 0), 0));
        assert!(!map.step(&mut pos, IVec2::ZERO, 4));
        assert_eq!(pos, start);
    }

    #[test]
    fn test_blocked_diagonal_slides() {
        let map = room();
        let mut pos = IVec2::new(64, 96);
        assert!(map.step(&mut pos, IVec2::new(-1, 1), 4));
        assert_eq!(pos, IVec2::new(64, 100), "Slides along y when x is blocked");
    }

    #[test]
    fn test_line_of_sight_blocked_by_pillar() {
        let map = room();
        let left = MapCollision::tile_center(IVec2::new(1, 2));
        let right = MapCollision::tile_center(IVec2::new(3, 2));
        let top_left = MapCollision::tile_center(IVec2::new(1, 1));
        let top_right = MapCollision::tile_center(IVec2::new(3, 1));

        assert!(!map.line_of_sight(left, right));
        assert!(map.line_of_sight(top_left, top_right));
        assert!(map.line_of_sight(left, left));
    }

    #[test]
    fn test_line_points_include_both_ends() {
        let points: Vec<IVec2> = line_points(IVec2::ZERO, IVec2::new(3, 1)).collect();
        assert_eq!(points.first(), Some(&IVec2::ZERO));
        assert_eq!(points.last(), Some(&IVec2::new(3, 1)));
        assert_eq!(points.len(), 4);
    }
}

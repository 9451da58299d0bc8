use crate::constants::COLLISION_REACH;
use crate::rng::Rng;
use crate::types::{Direction, Vec2};

pub(super) fn manhattan(a: Vec2, b: Vec2) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

pub(super) fn distance_sq(a: Vec2, b: Vec2) -> i64 {
    let dx = (a.x - b.x) as i64;
    let dy = (a.y - b.y) as i64;
    dx * dx + dy * dy
}

pub(super) fn offset(pos: Vec2, dir: Direction, distance: i32) -> Vec2 {
    match dir {
        Direction::Up => Vec2 {
            x: pos.x,
            y: pos.y - distance,
        },
        Direction::Down => Vec2 {
            x: pos.x,
            y: pos.y + distance,
        },
        Direction::Left => Vec2 {
            x: pos.x - distance,
            y: pos.y,
        },
        Direction::Right => Vec2 {
            x: pos.x + distance,
            y: pos.y,
        },
        Direction::None => pos,
    }
}

/// Sprites collide only when they share a row or a column.
pub(super) fn overlaps(a: Vec2, b: Vec2) -> bool {
    (a.y == b.y && (a.x - b.x).abs() <= COLLISION_REACH)
        || (a.x == b.x && (a.y - b.y).abs() <= COLLISION_REACH)
}

pub(super) fn horizontal_toward(from: i32, to: i32) -> Direction {
    match to.cmp(&from) {
        std::cmp::Ordering::Greater => Direction::Right,
        std::cmp::Ordering::Less => Direction::Left,
        std::cmp::Ordering::Equal => Direction::None,
    }
}

pub(super) fn vertical_toward(from: i32, to: i32) -> Direction {
    match to.cmp(&from) {
        std::cmp::Ordering::Greater => Direction::Down,
        std::cmp::Ordering::Less => Direction::Up,
        std::cmp::Ordering::Equal => Direction::None,
    }
}

pub(super) fn random_direction(rng: &mut Rng) -> Direction {
    Direction::CARDINALS[rng.index_below(Direction::CARDINALS.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_needs_shared_axis() {
        let a = Vec2 { x: 100, y: 100 };
        assert!(overlaps(a, Vec2 { x: 120, y: 100 }));
        assert!(overlaps(a, Vec2 { x: 100, y: 80 }));
        assert!(!overlaps(a, Vec2 { x: 121, y: 100 }));
        assert!(!overlaps(a, Vec2 { x: 105, y: 105 }));
    }

    #[test]
    fn offset_moves_along_facing() {
        let p = Vec2 { x: 50, y: 50 };
        assert_eq!(offset(p, Direction::Up, 40), Vec2 { x: 50, y: 10 });
        assert_eq!(offset(p, Direction::Right, 20), Vec2 { x: 70, y: 50 });
        assert_eq!(offset(p, Direction::None, 20), p);
    }

    #[test]
    fn random_direction_is_always_cardinal() {
        let mut rng = Rng::new(7);
        for _ in 0..200 {
            assert_ne!(random_direction(&mut rng), Direction::None);
        }
    }
}

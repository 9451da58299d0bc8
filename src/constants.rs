use crate::types::Vec2;

pub const TICK_MS: u64 = 42;
pub const MOVES_PER_TICK: u32 = 7;

pub const TILE_SIZE: i32 = 10;
pub const SPRITE_TILES: i32 = 3;
pub const MAZE_ROWS: usize = 53;
pub const MAZE_COLS: usize = 46;

/// Largest anchor coordinate an agent can occupy on each axis.
pub const MAX_AGENT_X: i32 = 420;
pub const MAX_AGENT_Y: i32 = 490;

pub const TUNNEL_Y: i32 = 230;
pub const TUNNEL_LEFT_MOUTH_X: i32 = 10;
pub const TUNNEL_RIGHT_MOUTH_X: i32 = 420;

pub const DEN_DOOR_ROW: usize = 20;
pub const DEN_DOOR_COLS: std::ops::RangeInclusive<usize> = 21..=24;
pub const DEN_GATE: Vec2 = Vec2 { x: 220, y: 170 };
pub const DEN_CENTER: Vec2 = Vec2 { x: 220, y: 200 };

pub const PLAYER_SPAWN: Vec2 = Vec2 { x: 217, y: 390 };
pub const DIRECT_SPAWN: Vec2 = Vec2 { x: 217, y: 170 };
pub const AMBUSH_SPAWN: Vec2 = Vec2 { x: 220, y: 250 };
pub const PINCER_SPAWN: Vec2 = Vec2 { x: 190, y: 250 };
pub const OPPORTUNIST_SPAWN: Vec2 = Vec2 { x: 250, y: 250 };

pub const PINCER_DEN_LOOPS: u32 = 3;
pub const OPPORTUNIST_DEN_LOOPS: u32 = 5;

pub const AMBUSH_LOOKAHEAD: i32 = 40;
pub const PINCER_LOOKAHEAD: i32 = 20;
pub const OPPORTUNIST_RADIUS: i32 = 80;
pub const OPPORTUNIST_CORNER: Vec2 = Vec2 { x: 10, y: 490 };

pub const COLLISION_REACH: i32 = 20;

pub const BONUS_ITEM_ANCHOR: Vec2 = Vec2 { x: 215, y: 290 };
pub const BONUS_ITEM_MAX_X: i32 = 244;

pub const SMALL_COLLECTIBLE_POINTS: u32 = 10;
pub const POWER_COLLECTIBLE_POINTS: u32 = 50;
pub const CAPTURE_BONUS_BASE: u32 = 100;
pub const EXTRA_LIFE_SCORE: u32 = 10_000;
pub const STARTING_LIVES: i32 = 3;

pub const FRIGHTEN_DURATION_MS: u64 = 6_000;
pub const FRIGHTEN_ENDING_MS: u64 = 4_000;
pub const ROUND_START_MS: u64 = 1_000;
pub const PLAYER_CAPTURED_MS: u64 = 500;
pub const LIFE_LOST_MS: u64 = 1_000;
pub const BONUS_DISPLAY_MS: u64 = 300;
pub const BONUS_BLINK_MS: u64 = 500;

pub const PLAYER_FRAMES: u8 = 4;
pub const DEATH_FRAMES: u8 = 12;
pub const FRIGHT_ENDING_FRAMES: u8 = 8;

pub const HIGH_SCORE_SLOTS: usize = 10;
pub const HIGH_SCORE_NAME_MAX: usize = 19;
pub const HIGH_SCORE_NAME_MIN: usize = 2;
pub const HIGH_SCORE_DEFAULT_NAME: &str = "UNKNOWN";

pub fn get_bonus_item_points(level: u32) -> u32 {
    if level > 5 {
        return 700;
    }
    level * 100
}

pub fn get_capture_bonus(already_returning: usize) -> u32 {
    CAPTURE_BONUS_BASE << already_returning.min(3)
}

pub fn mirror_across_center(point: Vec2) -> Vec2 {
    Vec2 {
        x: TILE_SIZE + MAX_AGENT_X - point.x,
        y: TILE_SIZE + MAX_AGENT_Y - point.y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bonus_item_points_cap_after_level_five() {
        assert_eq!(get_bonus_item_points(1), 100);
        assert_eq!(get_bonus_item_points(5), 500);
        assert_eq!(get_bonus_item_points(6), 700);
        assert_eq!(get_bonus_item_points(42), 700);
    }

    #[test]
    fn capture_bonus_doubles_per_returning_hunter() {
        assert_eq!(get_capture_bonus(0), 100);
        assert_eq!(get_capture_bonus(1), 200);
        assert_eq!(get_capture_bonus(2), 400);
        assert_eq!(get_capture_bonus(3), 800);
    }

    #[test]
    fn mirror_maps_corners_onto_each_other() {
        assert_eq!(
            mirror_across_center(Vec2 { x: 10, y: 10 }),
            Vec2 { x: 420, y: 490 }
        );
        assert_eq!(
            mirror_across_center(Vec2 { x: 215, y: 250 }),
            Vec2 { x: 215, y: 250 }
        );
    }
}

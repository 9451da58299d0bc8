use super::*;

/// Which way an agent may cross the den door. The door only matters for vertical moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DoorAccess {
    Closed,
    ExitOnly,
    Open,
}

impl DoorAccess {
    fn allows(self, dir: Direction) -> bool {
        match (self, dir) {
            (DoorAccess::Open, Direction::Up | Direction::Down) => true,
            (DoorAccess::ExitOnly, Direction::Up) => true,
            _ => false,
        }
    }
}

fn tile_clear(map: &TileMap, row: i32, col: i32, dir: Direction, access: DoorAccess) -> bool {
    map.is_passable(row, col) || (map.is_den_door(row, col) && access.allows(dir))
}

fn is_tunnel_mouth(pos: Vec2, dir: Direction) -> bool {
    pos.y == TUNNEL_Y
        && match dir {
            Direction::Left => pos.x == TUNNEL_LEFT_MOUTH_X,
            Direction::Right => pos.x == TUNNEL_RIGHT_MOUTH_X,
            _ => false,
        }
}

/// Alignment plus the three leading-edge tiles of the sprite.
pub fn can_move(map: &TileMap, pos: Vec2, dir: Direction, access: DoorAccess) -> bool {
    let (row, col) = (pos.y / TILE_SIZE, pos.x / TILE_SIZE);
    let leading: [(i32, i32); 3] = match dir {
        Direction::Up | Direction::Down => {
            if pos.x % TILE_SIZE != 0 {
                return false;
            }
            let edge = if dir == Direction::Up {
                (pos.y - 1) / TILE_SIZE
            } else {
                row + SPRITE_TILES
            };
            [(edge, col), (edge, col + 1), (edge, col + 2)]
        }
        Direction::Left | Direction::Right => {
            if pos.y % TILE_SIZE != 0 {
                return false;
            }
            if is_tunnel_mouth(pos, dir) {
                return true;
            }
            let edge = if dir == Direction::Left {
                (pos.x - 1) / TILE_SIZE
            } else {
                col + SPRITE_TILES
            };
            [(row, edge), (row + 1, edge), (row + 2, edge)]
        }
        Direction::None => return false,
    };
    leading
        .iter()
        .all(|&(r, c)| tile_clear(map, r, c, dir, access))
}

pub fn try_move_up(map: &TileMap, pos: &mut Vec2, access: DoorAccess) -> bool {
    if !can_move(map, *pos, Direction::Up, access) {
        return false;
    }
    pos.y -= 1;
    true
}

pub fn try_move_down(map: &TileMap, pos: &mut Vec2, access: DoorAccess) -> bool {
    if !can_move(map, *pos, Direction::Down, access) {
        return false;
    }
    pos.y += 1;
    true
}

pub fn try_move_left(map: &TileMap, pos: &mut Vec2, access: DoorAccess) -> bool {
    if is_tunnel_mouth(*pos, Direction::Left) {
        pos.x = TUNNEL_RIGHT_MOUTH_X;
        return true;
    }
    if !can_move(map, *pos, Direction::Left, access) {
        return false;
    }
    pos.x -= 1;
    true
}

pub fn try_move_right(map: &TileMap, pos: &mut Vec2, access: DoorAccess) -> bool {
    if is_tunnel_mouth(*pos, Direction::Right) {
        pos.x = TUNNEL_LEFT_MOUTH_X;
        return true;
    }
    if !can_move(map, *pos, Direction::Right, access) {
        return false;
    }
    pos.x += 1;
    true
}

pub fn try_move(map: &TileMap, pos: &mut Vec2, dir: Direction, access: DoorAccess) -> bool {
    match dir {
        Direction::Up => try_move_up(map, pos, access),
        Direction::Down => try_move_down(map, pos, access),
        Direction::Left => try_move_left(map, pos, access),
        Direction::Right => try_move_right(map, pos, access),
        Direction::None => false,
    }
}

/// Tile under the middle of a sprite anchored at `pos`, as `(row, col)`.
pub fn center_tile(pos: Vec2) -> (i32, i32) {
    let half = SPRITE_TILES * TILE_SIZE / 2;
    ((pos.y + half) / TILE_SIZE, (pos.x + half) / TILE_SIZE)
}

impl GameEngine {
    /// One unit of player movement: commit the desired direction if it is open,
    /// advance along the facing, then eat whatever sits under the sprite.
    pub(super) fn step_player(&mut self) {
        let desired = self.player.desired_dir;
        if desired != Direction::None && can_move(&self.map, self.player.pos, desired, DoorAccess::Closed)
        {
            self.player.dir = desired;
        }

        let facing = self.player.dir;
        if !try_move(&self.map, &mut self.player.pos, facing, DoorAccess::Closed) {
            self.player.stuck = true;
            return;
        }
        self.player.stuck = false;

        let (row, col) = center_tile(self.player.pos);
        match self.map.consume_if_collectible(row, col) {
            Consumed::None => {}
            Consumed::Small => {
                self.stats.collectibles_eaten += 1;
                self.events.push(RuntimeEvent::CollectibleEaten {
                    row: row as usize,
                    col: col as usize,
                    power: false,
                });
                self.add_score(SMALL_COLLECTIBLE_POINTS);
            }
            Consumed::Power => {
                self.stats.collectibles_eaten += 1;
                self.stats.power_eaten += 1;
                self.events.push(RuntimeEvent::CollectibleEaten {
                    row: row as usize,
                    col: col as usize,
                    power: true,
                });
                self.add_score(POWER_COLLECTIBLE_POINTS);
                self.frighten_hunters();
            }
        }
    }
}

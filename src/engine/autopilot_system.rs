use super::*;

const DANGER_RADIUS: i32 = 60;
const HUNT_RADIUS: i32 = 80;

impl GameEngine {
    /// Seeded player controller. Re-plans only at junctions or when the way ahead is shut.
    pub(super) fn update_autopilot(&mut self) {
        let pos = self.player.pos;
        let facing = self.player.dir;
        let open: Vec<Direction> = Direction::CARDINALS
            .into_iter()
            .filter(|dir| can_move(&self.map, pos, *dir, DoorAccess::Closed))
            .collect();
        if open.is_empty() {
            self.player.desired_dir = random_direction(&mut self.rng);
            return;
        }
        let at_junction = open
            .iter()
            .any(|dir| *dir != facing && *dir != facing.opposite());
        if !at_junction && open.contains(&facing) && !self.danger_ahead(pos, facing) {
            return;
        }
        self.player.desired_dir = self.choose_autopilot_direction(pos, facing, &open);
    }

    fn danger_ahead(&self, pos: Vec2, facing: Direction) -> bool {
        let ahead = offset(pos, facing, TILE_SIZE);
        self.hunters.iter().any(|hunter| {
            hunter.state == HunterState::Chasing
                && manhattan(ahead, hunter.pos) < manhattan(pos, hunter.pos)
                && manhattan(ahead, hunter.pos) < DANGER_RADIUS
        })
    }

    fn choose_autopilot_direction(
        &mut self,
        pos: Vec2,
        facing: Direction,
        open: &[Direction],
    ) -> Direction {
        let food = self.nearest_collectible(pos);
        let mut best = open[0];
        let mut best_score = f32::NEG_INFINITY;

        for &dir in open {
            let next = offset(pos, dir, TILE_SIZE);
            let mut score = 0.0;
            if let Some(food) = food {
                score -= manhattan(next, food) as f32;
            }
            for hunter in &self.hunters {
                let dist = manhattan(next, hunter.pos);
                match hunter.state {
                    HunterState::Chasing if dist < DANGER_RADIUS => {
                        score -= (DANGER_RADIUS - dist) as f32 * 3.0;
                    }
                    HunterState::Frightened | HunterState::FrightenedEnding
                        if dist < HUNT_RADIUS =>
                    {
                        score += (HUNT_RADIUS - dist) as f32 * 0.5;
                    }
                    _ => {}
                }
            }
            if dir == facing.opposite() {
                score -= 15.0;
            }
            score += self.rng.jitter(4.0);

            if score > best_score {
                best_score = score;
                best = dir;
            }
        }
        best
    }

    /// Anchor position that puts the nearest remaining collectible under the sprite center.
    fn nearest_collectible(&self, pos: Vec2) -> Option<Vec2> {
        let rows = self.map.rows() as i32;
        let cols = self.map.cols() as i32;
        (0..rows)
            .flat_map(|row| (0..cols).map(move |col| (row, col)))
            .filter(|&(row, col)| self.map.has_collectible(row, col))
            .map(|(row, col)| Vec2 {
                x: (col - 1) * TILE_SIZE,
                y: (row - 1) * TILE_SIZE,
            })
            .min_by_key(|anchor| manhattan(pos, *anchor))
    }
}

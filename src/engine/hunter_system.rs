use super::*;

/// Picks the next direction for a hunter at `pos` heading for `target`.
///
/// Candidates are tried in a fixed order: exact alignment with the target, the
/// axis with the larger offset (ties go horizontal) then the other axis, the
/// current facing, the perpendicular on the target's side then the other one.
/// None of these may be the reverse of `facing`. The reverse is tried last, and
/// `Direction::None` means every direction is blocked.
pub fn choose_direction(
    map: &TileMap,
    pos: Vec2,
    facing: Direction,
    target: Vec2,
    access: DoorAccess,
) -> Direction {
    let reverse = facing.opposite();
    let toward_x = horizontal_toward(pos.x, target.x);
    let toward_y = vertical_toward(pos.y, target.y);

    let mut candidates: Vec<Direction> = Vec::with_capacity(8);
    if target.x == pos.x {
        candidates.push(toward_y);
    }
    if target.y == pos.y {
        candidates.push(toward_x);
    }
    if (target.x - pos.x).abs() >= (target.y - pos.y).abs() {
        candidates.extend([toward_x, toward_y]);
    } else {
        candidates.extend([toward_y, toward_x]);
    }
    candidates.push(facing);
    if facing.is_horizontal() {
        let near = if target.y >= pos.y {
            Direction::Down
        } else {
            Direction::Up
        };
        candidates.extend([near, near.opposite()]);
    } else if facing.is_vertical() {
        let near = if target.x >= pos.x {
            Direction::Right
        } else {
            Direction::Left
        };
        candidates.extend([near, near.opposite()]);
    }

    candidates
        .into_iter()
        .filter(|dir| *dir != Direction::None && *dir != reverse)
        .find(|dir| can_move(map, pos, *dir, access))
        .or_else(|| {
            (reverse != Direction::None && can_move(map, pos, reverse, access)).then_some(reverse)
        })
        .unwrap_or(Direction::None)
}

impl GameEngine {
    pub(super) fn count_returning(&self) -> usize {
        self.hunters
            .iter()
            .filter(|hunter| hunter.state == HunterState::Returning)
            .count()
    }

    pub(super) fn chase_target(&self, idx: usize) -> Vec2 {
        let player = self.player.pos;
        let facing = self.player.dir;
        match self.hunters[idx].role {
            HunterRole::Direct => player,
            HunterRole::Ambush => offset(player, facing, AMBUSH_LOOKAHEAD),
            HunterRole::Pincer => {
                let pivot = offset(player, facing, PINCER_LOOKAHEAD);
                let direct = self.hunters[HunterRole::Direct.index()].pos;
                Vec2 {
                    x: 2 * pivot.x - direct.x,
                    y: 2 * pivot.y - direct.y,
                }
            }
            HunterRole::Opportunist => {
                let radius = OPPORTUNIST_RADIUS as i64;
                if distance_sq(self.hunters[idx].pos, player) > radius * radius {
                    player
                } else {
                    OPPORTUNIST_CORNER
                }
            }
        }
    }

    pub(super) fn hunter_target(&self, idx: usize) -> Vec2 {
        match self.hunters[idx].state {
            HunterState::Frightened | HunterState::FrightenedEnding => {
                mirror_across_center(self.chase_target(idx))
            }
            HunterState::Returning => DEN_GATE,
            HunterState::Waiting | HunterState::Chasing => self.chase_target(idx),
        }
    }

    /// One movement unit for hunter `idx`.
    pub(super) fn step_hunter(&mut self, idx: usize) {
        match self.hunters[idx].state {
            HunterState::Waiting => self.step_waiting_hunter(idx),
            HunterState::Chasing => self.steer_hunter(idx),
            HunterState::Frightened | HunterState::FrightenedEnding => {
                let hunter = &mut self.hunters[idx];
                hunter.low_speed = !hunter.low_speed;
                if hunter.low_speed {
                    self.steer_hunter(idx);
                }
            }
            HunterState::Returning => self.step_returning_hunter(idx),
        }
    }

    fn steer_hunter(&mut self, idx: usize) {
        let target = self.hunter_target(idx);
        let hunter = &self.hunters[idx];
        let dir = choose_direction(&self.map, hunter.pos, hunter.dir, target, DoorAccess::ExitOnly);
        if dir == Direction::None {
            return;
        }
        let hunter = &mut self.hunters[idx];
        hunter.dir = dir;
        try_move(&self.map, &mut hunter.pos, dir, DoorAccess::ExitOnly);
    }

    fn step_returning_hunter(&mut self, idx: usize) {
        let hunter = &mut self.hunters[idx];
        if hunter.pos == DEN_CENTER {
            hunter.state = HunterState::Chasing;
            hunter.dir = Direction::Up;
            hunter.low_speed = false;
            return;
        }
        let in_doorway = hunter.pos.x == DEN_GATE.x
            && (DEN_GATE.y..DEN_CENTER.y).contains(&hunter.pos.y);
        if in_doorway {
            hunter.dir = Direction::Down;
            try_move_down(&self.map, &mut hunter.pos, DoorAccess::Open);
            return;
        }
        self.steer_hunter(idx);
    }

    fn step_waiting_hunter(&mut self, idx: usize) {
        let required_loops = match self.hunters[idx].role {
            HunterRole::Direct | HunterRole::Ambush => {
                let hunter = &mut self.hunters[idx];
                hunter.dir = Direction::Up;
                if !try_move_up(&self.map, &mut hunter.pos, DoorAccess::ExitOnly) {
                    hunter.state = HunterState::Chasing;
                    self.steer_hunter(idx);
                }
                return;
            }
            HunterRole::Pincer => PINCER_DEN_LOOPS,
            HunterRole::Opportunist => OPPORTUNIST_DEN_LOOPS,
        };

        let map = &self.map;
        let hunter = &mut self.hunters[idx];
        if hunter.den_loops >= required_loops && hunter.pos.y % TILE_SIZE == 0 {
            if hunter.pos.x != DEN_GATE.x {
                hunter.dir = horizontal_toward(hunter.pos.x, DEN_GATE.x);
                try_move(map, &mut hunter.pos, hunter.dir, DoorAccess::ExitOnly);
            } else {
                hunter.dir = Direction::Up;
                if !try_move_up(map, &mut hunter.pos, DoorAccess::ExitOnly) {
                    hunter.state = HunterState::Chasing;
                }
            }
            return;
        }

        if hunter.dir == Direction::Up {
            if !try_move_up(map, &mut hunter.pos, DoorAccess::ExitOnly) {
                hunter.dir = Direction::Down;
                try_move_down(map, &mut hunter.pos, DoorAccess::ExitOnly);
                hunter.den_loops += 1;
            }
        } else if !try_move_down(map, &mut hunter.pos, DoorAccess::ExitOnly) {
            hunter.dir = Direction::Up;
            try_move_up(map, &mut hunter.pos, DoorAccess::ExitOnly);
        }
    }

    /// Power collectible effect. Waiting and returning hunters ignore it.
    pub(super) fn frighten_hunters(&mut self) {
        self.frighten_started_ms = Some(self.elapsed_ms);
        for hunter in &mut self.hunters {
            match hunter.state {
                HunterState::Chasing | HunterState::Frightened | HunterState::FrightenedEnding => {
                    hunter.state = HunterState::Frightened;
                }
                HunterState::Waiting | HunterState::Returning => {}
            }
        }
        self.events.push(RuntimeEvent::HuntersFrightened);
    }

    pub(super) fn update_frighten(&mut self, now_ms: u64) {
        let Some(started) = self.frighten_started_ms else {
            return;
        };
        let elapsed = now_ms.saturating_sub(started);
        if elapsed >= self.config.frighten_duration_ms {
            self.frighten_started_ms = None;
            for hunter in &mut self.hunters {
                if hunter.state.is_frightened() {
                    hunter.state = HunterState::Chasing;
                    hunter.low_speed = false;
                }
            }
        } else if elapsed >= self.config.frighten_ending_ms {
            for hunter in &mut self.hunters {
                if hunter.state == HunterState::Frightened {
                    hunter.state = HunterState::FrightenedEnding;
                }
            }
        }
    }

    pub(super) fn advance_hunter_frames(&mut self) {
        for hunter in &mut self.hunters {
            hunter.frame = if hunter.state == HunterState::FrightenedEnding {
                (hunter.frame + 1) % FRIGHT_ENDING_FRAMES
            } else {
                (hunter.frame + 1) % 2
            };
        }
    }
}

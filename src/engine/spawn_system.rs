use super::*;

pub(super) fn spawn_player() -> PlayerInternal {
    PlayerInternal {
        pos: PLAYER_SPAWN,
        dir: Direction::Left,
        desired_dir: Direction::None,
        stuck: false,
        frame: 0,
    }
}

pub(super) fn spawn_hunter(role: HunterRole) -> HunterInternal {
    let (pos, dir, state) = match role {
        HunterRole::Direct => (DIRECT_SPAWN, Direction::Left, HunterState::Chasing),
        HunterRole::Ambush => (AMBUSH_SPAWN, Direction::Up, HunterState::Waiting),
        HunterRole::Pincer => (PINCER_SPAWN, Direction::Up, HunterState::Waiting),
        HunterRole::Opportunist => (OPPORTUNIST_SPAWN, Direction::Left, HunterState::Waiting),
    };
    HunterInternal {
        role,
        pos,
        dir,
        state,
        den_loops: 0,
        low_speed: false,
        frame: 0,
    }
}

pub(super) fn spawn_hunters() -> [HunterInternal; 4] {
    HunterRole::ORDER.map(spawn_hunter)
}

impl GameEngine {
    /// Puts every agent back on its spawn point. The tile map is left alone.
    pub(super) fn reset_agents(&mut self) {
        self.player = spawn_player();
        self.hunters = spawn_hunters();
        self.frighten_started_ms = None;
    }
}

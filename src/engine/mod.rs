use crate::constants::{
    get_bonus_item_points, get_capture_bonus, mirror_across_center, AMBUSH_LOOKAHEAD,
    AMBUSH_SPAWN, BONUS_BLINK_MS, BONUS_DISPLAY_MS, BONUS_ITEM_ANCHOR, BONUS_ITEM_MAX_X,
    DEATH_FRAMES, DEN_CENTER, DEN_GATE, DIRECT_SPAWN, EXTRA_LIFE_SCORE, FRIGHTEN_DURATION_MS,
    FRIGHTEN_ENDING_MS, FRIGHT_ENDING_FRAMES, LIFE_LOST_MS, MOVES_PER_TICK, OPPORTUNIST_CORNER,
    OPPORTUNIST_DEN_LOOPS, OPPORTUNIST_RADIUS, OPPORTUNIST_SPAWN, PINCER_DEN_LOOPS,
    PINCER_LOOKAHEAD, PINCER_SPAWN, PLAYER_CAPTURED_MS, PLAYER_FRAMES, PLAYER_SPAWN,
    POWER_COLLECTIBLE_POINTS, ROUND_START_MS, SMALL_COLLECTIBLE_POINTS, SPRITE_TILES,
    STARTING_LIVES, TICK_MS, TILE_SIZE, TUNNEL_LEFT_MOUTH_X, TUNNEL_RIGHT_MOUTH_X, TUNNEL_Y,
};
use crate::maze::{to_world_init, Consumed, TileMap};
use crate::rng::Rng;
use crate::types::{
    BonusItemView, BonusSource, Direction, DisplayedBonus, GameConfig, GameSummary, HunterRole,
    HunterState, HunterView, PlayerView, RoundPhase, RunStats, RuntimeEvent, Snapshot, Vec2,
    WorldInit,
};

mod autopilot_system;
mod hunter_system;
mod movement;
mod spawn_system;
mod utils;

pub use self::hunter_system::choose_direction;
pub use self::movement::{
    can_move, center_tile, try_move, try_move_down, try_move_left, try_move_right, try_move_up,
    DoorAccess,
};

use self::spawn_system::{spawn_hunters, spawn_player};
use self::utils::{
    distance_sq, horizontal_toward, manhattan, offset, overlaps, random_direction,
    vertical_toward,
};

#[derive(Clone, Debug)]
struct PlayerInternal {
    pos: Vec2,
    dir: Direction,
    desired_dir: Direction,
    stuck: bool,
    frame: u8,
}

#[derive(Clone, Debug)]
struct HunterInternal {
    role: HunterRole,
    pos: Vec2,
    dir: Direction,
    state: HunterState,
    den_loops: u32,
    low_speed: bool,
    frame: u8,
}

#[derive(Clone, Debug, Default)]
pub struct GameEngineOptions {
    /// Let the seeded autopilot steer the player.
    pub autopilot: bool,
    pub starting_lives_override: Option<i32>,
}

/// One game session: the maze, the player, four hunters and the round phase.
#[derive(Clone, Debug)]
pub struct GameEngine {
    pub config: GameConfig,

    map: TileMap,
    rng: Rng,
    autopilot: bool,
    player: PlayerInternal,
    hunters: [HunterInternal; 4],
    events: Vec<RuntimeEvent>,
    stats: RunStats,

    score: u32,
    lives: i32,
    level: u32,
    extra_life_awarded: bool,
    last_capture_bonus: u32,
    displayed_bonus: Option<DisplayedBonus>,
    bonus_item_visible: bool,
    bonus_item_toggled_ms: u64,
    frighten_started_ms: Option<u64>,

    phase: RoundPhase,
    phase_started_ms: u64,
    paused: bool,
    elapsed_ms: u64,
    tick_counter: u64,
}

impl GameEngine {
    pub fn new(seed: u32, options: GameEngineOptions) -> Self {
        let config = GameConfig {
            tick_ms: TICK_MS,
            moves_per_tick: MOVES_PER_TICK,
            frighten_duration_ms: FRIGHTEN_DURATION_MS,
            frighten_ending_ms: FRIGHTEN_ENDING_MS,
            round_start_ms: ROUND_START_MS,
            player_captured_ms: PLAYER_CAPTURED_MS,
            life_lost_ms: LIFE_LOST_MS,
            bonus_display_ms: BONUS_DISPLAY_MS,
            bonus_blink_ms: BONUS_BLINK_MS,
            starting_lives: options.starting_lives_override.unwrap_or(STARTING_LIVES),
        };

        let mut engine = Self {
            config,
            map: TileMap::new(),
            rng: Rng::new(seed),
            autopilot: options.autopilot,
            player: spawn_player(),
            hunters: spawn_hunters(),
            events: Vec::new(),
            stats: RunStats::default(),
            score: 0,
            lives: 0,
            level: 0,
            extra_life_awarded: false,
            last_capture_bonus: 0,
            displayed_bonus: None,
            bonus_item_visible: false,
            bonus_item_toggled_ms: 0,
            frighten_started_ms: None,
            phase: RoundPhase::RoundStart,
            phase_started_ms: 0,
            paused: false,
            elapsed_ms: 0,
            tick_counter: 0,
        };
        engine.new_game();
        engine
    }

    pub fn is_ended(&self) -> bool {
        self.phase == RoundPhase::GameOver
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn get_world_init(&self) -> WorldInit {
        to_world_init(&self.map)
    }

    /// Queues a direction. It is committed at the next tile boundary where the way is clear.
    pub fn set_desired_direction(&mut self, dir: Direction) {
        self.player.desired_dir = dir;
    }

    /// Returns whether the pause flag changed. Only a session in `Playing` can pause.
    pub fn toggle_pause(&mut self) -> bool {
        if self.phase != RoundPhase::Playing {
            return false;
        }
        self.paused = !self.paused;
        tracing::debug!(paused = self.paused, "pause toggled");
        true
    }

    pub fn new_game(&mut self) {
        self.score = 0;
        self.lives = self.config.starting_lives;
        self.level = 0;
        self.extra_life_awarded = false;
        self.last_capture_bonus = 0;
        self.stats = RunStats::default();
        self.paused = false;
        self.enter_phase(RoundPhase::RoundStart);
    }

    pub fn step(&mut self, dt_ms: u64) {
        if self.paused || self.is_ended() {
            return;
        }
        self.tick_counter += 1;
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        let now_ms = self.elapsed_ms;
        let in_phase_ms = now_ms.saturating_sub(self.phase_started_ms);

        match self.phase {
            RoundPhase::RoundStart => {
                if in_phase_ms >= self.config.round_start_ms {
                    self.enter_phase(RoundPhase::Playing);
                }
            }
            RoundPhase::Playing => self.update_playing(now_ms),
            RoundPhase::HunterCaptured => {
                if in_phase_ms >= self.config.bonus_display_ms {
                    self.enter_phase(RoundPhase::Playing);
                }
            }
            RoundPhase::PlayerCaptured => {
                let frames = DEATH_FRAMES as u64;
                let frame = in_phase_ms * frames / self.config.player_captured_ms.max(1);
                self.player.frame = frame.min(frames - 1) as u8;
                if in_phase_ms >= self.config.player_captured_ms {
                    self.enter_phase(RoundPhase::LifeLost);
                }
            }
            RoundPhase::RoundClear => self.enter_phase(RoundPhase::RoundStart),
            RoundPhase::LifeLost => {
                if in_phase_ms >= self.config.life_lost_ms {
                    if self.lives > 0 {
                        self.enter_phase(RoundPhase::Playing);
                    } else {
                        self.enter_phase(RoundPhase::GameOver);
                    }
                }
            }
            RoundPhase::GameOver => {}
        }
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        Snapshot {
            tick: self.tick_counter,
            now_ms: self.elapsed_ms,
            phase: self.phase,
            paused: self.paused,
            score: self.score,
            lives: self.lives,
            level: self.level,
            player: PlayerView {
                x: self.player.pos.x,
                y: self.player.pos.y,
                dir: self.player.dir,
                stuck: self.player.stuck,
                frame: self.player.frame,
            },
            hunters: self
                .hunters
                .iter()
                .map(|hunter| HunterView {
                    role: hunter.role,
                    x: hunter.pos.x,
                    y: hunter.pos.y,
                    dir: hunter.dir,
                    state: hunter.state,
                    frame: hunter.frame,
                })
                .collect(),
            bonus_item: BonusItemView {
                x: BONUS_ITEM_ANCHOR.x,
                y: BONUS_ITEM_ANCHOR.y,
                visible: self.bonus_item_visible,
                points: get_bonus_item_points(self.level),
            },
            displayed_bonus: self.displayed_bonus.clone(),
            last_capture_bonus: self.last_capture_bonus,
            tiles: self.map.to_rows(),
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
        }
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            score: self.score,
            level: self.level,
            duration_ms: self.elapsed_ms,
            ended: self.is_ended(),
            stats: self.stats.clone(),
        }
    }

    fn enter_phase(&mut self, phase: RoundPhase) {
        tracing::debug!(from = ?self.phase, to = ?phase, level = self.level, "round phase changed");
        self.phase = phase;
        self.phase_started_ms = self.elapsed_ms;
        if phase != RoundPhase::Playing {
            self.bonus_item_visible = false;
        }

        match phase {
            RoundPhase::RoundStart => {
                self.level += 1;
                self.map.refill();
                self.reset_agents();
                self.displayed_bonus = None;
                self.events.push(RuntimeEvent::RoundStarted { level: self.level });
            }
            RoundPhase::Playing => {
                self.bonus_item_toggled_ms = self.elapsed_ms;
                self.displayed_bonus = None;
            }
            RoundPhase::PlayerCaptured => {
                self.player.frame = 0;
            }
            RoundPhase::HunterCaptured => {}
            RoundPhase::RoundClear => {
                self.stats.rounds_cleared += 1;
                self.events.push(RuntimeEvent::RoundCleared { level: self.level });
            }
            RoundPhase::LifeLost => {
                self.lives -= 1;
                self.stats.lives_lost += 1;
                self.reset_agents();
                self.events.push(RuntimeEvent::LifeLost { lives: self.lives });
            }
            RoundPhase::GameOver => {
                tracing::info!(score = self.score, level = self.level, "game over");
                self.events.push(RuntimeEvent::GameOver { score: self.score });
            }
        }
    }

    fn update_playing(&mut self, now_ms: u64) {
        self.update_frighten(now_ms);
        self.update_bonus_item(now_ms);

        for _ in 0..self.config.moves_per_tick {
            if self.autopilot {
                self.update_autopilot();
            }
            self.step_player();
            for idx in 0..self.hunters.len() {
                self.step_hunter(idx);
            }
        }
        self.player.frame = if self.player.stuck {
            1
        } else {
            (self.player.frame + 1) % PLAYER_FRAMES
        };
        self.advance_hunter_frames();

        if self.map.remaining_collectibles() == 0 {
            self.enter_phase(RoundPhase::RoundClear);
            return;
        }
        self.resolve_collisions();
        if self.phase == RoundPhase::Playing {
            self.check_bonus_item();
        }
    }

    /// Player/hunter overlaps, evaluated in role order. Any capture in the
    /// tick cancels a death from a chasing hunter on the same tick.
    fn resolve_collisions(&mut self) {
        let mut captured = false;
        let mut caught_by = None;
        for idx in 0..self.hunters.len() {
            if !overlaps(self.player.pos, self.hunters[idx].pos) {
                continue;
            }
            match self.hunters[idx].state {
                HunterState::Waiting | HunterState::Returning => {}
                HunterState::Frightened | HunterState::FrightenedEnding => {
                    self.capture_hunter(idx);
                    captured = true;
                }
                HunterState::Chasing => {
                    caught_by.get_or_insert(self.hunters[idx].role);
                }
            }
        }

        if captured {
            self.enter_phase(RoundPhase::HunterCaptured);
        } else if let Some(role) = caught_by {
            self.events.push(RuntimeEvent::PlayerCaptured { role });
            self.enter_phase(RoundPhase::PlayerCaptured);
        }
    }

    fn capture_hunter(&mut self, idx: usize) {
        let bonus = get_capture_bonus(self.count_returning());
        let hunter = &mut self.hunters[idx];
        hunter.state = HunterState::Returning;
        hunter.low_speed = false;
        let (role, pos) = (hunter.role, hunter.pos);

        self.last_capture_bonus = bonus;
        self.stats.hunters_captured += 1;
        self.events.push(RuntimeEvent::HunterCaptured { role, bonus });
        self.add_score(bonus);
        self.displayed_bonus = Some(DisplayedBonus {
            x: pos.x,
            y: pos.y,
            points: bonus,
            source: BonusSource::Hunter,
        });
    }

    fn update_bonus_item(&mut self, now_ms: u64) {
        if now_ms.saturating_sub(self.bonus_item_toggled_ms) >= self.config.bonus_blink_ms {
            self.bonus_item_visible = !self.bonus_item_visible;
            self.bonus_item_toggled_ms = now_ms;
        }
    }

    fn check_bonus_item(&mut self) {
        let pos = self.player.pos;
        let in_reach = pos.y == BONUS_ITEM_ANCHOR.y
            && (BONUS_ITEM_ANCHOR.x..=BONUS_ITEM_MAX_X).contains(&pos.x);
        if !self.bonus_item_visible || !in_reach {
            return;
        }
        let points = get_bonus_item_points(self.level);
        self.bonus_item_visible = false;
        self.bonus_item_toggled_ms = self.elapsed_ms;
        self.stats.bonus_items_eaten += 1;
        self.events.push(RuntimeEvent::BonusItemEaten { points });
        self.add_score(points);
        self.displayed_bonus = Some(DisplayedBonus {
            x: BONUS_ITEM_ANCHOR.x,
            y: BONUS_ITEM_ANCHOR.y,
            points,
            source: BonusSource::BonusItem,
        });
        self.enter_phase(RoundPhase::HunterCaptured);
    }

    fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        if !self.extra_life_awarded && self.score >= EXTRA_LIFE_SCORE {
            self.extra_life_awarded = true;
            self.lives += 1;
            self.events.push(RuntimeEvent::ExtraLife { lives: self.lives });
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::constants::{
        BONUS_BLINK_MS, FRIGHTEN_DURATION_MS, LIFE_LOST_MS, PLAYER_CAPTURED_MS, ROUND_START_MS,
        TICK_MS,
    };
    use crate::engine::{GameEngine, GameEngineOptions};
    use crate::maze::Cell;
    use crate::types::{
        BonusSource, Direction, HunterRole, HunterState, RoundPhase, RuntimeEvent, Vec2,
    };

    fn playing_engine() -> GameEngine {
        let mut engine = GameEngine::new(5, GameEngineOptions::default());
        while engine.phase() != RoundPhase::Playing {
            engine.step(TICK_MS);
        }
        engine
    }

    fn park_hunters_in_den(engine: &mut GameEngine) {
        for hunter in &mut engine.hunters {
            hunter.state = HunterState::Waiting;
        }
    }

    fn step_until_phase_changes(engine: &mut GameEngine) -> u64 {
        let from = engine.phase();
        let start = engine.elapsed_ms;
        for _ in 0..1_000 {
            engine.step(TICK_MS);
            if engine.phase() != from {
                return engine.elapsed_ms - start;
            }
        }
        panic!("phase never left {from:?}");
    }

    #[test]
    fn new_game_starts_round_one_with_full_maze() {
        let engine = GameEngine::new(1, GameEngineOptions::default());
        assert_eq!(engine.phase(), RoundPhase::RoundStart);
        assert_eq!(engine.level(), 1);
        assert_eq!(engine.lives(), 3);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.map.remaining_collectibles(), 248);
    }

    #[test]
    fn round_start_waits_before_play() {
        let mut engine = GameEngine::new(1, GameEngineOptions::default());
        let waited = step_until_phase_changes(&mut engine);
        assert_eq!(engine.phase(), RoundPhase::Playing);
        assert!(waited >= ROUND_START_MS);
        assert!(waited < ROUND_START_MS + TICK_MS);
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = GameEngine::new(3, GameEngineOptions::default());
        let peek = engine.build_snapshot(false);
        assert!(peek.events.is_empty());

        let first = engine.build_snapshot(true);
        let second = engine.build_snapshot(true);
        assert!(matches!(
            first.events.as_slice(),
            [RuntimeEvent::RoundStarted { level: 1 }]
        ));
        assert!(second.events.is_empty());
        assert_eq!(first.hunters.len(), 4);
        assert_eq!(first.tiles.len(), 53);
    }

    #[test]
    fn snapshot_serializes_with_camel_case_keys() {
        let mut engine = GameEngine::new(3, GameEngineOptions::default());
        let value = serde_json::to_value(engine.build_snapshot(true)).expect("serialize snapshot");
        assert_eq!(value["phase"], "round_start");
        assert_eq!(value["bonusItem"]["visible"], false);
        assert_eq!(value["hunters"][0]["role"], "direct");
        assert_eq!(value["events"][0]["type"], "round_started");
        assert!(value["displayedBonus"].is_null());
        assert_eq!(value["lastCaptureBonus"], 0);
    }

    #[test]
    fn eating_power_frightens_chasing_hunters_and_capture_scores_100() {
        let mut engine = playing_engine();
        assert_eq!(engine.level(), 1);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.lives(), 3);
        park_hunters_in_den(&mut engine);
        engine.hunters[0].state = HunterState::Chasing;
        engine.hunters[1].state = HunterState::Chasing;

        // Small collectible at (2, 2).
        engine.player.pos = Vec2 { x: 10, y: 11 };
        engine.player.dir = Direction::Up;
        engine.step_player();
        assert_eq!(engine.score(), 10);

        // Power collectible at (4, 2).
        engine.player.pos = Vec2 { x: 10, y: 24 };
        engine.player.dir = Direction::Down;
        engine.step_player();
        assert_eq!(engine.player.pos, Vec2 { x: 10, y: 25 });
        assert_eq!(engine.score(), 60);
        assert_eq!(engine.hunters[0].state, HunterState::Frightened);
        assert_eq!(engine.hunters[1].state, HunterState::Frightened);
        assert_eq!(engine.hunters[2].state, HunterState::Waiting);
        let frightened_at = engine.frighten_started_ms.expect("fright running");

        engine.hunters[0].pos = Vec2 { x: 30, y: 25 };
        engine.hunters[1].pos = Vec2 { x: 200, y: 390 };
        engine.resolve_collisions();
        assert_eq!(engine.hunters[0].state, HunterState::Returning);
        assert_eq!(engine.score(), 160);
        assert_eq!(engine.phase(), RoundPhase::HunterCaptured);
        let shown = engine.displayed_bonus.clone().expect("bonus shown");
        assert_eq!(shown.points, 100);
        assert_eq!(shown.source, BonusSource::Hunter);

        engine.update_frighten(frightened_at + FRIGHTEN_DURATION_MS);
        assert_eq!(engine.hunters[1].state, HunterState::Chasing);
        assert_eq!(engine.hunters[0].state, HunterState::Returning);
    }

    #[test]
    fn third_capture_with_two_returning_scores_400() {
        let mut engine = playing_engine();
        let at = Vec2 { x: 100, y: 250 };
        engine.player.pos = at;
        engine.hunters[0].state = HunterState::Returning;
        engine.hunters[1].state = HunterState::Returning;
        engine.hunters[2].state = HunterState::Frightened;
        engine.hunters[2].pos = Vec2 { x: 115, y: 250 };
        engine.hunters[3].state = HunterState::Waiting;
        engine.hunters[0].pos = Vec2 { x: 300, y: 10 };
        engine.hunters[1].pos = Vec2 { x: 300, y: 10 };

        let before = engine.score();
        engine.resolve_collisions();
        assert_eq!(engine.score() - before, 400);
        assert_eq!(engine.count_returning(), 3);
    }

    #[test]
    fn captures_in_one_tick_stack_in_role_order() {
        let mut engine = playing_engine();
        let at = Vec2 { x: 100, y: 250 };
        engine.player.pos = at;
        for hunter in &mut engine.hunters {
            hunter.state = HunterState::FrightenedEnding;
            hunter.pos = at;
        }
        engine.build_snapshot(true);
        engine.resolve_collisions();

        let bonuses: Vec<u32> = engine
            .build_snapshot(true)
            .events
            .into_iter()
            .filter_map(|event| match event {
                RuntimeEvent::HunterCaptured { bonus, .. } => Some(bonus),
                _ => None,
            })
            .collect();
        assert_eq!(bonuses, vec![100, 200, 400, 800]);
        assert_eq!(engine.score(), 1_500);
        assert_eq!(engine.build_snapshot(false).last_capture_bonus, 800);
    }

    fn player_between_chasing_and_frightened(chasing: usize, frightened: usize) -> GameEngine {
        let mut engine = playing_engine();
        park_hunters_in_den(&mut engine);
        let at = Vec2 { x: 100, y: 250 };
        engine.player.pos = at;
        engine.hunters[chasing].state = HunterState::Chasing;
        engine.hunters[chasing].pos = Vec2 { x: 90, y: 250 };
        engine.hunters[frightened].state = HunterState::Frightened;
        engine.hunters[frightened].pos = Vec2 { x: 110, y: 250 };
        engine.build_snapshot(true);
        engine
    }

    #[test]
    fn capture_beats_an_earlier_chasing_hunter_on_the_same_tick() {
        let mut engine = player_between_chasing_and_frightened(0, 1);
        engine.resolve_collisions();

        assert_eq!(engine.phase(), RoundPhase::HunterCaptured);
        assert_eq!(engine.hunters[0].state, HunterState::Chasing);
        assert_eq!(engine.hunters[1].state, HunterState::Returning);
        assert_eq!(engine.score(), 100);
        assert_eq!(engine.lives(), 3);
        let snapshot = engine.build_snapshot(true);
        assert_eq!(snapshot.last_capture_bonus, 100);
        assert!(!snapshot
            .events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::PlayerCaptured { .. })));
    }

    #[test]
    fn capture_beats_a_later_chasing_hunter_on_the_same_tick() {
        let mut engine = player_between_chasing_and_frightened(1, 0);
        engine.resolve_collisions();

        assert_eq!(engine.phase(), RoundPhase::HunterCaptured);
        assert_eq!(engine.hunters[0].state, HunterState::Returning);
        assert_eq!(engine.hunters[1].state, HunterState::Chasing);
        assert_eq!(engine.score(), 100);
        assert!(!engine
            .build_snapshot(true)
            .events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::PlayerCaptured { .. })));

        step_until_phase_changes(&mut engine);
        assert_eq!(engine.phase(), RoundPhase::Playing);
        assert_eq!(engine.lives(), 3);
    }

    #[test]
    fn first_chasing_hunter_in_role_order_is_reported() {
        let mut engine = playing_engine();
        park_hunters_in_den(&mut engine);
        engine.player.pos = Vec2 { x: 100, y: 250 };
        for idx in [1, 2] {
            engine.hunters[idx].state = HunterState::Chasing;
            engine.hunters[idx].pos = engine.player.pos;
        }
        engine.build_snapshot(true);
        engine.resolve_collisions();

        assert_eq!(engine.phase(), RoundPhase::PlayerCaptured);
        let deaths: Vec<HunterRole> = engine
            .build_snapshot(true)
            .events
            .into_iter()
            .filter_map(|event| match event {
                RuntimeEvent::PlayerCaptured { role } => Some(role),
                _ => None,
            })
            .collect();
        assert_eq!(deaths, vec![HunterRole::Ambush]);
    }

    #[test]
    fn waiting_and_returning_hunters_never_collide() {
        let mut engine = playing_engine();
        engine.player.pos = Vec2 { x: 100, y: 250 };
        engine.hunters[0].state = HunterState::Waiting;
        engine.hunters[1].state = HunterState::Returning;
        engine.hunters[0].pos = engine.player.pos;
        engine.hunters[1].pos = engine.player.pos;
        engine.resolve_collisions();
        assert_eq!(engine.phase(), RoundPhase::Playing);
    }

    #[test]
    fn eating_the_last_collectible_clears_the_round_in_the_same_tick() {
        let mut engine = playing_engine();
        for row in 0..53 {
            for col in 0..46 {
                if (row, col) != (2, 2) {
                    engine.map.consume_if_collectible(row, col);
                }
            }
        }
        assert_eq!(engine.map.remaining_collectibles(), 1);
        engine.player.pos = Vec2 { x: 10, y: 11 };
        engine.player.dir = Direction::Up;

        engine.step(TICK_MS);
        assert_eq!(engine.phase(), RoundPhase::RoundClear);
        assert_eq!(engine.map.remaining_collectibles(), 0);

        engine.step(TICK_MS);
        assert_eq!(engine.phase(), RoundPhase::RoundStart);
        assert_eq!(engine.level(), 2);
        assert_eq!(engine.map.remaining_collectibles(), 248);
        assert_eq!(engine.player.pos, crate::constants::PLAYER_SPAWN);
    }

    #[test]
    fn border_stays_wall_after_round_reset() {
        let mut engine = playing_engine();
        engine.enter_phase(RoundPhase::RoundClear);
        engine.step(TICK_MS);
        for col in 0..46 {
            assert_eq!(engine.map.cell(0, col), Cell::Wall);
            assert_eq!(engine.map.cell(52, col), Cell::Wall);
        }
        for row in 0..53 {
            assert_eq!(engine.map.cell(row, 0), Cell::Wall);
            assert_eq!(engine.map.cell(row, 45), Cell::Wall);
        }
    }

    #[test]
    fn losing_the_last_life_ends_the_game() {
        let mut engine = GameEngine::new(
            9,
            GameEngineOptions {
                starting_lives_override: Some(1),
                ..GameEngineOptions::default()
            },
        );
        while engine.phase() != RoundPhase::Playing {
            engine.step(TICK_MS);
        }
        engine.player.pos = Vec2 { x: 100, y: 250 };
        engine.hunters[0].state = HunterState::Chasing;
        engine.hunters[0].pos = Vec2 { x: 100, y: 265 };
        engine.resolve_collisions();
        assert_eq!(engine.phase(), RoundPhase::PlayerCaptured);

        let death = step_until_phase_changes(&mut engine);
        assert!(death >= PLAYER_CAPTURED_MS);
        assert_eq!(engine.phase(), RoundPhase::LifeLost);
        assert_eq!(engine.lives(), 0);

        let pause = step_until_phase_changes(&mut engine);
        assert!(pause >= LIFE_LOST_MS);
        assert_eq!(engine.phase(), RoundPhase::GameOver);
        assert!(engine.is_ended());

        let summary = engine.build_summary();
        assert!(summary.ended);
        assert_eq!(summary.stats.lives_lost, 1);

        let frozen = engine.elapsed_ms;
        engine.step(TICK_MS);
        assert_eq!(engine.elapsed_ms, frozen);
    }

    #[test]
    fn life_lost_respawns_without_refilling() {
        let mut engine = playing_engine();
        engine.map.consume_if_collectible(2, 2);
        engine.player.pos = Vec2 { x: 100, y: 250 };
        engine.hunters[0].state = HunterState::Chasing;
        engine.hunters[0].pos = Vec2 { x: 90, y: 250 };
        engine.resolve_collisions();
        step_until_phase_changes(&mut engine);
        assert_eq!(engine.phase(), RoundPhase::LifeLost);
        assert_eq!(engine.lives(), 2);
        assert_eq!(engine.map.remaining_collectibles(), 247);
        assert_eq!(engine.player.pos, crate::constants::PLAYER_SPAWN);

        step_until_phase_changes(&mut engine);
        assert_eq!(engine.phase(), RoundPhase::Playing);
        assert_eq!(engine.level(), 1);
    }

    #[test]
    fn pause_only_works_while_playing_and_freezes_the_clock() {
        let mut engine = GameEngine::new(2, GameEngineOptions::default());
        assert!(!engine.toggle_pause());

        while engine.phase() != RoundPhase::Playing {
            engine.step(TICK_MS);
        }
        assert!(engine.toggle_pause());
        assert!(engine.is_paused());
        let frozen = engine.build_snapshot(false);
        for _ in 0..10 {
            engine.step(TICK_MS);
        }
        let after = engine.build_snapshot(false);
        assert_eq!(after.now_ms, frozen.now_ms);
        assert_eq!(after.tick, frozen.tick);
        assert_eq!(after.player.x, frozen.player.x);

        assert!(engine.toggle_pause());
        engine.step(TICK_MS);
        assert_eq!(engine.build_snapshot(false).now_ms, frozen.now_ms + TICK_MS);
    }

    #[test]
    fn extra_life_is_awarded_once() {
        let mut engine = playing_engine();
        engine.score = 9_995;
        engine.add_score(10);
        assert_eq!(engine.lives(), 4);
        engine.add_score(10_000);
        assert_eq!(engine.lives(), 4);
        let extra_lives = engine
            .build_snapshot(true)
            .events
            .iter()
            .filter(|event| matches!(event, RuntimeEvent::ExtraLife { .. }))
            .count();
        assert_eq!(extra_lives, 1);
    }

    #[test]
    fn new_game_resets_score_lives_and_level() {
        let mut engine = playing_engine();
        engine.score = 4_200;
        engine.lives = 1;
        engine.level = 7;
        engine.new_game();
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.lives(), 3);
        assert_eq!(engine.level(), 1);
        assert_eq!(engine.phase(), RoundPhase::RoundStart);
    }

    #[test]
    fn bonus_item_blinks_while_playing() {
        let mut engine = playing_engine();
        let start = engine.elapsed_ms;
        assert!(!engine.bonus_item_visible);
        engine.update_bonus_item(start + BONUS_BLINK_MS - 1);
        assert!(!engine.bonus_item_visible);
        engine.update_bonus_item(start + BONUS_BLINK_MS);
        assert!(engine.bonus_item_visible);
        engine.update_bonus_item(start + 2 * BONUS_BLINK_MS);
        assert!(!engine.bonus_item_visible);
    }

    #[test]
    fn visible_bonus_item_is_eaten_in_reach() {
        let mut engine = playing_engine();
        engine.bonus_item_visible = true;
        engine.player.pos = Vec2 { x: 245, y: 290 };
        engine.check_bonus_item();
        assert_eq!(engine.phase(), RoundPhase::Playing);

        engine.player.pos = Vec2 { x: 230, y: 290 };
        engine.check_bonus_item();
        assert_eq!(engine.score(), 100);
        assert_eq!(engine.phase(), RoundPhase::HunterCaptured);
        assert!(!engine.bonus_item_visible);
        let shown = engine.displayed_bonus.clone().expect("bonus shown");
        assert_eq!(shown.source, BonusSource::BonusItem);

        step_until_phase_changes(&mut engine);
        assert_eq!(engine.phase(), RoundPhase::Playing);
        assert!(engine.displayed_bonus.is_none());
    }

    #[test]
    fn hidden_bonus_item_is_not_eaten() {
        let mut engine = playing_engine();
        engine.bonus_item_visible = false;
        engine.player.pos = Vec2 { x: 220, y: 290 };
        engine.check_bonus_item();
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.phase(), RoundPhase::Playing);
    }

    #[test]
    fn stuck_player_shows_frame_one() {
        let mut engine = playing_engine();
        park_hunters_in_den(&mut engine);
        engine.player.pos = Vec2 { x: 10, y: 10 };
        engine.player.dir = Direction::Up;
        engine.step(TICK_MS);
        assert!(engine.player.stuck);
        assert_eq!(engine.player.frame, 1);
    }

    #[test]
    fn desired_direction_waits_for_an_open_turn() {
        let mut engine = playing_engine();
        park_hunters_in_den(&mut engine);
        engine.player.pos = Vec2 { x: 15, y: 10 };
        engine.player.dir = Direction::Left;
        engine.set_desired_direction(Direction::Down);
        engine.step_player();
        assert_eq!(engine.player.dir, Direction::Left);
        assert_eq!(engine.player.pos, Vec2 { x: 14, y: 10 });
        for _ in 0..4 {
            engine.step_player();
        }
        assert_eq!(engine.player.pos, Vec2 { x: 10, y: 10 });
        engine.step_player();
        assert_eq!(engine.player.dir, Direction::Down);
        assert_eq!(engine.player.pos, Vec2 { x: 10, y: 11 });
    }
}

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::None => Self::None,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HunterRole {
    Direct,
    Ambush,
    Pincer,
    Opportunist,
}

impl HunterRole {
    /// Per-tick evaluation order. Capture stacking depends on it.
    pub const ORDER: [HunterRole; 4] = [
        HunterRole::Direct,
        HunterRole::Ambush,
        HunterRole::Pincer,
        HunterRole::Opportunist,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Direct => 0,
            Self::Ambush => 1,
            Self::Pincer => 2,
            Self::Opportunist => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HunterState {
    Waiting,
    Chasing,
    Frightened,
    FrightenedEnding,
    Returning,
}

impl HunterState {
    pub fn is_frightened(self) -> bool {
        matches!(self, Self::Frightened | Self::FrightenedEnding)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    RoundStart,
    Playing,
    PlayerCaptured,
    HunterCaptured,
    RoundClear,
    LifeLost,
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusSource {
    Hunter,
    BonusItem,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct WorldInit {
    pub width: i32,
    pub height: i32,
    #[serde(rename = "tileSize")]
    pub tile_size: i32,
    pub tiles: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameConfig {
    #[serde(rename = "tickMs")]
    pub tick_ms: u64,
    #[serde(rename = "movesPerTick")]
    pub moves_per_tick: u32,
    #[serde(rename = "frightenDurationMs")]
    pub frighten_duration_ms: u64,
    #[serde(rename = "frightenEndingMs")]
    pub frighten_ending_ms: u64,
    #[serde(rename = "roundStartMs")]
    pub round_start_ms: u64,
    #[serde(rename = "playerCapturedMs")]
    pub player_captured_ms: u64,
    #[serde(rename = "lifeLostMs")]
    pub life_lost_ms: u64,
    #[serde(rename = "bonusDisplayMs")]
    pub bonus_display_ms: u64,
    #[serde(rename = "bonusBlinkMs")]
    pub bonus_blink_ms: u64,
    #[serde(rename = "startingLives")]
    pub starting_lives: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub stuck: bool,
    pub frame: u8,
}

#[derive(Clone, Debug, Serialize)]
pub struct HunterView {
    pub role: HunterRole,
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub state: HunterState,
    pub frame: u8,
}

#[derive(Clone, Debug, Serialize)]
pub struct BonusItemView {
    pub x: i32,
    pub y: i32,
    pub visible: bool,
    pub points: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct DisplayedBonus {
    pub x: i32,
    pub y: i32,
    pub points: u32,
    pub source: BonusSource,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    CollectibleEaten {
        row: usize,
        col: usize,
        power: bool,
    },
    HuntersFrightened,
    HunterCaptured {
        role: HunterRole,
        bonus: u32,
    },
    PlayerCaptured {
        role: HunterRole,
    },
    LifeLost {
        lives: i32,
    },
    ExtraLife {
        lives: i32,
    },
    BonusItemEaten {
        points: u32,
    },
    RoundStarted {
        level: u32,
    },
    RoundCleared {
        level: u32,
    },
    GameOver {
        score: u32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "nowMs")]
    pub now_ms: u64,
    pub phase: RoundPhase,
    pub paused: bool,
    pub score: u32,
    pub lives: i32,
    pub level: u32,
    pub player: PlayerView,
    pub hunters: Vec<HunterView>,
    #[serde(rename = "bonusItem")]
    pub bonus_item: BonusItemView,
    #[serde(rename = "displayedBonus")]
    pub displayed_bonus: Option<DisplayedBonus>,
    #[serde(rename = "lastCaptureBonus")]
    pub last_capture_bonus: u32,
    pub tiles: Vec<String>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct RunStats {
    #[serde(rename = "collectiblesEaten")]
    pub collectibles_eaten: u32,
    #[serde(rename = "powerEaten")]
    pub power_eaten: u32,
    #[serde(rename = "huntersCaptured")]
    pub hunters_captured: u32,
    #[serde(rename = "bonusItemsEaten")]
    pub bonus_items_eaten: u32,
    #[serde(rename = "roundsCleared")]
    pub rounds_cleared: u32,
    #[serde(rename = "livesLost")]
    pub lives_lost: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub score: u32,
    pub level: u32,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    pub ended: bool,
    pub stats: RunStats,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub name: String,
    pub score: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct HighScoreResponse {
    #[serde(rename = "generatedAtIso")]
    pub generated_at_iso: String,
    pub entries: Vec<HighScoreEntry>,
}

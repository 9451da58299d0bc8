use crate::constants::{DEN_DOOR_COLS, DEN_DOOR_ROW, MAZE_COLS, MAZE_ROWS, TILE_SIZE};
use crate::types::WorldInit;

/// Pristine layout. `#` wall, ` ` empty, `.` small collectible, `o` power collectible.
const LAYOUT: [&str; MAZE_ROWS] = [
    "##############################################",
    "#                     ##                     #",
    "# . .. .. . .. . .. . ## . .. .. . . .. .. . #",
    "#                     ##                     #",
    "# o ##### . ####### . ## . ####### . ##### o #",
    "# . ##### . ####### . ## . ####### . ##### . #",
    "# . ##### . ####### . ## . ####### . ##### . #",
    "#                                            #",
    "# . .. .. . .. . .. . .. . .. .. . . .. .. . #",
    "#                                            #",
    "# . ##### . ## . ############ . ## . ##### . #",
    "# . ##### . ## . ############ . ## . ##### . #",
    "#           ##        ##        ##           #",
    "# . .. .. . ## . .. . ## . .. . ## . .. .. . #",
    "#           ##        ##        ##           #",
    "######### . #######   ##   ####### . #########",
    "######### . #######   ##   ####### . #########",
    "#       #   ##                  ##   #       #",
    "#       # . ##                  ## . #       #",
    "#       #   ##                  ##   #       #",
    "#       # . ##   ############   ## . #       #",
    "######### . ##   #          #   ## . #########",
    "######### . ##   #          #   ## . #########",
    "#                #          #                #",
    "#         .      #          #      .         #",
    "#                #          #                #",
    "######### . ##   #          #   ## . #########",
    "######### . ##   #          #   ## . #########",
    "#       # . ##   ############   ## . #       #",
    "#       #   ##                  ##   #       #",
    "#       # . ##                  ## . #       #",
    "#       #   ##                  ##   #       #",
    "######### . ##   ############   ## . #########",
    "######### . ##   ############   ## . #########",
    "#                     ##                     #",
    "# . .. .. . .. . .. . ## . .. .. . . .. .. . #",
    "#                     ##                     #",
    "# . ##### . ####### . ## . ####### . ##### . #",
    "# . ##### . ####### . ## . ####### . ##### . #",
    "#      ##                            ##      #",
    "# o .. ## . .. . .. .    . .. .. . . ## .. o #",
    "#      ##                            ##      #",
    "#### . ## . ## . ############ . ## . ## . ####",
    "#### . ## . ## . ############ . ## . ## . ####",
    "#           ##        ##        ##           #",
    "# . .. .. . ## . .. . ## . .. . ## . .. .. . #",
    "#           ##        ##        ##           #",
    "# . ############### . ## . ############### . #",
    "# . ############### . ## . ############### . #",
    "#                                            #",
    "# . .. .. . .. . .. . .. . .. .. . . .. .. . #",
    "#                                            #",
    "##############################################",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Wall,
    Empty,
    Collectible,
    PowerCollectible,
}

impl Cell {
    fn from_layout(c: u8) -> Self {
        match c {
            b'#' => Cell::Wall,
            b'.' => Cell::Collectible,
            b'o' => Cell::PowerCollectible,
            _ => Cell::Empty,
        }
    }

    fn glyph(self) -> char {
        match self {
            Cell::Wall => '#',
            Cell::Empty => ' ',
            Cell::Collectible => '.',
            Cell::PowerCollectible => 'o',
        }
    }

    fn is_collectible(self) -> bool {
        matches!(self, Cell::Collectible | Cell::PowerCollectible)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Consumed {
    None,
    Small,
    Power,
}

#[derive(Clone, Debug)]
pub struct TileMap {
    cells: Vec<Cell>,
    remaining: usize,
}

impl Default for TileMap {
    fn default() -> Self {
        Self::new()
    }
}

impl TileMap {
    pub fn new() -> Self {
        let cells: Vec<Cell> = LAYOUT
            .iter()
            .flat_map(|row| row.bytes().map(Cell::from_layout))
            .collect();
        let remaining = cells.iter().filter(|cell| cell.is_collectible()).count();
        Self { cells, remaining }
    }

    pub fn rows(&self) -> usize {
        MAZE_ROWS
    }

    pub fn cols(&self) -> usize {
        MAZE_COLS
    }

    fn index_of(&self, row: i32, col: i32) -> Option<usize> {
        if row < 0 || col < 0 || row as usize >= MAZE_ROWS || col as usize >= MAZE_COLS {
            return None;
        }
        Some(row as usize * MAZE_COLS + col as usize)
    }

    pub fn cell(&self, row: i32, col: i32) -> Cell {
        self.index_of(row, col)
            .map(|idx| self.cells[idx])
            .unwrap_or(Cell::Wall)
    }

    /// Out-of-range coordinates are impassable.
    pub fn is_passable(&self, row: i32, col: i32) -> bool {
        self.cell(row, col) != Cell::Wall
    }

    pub fn has_collectible(&self, row: i32, col: i32) -> bool {
        self.cell(row, col).is_collectible()
    }

    pub fn is_den_door(&self, row: i32, col: i32) -> bool {
        row == DEN_DOOR_ROW as i32 && col >= 0 && DEN_DOOR_COLS.contains(&(col as usize))
    }

    pub fn consume_if_collectible(&mut self, row: i32, col: i32) -> Consumed {
        let Some(idx) = self.index_of(row, col) else {
            return Consumed::None;
        };
        let consumed = match self.cells[idx] {
            Cell::Collectible => Consumed::Small,
            Cell::PowerCollectible => Consumed::Power,
            Cell::Wall | Cell::Empty => return Consumed::None,
        };
        self.cells[idx] = Cell::Empty;
        self.remaining -= 1;
        consumed
    }

    pub fn remaining_collectibles(&self) -> usize {
        self.remaining
    }

    pub fn refill(&mut self) {
        *self = Self::new();
    }

    /// Current grid as one glyph string per row, using the layout legend.
    pub fn to_rows(&self) -> Vec<String> {
        self.cells
            .chunks(MAZE_COLS)
            .map(|row| row.iter().map(|cell| cell.glyph()).collect())
            .collect()
    }
}

pub fn to_world_init(map: &TileMap) -> WorldInit {
    WorldInit {
        width: map.cols() as i32,
        height: map.rows() as i32,
        tile_size: TILE_SIZE,
        tiles: map.to_rows(),
    }
}

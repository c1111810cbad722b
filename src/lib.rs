//! Falling-block puzzle: simulation core plus browser bindings.
//!
//! Everything with game logic in it lives in this module and is free of DOM
//! types, so native `cargo test` can drive it. Rendering goes through the
//! [`CellPainter`] seam; the canvas implementation, the gravity timer, the
//! keyboard handler and the persisted score table are in [`web`].

use rand::seq::SliceRandom;
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::wasm_bindgen;

pub mod web;

pub const BOARD_ROWS: usize = 20;
pub const BOARD_COLS: usize = 10;
pub const PREVIEW_ROWS: usize = 4;
pub const PREVIEW_COLS: usize = 4;
pub const SQUARE_SIZE: u32 = 25;
pub const SCORE_TABLE_LIMIT: usize = 10;

pub const EMPTY_COLOR: u8 = 0;
pub const STROKE_COLOR: u8 = 8;

/// Fill colors by cell value; index 0 is the empty cell, index 8 the border
/// stroke.
pub const PALETTE: [&str; 9] = [
    "#EAECEE", "#F4D03F", "#58D68D", "#A569BD", "#5DADE2", "#E67E22", "#E74C3C", "#148F77",
    "#ABB2B9",
];

pub const SPAWN_X: i32 = 3;
pub const SPAWN_Y: i32 = -2;

pub const ROW_CLEAR_SCORE: u32 = 100;
pub const START_DELAY_MS: u32 = 1000;
pub const DELAY_STEP_MS: u32 = 50;
pub const MIN_DELAY_MS: u32 = 200;

const ORIENTATION_COUNT: usize = 4;

#[wasm_bindgen(start)]
pub fn bootstrap() {
    console_error_panic_hook::set_once();
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Tetromino {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl Tetromino {
    pub fn all() -> [Tetromino; 7] {
        [
            Tetromino::I,
            Tetromino::J,
            Tetromino::L,
            Tetromino::O,
            Tetromino::S,
            Tetromino::T,
            Tetromino::Z,
        ]
    }

    fn color_id(self) -> u8 {
        match self {
            Tetromino::I => 1,
            Tetromino::J => 2,
            Tetromino::L => 3,
            Tetromino::O => 4,
            Tetromino::S => 5,
            Tetromino::T => 6,
            Tetromino::Z => 7,
        }
    }

    /// Canonical spawn-orientation matrix. I and O use a 4x4 matrix, the
    /// rest 3x3; `1` marks an occupied cell relative to the figure's
    /// top-left corner.
    pub fn shape(self) -> Shape {
        match self {
            Tetromino::I => vec![
                vec![0, 0, 0, 0],
                vec![1, 1, 1, 1],
                vec![0, 0, 0, 0],
                vec![0, 0, 0, 0],
            ],
            Tetromino::J => vec![vec![1, 0, 0], vec![1, 1, 1], vec![0, 0, 0]],
            Tetromino::L => vec![vec![0, 0, 1], vec![1, 1, 1], vec![0, 0, 0]],
            Tetromino::O => vec![
                vec![0, 0, 0, 0],
                vec![0, 1, 1, 0],
                vec![0, 1, 1, 0],
                vec![0, 0, 0, 0],
            ],
            Tetromino::S => vec![vec![0, 1, 1], vec![1, 1, 0], vec![0, 0, 0]],
            Tetromino::T => vec![vec![0, 1, 0], vec![1, 1, 1], vec![0, 0, 0]],
            Tetromino::Z => vec![vec![1, 1, 0], vec![0, 1, 1], vec![0, 0, 0]],
        }
    }
}

pub type Shape = Vec<Vec<u8>>;

/// Rotates a shape matrix a quarter turn clockwise: reverse the row order,
/// then transpose.
pub fn rotate_shape(shape: &Shape) -> Shape {
    let n = shape.len();
    let mut rotated = vec![vec![0; n]; n];
    for (i, row) in shape.iter().rev().enumerate() {
        for (j, &cell) in row.iter().enumerate() {
            rotated[j][i] = cell;
        }
    }
    rotated
}

/// Wall-kick offsets shared by J, L, S, T and Z, indexed by the orientation
/// the figure is rotating out of. Each candidate is tried in order against
/// the rotated matrix; the first that fits wins.
pub const KICKS: [[(i32, i32); 5]; 4] = [
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
];

/// The I figure kicks farther than the rest and has its own table.
pub const I_KICKS: [[(i32, i32); 5]; 4] = [
    [(0, 0), (-2, 0), (1, 0), (-2, -1), (1, 2)],
    [(0, 0), (-1, 0), (2, 0), (-1, 2), (2, -1)],
    [(0, 0), (2, 0), (-1, 0), (2, 1), (-1, -2)],
    [(0, 0), (1, 0), (-2, 0), (1, -2), (-2, 1)],
];

pub fn kick_offsets(kind: Tetromino, orientation: usize) -> &'static [(i32, i32); 5] {
    match kind {
        Tetromino::I => &I_KICKS[orientation % ORIENTATION_COUNT],
        _ => &KICKS[orientation % ORIENTATION_COUNT],
    }
}

/// A falling figure. `(x, y)` is the offset of the shape's top-left cell in
/// board coordinates; `y` is negative while the figure is still in the spawn
/// area above the visible grid.
#[derive(Clone, Debug)]
pub struct Figure {
    pub kind: Tetromino,
    pub shape: Shape,
    pub orientation: usize,
    pub x: i32,
    pub y: i32,
    pub color: u8,
}

impl Figure {
    pub fn new(kind: Tetromino) -> Self {
        Self {
            kind,
            shape: kind.shape(),
            orientation: 0,
            x: 0,
            y: 0,
            color: kind.color_id(),
        }
    }

    /// Absolute board coordinates of every occupied cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape.iter().enumerate().flat_map(move |(i, row)| {
            let y = self.y + i as i32;
            row.iter()
                .enumerate()
                .filter(|(_, cell)| **cell != 0)
                .map(move |(j, _)| (self.x + j as i32, y))
        })
    }
}

/// Pull-based endless figure source: one uniformly random tetromino per
/// call, spawn orientation, position (0, 0).
pub fn next_figure() -> Figure {
    let mut rng = thread_rng();
    Figure::new(*Tetromino::all().choose(&mut rng).unwrap())
}

/// Drawing surface for one grid. Implementations paint a single bordered
/// square at a cell coordinate; the simulation never touches the canvas
/// directly.
pub trait CellPainter {
    fn paint_cell(&self, col: i32, row: i32, color: u8);
}

/// A rectangle of locked cell colors plus the surface it paints itself on.
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<u8>>,
    painter: Box<dyn CellPainter>,
}

impl Grid {
    pub fn new(painter: Box<dyn CellPainter>, rows: usize, cols: usize) -> Self {
        let grid = Self {
            rows,
            cols,
            cells: vec![vec![EMPTY_COLOR; cols]; rows],
            painter,
        };
        grid.draw();
        grid
    }

    /// Full repaint of every cell.
    pub fn draw(&self) {
        for (i, row) in self.cells.iter().enumerate() {
            for (j, &cell) in row.iter().enumerate() {
                self.painter.paint_cell(j as i32, i as i32, cell);
            }
        }
    }

    fn fill_figure(&self, figure: &Figure, color: u8) {
        for (x, y) in figure.cells() {
            self.painter.paint_cell(x, y, color);
        }
    }

    fn draw_figure(&self, figure: &Figure) {
        self.fill_figure(figure, figure.color);
    }

    fn erase_figure(&self, figure: &Figure) {
        self.fill_figure(figure, EMPTY_COLOR);
    }
}

/// The "next figure" pane: a 4x4 grid that always shows the upcoming piece.
pub struct Preview {
    grid: Grid,
    figure: Figure,
}

impl Preview {
    pub fn new(painter: Box<dyn CellPainter>) -> Self {
        let grid = Grid::new(painter, PREVIEW_ROWS, PREVIEW_COLS);
        let figure = next_figure();
        grid.draw_figure(&figure);
        Self { grid, figure }
    }

    /// Hands the held figure to the caller and immediately queues a fresh
    /// one, repainting the pane to show it.
    pub fn take_figure(&mut self) -> Figure {
        self.grid.erase_figure(&self.figure);
        let figure = std::mem::replace(&mut self.figure, next_figure());
        self.grid.draw_figure(&self.figure);
        figure
    }
}

/// Outcome of a gravity step, consumed by the loop driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The figure descended one row.
    Moved,
    /// The figure could not descend and was written into the grid.
    Locked { rows_cleared: usize },
    /// The figure tried to lock at or above the top row. The grid is
    /// untouched and no new figure was spawned; the game is over.
    GameOver,
}

/// The playing field: locked cells, the active figure, the preview pane it
/// pulls new figures from, and the score / gravity-delay progression.
pub struct Board {
    grid: Grid,
    figure: Figure,
    preview: Preview,
    score: u32,
    delay_ms: u32,
}

impl Board {
    pub fn new(painter: Box<dyn CellPainter>, mut preview: Preview, start_delay_ms: u32) -> Self {
        let figure = Self::spawn_from(&mut preview);
        Self {
            grid: Grid::new(painter, BOARD_ROWS, BOARD_COLS),
            figure,
            preview,
            score: 0,
            delay_ms: start_delay_ms,
        }
    }

    fn spawn_from(preview: &mut Preview) -> Figure {
        let mut figure = preview.take_figure();
        figure.x = SPAWN_X;
        figure.y = SPAWN_Y;
        figure
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn figure(&self) -> &Figure {
        &self.figure
    }

    /// Tests whether `shape` (the active figure's when `None`) placed with
    /// its top-left corner at `(x, y)` hits a wall, the floor, or a locked
    /// cell. Rows above the grid never collide. Pure query.
    pub fn check_collision(&self, x: i32, y: i32, shape: Option<&Shape>) -> bool {
        let shape = shape.unwrap_or(&self.figure.shape);
        for (i, row) in shape.iter().enumerate() {
            for (j, &cell) in row.iter().enumerate() {
                if cell == 0 {
                    continue;
                }
                let cell_x = x + j as i32;
                let cell_y = y + i as i32;
                if cell_x < 0 || cell_x >= self.grid.cols as i32 || cell_y >= self.grid.rows as i32 {
                    return true;
                }
                if cell_y < 0 {
                    continue;
                }
                if self.grid.cells[cell_y as usize][cell_x as usize] != EMPTY_COLOR {
                    return true;
                }
            }
        }
        false
    }

    /// Moves the active figure to `(x, y)` if nothing is in the way,
    /// adopting `next_shape` (and advancing the orientation) when one is
    /// supplied. Repaints on success; returns whether the move happened.
    pub fn attempt_move(&mut self, x: i32, y: i32, next_shape: Option<Shape>) -> bool {
        if self.check_collision(x, y, next_shape.as_ref()) {
            return false;
        }
        self.grid.erase_figure(&self.figure);
        self.figure.x = x;
        self.figure.y = y;
        if let Some(shape) = next_shape {
            self.figure.shape = shape;
            self.figure.orientation = (self.figure.orientation + 1) % ORIENTATION_COUNT;
        }
        self.grid.draw_figure(&self.figure);
        true
    }

    pub fn move_left(&mut self) {
        self.attempt_move(self.figure.x - 1, self.figure.y, None);
    }

    pub fn move_right(&mut self) {
        self.attempt_move(self.figure.x + 1, self.figure.y, None);
    }

    /// Gravity step. When the figure cannot descend it locks in place.
    pub fn move_down(&mut self) -> StepOutcome {
        if self.attempt_move(self.figure.x, self.figure.y + 1, None) {
            StepOutcome::Moved
        } else {
            self.lock_figure()
        }
    }

    /// Rotates the active figure a quarter turn clockwise, trying each kick
    /// offset for its type against the pre-rotation position until one
    /// fits. The square figure never rotates; five misses cancel the
    /// rotation entirely.
    pub fn rotate(&mut self) {
        if self.figure.kind == Tetromino::O {
            return;
        }
        let rotated = rotate_shape(&self.figure.shape);
        let (x, y) = (self.figure.x, self.figure.y);
        for &(dx, dy) in kick_offsets(self.figure.kind, self.figure.orientation) {
            if self.attempt_move(x + dx, y + dy, Some(rotated.clone())) {
                break;
            }
        }
    }

    /// True when writing the active figure into the grid would place any of
    /// its cells at or above the top row.
    fn lock_ends_game(&self) -> bool {
        self.figure.cells().any(|(_, y)| y <= 0)
    }

    fn lock_figure(&mut self) -> StepOutcome {
        if self.lock_ends_game() {
            return StepOutcome::GameOver;
        }
        for (x, y) in self.figure.cells() {
            self.grid.cells[y as usize][x as usize] = self.figure.color;
        }
        let from = self.figure.y;
        let to = self.figure.y + self.figure.shape.len() as i32;
        let rows_cleared = self.remove_full_rows(from, to);
        self.grid.draw();
        self.figure = Self::spawn_from(&mut self.preview);
        StepOutcome::Locked { rows_cleared }
    }

    /// Scans rows `[from, min(to, rows))` in increasing order and removes
    /// every full one, pushing an empty row in at the top. The index is not
    /// re-adjusted after a removal: rows above the removed index shift down
    /// while rows below keep theirs, so the next index examined is always
    /// the next untouched row. Each cleared row scores [`ROW_CLEAR_SCORE`]
    /// and shortens the gravity delay by [`DELAY_STEP_MS`] until
    /// [`MIN_DELAY_MS`].
    pub fn remove_full_rows(&mut self, from: i32, to: i32) -> usize {
        let from = from.max(0) as usize;
        let to = (to.max(0) as usize).min(self.grid.rows);
        let mut cleared = 0;
        for i in from..to {
            if self.grid.cells[i].iter().all(|&cell| cell != EMPTY_COLOR) {
                self.grid.cells.remove(i);
                self.grid.cells.insert(0, vec![EMPTY_COLOR; self.grid.cols]);
                self.score += ROW_CLEAR_SCORE;
                if self.delay_ms > MIN_DELAY_MS {
                    self.delay_ms -= DELAY_STEP_MS;
                }
                cleared += 1;
            }
        }
        cleared
    }
}

/// One row of the persisted high-score table.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntry {
    pub player: String,
    pub score: u32,
}

/// Inserts `entry` into a table kept in descending score order and truncates
/// it to [`SCORE_TABLE_LIMIT`] rows. Ties land after existing entries with
/// the same score. Returns the insertion index, which may point past the
/// truncated tail.
pub fn ranked_insert(table: &mut Vec<ScoreEntry>, entry: ScoreEntry) -> usize {
    let index = table
        .iter()
        .position(|other| entry.score > other.score)
        .unwrap_or(table.len());
    table.insert(index, entry);
    table.truncate(SCORE_TABLE_LIMIT);
    index
}

/// Decodes a persisted score table. Missing or malformed data counts as "no
/// scores yet".
pub fn parse_scores(raw: Option<&str>) -> Vec<ScoreEntry> {
    raw.and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default()
}

/// Knobs the page may pass to `startGame`; everything defaults to the
/// classic values.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub start_delay_ms: u32,
    pub player: Option<String>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            start_delay_ms: START_DELAY_MS,
            player: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopPainter;

    impl CellPainter for NoopPainter {
        fn paint_cell(&self, _col: i32, _row: i32, _color: u8) {}
    }

    fn test_board() -> Board {
        let preview = Preview::new(Box::new(NoopPainter));
        Board::new(Box::new(NoopPainter), preview, START_DELAY_MS)
    }

    fn install(board: &mut Board, kind: Tetromino, x: i32, y: i32) {
        let mut figure = Figure::new(kind);
        figure.x = x;
        figure.y = y;
        board.figure = figure;
    }

    fn fill_row(board: &mut Board, row: usize, color: u8) {
        board.grid.cells[row] = vec![color; BOARD_COLS];
    }

    #[test]
    fn open_board_accepts_in_bounds_placements() {
        let board = test_board();
        for kind in Tetromino::all() {
            assert!(
                !board.check_collision(3, 5, Some(&kind.shape())),
                "{kind:?} should fit in the open middle"
            );
        }
    }

    #[test]
    fn walls_floor_and_locked_cells_collide() {
        let mut board = test_board();
        install(&mut board, Tetromino::T, 3, 5);
        // left wall, right wall, floor
        assert!(board.check_collision(-1, 5, None));
        assert!(board.check_collision(8, 5, None));
        assert!(board.check_collision(3, 19, None));
        // overlap with a locked cell
        board.grid.cells[6][4] = 2;
        assert!(board.check_collision(3, 5, None));
    }

    #[test]
    fn rows_above_the_grid_never_collide() {
        let mut board = test_board();
        fill_row(&mut board, 0, 5);
        install(&mut board, Tetromino::T, 3, -2);
        // T occupies relative rows 0 and 1, both above the grid here
        assert!(!board.check_collision(3, -2, None));
        // one row lower its bottom row lands on the filled top row
        assert!(board.check_collision(3, -1, None));
    }

    #[test]
    fn horizontal_moves_stop_at_the_walls() {
        let mut board = test_board();
        install(&mut board, Tetromino::T, 3, 5);
        board.move_left();
        assert_eq!(board.figure.x, 2);

        install(&mut board, Tetromino::T, 0, 5);
        board.move_left();
        assert_eq!(board.figure.x, 0);

        install(&mut board, Tetromino::T, 7, 5);
        board.move_right();
        assert_eq!(board.figure.x, 7);
    }

    #[test]
    fn square_figure_never_rotates() {
        let mut board = test_board();
        install(&mut board, Tetromino::O, 3, 5);
        board.rotate();
        assert_eq!(board.figure.shape, Tetromino::O.shape());
        assert_eq!(board.figure.orientation, 0);
        assert_eq!((board.figure.x, board.figure.y), (3, 5));
    }

    #[test]
    fn four_rotations_restore_every_shape() {
        for kind in Tetromino::all() {
            if kind == Tetromino::O {
                continue;
            }
            let mut board = test_board();
            install(&mut board, kind, 3, 5);
            for _ in 0..4 {
                board.rotate();
            }
            assert_eq!(board.figure.shape, kind.shape(), "{kind:?}");
            assert_eq!(board.figure.orientation, 0, "{kind:?}");
            assert_eq!((board.figure.x, board.figure.y), (3, 5), "{kind:?}");
        }
    }

    #[test]
    fn vertical_i_kicks_off_the_left_wall() {
        let mut board = test_board();
        install(&mut board, Tetromino::I, 3, 5);
        board.rotate();
        assert_eq!(board.figure.orientation, 1);
        // hug the wall: the vertical I occupies column x + 2
        board.figure.x = -2;
        board.rotate();
        // first two offsets of I_KICKS[1] collide, the third shifts right
        assert_eq!(board.figure.orientation, 2);
        assert_eq!((board.figure.x, board.figure.y), (0, 5));
    }

    #[test]
    fn boxed_in_rotation_is_cancelled() {
        let mut board = test_board();
        install(&mut board, Tetromino::T, 4, 10);
        for row in 0..BOARD_ROWS {
            fill_row(&mut board, row, 2);
        }
        for (x, y) in board.figure.cells().collect::<Vec<_>>() {
            board.grid.cells[y as usize][x as usize] = EMPTY_COLOR;
        }
        board.rotate();
        assert_eq!(board.figure.shape, Tetromino::T.shape());
        assert_eq!(board.figure.orientation, 0);
        assert_eq!((board.figure.x, board.figure.y), (4, 10));
    }

    #[test]
    fn locking_writes_cells_and_respawns() {
        let mut board = test_board();
        install(&mut board, Tetromino::T, 3, 17);
        assert_eq!(board.move_down(), StepOutcome::Moved);
        assert_eq!(board.move_down(), StepOutcome::Locked { rows_cleared: 0 });
        assert_eq!(board.grid.cells[18][4], 6);
        assert_eq!(board.grid.cells[19][3], 6);
        assert_eq!(board.grid.cells[19][4], 6);
        assert_eq!(board.grid.cells[19][5], 6);
        // the next figure is already installed at the spawn offset
        assert_eq!((board.figure.x, board.figure.y), (SPAWN_X, SPAWN_Y));
    }

    #[test]
    fn locking_at_the_top_ends_the_game_without_writing() {
        let mut board = test_board();
        fill_row(&mut board, 2, 4);
        install(&mut board, Tetromino::T, 3, 0);
        let before = board.grid.cells.clone();
        assert_eq!(board.move_down(), StepOutcome::GameOver);
        assert_eq!(board.grid.cells, before);
        assert_eq!(board.score(), 0);
        // no respawn either
        assert_eq!((board.figure.x, board.figure.y), (3, 0));
    }

    #[test]
    fn full_row_is_removed_and_rows_above_shift_down() {
        let mut board = test_board();
        fill_row(&mut board, 15, 3);
        board.grid.cells[14][0] = 5;
        board.grid.cells[16][3] = 7;
        assert_eq!(board.remove_full_rows(13, 17), 1);
        assert_eq!(board.score(), 100);
        assert_eq!(board.delay_ms(), 950);
        assert!(board.grid.cells[0].iter().all(|&c| c == EMPTY_COLOR));
        // the marker above the cleared row moved down one
        assert_eq!(board.grid.cells[15][0], 5);
        // the marker below kept its index
        assert_eq!(board.grid.cells[16][3], 7);
        assert!(
            board
                .grid
                .cells
                .iter()
                .all(|row| row.iter().any(|&c| c == EMPTY_COLOR))
        );
    }

    #[test]
    fn adjacent_full_rows_clear_in_one_scan() {
        let mut board = test_board();
        fill_row(&mut board, 14, 3);
        fill_row(&mut board, 15, 6);
        board.grid.cells[13][2] = 4;
        board.grid.cells[16][7] = 1;
        assert_eq!(board.remove_full_rows(14, 16), 2);
        assert_eq!(board.score(), 200);
        assert_eq!(board.delay_ms(), 900);
        assert_eq!(board.grid.cells[15][2], 4);
        assert_eq!(board.grid.cells[16][7], 1);
    }

    #[test]
    fn gravity_delay_bottoms_out_at_the_floor() {
        let mut board = test_board();
        for clear in 1..=17 {
            fill_row(&mut board, 10, 2);
            assert_eq!(board.remove_full_rows(10, 11), 1);
            let expected = START_DELAY_MS
                .saturating_sub(DELAY_STEP_MS * clear)
                .max(MIN_DELAY_MS);
            assert_eq!(board.delay_ms(), expected, "after {clear} clears");
        }
        assert_eq!(board.delay_ms(), MIN_DELAY_MS);
        assert_eq!(board.score(), 1700);
    }

    #[test]
    fn ranked_insert_keeps_descending_order() {
        let mut table = Vec::new();
        ranked_insert(
            &mut table,
            ScoreEntry {
                player: "a".into(),
                score: 50,
            },
        );
        ranked_insert(
            &mut table,
            ScoreEntry {
                player: "b".into(),
                score: 200,
            },
        );
        ranked_insert(
            &mut table,
            ScoreEntry {
                player: "c".into(),
                score: 100,
            },
        );
        let scores: Vec<u32> = table.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![200, 100, 50]);
    }

    #[test]
    fn ranked_insert_places_ties_after_existing_entries() {
        let mut table = vec![
            ScoreEntry {
                player: "first".into(),
                score: 100,
            },
            ScoreEntry {
                player: "low".into(),
                score: 50,
            },
        ];
        let index = ranked_insert(
            &mut table,
            ScoreEntry {
                player: "second".into(),
                score: 100,
            },
        );
        assert_eq!(index, 1);
        assert_eq!(table[0].player, "first");
        assert_eq!(table[1].player, "second");
    }

    #[test]
    fn ranked_insert_truncates_to_the_limit() {
        let mut table: Vec<ScoreEntry> = (0..SCORE_TABLE_LIMIT)
            .map(|i| ScoreEntry {
                player: format!("p{i}"),
                score: 1000 - 100 * i as u32,
            })
            .collect();
        // too low to stay: inserted at the tail, then truncated away
        let index = ranked_insert(
            &mut table,
            ScoreEntry {
                player: "tail".into(),
                score: 5,
            },
        );
        assert_eq!(index, SCORE_TABLE_LIMIT);
        assert_eq!(table.len(), SCORE_TABLE_LIMIT);
        assert!(table.iter().all(|e| e.player != "tail"));

        let index = ranked_insert(
            &mut table,
            ScoreEntry {
                player: "runner-up".into(),
                score: 950,
            },
        );
        assert_eq!(index, 1);
        assert_eq!(table.len(), SCORE_TABLE_LIMIT);
        assert_eq!(table[1].player, "runner-up");
    }

    #[test]
    fn missing_or_malformed_scores_load_empty() {
        assert!(parse_scores(None).is_empty());
        assert!(parse_scores(Some("{not json")).is_empty());
        let table = parse_scores(Some(r#"[{"player":"a","score":300}]"#));
        assert_eq!(
            table,
            vec![ScoreEntry {
                player: "a".into(),
                score: 300,
            }]
        );
    }

    #[test]
    fn preview_hands_out_fresh_spawn_figures() {
        let mut preview = Preview::new(Box::new(NoopPainter));
        let taken = preview.take_figure();
        assert_eq!(taken.orientation, 0);
        assert_eq!((taken.x, taken.y), (0, 0));
        assert_eq!(taken.shape, taken.kind.shape());
        // the pane immediately holds a replacement
        assert_eq!(preview.figure.shape, preview.figure.kind.shape());
    }

    #[test]
    fn i_figure_uses_its_own_kick_table() {
        assert_eq!(kick_offsets(Tetromino::I, 0), &I_KICKS[0]);
        assert_eq!(kick_offsets(Tetromino::T, 3), &KICKS[3]);
        assert_eq!(kick_offsets(Tetromino::S, 2), &KICKS[2]);
    }

    #[test]
    fn default_settings_match_the_classic_pace() {
        let settings = GameSettings::default();
        assert_eq!(settings.start_delay_ms, START_DELAY_MS);
        assert!(settings.player.is_none());
    }
}

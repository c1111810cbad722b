//! Browser bindings: canvas painting, the gravity timer, keyboard input and
//! the persisted score table.
//!
//! All state for a running game sits in one [`Session`] held in a
//! thread-local cell; the timer and keyboard closures reach it through
//! [`with_session`]. The exported entry points are `startGame` for the game
//! page and `renderScoreTable` / `exportScores` for the scores page.

use std::cell::RefCell;

use serde_wasm_bindgen::from_value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Blob, BlobPropertyBag, CanvasRenderingContext2d, Document, HtmlAnchorElement,
    HtmlCanvasElement, HtmlElement, KeyboardEvent, Storage, Url, Window, console,
};

use crate::{
    Board, CellPainter, GameSettings, PALETTE, Preview, SQUARE_SIZE, STROKE_COLOR, ScoreEntry,
    StepOutcome, parse_scores, ranked_insert,
};

const PLAYER_NAME_KEY: &str = "playerName";
const SCORES_KEY: &str = "scores";
const NEW_SCORE_INDEX_KEY: &str = "newScoreIndex";

const BOARD_VIEW_ID: &str = "boardView";
const NEXT_FIGURE_VIEW_ID: &str = "nextFigureView";
const SCORE_READOUT_ID: &str = "score";
const PLAYER_READOUT_ID: &str = "playerName";
const GAME_OVER_DIALOG_ID: &str = "gameOverDialog";
const SCORES_BODY_ID: &str = "scoresBody";
const NEW_SCORE_CLASS: &str = "new-score";
const EXPORT_FILE_NAME: &str = "tetris-scores.json";
const DEFAULT_PLAYER: &str = "Player";

fn log(msg: &str) {
    console::log_1(&JsValue::from_str(msg));
}

/// Paints one grid onto a 2d canvas context: a filled square with a border
/// stroke per cell, [`SQUARE_SIZE`] pixels on a side.
struct CanvasPainter {
    ctx: CanvasRenderingContext2d,
}

impl CanvasPainter {
    fn for_canvas(document: &Document, id: &str) -> Result<Self, JsValue> {
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(id)
            .ok_or_else(|| JsValue::from_str(&format!("missing canvas #{id}")))?
            .dyn_into()?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into()?;
        Ok(Self { ctx })
    }
}

impl CellPainter for CanvasPainter {
    fn paint_cell(&self, col: i32, row: i32, color: u8) {
        let size = SQUARE_SIZE as f64;
        let x = col as f64 * size;
        let y = row as f64 * size;
        self.ctx.set_fill_style_str(PALETTE[color as usize]);
        self.ctx.fill_rect(x, y, size, size);
        self.ctx.set_stroke_style_str(PALETTE[STROKE_COLOR as usize]);
        self.ctx.stroke_rect(x, y, size, size);
    }
}

/// One running game: the board, the score table loaded for this session,
/// the live timer and both event closures. Nothing outside the session
/// mutates simulation state.
struct Session {
    board: Board,
    scoreboard: Vec<ScoreEntry>,
    player: String,
    timer_id: i32,
    tick: Closure<dyn FnMut()>,
    keydown: Closure<dyn FnMut(KeyboardEvent)>,
    over: bool,
}

thread_local! {
    static SESSION: RefCell<Option<Session>> = const { RefCell::new(None) };
}

fn with_session(f: impl FnOnce(&mut Session)) {
    SESSION.with(|cell| {
        if let Some(session) = cell.borrow_mut().as_mut() {
            f(session);
        }
    });
}

fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

fn document(window: &Window) -> Result<Document, JsValue> {
    window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))
}

fn local_storage(window: &Window) -> Result<Storage, JsValue> {
    window
        .local_storage()?
        .ok_or_else(|| JsValue::from_str("local storage unavailable"))
}

fn load_scores(storage: &Storage) -> Vec<ScoreEntry> {
    let raw = storage.get_item(SCORES_KEY).ok().flatten();
    parse_scores(raw.as_deref())
}

fn store_scores(storage: &Storage, scores: &[ScoreEntry]) -> Result<(), JsValue> {
    let raw = serde_json::to_string(scores).map_err(|err| JsValue::from_str(&err.to_string()))?;
    storage.set_item(SCORES_KEY, &raw)
}

fn set_text(document: &Document, id: &str, text: &str) {
    if let Some(element) = document.get_element_by_id(id) {
        element.set_text_content(Some(text));
    }
}

fn set_dialog_visible(document: &Document, visible: bool) -> Result<(), JsValue> {
    if let Some(element) = document.get_element_by_id(GAME_OVER_DIALOG_ID) {
        let element: HtmlElement = element.dyn_into()?;
        let display = if visible { "block" } else { "none" };
        element.style().set_property("display", display)?;
    }
    Ok(())
}

/// Starts a game on the current page. Expects the `boardView` and
/// `nextFigureView` canvases; `settings` may override the starting gravity
/// delay and the player name, and an empty object means defaults.
#[wasm_bindgen(js_name = startGame)]
pub fn start_game(settings: JsValue) -> Result<(), JsValue> {
    let settings: GameSettings = from_value(settings).unwrap_or_default();
    let window = window()?;
    let document = document(&window)?;
    let storage = local_storage(&window)?;

    let player = settings
        .player
        .clone()
        .or_else(|| storage.get_item(PLAYER_NAME_KEY).ok().flatten())
        .unwrap_or_else(|| DEFAULT_PLAYER.to_string());
    set_text(
        &document,
        PLAYER_READOUT_ID,
        &format!("Player's name: {player}"),
    );
    set_text(&document, SCORE_READOUT_ID, "Score: 0");
    set_dialog_visible(&document, false)?;

    let preview = Preview::new(Box::new(CanvasPainter::for_canvas(
        &document,
        NEXT_FIGURE_VIEW_ID,
    )?));
    let board = Board::new(
        Box::new(CanvasPainter::for_canvas(&document, BOARD_VIEW_ID)?),
        preview,
        settings.start_delay_ms,
    );
    let scoreboard = load_scores(&storage);

    let tick = Closure::wrap(Box::new(|| {
        with_session(advance);
    }) as Box<dyn FnMut()>);
    let keydown = Closure::wrap(Box::new(handle_keydown) as Box<dyn FnMut(KeyboardEvent)>);

    document.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
    let timer_id = window.set_interval_with_callback_and_timeout_and_arguments_0(
        tick.as_ref().unchecked_ref(),
        settings.start_delay_ms as i32,
    )?;

    log(&format!(
        "game started for {player:?} at {} ms gravity",
        settings.start_delay_ms
    ));
    let session = Session {
        board,
        scoreboard,
        player,
        timer_id,
        tick,
        keydown,
        over: false,
    };
    SESSION.with(|cell| {
        if let Some(old) = cell.borrow_mut().replace(session) {
            // a restart must not leak the previous timer or listener
            if !old.over {
                window.clear_interval_with_handle(old.timer_id);
                let _ = document.remove_event_listener_with_callback(
                    "keydown",
                    old.keydown.as_ref().unchecked_ref(),
                );
            }
        }
    });
    Ok(())
}

fn handle_keydown(event: KeyboardEvent) {
    with_session(|session| {
        if session.over {
            return;
        }
        match event.key().as_str() {
            "ArrowLeft" => {
                event.prevent_default();
                session.board.move_left();
            }
            "ArrowRight" => {
                event.prevent_default();
                session.board.move_right();
            }
            "ArrowUp" => {
                event.prevent_default();
                session.board.rotate();
            }
            "ArrowDown" => {
                event.prevent_default();
                advance(session);
            }
            _ => {}
        }
    });
}

/// One gravity step, shared by the timer and the down-arrow key.
fn advance(session: &mut Session) {
    if session.over {
        return;
    }
    match session.board.move_down() {
        StepOutcome::Moved => {}
        StepOutcome::Locked { rows_cleared } => {
            if rows_cleared > 0 {
                if let Err(err) = apply_row_clears(session) {
                    log(&format!("failed to apply row clears: {err:?}"));
                }
            }
        }
        StepOutcome::GameOver => {
            if let Err(err) = finish(session) {
                log(&format!("failed to finish the game: {err:?}"));
            }
        }
    }
}

/// Refreshes the score readout and restarts the gravity timer at the
/// board's current (possibly shortened) delay.
fn apply_row_clears(session: &mut Session) -> Result<(), JsValue> {
    let window = window()?;
    let document = document(&window)?;
    set_text(
        &document,
        SCORE_READOUT_ID,
        &format!("Score: {}", session.board.score()),
    );
    window.clear_interval_with_handle(session.timer_id);
    session.timer_id = window.set_interval_with_callback_and_timeout_and_arguments_0(
        session.tick.as_ref().unchecked_ref(),
        session.board.delay_ms() as i32,
    )?;
    Ok(())
}

/// Ends the game: stops the timer, detaches input so nothing can mutate the
/// board afterwards, ranks and persists the final score together with the
/// one-shot highlight marker, and reveals the game-over notice.
fn finish(session: &mut Session) -> Result<(), JsValue> {
    session.over = true;
    let window = window()?;
    let document = document(&window)?;
    window.clear_interval_with_handle(session.timer_id);
    document.remove_event_listener_with_callback(
        "keydown",
        session.keydown.as_ref().unchecked_ref(),
    )?;

    let entry = ScoreEntry {
        player: session.player.clone(),
        score: session.board.score(),
    };
    let index = ranked_insert(&mut session.scoreboard, entry);

    let storage = local_storage(&window)?;
    storage.set_item(NEW_SCORE_INDEX_KEY, &index.to_string())?;
    store_scores(&storage, &session.scoreboard)?;

    set_dialog_visible(&document, true)?;
    log(&format!("game over, final score {}", session.board.score()));
    Ok(())
}

/// Fills the table on the scores page and highlights the row recorded by
/// the game that just ended, consuming the marker so a reload shows a plain
/// table.
#[wasm_bindgen(js_name = renderScoreTable)]
pub fn render_score_table() -> Result<(), JsValue> {
    let window = window()?;
    let document = document(&window)?;
    let storage = local_storage(&window)?;

    let scores = load_scores(&storage);
    let new_index = storage
        .get_item(NEW_SCORE_INDEX_KEY)?
        .and_then(|raw| raw.parse::<usize>().ok());
    storage.remove_item(NEW_SCORE_INDEX_KEY)?;

    let body = document
        .get_element_by_id(SCORES_BODY_ID)
        .ok_or_else(|| JsValue::from_str("missing score table body"))?;
    for (i, entry) in scores.iter().enumerate() {
        let row = document.create_element("tr")?;
        if Some(i) == new_index {
            row.set_class_name(NEW_SCORE_CLASS);
        }
        let player_cell = document.create_element("td")?;
        player_cell.set_text_content(Some(&entry.player));
        row.append_child(&player_cell)?;
        let score_cell = document.create_element("td")?;
        score_cell.set_text_content(Some(&entry.score.to_string()));
        row.append_child(&score_cell)?;
        body.append_child(&row)?;
    }
    Ok(())
}

/// Serializes the score table and triggers a download of
/// `tetris-scores.json` through a temporary object-URL anchor.
#[wasm_bindgen(js_name = exportScores)]
pub fn export_scores() -> Result<(), JsValue> {
    let window = window()?;
    let document = document(&window)?;
    let storage = local_storage(&window)?;

    let scores = load_scores(&storage);
    let raw = serde_json::to_string(&scores).map_err(|err| JsValue::from_str(&err.to_string()))?;

    let parts = js_sys::Array::of1(&JsValue::from_str(&raw));
    let options = BlobPropertyBag::new();
    options.set_type("application/json");
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(EXPORT_FILE_NAME);
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("document has no body"))?;
    body.append_child(&anchor)?;
    anchor.click();
    body.remove_child(&anchor)?;
    Url::revoke_object_url(&url)?;
    Ok(())
}

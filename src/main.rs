use std::{cell::Cell, rc::Rc};

use log::{info, warn};
use mq::{
    prelude::{
        clear_background, draw_circle, draw_rectangle, draw_text, is_mouse_button_pressed,
        mouse_position, next_frame, Color, MouseButton, DARKGRAY,
    },
    window::Conf,
};
use squares::{
    board::{self, Board, BLACK_SQUARE_CLASS},
    Config, EventBinder, SqResult, SquarePos,
};
use zdom::{Document, Event, EventKind, HandlerResult};

const CONFIG_PATH: &str = "assets/config.ron";
const CELL_SIZE: f32 = 64.0;
const BOARD_OFFSET: f32 = 32.0;

const COLOR_BG: Color = Color::new(0.9, 0.9, 0.8, 1.0);
const COLOR_BLACK_SQUARE: Color = Color::new(0.45, 0.35, 0.3, 1.0);
const COLOR_WHITE_SQUARE: Color = Color::new(0.85, 0.8, 0.7, 1.0);
const COLOR_MARKER: Color = Color::new(0.2, 0.2, 0.2, 0.8);

fn css_to_mq(c: zdom::Color) -> Color {
    Color::new(
        c.r as f32 / 255.0,
        c.g as f32 / 255.0,
        c.b as f32 / 255.0,
        c.a,
    )
}

/// The host side of the page: everything the binder expects to find.
struct Demo {
    doc: Document,
    board: Board,
    binder: EventBinder,
    hovered: Option<SquarePos>,
    needs_rerender: Rc<Cell<bool>>,
}

impl Demo {
    fn new(config: Config) -> SqResult<Self> {
        let mut doc = Document::new();
        let root = doc.root();
        let style = doc.create_element("style");
        doc.set_id(style, &config.style_slot_id)?;
        doc.append_child(root, style)?;
        let update = doc.create_element("button");
        doc.set_id(update, &config.update_control_id)?;
        doc.append_child(root, update)?;
        let board = Board::render(&mut doc, root, config.board_size, &config.square_class)?;
        let mut binder = EventBinder::new(&doc, config)?;
        let needs_rerender = Rc::new(Cell::new(false));
        {
            let state = binder.state();
            let needs_rerender = needs_rerender.clone();
            let on_update = Rc::new(move |_: &mut Document, _: &Event| -> HandlerResult {
                info!("update: click_pos={:?}", state.borrow().click_pos());
                needs_rerender.set(true);
                Ok(())
            });
            doc.add_event_listener(update, EventKind::Click, on_update)?;
        }
        binder.bind_all(&mut doc)?;
        let mut demo = Self {
            doc,
            board,
            binder,
            hovered: None,
            needs_rerender,
        };
        demo.place_markers()?;
        Ok(demo)
    }

    /// Two rows of markers, each pointing at the two squares in front of it.
    fn place_markers(&mut self) -> SqResult {
        let size = self.board.size();
        if size < 4 {
            return Ok(());
        }
        for col in 0..size {
            let near = [SquarePos::new(2, col), SquarePos::new(3, col)];
            self.board
                .add_marker(&mut self.doc, SquarePos::new(1, col), &near)?;
            let far = [SquarePos::new(size - 3, col), SquarePos::new(size - 4, col)];
            self.board
                .add_marker(&mut self.doc, SquarePos::new(size - 2, col), &far)?;
        }
        Ok(())
    }

    fn mouse_pos(&self) -> Option<SquarePos> {
        let (x, y) = mouse_position();
        self.board
            .pos_at(x - BOARD_OFFSET, y - BOARD_OFFSET, CELL_SIZE)
    }

    fn update(&mut self) -> SqResult {
        let pos = self.mouse_pos();
        if pos != self.hovered {
            self.hovered = pos;
            if let Some(square) = pos.and_then(|pos| self.board.square(&self.doc, pos)) {
                if let Err(err) = self.doc.mouse_over(square) {
                    warn!("hover: {}", err);
                }
            }
        }
        if is_mouse_button_pressed(MouseButton::Left) {
            if let Some(square) = pos.and_then(|pos| self.board.square(&self.doc, pos)) {
                if let Err(err) = self.doc.click(square) {
                    warn!("click: {}", err);
                }
            }
        }
        if self.needs_rerender.replace(false) {
            self.board.rerender(&mut self.doc)?;
            self.binder.bind_all(&mut self.doc)?;
        }
        Ok(())
    }

    fn draw(&self) {
        clear_background(COLOR_BG);
        for pos in board::positions(self.board.size()) {
            let square = match self.board.square(&self.doc, pos) {
                Some(square) => square,
                None => continue,
            };
            let x = BOARD_OFFSET + pos.col as f32 * CELL_SIZE;
            let y = BOARD_OFFSET + pos.row as f32 * CELL_SIZE;
            let color = if self.doc.has_class(square, BLACK_SQUARE_CLASS) {
                COLOR_BLACK_SQUARE
            } else {
                COLOR_WHITE_SQUARE
            };
            draw_rectangle(x, y, CELL_SIZE, CELL_SIZE, color);
            let half = CELL_SIZE / 2.0;
            for marker in self.board.markers_at(&self.doc, pos) {
                let color = self
                    .doc
                    .background_of(marker)
                    .map(css_to_mq)
                    .unwrap_or(COLOR_MARKER);
                draw_circle(x + half, y + half, half * 0.6, color);
            }
        }
        let state = self.binder.state();
        let text = match state.borrow().click_pos() {
            Some(id) => format!("selected: {}", id),
            None => "selected: -".to_string(),
        };
        let text_y = BOARD_OFFSET * 1.5 + self.board.size() as f32 * CELL_SIZE;
        draw_text(&text, BOARD_OFFSET, text_y, 24.0, DARKGRAY);
    }
}

fn load_config() -> Config {
    match Config::load(CONFIG_PATH) {
        Ok(config) => config,
        Err(err) => {
            warn!("{}, using the default config", err);
            Config::default()
        }
    }
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Squares".to_owned(),
        window_width: 576,
        window_height: 640,
        ..Default::default()
    }
}

async fn run() -> SqResult {
    let mut demo = Demo::new(load_config())?;
    loop {
        demo.update()?;
        demo.draw();
        next_frame().await;
    }
}

#[mq::main(window_conf)]
#[macroquad(crate_rename = "mq")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run().await {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

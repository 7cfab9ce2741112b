use macroquad::prelude::*;
use tracing::{error, info};

use snakeq::agent::{Agent, AgentConfig, TrainingConfig};
use snakeq::approximator::{DEFAULT_HIDDEN, DEFAULT_LEARNING_RATE};
use snakeq::game::{tick_interval, Board, Vector, FEATURES};
use snakeq::player::Autopilot;
use snakeq::sequential::Sequential;

const SCORE_AREA_HEIGHT: f32 = 60.0;
const SCORE_TEXT_SIZE: f32 = 40.0;
const CELL_SIZE: i32 = 30;
const GAME_COLS: i32 = 27; // cells
const GAME_ROWS: i32 = 21; // cells
const AGENT_TICK_SPEED: f32 = 0.05; // seconds

// shorter than the headless run so the window opens quickly
const WARMUP: TrainingConfig = TrainingConfig {
    episodes: 30,
    games_per_episode: 20,
    move_budget: 2_000,
    batch_size: 32,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Human,
    Autopilot,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "snakeq".to_owned(),
        window_width: GAME_COLS*CELL_SIZE,
        window_height: (SCORE_AREA_HEIGHT as i32) + GAME_ROWS*CELL_SIZE,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt::init();

    clear_background(LIGHTGRAY);
    draw_centered("Training agent...", screen_height() / 2.0, 40.0, BLACK);
    next_frame().await;

    let mut board = Board::new_game(GAME_ROWS, GAME_COLS);
    let q = Sequential::value_network(FEATURES, &DEFAULT_HIDDEN, DEFAULT_LEARNING_RATE, &mut ::rand::rng());
    let mut agent = Agent::new(q, AgentConfig::default());
    match agent.train(&mut board, &WARMUP) {
        Ok(report) => info!(max_score = report.max_score, "agent ready"),
        Err(aborted) => error!("{}; playing with a partially trained agent", aborted),
    }

    let mut screen = Screen::Menu;
    let mut pilot = Autopilot::new();
    let mut time_accumulator: f32 = 0.0; // seconds

    loop {
        clear_background(LIGHTGRAY);

        match screen {
            Screen::Menu => {
                if let Some(choice) = draw_menu() {
                    board.reset();
                    time_accumulator = 0.0;
                    screen = choice;
                }
            }
            Screen::Human => {
                if board.game_over() {
                    info!(score = board.score(), "game over");
                    screen = Screen::Menu;
                } else {
                    handle_key_inputs(&mut board);

                    time_accumulator += get_frame_time();
                    let interval = tick_interval(board.score()).as_secs_f32();
                    while time_accumulator >= interval {
                        time_accumulator -= interval;
                        board.tick();
                    }

                    draw(&board, &format!("Score: {}", board.score()));
                }
            }
            Screen::Autopilot => {
                if is_key_pressed(KeyCode::Escape) {
                    screen = Screen::Menu;
                } else {
                    time_accumulator += get_frame_time();
                    while time_accumulator >= AGENT_TICK_SPEED {
                        time_accumulator -= AGENT_TICK_SPEED;
                        if let Err(e) = pilot.step(&mut board, &mut agent) {
                            error!("agent failed: {}", e);
                            screen = Screen::Menu;
                            break;
                        }
                    }

                    let text = format!("Score: {}  Best: {}", board.score(), pilot.high_score().max(board.score()));
                    draw(&board, &text);
                }
            }
        }

        next_frame().await
    }
}

fn draw_centered(text: &str, y: f32, size: f32, color: Color) {
    let dims = measure_text(text, None, size as u16, 1.0);
    draw_text(text, screen_width() / 2.0 - dims.width / 2.0, y, size, color);
}

fn draw(board: &Board, score_text: &str) {
    let screen_w = screen_width();
    let screen_h = screen_height();


    // score area

    let score_area = Rect::new(0.0, 0.0, screen_w, SCORE_AREA_HEIGHT);

    draw_rectangle(
        score_area.x,
        score_area.y,
        score_area.w,
        score_area.h,
        Color::new(0.1, 0.1, 0.2, 1.0),
    );
    draw_line(score_area.x, score_area.h, screen_w, score_area.h, 2.0, BLACK);

    let text_dims = measure_text(score_text, None, SCORE_TEXT_SIZE as u16, 1.0);
    draw_text(
        score_text,
        score_area.w / 2.0 - text_dims.width / 2.0,
        score_area.y + score_area.h / 2.0 + text_dims.height / 2.0,
        SCORE_TEXT_SIZE,
        WHITE,
    );


    // game area

    let game_area = Rect::new(0.0, score_area.h, screen_w, screen_h - score_area.h);

    let cell_width = game_area.w / board.cols() as f32;
    let cell_height = game_area.h / board.rows() as f32;
    let grid_line_color = Color::new(0.4, 0.4, 0.4, 0.3);

    for i in 1..board.cols() {
        let x = game_area.x + i as f32 * cell_width;
        draw_line(x, game_area.y, x, game_area.y + game_area.h, 1.0, grid_line_color);
    }

    for i in 1..board.rows() {
        let y = game_area.y + i as f32 * cell_height;
        draw_line(game_area.x, y, game_area.x + game_area.w, y, 1.0, grid_line_color);
    }

    let draw_cell = |row: i32, col: i32, border: Color, fill: Color| {
        let cell_fill_border: f32 = 2.0;
        let x = game_area.x + col as f32 * cell_width;
        let y = game_area.y + row as f32 * cell_height;
        draw_rectangle(x, y, cell_width-1.0, cell_height-1.0, border);
        draw_rectangle(
            x + cell_fill_border,
            y + cell_fill_border,
            (cell_width-1.0) - cell_fill_border*2.0,
            (cell_height-1.0) - cell_fill_border*2.0,
            fill,
        );
    };

    let food = board.food();
    draw_cell(food.row, food.col, Color::new(0.5, 0.0, 0.0, 1.0), RED);

    // a dead head sits outside the grid
    for segment in board.snake().body() {
        if !board.out_of_bounds(segment.row, segment.col) {
            draw_cell(segment.row, segment.col, DARKGREEN, GREEN);
        }
    }
}

struct Button {
    rect: Rect,
    text: &'static str,
}

impl Button {
    fn new(x: f32, y: f32, w: f32, h: f32, text: &'static str) -> Self {
        Self {
            rect: Rect::new(x, y, w, h),
            text,
        }
    }

    fn draw_and_check_click(&self) -> bool {
        let mouse_pos = mouse_position();
        let mouse_over = self.rect.contains(vec2(mouse_pos.0, mouse_pos.1));

        let color = if mouse_over {
            Color::from_rgba(100, 100, 120, 255)
        } else {
            Color::from_rgba(80, 80, 100, 255)
        };

        draw_rectangle(self.rect.x, self.rect.y, self.rect.w, self.rect.h, color);
        let text_dims = measure_text(self.text, None, 30, 1.0);
        let text_x = self.rect.x + (self.rect.w - text_dims.width) / 2.0;
        let text_y = self.rect.y + (self.rect.h - text_dims.height) / 2.0 + text_dims.offset_y;
        draw_text(self.text, text_x, text_y, 30.0, WHITE);
        mouse_over && is_mouse_button_pressed(MouseButton::Left)
    }
}

fn draw_menu() -> Option<Screen> {
    let center_x = screen_width() / 2.0;
    let center_y = screen_height() / 2.0;
    let button_width = 250.0;
    let button_height = 60.0;
    let spacing = 20.0;

    let human_button = Button::new(
        center_x - button_width / 2.0,
        center_y - button_height - spacing / 2.0,
        button_width,
        button_height,
        "Human Player"
    );

    let agent_button = Button::new(
        center_x - button_width / 2.0,
        center_y + spacing / 2.0,
        button_width,
        button_height,
        "Q-Learning Agent"
    );

    draw_centered("Select Player", center_y - 100.0, 50.0, BLACK);

    if human_button.draw_and_check_click() {
        return Some(Screen::Human);
    }
    if agent_button.draw_and_check_click() {
        return Some(Screen::Autopilot);
    }
    None
}

fn handle_key_inputs(board: &mut Board) {
    // use WASD or arrow keys for input
    if is_key_pressed(KeyCode::Up) || is_key_pressed(KeyCode::W) {
        board.steer(Vector::NORTH);
    } else if is_key_pressed(KeyCode::Down) || is_key_pressed(KeyCode::S) {
        board.steer(Vector::SOUTH);
    } else if is_key_pressed(KeyCode::Right) || is_key_pressed(KeyCode::D) {
        board.steer(Vector::EAST);
    } else if is_key_pressed(KeyCode::Left) || is_key_pressed(KeyCode::A) {
        board.steer(Vector::WEST);
    }
}

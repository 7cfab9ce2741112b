pub mod snake;

use std::time::Duration;
use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::warn;

pub use snake::{Point, Vector, Snake, CARDINALS, MIN_SNAKE_LEN};

pub const FEATURES: usize = 11;

/// Encoded view of a board: the only thing the approximator ever sees.
pub type FeatureVector = [f32; FEATURES];

pub const SCORING_REWARD: f32 = 100.0;
pub const TERMINAL_REWARD: f32 = -100.0;
pub const CLOSER_REWARD: f32 = 2.0;
pub const FARTHER_REWARD: f32 = -4.0;
pub const NEUTRAL_REWARD: f32 = -1.0;

#[derive(Debug, Clone)]
pub struct Board {
    rows: i32,
    cols: i32,
    snake: Snake,
    food: Point,
    score: u32,
    game_over: bool,
    requested: Option<Vector>, // steered direction, applied on the next tick
    rng: StdRng, // food placement
}

impl Board {
    /// Fresh game with the snake along the top-left edge heading east.
    pub fn new_game(rows: i32, cols: i32) -> Self {
        Self::from_rng(rows, cols, StdRng::from_rng(&mut rand::rng()))
    }

    pub fn seeded(rows: i32, cols: i32, seed: u64) -> Self {
        Self::from_rng(rows, cols, StdRng::seed_from_u64(seed))
    }

    pub fn new(rows: i32, cols: i32, snake: Snake, food: Point) -> Self {
        assert_fits(rows, cols);
        Self {
            rows,
            cols,
            snake,
            food,
            score: 0,
            game_over: false,
            requested: None,
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    fn from_rng(rows: i32, cols: i32, mut rng: StdRng) -> Self {
        assert_fits(rows, cols);
        let snake = Snake::new(
            (0..MIN_SNAKE_LEN as i32).map(|col| Point::new(0, col)).collect(),
            Vector::EAST,
        );
        let food = place_food(rows, cols, &snake, &mut rng);

        Self {
            rows,
            cols,
            snake,
            food,
            score: 0,
            game_over: false,
            requested: None,
            rng,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::from_rng(self.rows, self.cols, self.rng.clone());
    }

    pub fn rows(&self) -> i32 {self.rows}
    pub fn cols(&self) -> i32 {self.cols}
    pub fn snake(&self) -> &Snake {&self.snake}
    pub fn food(&self) -> Point {self.food}
    pub fn score(&self) -> u32 {self.score}
    pub fn game_over(&self) -> bool {self.game_over}
    pub fn head(&self) -> Point {self.snake.head()}
    pub fn direction(&self) -> Vector {self.snake.direction()}

    pub fn next_location(&self, dir: Vector) -> Point {
        self.snake.head() + dir
    }

    // only a step back onto the neck is refused; walls and body are terminal, not invalid
    pub fn move_is_valid(&self, point: Point) -> bool {
        point != self.snake.neck()
    }

    pub fn out_of_bounds(&self, row: i32, col: i32) -> bool {
        row < 0 || col < 0 || row >= self.rows || col >= self.cols
    }

    pub fn move_is_terminal(&self, point: Point) -> bool {
        self.out_of_bounds(point.row, point.col) || self.snake.occupies(point)
    }

    pub fn move_is_scoring(&self, point: Point) -> bool {
        point == self.food
    }

    /// Reward and terminal flag the move would produce, without making it.
    pub fn evaluate_action(&self, dir: Vector) -> (f32, bool) {
        let next = self.next_location(dir);

        if self.move_is_scoring(next) {
            return (SCORING_REWARD, false);
        }
        if self.move_is_terminal(next) {
            return (TERMINAL_REWARD, true);
        }

        let before = self.snake.head().manhattan(self.food);
        let after = next.manhattan(self.food);
        if after < before {
            (CLOSER_REWARD, false)
        } else if after > before {
            (FARTHER_REWARD, false)
        } else {
            (NEUTRAL_REWARD, false)
        }
    }

    pub fn danger_ahead(&self) -> bool {
        self.move_is_terminal(self.next_location(self.snake.direction()))
    }

    pub fn danger_right(&self) -> bool {
        self.move_is_terminal(self.next_location(self.snake.direction().turned_right()))
    }

    pub fn danger_left(&self) -> bool {
        self.move_is_terminal(self.next_location(self.snake.direction().turned_left()))
    }

    // [danger ahead, right, left; heading W, E, N, S; food W, E, N, S]
    pub fn current_state(&self) -> FeatureVector {
        let head = self.snake.head();
        let dir = self.snake.direction();

        let flags = [
            self.danger_ahead(),
            self.danger_right(),
            self.danger_left(),
            dir == Vector::WEST,
            dir == Vector::EAST,
            dir == Vector::NORTH,
            dir == Vector::SOUTH,
            self.food.col < head.col,
            self.food.col > head.col,
            self.food.row < head.row,
            self.food.row > head.row,
        ];

        flags.map(|flag| flag as i32 as f32)
    }

    /// Independent deep copy used for one-ply lookahead.
    pub fn lookahead(&self) -> Board {
        self.clone()
    }

    pub fn next_state(&self, dir: Vector) -> FeatureVector {
        let mut branch = self.lookahead();
        branch.make_move(dir);
        branch.current_state()
    }

    /// Directions the snake may take from here; empty once the game is over.
    pub fn legal_actions(&self) -> Vec<Vector> {
        if self.game_over {
            return Vec::new();
        }
        CARDINALS
            .iter()
            .copied()
            .filter(|&dir| self.move_is_valid(self.next_location(dir)))
            .collect()
    }

    pub fn lookahead_states(&self, actions: &[Vector]) -> Vec<FeatureVector> {
        if self.game_over {
            return Vec::new();
        }
        actions.iter().map(|&dir| self.next_state(dir)).collect()
    }

    /// Programmatic move: turn towards `dir` and advance one tick.
    pub fn make_move(&mut self, dir: Vector) {
        if !self.move_is_valid(self.next_location(dir)) {
            warn!(?dir, heading = ?self.snake.direction(), "invalid move ignored");
            return;
        }

        self.requested = None;
        self.snake.change_direction(dir);
        self.tick();
    }

    /// Keyboard-style direction request; the latest one is checked and applied on the next tick.
    pub fn steer(&mut self, dir: Vector) {
        self.requested = Some(dir);
    }

    pub fn tick(&mut self) {
        if self.game_over {
            return;
        }

        if let Some(dir) = self.requested.take() {
            if self.move_is_valid(self.next_location(dir)) {
                self.snake.change_direction(dir);
            } else {
                warn!(?dir, heading = ?self.snake.direction(), "invalid steer ignored");
            }
        }

        self.snake.advance();
        let head = self.snake.head();

        if self.out_of_bounds(head.row, head.col) || self.snake.head_hits_body() {
            self.game_over = true;
            return;
        }

        if head == self.food {
            self.snake.grow();
            self.food = place_food(self.rows, self.cols, &self.snake, &mut self.rng);
            self.score += 1;
        }
    }
}

fn assert_fits(rows: i32, cols: i32) {
    assert!(
        rows >= 1 && cols > MIN_SNAKE_LEN as i32,
        "board {}x{} cannot hold the starting snake",
        rows,
        cols
    );
}

// uniform over free cells by rejection
fn place_food<R: Rng>(rows: i32, cols: i32, snake: &Snake, rng: &mut R) -> Point {
    assert!(
        snake.len() < (rows * cols) as usize,
        "no free cell left for food"
    );
    loop {
        let point = Point::new(rng.random_range(0..rows), rng.random_range(0..cols));
        if !snake.occupies(point) {
            return point;
        }
    }
}

/// Live-play tick length; the game speeds up as the score grows.
pub fn tick_interval(score: u32) -> Duration {
    if score > 20 {
        Duration::from_millis(100)
    } else if score > 10 {
        Duration::from_millis(125)
    } else {
        Duration::from_millis(150)
    }
}

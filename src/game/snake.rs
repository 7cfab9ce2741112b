use std::ops::{Add, Neg};

pub const MIN_SNAKE_LEN: usize = 4;

/// A cell on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub row: i32,
    pub col: i32,
}

impl Point {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn manhattan(&self, other: Point) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }
}

/// Unit displacement on the grid. The four cardinals double as the agent's actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vector {
    pub row: i32,
    pub col: i32,
}

impl Vector {
    pub const NORTH: Vector = Vector { row: -1, col: 0 };
    pub const SOUTH: Vector = Vector { row: 1, col: 0 };
    pub const EAST: Vector = Vector { row: 0, col: 1 };
    pub const WEST: Vector = Vector { row: 0, col: -1 };

    // clockwise quarter turn: N -> E -> S -> W
    pub fn turned_right(&self) -> Vector {
        Vector { row: self.col, col: -self.row }
    }

    pub fn turned_left(&self) -> Vector {
        Vector { row: -self.col, col: self.row }
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector { row: -self.row, col: -self.col }
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    fn add(self, dir: Vector) -> Point {
        Point { row: self.row + dir.row, col: self.col + dir.col }
    }
}

/// Candidate actions, in the order the agent scores them.
pub const CARDINALS: [Vector; 4] = [Vector::EAST, Vector::NORTH, Vector::SOUTH, Vector::WEST];

#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    body: Vec<Point>, // tail first, head last
    direction: Vector,
    just_ate: bool,
}

impl Snake {
    pub fn new(body: Vec<Point>, direction: Vector) -> Self {
        assert!(
            body.len() >= MIN_SNAKE_LEN,
            "snake needs at least {} segments, got {}",
            MIN_SNAKE_LEN,
            body.len()
        );
        Self {
            body,
            direction,
            just_ate: false,
        }
    }

    pub fn body(&self) -> &[Point] {&self.body}
    pub fn direction(&self) -> Vector {self.direction}
    pub fn just_ate(&self) -> bool {self.just_ate}
    pub fn len(&self) -> usize {self.body.len()}

    pub fn head(&self) -> Point {
        self.body[self.body.len() - 1]
    }

    pub fn neck(&self) -> Point {
        self.body[self.body.len() - 2]
    }

    pub fn change_direction(&mut self, new_direction: Vector) {
        if new_direction == self.direction || new_direction == -self.direction {
            return;
        }
        self.direction = new_direction;
    }

    pub fn advance(&mut self) {
        let new_head = self.head() + self.direction;
        self.body.push(new_head);

        if self.just_ate {
            self.just_ate = false;
        } else {
            self.body.remove(0);
        }
    }

    pub fn grow(&mut self) {
        self.just_ate = true;
    }

    pub fn occupies(&self, point: Point) -> bool {
        self.body.contains(&point)
    }

    pub fn head_hits_body(&self) -> bool {
        let head = self.head();
        self.body[..self.body.len() - 1].contains(&head)
    }
}

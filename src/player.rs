use tracing::info;

use crate::agent::Agent;
use crate::approximator::{ApproximatorError, QFunction};
use crate::cycle::{detect_cycle, CYCLE_WINDOW};
use crate::game::{Board, Point, Vector};

/// Drives a live board with a trained agent, resetting games that die or loop.
#[derive(Debug, Default)]
pub struct Autopilot {
    visited: Vec<Point>,
    high_score: u32,
    resets: usize,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn high_score(&self) -> u32 {self.high_score}
    pub fn resets(&self) -> usize {self.resets}
    pub fn visited(&self) -> &[Point] {&self.visited}

    /// One live tick: housekeeping, then the agent's move.
    pub fn step<Q: QFunction>(&mut self, board: &mut Board, agent: &mut Agent<Q>) -> Result<Vector, ApproximatorError> {
        if board.game_over() {
            self.restart(board);
            self.visited.clear();
        }

        if self.visited.len() >= CYCLE_WINDOW {
            if let Some(cycle) = detect_cycle(&self.visited) {
                info!(start = cycle.start, period = cycle.period, "agent is looping");
                self.restart(board);
            }
            self.visited.clear();
        }

        let action = agent.best_move(board)?;

        // a head that did not move is not a new visit
        let head = board.head();
        if self.visited.last() != Some(&head) {
            self.visited.push(head);
        }

        board.make_move(action);
        Ok(action)
    }

    /// Records the score of the finished game and starts a new one.
    pub fn restart(&mut self, board: &mut Board) {
        self.high_score = self.high_score.max(board.score());
        info!(score = board.score(), high_score = self.high_score, "resetting game");
        board.reset();
        self.resets += 1;
    }
}

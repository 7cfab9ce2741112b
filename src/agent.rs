pub mod memory;

use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::approximator::{ApproximatorError, QFunction};
use crate::game::{Board, Vector, SCORING_REWARD, TERMINAL_REWARD};
use memory::{ExperienceMemory, Memory};

/// Learning hyperparameters, fixed for the lifetime of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub gamma: f32,         // discount
    pub epsilon: f32,       // starting exploration probability
    pub epsilon_min: f32,
    pub epsilon_decay: f32, // multiplicative, per replayed sample
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            gamma: 0.95,
            epsilon: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub episodes: usize,
    pub games_per_episode: usize,
    pub move_budget: usize, // per game; a game that runs longer is cut off
    pub batch_size: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 100,
            games_per_episode: 50,
            move_budget: 10_000,
            batch_size: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeStats {
    pub episode: usize,
    pub games: usize,
    pub moves: usize,
    pub max_score: u32,
    pub total_reward: f32,
    pub epsilon: f32,
    pub memories: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub episodes: Vec<EpisodeStats>,
    pub max_score: u32,
}

/// A training run stopped by an approximator failure; `report` holds the finished episodes.
#[derive(Error, Debug)]
#[error("training aborted in episode {episode}: {source}")]
pub struct TrainingAborted {
    pub episode: usize,
    pub report: TrainingReport,
    #[source]
    pub source: ApproximatorError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Training,
}

pub struct Agent<Q: QFunction> {
    q: Q,
    memory: ExperienceMemory,
    config: AgentConfig,
    epsilon: f32,
    mode: Mode,
    rng: StdRng, // tie-breaks and replay sampling
}

impl<Q: QFunction> Agent<Q> {
    pub fn new(q: Q, config: AgentConfig) -> Self {
        Self {
            q,
            memory: ExperienceMemory::new(),
            config,
            epsilon: config.epsilon,
            mode: Mode::Idle,
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &AgentConfig {&self.config}
    pub fn epsilon(&self) -> f32 {self.epsilon}
    pub fn mode(&self) -> Mode {self.mode}
    pub fn memory(&self) -> &ExperienceMemory {&self.memory}
    pub fn q(&self) -> &Q {&self.q}

    /// Picks among `candidates` by scoring the state each one leads to.
    ///
    /// Outside training, moves that are certainly fatal are dropped (unless all are)
    /// and a move that eats is taken without consulting the approximator.
    /// A non-finite score is an approximator failure.
    ///
    /// # Panics
    /// If `candidates` is empty.
    pub fn best_action(&mut self, board: &Board, candidates: &[Vector]) -> Result<Vector, ApproximatorError> {
        assert!(!candidates.is_empty(), "best_action called with no candidate actions");

        let training = self.mode == Mode::Training;
        let mut moves = candidates.to_vec();
        if !training {
            let safe: Vec<Vector> = moves
                .iter()
                .copied()
                .filter(|&action| board.evaluate_action(action).0 != TERMINAL_REWARD)
                .collect();
            if !safe.is_empty() {
                moves = safe;
            }
        }

        let mut best_actions: Vec<Vector> = Vec::with_capacity(moves.len());
        let mut best_score = f32::NEG_INFINITY;
        for &action in &moves {
            if !training && board.evaluate_action(action).0 == SCORING_REWARD {
                return Ok(action);
            }

            let score = self.q.predict(&board.next_state(action))?;
            if !score.is_finite() {
                return Err(ApproximatorError::NonFiniteOutput);
            }
            if score > best_score {
                best_score = score;
                best_actions.clear();
                best_actions.push(action);
            } else if score == best_score {
                best_actions.push(action);
            }
        }

        if best_actions.len() > 1 && self.rng.random::<f32>() < self.epsilon {
            return Ok(best_actions[self.rng.random_range(0..best_actions.len())]);
        }
        Ok(best_actions[0])
    }

    /// Move for the live board; keeps the current heading once the game is over.
    ///
    /// # Panics
    /// If a running game offers no legal move.
    pub fn best_move(&mut self, board: &Board) -> Result<Vector, ApproximatorError> {
        let moves = board.legal_actions();
        if moves.is_empty() {
            assert!(board.game_over(), "no legal moves on a running board");
            debug!("terminal state reached, defaulting to current heading");
            return Ok(board.direction());
        }
        self.best_action(board, &moves)
    }

    pub fn train(&mut self, board: &mut Board, config: &TrainingConfig) -> Result<TrainingReport, TrainingAborted> {
        self.mode = Mode::Training;
        let outcome = self.run_episodes(board, config);
        self.mode = Mode::Idle;
        board.reset();

        if let Ok(report) = &outcome {
            info!(max_score = report.max_score, memories = self.memory.len(), "training complete");
        }
        outcome
    }

    fn run_episodes(&mut self, board: &mut Board, config: &TrainingConfig) -> Result<TrainingReport, TrainingAborted> {
        let mut report = TrainingReport::default();

        for episode in 0..config.episodes {
            let mut games = 0;
            let mut moves = 0;
            let mut moves_in_game = 0;
            let mut total_reward = 0.0;
            let mut episode_max = 0;

            while games < config.games_per_episode {
                if moves_in_game >= config.move_budget {
                    debug!(moves_in_game, score = board.score(), "move budget exhausted, forcing reset");
                    episode_max = episode_max.max(board.score());
                    board.reset();
                    games += 1;
                    moves_in_game = 0;
                    continue;
                }

                let state = board.current_state();
                let actions = board.legal_actions();
                if actions.is_empty() {
                    episode_max = episode_max.max(board.score());
                    board.reset();
                    games += 1;
                    moves_in_game = 0;
                    continue;
                }

                let action = match self.best_action(board, &actions) {
                    Ok(action) => action,
                    Err(source) => return Err(TrainingAborted { episode, report, source }),
                };
                let (reward, done) = board.evaluate_action(action);
                total_reward += reward;

                board.make_move(action);
                moves += 1;
                moves_in_game += 1;

                let next_actions = board.lookahead_states(&board.legal_actions());
                self.memory.add(Memory {
                    state,
                    action,
                    reward,
                    next_state: board.current_state(),
                    next_actions,
                    done,
                });

                if done || board.game_over() {
                    episode_max = episode_max.max(board.score());
                    board.reset();
                    games += 1;
                    moves_in_game = 0;
                }
            }

            if let Err(source) = self.replay(config.batch_size) {
                return Err(TrainingAborted { episode, report, source });
            }

            report.max_score = report.max_score.max(episode_max);
            info!(
                episode,
                games,
                moves,
                episode_max,
                max_score = report.max_score,
                epsilon = self.epsilon,
                "episode finished"
            );
            report.episodes.push(EpisodeStats {
                episode,
                games,
                moves,
                max_score: episode_max,
                total_reward,
                epsilon: self.epsilon,
                memories: self.memory.len(),
            });
        }

        Ok(report)
    }

    /// Learns from up to `batch_size` remembered transitions.
    ///
    /// An approximator error stops the pass; updates already applied stay applied.
    pub fn replay(&mut self, batch_size: usize) -> Result<(), ApproximatorError> {
        let indices = self.memory.sample_indices(batch_size, &mut self.rng);
        let (mut scoring, mut terminal) = (0, 0);

        for &idx in &indices {
            let memory = &self.memory[idx];
            if memory.reward == SCORING_REWARD {
                scoring += 1;
            } else if memory.reward == TERMINAL_REWARD {
                terminal += 1;
            }

            let target = if memory.done || memory.next_actions.is_empty() {
                memory.reward
            } else {
                let mut best_next = f32::NEG_INFINITY;
                for next in &memory.next_actions {
                    best_next = best_next.max(self.q.predict(next)?);
                }
                memory.reward + self.config.gamma * best_next
            };

            self.q.update(&[(memory.state, target)])?;
            self.decay_epsilon();
        }

        debug!(samples = indices.len(), scoring, terminal, epsilon = self.epsilon, "replay pass");
        Ok(())
    }

    fn decay_epsilon(&mut self) {
        if self.epsilon > self.config.epsilon_min {
            self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
        }
    }
}

use std::ops::Index;
use rand::Rng;

use crate::game::{FeatureVector, Vector};

/// One observed transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Memory {
    pub state: FeatureVector,
    pub action: Vector,
    pub reward: f32,
    pub next_state: FeatureVector,
    pub next_actions: Vec<FeatureVector>, // lookahead states of every move legal after this one
    pub done: bool,
}

/// Append-only log of transitions for the lifetime of a training run.
#[derive(Debug, Default)]
pub struct ExperienceMemory {
    memories: Vec<Memory>,
}

impl ExperienceMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, memory: Memory) {
        self.memories.push(memory);
    }

    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Memory> {
        self.memories.iter()
    }

    // min(batch_size, len) distinct indices, uniformly without replacement
    pub fn sample_indices<R: Rng>(&self, batch_size: usize, rng: &mut R) -> Vec<usize> {
        let amount = batch_size.min(self.memories.len());
        rand::seq::index::sample(rng, self.memories.len(), amount).into_vec()
    }
}

impl Index<usize> for ExperienceMemory {
    type Output = Memory;

    fn index(&self, index: usize) -> &Memory {
        &self.memories[index]
    }
}

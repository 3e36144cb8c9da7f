//! Real-Time Dynamic Programming.
//!
//! Training runs simulated episodes from the initial state. Every state the
//! agent stands on gets one Bellman backup before it acts, so only states
//! that trajectories actually reach are ever updated.

use crate::{config::RtdpConfig, value_table::ValueTable};
use log::info;
use planner_core::{Heuristic, Mdp, PlanningError, Result, DEFAULT_SEED};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Outcome of one training episode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Zero-based episode index.
    pub episode: usize,
    pub steps: usize,
    /// Undiscounted reward collected.
    pub total_reward: f64,
    /// Exploration rate used throughout the episode.
    pub epsilon: f64,
}

/// RTDP planner with an epsilon-greedy behaviour policy.
///
/// Generic over:
/// - `M`: The environment model
/// - `R`: The random number generator, shared by action choice and sampling
pub struct Rtdp<M: Mdp, R = ChaCha8Rng> {
    mdp: M,
    config: RtdpConfig,
    rng: R,
    heuristic: Option<Heuristic<M::State>>,
    values: ValueTable<M::State>,
}

impl<M: Mdp> Rtdp<M> {
    /// Create a planner with the default fixed-seed random source.
    pub fn new(mdp: M, config: RtdpConfig) -> Self {
        Self::with_rng(mdp, config, ChaCha8Rng::seed_from_u64(DEFAULT_SEED))
    }
}

impl<M, R> Rtdp<M, R>
where
    M: Mdp,
    R: Rng,
{
    /// Create a planner drawing from `rng`.
    pub fn with_rng(mdp: M, config: RtdpConfig, rng: R) -> Self {
        Self {
            mdp,
            config,
            rng,
            heuristic: None,
            values: ValueTable::new(),
        }
    }

    /// Seed unseen states with `heuristic` instead of 0.0.
    ///
    /// Terminal states are never backed up during training, so the
    /// heuristic should return 0.0 for them.
    pub fn with_heuristic(mut self, heuristic: impl Fn(&M::State) -> f64 + 'static) -> Self {
        self.heuristic = Some(Box::new(heuristic));
        self
    }

    pub fn config(&self) -> &RtdpConfig {
        &self.config
    }

    pub fn mdp(&self) -> &M {
        &self.mdp
    }

    /// Read access to the learned values.
    pub fn values(&self) -> &ValueTable<M::State> {
        &self.values
    }

    /// Current estimate for `state`, seeded from the heuristic on first access.
    pub fn value(&mut self, state: &M::State) -> f64 {
        let heuristic = &self.heuristic;
        self.values
            .get_or_insert_with(state, |s| heuristic.as_ref().map_or(0.0, |h| h(s)))
    }

    /// One-step lookahead: sum over outcomes of p * (r + gamma * V(s')).
    fn q_value(&mut self, state: &M::State, action: &M::Action) -> f64 {
        let gamma = self.config.gamma;
        let mut q = 0.0;
        for t in self.mdp.transitions(state, action) {
            q += t.probability * (t.reward + gamma * self.value(&t.next_state));
        }
        q
    }

    fn q_values(&mut self, state: &M::State, actions: &[M::Action]) -> Vec<f64> {
        actions.iter().map(|a| self.q_value(state, a)).collect()
    }

    /// Set `state`'s value to the best one-step lookahead and return it.
    ///
    /// Terminal states and states without actions are absorbing: their value
    /// is set to 0.0.
    pub fn bellman_backup(&mut self, state: &M::State) -> f64 {
        let actions = self.mdp.actions(state);
        let value = if actions.is_empty() || self.mdp.is_terminal(state) {
            0.0
        } else {
            max_of(&self.q_values(state, &actions))
        };

        self.values.set(state.clone(), value);
        value
    }

    /// Epsilon-greedy action choice.
    ///
    /// With probability `epsilon` a uniformly random action, otherwise a
    /// uniformly random one among those whose lookahead Q-value equals the
    /// best or lies within `tie_tolerance` of it.
    ///
    /// # Errors
    /// Returns [`PlanningError::NoActions`] if `state` offers no actions.
    pub fn select_action(&mut self, state: &M::State, epsilon: f64) -> Result<M::Action> {
        let actions = self.mdp.actions(state);
        if actions.is_empty() {
            return Err(PlanningError::NoActions(format!("{state:?}")));
        }

        if self.rng.gen::<f64>() < epsilon {
            let idx = self.rng.gen_range(0..actions.len());
            return Ok(actions[idx].clone());
        }

        let q_values = self.q_values(state, &actions);
        let max_q = max_of(&q_values);
        let tolerance = self.config.tie_tolerance;

        let mut best: Vec<&M::Action> = actions
            .iter()
            .zip(&q_values)
            .filter(|(_, q)| **q == max_q || max_q - **q <= tolerance)
            .map(|(a, _)| a)
            .collect();
        // Every Q-value NaN: nothing compares, fall back to all actions.
        if best.is_empty() {
            best = actions.iter().collect();
        }

        let idx = self.rng.gen_range(0..best.len());
        Ok(best[idx].clone())
    }

    /// Greedy choice under the current values (epsilon = 0).
    pub fn greedy_action(&mut self, state: &M::State) -> Result<M::Action> {
        self.select_action(state, 0.0)
    }

    /// Run the configured number of training episodes.
    ///
    /// # Errors
    /// Fails if a trajectory reaches a non-terminal state without actions, or
    /// the environment reports an empty outcome distribution.
    pub fn run(&mut self) -> Result<Vec<EpisodeSummary>> {
        let mut summaries = Vec::with_capacity(self.config.episodes);
        for episode in 0..self.config.episodes {
            let summary = self.run_episode(episode)?;
            info!(
                "Episode {}: steps={}, total_reward={:.2}",
                episode + 1,
                summary.steps,
                summary.total_reward
            );
            summaries.push(summary);
        }
        Ok(summaries)
    }

    fn run_episode(&mut self, episode: usize) -> Result<EpisodeSummary> {
        let epsilon = self.config.epsilon(episode);
        let mut state = self.mdp.initial_state();
        let mut steps = 0;
        let mut total_reward = 0.0;

        while !self.mdp.is_terminal(&state) && steps < self.config.max_steps {
            self.bellman_backup(&state);
            let action = self.select_action(&state, epsilon)?;
            let (next, reward) = self.mdp.sample(&state, &action, &mut self.rng)?;
            total_reward += reward;
            state = next;
            steps += 1;
        }

        Ok(EpisodeSummary {
            episode,
            steps,
            total_reward,
            epsilon,
        })
    }
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

use crate::{ConfigurationError, Result, Transition};
use rand::Rng;
use std::fmt::Debug;
use std::hash::Hash;

/// A discrete, stochastic Markov Decision Process.
///
/// This is the only view the planners have of an environment. States and
/// actions are opaque: they are hashed, compared and cloned, never inspected.
/// Implementations must be safe to query repeatedly; the planners never
/// mutate them.
pub trait Mdp {
    /// An environment state (e.g. a grid cell)
    type State: Clone + Eq + Hash + Debug;

    /// An action available in some state
    type Action: Clone + Eq + Hash + Debug;

    /// Returns the state every episode starts from
    fn initial_state(&self) -> Self::State;

    /// Returns the actions available in `state`, in a stable order.
    ///
    /// Terminal states usually report none.
    fn actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Returns the outcome distribution of taking `action` in `state`.
    ///
    /// Probabilities are expected to sum to 1. This is not enforced by the
    /// planners.
    fn transitions(
        &self,
        state: &Self::State,
        action: &Self::Action,
    ) -> Vec<Transition<Self::State>>;

    /// Returns true if an episode ends in `state`
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Draws one `(next_state, reward)` outcome of `action` in `state`.
    ///
    /// The default draws from [`Mdp::transitions`]. Environments with a cheap
    /// generative model may override it, as long as the draws follow the same
    /// distribution.
    fn sample<R: Rng + ?Sized>(
        &self,
        state: &Self::State,
        action: &Self::Action,
        rng: &mut R,
    ) -> Result<(Self::State, f64)> {
        sample_next_state_and_reward(self, state, action, rng)
    }
}

impl<M: Mdp + ?Sized> Mdp for &M {
    type State = M::State;
    type Action = M::Action;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn actions(&self, state: &Self::State) -> Vec<Self::Action> {
        (**self).actions(state)
    }

    fn transitions(
        &self,
        state: &Self::State,
        action: &Self::Action,
    ) -> Vec<Transition<Self::State>> {
        (**self).transitions(state, action)
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        (**self).is_terminal(state)
    }

    fn sample<R: Rng + ?Sized>(
        &self,
        state: &Self::State,
        action: &Self::Action,
        rng: &mut R,
    ) -> Result<(Self::State, f64)> {
        (**self).sample(state, action, rng)
    }
}

/// Draw one outcome consistent with the transition distribution of
/// `(state, action)`.
///
/// Inverse-CDF sampling over the transitions in the order the environment
/// reports them. If the probabilities sum to less than 1 the leftover mass
/// falls on the last transition.
///
/// # Errors
/// Returns [`ConfigurationError::EmptyDistribution`] if the environment
/// reports no transitions.
pub fn sample_next_state_and_reward<M, R>(
    mdp: &M,
    state: &M::State,
    action: &M::Action,
    rng: &mut R,
) -> Result<(M::State, f64)>
where
    M: Mdp + ?Sized,
    R: Rng + ?Sized,
{
    let mut transitions = mdp.transitions(state, action);
    if transitions.is_empty() {
        let context = format!("{state:?} / {action:?}");
        return Err(ConfigurationError::EmptyDistribution(context).into());
    }

    let threshold: f64 = rng.gen();
    let mut cumulative = 0.0;
    let mut chosen = transitions.len() - 1;
    for (i, t) in transitions.iter().enumerate() {
        cumulative += t.probability;
        if threshold < cumulative {
            chosen = i;
            break;
        }
    }

    let t = transitions.swap_remove(chosen);
    Ok((t.next_state, t.reward))
}

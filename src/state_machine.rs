// Copyright 2025 Cowboy AI, LLC.

//! State machine primitives for guarded entity transitions
//!
//! Entities whose status must only move along defined edges implement
//! [`MealyStateTransitions`]: whether a move is allowed depends on the current
//! state *and* the input that requests it. [`transition`] checks the guard and
//! produces a [`StateTransition`] record, or an
//! [`DomainError::InvalidStateTransition`].

use crate::errors::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Input to a state machine transition
pub trait TransitionInput: Debug + Clone + Send + Sync {
    /// Get a description of this input for logging
    fn description(&self) -> String;
}

/// Trait for types that can be used as states in a state machine
pub trait State: Debug + Clone + PartialEq + Eq + Send + Sync {
    /// Get the name of this state for logging/debugging
    fn name(&self) -> &'static str;

    /// Check if this is a terminal state
    fn is_terminal(&self) -> bool {
        false
    }
}

/// Mealy Machine: the allowed target depends on current state AND input
pub trait MealyStateTransitions: State {
    /// The input type for transitions
    type Input: TransitionInput;

    /// Check if a transition is valid given the input
    fn can_transition_to(&self, target: &Self, input: &Self::Input) -> bool;

    /// Get valid transitions for a given input
    fn valid_transitions(&self, input: &Self::Input) -> Vec<Self>;
}

/// Record of a state transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition<S, I> {
    /// The state before the transition
    pub from: S,
    /// The state after the transition
    pub to: S,
    /// The input that triggered the transition
    pub input: I,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
}

/// Check the guard for `from -> to` under `input`.
pub fn transition<S>(from: &S, to: S, input: S::Input) -> DomainResult<StateTransition<S, S::Input>>
where
    S: MealyStateTransitions,
{
    if from.is_terminal() || !from.can_transition_to(&to, &input) {
        return Err(DomainError::InvalidStateTransition {
            from: from.name().to_string(),
            to: to.name().to_string(),
        });
    }

    Ok(StateTransition {
        from: from.clone(),
        to,
        input,
        timestamp: Utc::now(),
    })
}

//! Rules that apply on their own or gate player actions.

pub mod state_based;
pub mod timing;

pub use state_based::{
    LoseReason, StateBasedAction, apply_state_based_actions, check_state_based_actions,
    run_state_based_actions,
};
pub use timing::{Timing, can_cast, can_play_land};

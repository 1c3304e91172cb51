pub mod controller;
mod photos;
pub mod state;

pub use controller::{RoundController, RoundSnapshot};
pub use state::{RoundPhase, RoundState};

mod guard;
mod sequencer;
mod space;
mod status;
#[cfg(test)]
mod tests;

pub use guard::*;
pub(crate) use sequencer::SpinBudget;
pub use sequencer::{DEFAULT_MAX_SPIN, Sequencer, SpaceGuard};
pub use space::*;
pub use status::*;

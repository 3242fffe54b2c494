pub mod controller;
mod loop_worker;
pub mod state;

pub use controller::{PollHandle, PollObserver, Poller, PollerConfig};
pub use state::{PollState, PollStatus};

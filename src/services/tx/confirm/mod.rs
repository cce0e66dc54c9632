pub mod poller;

pub use poller::{ConfirmationPoller, MIN_POLL_INTERVAL, PollState};

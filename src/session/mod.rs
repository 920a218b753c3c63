mod state;

pub use state::{SessionState, SessionTeardown};

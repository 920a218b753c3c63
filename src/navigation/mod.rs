pub mod guard;
pub mod navigator;
pub mod progress;
pub mod reload;

pub use guard::{GuardState, NavigationGuard};
pub use navigator::{BeforeEach, GuardDecision, Navigation, NavigationHook, Navigator};
pub use progress::Progress;
pub use reload::{ReloadSignal, Reloader};

pub mod app;
pub mod shutdown;

pub use app::{build_state, Application};
pub use shutdown::{wait_for_shutdown_signal, ShutdownManager};

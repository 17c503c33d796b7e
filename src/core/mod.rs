pub mod interceptor;
pub mod notifier;
pub mod refresh;
pub mod session_store;
pub mod transport;

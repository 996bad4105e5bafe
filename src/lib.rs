pub mod bot;
pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod media_library;
pub mod onboarding;
pub mod transport;
pub mod types;
pub mod welcome;

pub use bot::run;

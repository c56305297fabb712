// Library surface for headless/integration tests and reuse.
// The terminal front-end lives in main.rs and only talks to the session
// through `SessionDriver`.
pub mod alignment;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod driver;
pub mod history;
pub mod recorder;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod text;
pub mod time_series;
pub mod util;

pub mod browse;
pub mod import;
pub mod setup;
pub mod ui;

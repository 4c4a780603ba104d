//! Sign-up screen built on controlled form fields

mod app;
mod input;
pub mod ui;

pub use app::DemoApp;

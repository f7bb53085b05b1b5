//! Interactive terminal form: register accounts, see their profiles, post to all.
mod activity;
mod feeders;
mod input;
mod model;
mod styles;
mod tui;
mod view;

pub use activity::ActivityLine;
pub use input::TextInput;
pub use model::{Effect, Focus, Model, Msg, ProfileRow, update};
pub use tui::run_tui;

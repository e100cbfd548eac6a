pub mod config;
pub mod project;
pub mod state;
pub mod task;
pub mod user;

pub use config::*;
pub use project::*;
pub use state::*;
pub use task::*;
pub use user::*;

pub mod command;
pub mod domains;
pub mod engine;
pub mod placement;
pub mod source;
pub mod text;
pub mod xapi;

pub use crate::domain::model::{BackgroundSlot, Command, LogoSource, Rectangle};
pub use crate::domain::ports::{ControlChannel, Storage};
pub use crate::utils::error::Result;

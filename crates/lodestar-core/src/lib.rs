//! Core maze geometry: cell positions, layout, and the search heuristic.

mod error;
mod heuristic;
mod layout;
mod pos;

pub use error::LayoutError;
pub use heuristic::manhattan;
pub use layout::{Endpoints, Layout};
pub use pos::Pos;

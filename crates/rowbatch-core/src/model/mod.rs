pub mod animation;
pub mod position;
pub mod section;

pub use animation::RowAnimation;
pub use position::IndexPath;
pub use section::{DiffSection, Section};

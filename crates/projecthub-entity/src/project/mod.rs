//! Project and roster entities.

mod model;

pub use model::{Project, ProjectMember};

pub mod entities;
pub mod messaging;
pub mod query;
pub mod repositories;
pub mod validation;

pub use entities::*;
pub use messaging::*;
pub use query::*;
pub use repositories::*;
pub use taskplane_core::{TaskPlaneError, TaskPlaneResult};
pub use validation::validate_task_spec;

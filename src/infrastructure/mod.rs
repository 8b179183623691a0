//! Infrastructure layer: data sources, seed data and DI container
//!
//! This layer implements the I/O boundary traits and wires up services.

pub mod di;
pub mod error;
pub mod mock_source;
pub mod seed;
pub mod traits;

pub use di::ServiceContainer;
pub use error::{FetchError, InfraError, InfraResult};
pub use mock_source::MockChildSource;
pub use traits::ChildSource;

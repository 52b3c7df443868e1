pub mod config;
pub mod domain;
pub mod errors;

pub use domain::product::{NewProduct, Product, ProductId};
pub use domain::review::{Review, MAX_RATING, MIN_RATING};
pub use errors::{ApplicationError, DomainError, InterfaceError};

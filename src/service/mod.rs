//! CrudService: the persistence gateway over the in-memory store.

mod crud;
mod validation;
pub use crud::{CrudService, ListPage};
pub use validation::RequestValidator;

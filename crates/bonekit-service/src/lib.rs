//! # bonekit-service
//!
//! Generic services bound to one entity type and one persistence context:
//! CRUD, bulk and windowed listing, named-query lookups, and dynamic
//! criteria search.

pub mod crud;
pub mod generic;
pub mod search;
pub mod single;

pub use crud::CrudService;
pub use generic::GenericService;
pub use single::SingleResult;

// Hotels resource: CRUD over the generic repository

pub mod handlers;
pub mod repository;

pub use repository::HotelsRepository;

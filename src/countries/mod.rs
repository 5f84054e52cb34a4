// Countries resource: CRUD over the generic repository plus the
// details fetch that loads the owned hotels

pub mod handlers;
pub mod repository;

pub use repository::CountriesRepository;

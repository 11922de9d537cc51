// ==========================================
// IPO Validation - Repository Layer
// ==========================================
// Responsibilities: validation run metadata and result artifacts
// Rule: no business logic; all SQL parameterized
// ==========================================

pub mod error;
pub mod result_store;
pub mod validation_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use result_store::{CsvResultStore, ResultStore};
pub use validation_repo::ValidationRunRepository;

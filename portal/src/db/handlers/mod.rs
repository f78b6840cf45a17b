//! Repositories, one per table. Each wraps a `&mut SqliteConnection` taken from the pool by
//! the calling handler:
//!
//! ```ignore
//! let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
//! let mut repo = Employees::new(&mut conn);
//! let employees = repo.list(&EmployeeFilter::default()).await?;
//! ```

pub mod employees;
pub mod repository;
pub mod slides;
pub mod users;

pub use employees::Employees;
pub use repository::Repository;
pub use slides::Slides;
pub use users::Users;

mod departments;
mod notifications;
mod payments;
mod ratings;
mod reports;
mod storage;
mod users;

pub use departments::DepartmentRepository;
pub use notifications::NotificationRepository;
pub use payments::PaymentRepository;
pub use ratings::RatingRepository;
pub use reports::ReportRepository;
pub use storage::{StorageError, StorageRepository};
pub use users::UserRepository;

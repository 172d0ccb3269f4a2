mod department;
mod full_name;
mod notification;
mod payment;
mod rating;
mod rent_month;
mod report;
mod user;
mod user_email;

pub use department::*;
pub use full_name::FullName;
pub use notification::Notification;
pub use payment::*;
pub use rating::*;
pub use rent_month::*;
pub use report::*;
pub use user::*;
pub use user_email::UserEmail;

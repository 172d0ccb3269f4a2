mod catalog;
mod department;

pub use catalog::catalog;
pub use department::{department_detail, pay_department, pay_department_form, rate_department};

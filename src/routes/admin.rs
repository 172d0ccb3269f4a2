mod dashboard;
mod departments;
mod payments;
mod reports;
mod users;

pub use dashboard::admin_dashboard;
pub use departments::{
    change_department_status, create_department, delete_department, departments_list,
    edit_department_form, new_department_form, update_department,
};
pub use payments::{approve_payment, payment_detail, payments_list, reject_payment};
pub use reports::{reports_list, resolve_report, update_report_status};
pub use users::{create_admin, new_admin_form};

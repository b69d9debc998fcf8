pub mod patient_form;
pub mod user;

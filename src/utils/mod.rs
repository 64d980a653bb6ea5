pub mod form;
pub mod uploads;
pub mod validation;

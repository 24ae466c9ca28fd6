pub mod engagement;
pub mod patient;

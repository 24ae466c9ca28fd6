pub mod booking;
pub mod practiceq;

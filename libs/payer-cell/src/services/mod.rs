pub mod bookability;
pub mod payer;
pub mod sanity;

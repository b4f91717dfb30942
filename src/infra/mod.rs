pub mod policy;
pub mod secrets;

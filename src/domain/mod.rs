pub mod catalog;
pub mod envelope;
pub mod request;
pub mod review;
pub mod session;

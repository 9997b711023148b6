pub mod r#assert;
pub mod auth;
pub mod data;
pub mod mutation;
pub mod request;
pub mod runner;
pub mod suite;
pub mod upload;

pub mod account;
pub mod expense;

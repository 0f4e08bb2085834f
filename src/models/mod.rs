pub mod accounting;
pub mod bank_account;
pub mod bill;
pub mod customer;
pub mod expense;
pub mod file;
pub mod payroll;
pub mod product;
pub mod purchase;
pub mod shift;
pub mod supplier;
pub mod tank;
pub mod user;

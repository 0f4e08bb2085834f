pub mod accounting;
pub mod bank_account;
pub mod bill;
pub mod common;
pub mod customer;
pub mod expense;
pub mod lenient;
pub mod payroll;
pub mod product;
pub mod purchase;
pub mod report;
pub mod shift;
pub mod supplier;
pub mod tank;
pub mod user;

pub mod auth;
pub mod brands;
pub mod customer;
pub mod dashboard;
pub mod intelligence;
pub mod orders;
pub mod products;

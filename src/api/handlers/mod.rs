pub mod addons;
pub mod booking;
pub mod capacity;
pub mod health;
pub mod payments;
pub mod purchases;
pub mod tickets;
pub mod tokens;

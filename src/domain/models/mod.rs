pub mod addon;
pub mod capacity;
pub mod purchase;
pub mod ticket;
pub mod token;
pub mod wizard;

pub mod addons;
pub mod capacity;
pub mod pricing;
pub mod token_lifecycle;

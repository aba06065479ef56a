pub mod auth;
pub mod cart;
pub mod delivery;
pub mod orders;
pub mod pizzas;

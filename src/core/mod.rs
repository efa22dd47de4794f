pub mod communication;
pub mod session;

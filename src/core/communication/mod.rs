// Communication module - wire messages and the transport seam
pub mod message;
pub mod transport;

pub use message::{Inbound, LastMessage, Request};
pub use transport::{Connector, Link};

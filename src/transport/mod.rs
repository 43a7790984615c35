pub mod channel;
pub mod messages;

pub use channel::{
    is_secure_endpoint, Connection, TransportChannel, TransportEvent, TransportFactory,
    WebSocketFactory,
};
pub use messages::{ClientMessage, ServerMessage};

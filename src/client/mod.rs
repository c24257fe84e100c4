pub mod error;
pub mod session;
pub mod socketio;
pub mod transport;

pub use error::{ClientError, TransportError};
pub use session::{Credentials, MonitorClient};
pub use socketio::{SocketIoTransport, TransportOptions};
pub use transport::{EventTransport, PushListener, PushRegistry};

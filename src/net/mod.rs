//! Network collaborators: the transport used to reach enterprise nodes and the
//! retry policy it applies.
pub mod retry;
pub mod transport;

pub use retry::RetryPolicy;
pub use transport::{HttpTransport, Transport};

pub mod config;
pub mod credentials;
pub mod error;
pub mod fault;
pub mod http;
pub mod manager;
pub mod registry;
pub mod session;
pub mod transport;
pub mod turn;

pub use config::Config;
pub use credentials::CredentialStore;
pub use error::{SessionError, SessionResult};
pub use fault::{Fault, FaultLog, FaultSink, TracingFaultSink};
pub use http::{create_router, AppState};
pub use manager::{ManagerStatus, SessionManager};
pub use registry::{ListenerHandle, ListenerRegistry, MESSAGE_EVENT};
pub use session::{
    EntryKind, Session, SessionConfig, SessionState, SessionStats, SpeakerRole, TranscriptEntry,
    TranscriptRetention,
};
pub use transport::{
    ConfiguredTransportFactory, MockTransport, MockTransportConfig, NatsTransport, Transport,
    TransportFactory, WireMessage,
};
pub use turn::{infer_turn_state, TurnState};

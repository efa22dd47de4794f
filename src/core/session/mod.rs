// Session module - connection lifecycle, timers and subscription replay
pub mod event;
pub mod heartbeat;
pub mod manager;
pub mod reconnect;
pub mod session;
pub mod state;
pub mod subscriptions;
pub mod timer;

pub use event::{ConnectionId, EventSender, SessionEvent, TimerId, TimerKind};
pub use heartbeat::{HeartbeatAction, IdleWatchdog};
pub use manager::SessionManager;
pub use reconnect::ReconnectScheduler;
pub use session::SessionHandle;
pub use state::{ClosePolicy, ConnectionStatus, SessionStats, WatchdogState};
pub use subscriptions::SubscriptionSet;
pub use timer::{TimerHandle, TimerSlot};

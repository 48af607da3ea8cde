//! InkMirror Core Library
//!
//! Stroke capture, outline geometry and snapshot replication for a
//! freehand whiteboard mirrored onto one or more read-only viewers.

pub mod bounds;
pub mod camera;
pub mod channel;
pub mod config;
pub mod debounce;
pub mod outline;
pub mod path;
pub mod protocol;
pub mod replication;
pub mod store;
pub mod stroke;

pub use bounds::{BASE_PADDING, bounds, clamp_to_surface};
pub use camera::Camera;
pub use channel::{
    ChannelError, ChannelNotice, ChannelResult, ContextId, FileChannel, MemoryChannel,
    SharedChannel, Subscription,
};
pub use config::{BrushConfig, ConfigError, InkConfig, ReplicationConfig, SurfaceConfig};
pub use debounce::Debouncer;
pub use outline::{EndOptions, OutlineOptions, Taper, outline};
pub use path::to_svg_path;
pub use protocol::{ProtocolError, Snapshot, WireMessage, WireStroke};
pub use replication::{
    ListenerState, PublishOutcome, PublisherState, ReplicationError, ReplicationEvent,
    SnapshotListener, SnapshotPublisher,
};
pub use store::{PendingStroke, StrokeStore};
pub use stroke::{DEFAULT_PRESSURE, Stroke, StrokeColor, StrokeId, StrokePoint};

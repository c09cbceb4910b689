//! # quill-bind: keeps a local text surface in sync with a shared document
//!
//! Local edits are diffed into positional [`Transform`]s and sent upstream;
//! transforms from other participants are applied to the surface while the
//! user's selection is carried along.
//!
//! ## Architecture
//!
//! ```text
//!   user keystroke                          collaboration layer
//!         │                                  │            ▲
//!         ▼                                  │ RemoteEvent│ Collaborator
//! ┌──────────────┐  change notification ┌────▼────────────┴───┐
//! │ TextSurface  │ ───────────────────► │       Binding       │
//! │ (content,    │ ◄─────────────────── │  (lifecycle, diff,  │
//! │  selection)  │  content + selection │   apply, cursor)    │
//! └──────────────┘                      └─────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`transform`]: edit operation model and application
//! - [`diff`]: single-hunk change detection
//! - [`selection`]: selection remapping across remote edits
//! - [`surface`]: text surface contract and an in-memory surface
//! - [`channel`]: inbound events and outbound actions
//! - [`cursor`]: periodic caret reporting
//! - [`binding`]: the lifecycle state machine and event loop
//! - [`config`]: binding configuration

pub mod transform;
pub mod diff;
pub mod selection;
pub mod surface;
pub mod channel;
pub mod cursor;
pub mod binding;
pub mod config;

pub use transform::{Transform, TransformError};
pub use diff::detect_change;
pub use selection::Selection;
pub use surface::{ChangeReceiver, MemorySurface, TextSurface};
pub use channel::{
    remote_events, ChannelCollaborator, Collaborator, DocumentSnapshot, Outbound, Rejection,
    RemoteEvent,
};
pub use cursor::CursorReporter;
pub use binding::{
    Binding, BindingError, BindingState, BindingStats, TeardownHandle, LOCAL_TRANSFORM_REJECTED,
};
pub use config::{BindingConfig, ConfigError};

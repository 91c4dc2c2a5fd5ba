//! Safe Rust bindings for the libvlc media library.
//!
//! This crate wraps the native libvlc objects (instances, media, media
//! players, renderer discoverers) in owned handle types and translates the
//! native event callbacks into typed Rust events delivered to registered
//! listeners. All media parsing, decoding and rendering happens inside
//! libvlc; this layer only owns handles, decodes event payloads and routes
//! them.
//!
//! Events are delivered on threads owned by libvlc. Listener callbacks run
//! synchronously on the delivering thread, so listeners must not block.

pub mod enums;
pub mod events;
mod instance;
mod media;
mod native;
mod player;
pub mod registry;
mod renderer;

pub use enums::{MediaState, Meta, ParseFlag, ParsedStatus};
pub use events::{
    DecodeError, MediaEvent, MediaEventListener, MediaPlayerEvent, MediaPlayerEventListener,
    RendererDiscovererEvent, RendererDiscovererEventListener,
};
pub use instance::{Instance, InstanceArgs};
pub use media::Media;
pub use player::MediaPlayer;
pub use renderer::{RendererDiscoverer, RendererItem};

/// Result type for rvlc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for rvlc operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("libvlc could not be loaded: {0}")]
    LibraryLoad(#[from] rvlc_sys::LoadError),

    #[error("libvlc returned a NULL {0} handle")]
    NullHandle(&'static str),

    #[error("native handle was already released")]
    Released,

    #[error("string contains an interior NUL byte: {0}")]
    InvalidString(#[from] std::ffi::NulError),

    #[error("event decode failed: {0}")]
    Decode(#[from] events::DecodeError),
}

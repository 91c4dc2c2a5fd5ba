//! Runtime loader for the libvlc shared library.
//!
//! libvlc is resolved with `dlopen`-style loading instead of link-time
//! binding, so crates in this workspace build and run their tests on hosts
//! without a VLC installation. Symbols are looked up once and cached in a
//! process-wide table.

use libloading::Library;
use once_cell::sync::OnceCell;

use crate::*;

/// Shared library names probed, in order, per platform.
#[cfg(target_os = "linux")]
const CANDIDATES: &[&str] = &["libvlc.so.5", "libvlc.so"];
#[cfg(target_os = "macos")]
const CANDIDATES: &[&str] = &[
    "/Applications/VLC.app/Contents/MacOS/lib/libvlc.dylib",
    "libvlc.dylib",
];
#[cfg(target_os = "windows")]
const CANDIDATES: &[&str] = &["libvlc.dll"];
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const CANDIDATES: &[&str] = &["libvlc.so"];

/// Errors raised while locating or resolving the native library.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("no libvlc shared library found (tried: {0})")]
    NotFound(String),

    #[error("failed to resolve libvlc symbol: {0}")]
    Symbol(#[from] libloading::Error),
}

static SHARED: OnceCell<LibVlc> = OnceCell::new();

macro_rules! resolve {
    ($lib:expr, $name:literal) => {
        *(unsafe { $lib.get(concat!($name, "\0").as_bytes()) }?)
    };
}

/// Resolved libvlc entry points.
///
/// The backing [`Library`] is kept alive for as long as this table exists,
/// which keeps every function pointer valid.
pub struct LibVlc {
    _lib: Library,

    pub libvlc_new: fn_libvlc_new,
    pub libvlc_release: fn_libvlc_release,

    pub libvlc_media_new_location: fn_libvlc_media_new_location,
    pub libvlc_media_new_path: fn_libvlc_media_new_path,
    pub libvlc_media_release: fn_libvlc_media_release,
    pub libvlc_media_parse_with_options: fn_libvlc_media_parse_with_options,
    pub libvlc_media_parse_stop: fn_libvlc_media_parse_stop,
    pub libvlc_media_get_parsed_status: fn_libvlc_media_get_parsed_status,
    pub libvlc_media_event_manager: fn_libvlc_media_event_manager,

    pub libvlc_media_player_new: fn_libvlc_media_player_new,
    pub libvlc_media_player_release: fn_libvlc_media_player_release,
    pub libvlc_media_player_set_media: fn_libvlc_media_player_set_media,
    pub libvlc_media_player_play: fn_libvlc_media_player_play,
    pub libvlc_media_player_stop: fn_libvlc_media_player_stop,
    pub libvlc_media_player_event_manager: fn_libvlc_media_player_event_manager,
    pub libvlc_video_take_snapshot: fn_libvlc_video_take_snapshot,

    pub libvlc_renderer_discoverer_new: fn_libvlc_renderer_discoverer_new,
    pub libvlc_renderer_discoverer_release: fn_libvlc_renderer_discoverer_release,
    pub libvlc_renderer_discoverer_start: fn_libvlc_renderer_discoverer_start,
    pub libvlc_renderer_discoverer_stop: fn_libvlc_renderer_discoverer_stop,
    pub libvlc_renderer_discoverer_event_manager: fn_libvlc_renderer_discoverer_event_manager,

    pub libvlc_renderer_item_name: fn_libvlc_renderer_item_name,
    pub libvlc_renderer_item_type: fn_libvlc_renderer_item_type,
    pub libvlc_renderer_item_hold: fn_libvlc_renderer_item_hold,
    pub libvlc_renderer_item_release: fn_libvlc_renderer_item_release,

    pub libvlc_event_attach: fn_libvlc_event_attach,
    pub libvlc_event_detach: fn_libvlc_event_detach,
}

impl LibVlc {
    /// Loads libvlc from the first matching candidate name.
    pub fn open() -> Result<Self, LoadError> {
        let lib = Self::find_library()?;
        Self::from_library(lib)
    }

    /// Returns the process-wide symbol table, loading it on first use.
    pub fn shared() -> Result<&'static Self, LoadError> {
        SHARED.get_or_try_init(Self::open)
    }

    fn find_library() -> Result<Library, LoadError> {
        for name in CANDIDATES {
            if let Ok(lib) = unsafe { Library::new(name) } {
                return Ok(lib);
            }
        }
        Err(LoadError::NotFound(CANDIDATES.join(", ")))
    }

    fn from_library(lib: Library) -> Result<Self, LoadError> {
        Ok(Self {
            libvlc_new: resolve!(lib, "libvlc_new"),
            libvlc_release: resolve!(lib, "libvlc_release"),

            libvlc_media_new_location: resolve!(lib, "libvlc_media_new_location"),
            libvlc_media_new_path: resolve!(lib, "libvlc_media_new_path"),
            libvlc_media_release: resolve!(lib, "libvlc_media_release"),
            libvlc_media_parse_with_options: resolve!(lib, "libvlc_media_parse_with_options"),
            libvlc_media_parse_stop: resolve!(lib, "libvlc_media_parse_stop"),
            libvlc_media_get_parsed_status: resolve!(lib, "libvlc_media_get_parsed_status"),
            libvlc_media_event_manager: resolve!(lib, "libvlc_media_event_manager"),

            libvlc_media_player_new: resolve!(lib, "libvlc_media_player_new"),
            libvlc_media_player_release: resolve!(lib, "libvlc_media_player_release"),
            libvlc_media_player_set_media: resolve!(lib, "libvlc_media_player_set_media"),
            libvlc_media_player_play: resolve!(lib, "libvlc_media_player_play"),
            libvlc_media_player_stop: resolve!(lib, "libvlc_media_player_stop"),
            libvlc_media_player_event_manager: resolve!(lib, "libvlc_media_player_event_manager"),
            libvlc_video_take_snapshot: resolve!(lib, "libvlc_video_take_snapshot"),

            libvlc_renderer_discoverer_new: resolve!(lib, "libvlc_renderer_discoverer_new"),
            libvlc_renderer_discoverer_release: resolve!(lib, "libvlc_renderer_discoverer_release"),
            libvlc_renderer_discoverer_start: resolve!(lib, "libvlc_renderer_discoverer_start"),
            libvlc_renderer_discoverer_stop: resolve!(lib, "libvlc_renderer_discoverer_stop"),
            libvlc_renderer_discoverer_event_manager: resolve!(
                lib,
                "libvlc_renderer_discoverer_event_manager"
            ),

            libvlc_renderer_item_name: resolve!(lib, "libvlc_renderer_item_name"),
            libvlc_renderer_item_type: resolve!(lib, "libvlc_renderer_item_type"),
            libvlc_renderer_item_hold: resolve!(lib, "libvlc_renderer_item_hold"),
            libvlc_renderer_item_release: resolve!(lib, "libvlc_renderer_item_release"),

            libvlc_event_attach: resolve!(lib, "libvlc_event_attach"),
            libvlc_event_detach: resolve!(lib, "libvlc_event_detach"),

            _lib: lib,
        })
    }
}

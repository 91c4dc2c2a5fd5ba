//! Raw libvlc C ABI surface.
//!
//! Hand-maintained declarations for the subset of libvlc 3.x this binding
//! uses: media construction and parsing, media players, renderer
//! discoverers, and the event manager. Symbols are resolved at runtime from
//! the installed libvlc shared library (see [`LibVlc`]), so the workspace
//! links and tests without libvlc present on the build host.

#![allow(non_camel_case_types)]
#![allow(non_upper_case_globals)]

use libc::{c_char, c_float, c_int, c_uint, c_void};

mod dynamic;

pub use dynamic::{LibVlc, LoadError};

// Opaque native object types
pub enum libvlc_instance_t {}
pub enum libvlc_media_t {}
pub enum libvlc_media_player_t {}
pub enum libvlc_event_manager_t {}
pub enum libvlc_renderer_discoverer_t {}
pub enum libvlc_renderer_item_t {}

// ──────────────────── event type codes ────────────────────

pub const libvlc_MediaMetaChanged: c_int = 0;
pub const libvlc_MediaSubItemAdded: c_int = 1;
pub const libvlc_MediaDurationChanged: c_int = 2;
pub const libvlc_MediaParsedChanged: c_int = 3;
pub const libvlc_MediaFreed: c_int = 4;
pub const libvlc_MediaStateChanged: c_int = 5;
pub const libvlc_MediaSubItemTreeAdded: c_int = 6;

pub const libvlc_MediaPlayerMediaChanged: c_int = 0x100;
pub const libvlc_MediaPlayerOpening: c_int = 0x102;
pub const libvlc_MediaPlayerBuffering: c_int = 0x103;
pub const libvlc_MediaPlayerPlaying: c_int = 0x104;
pub const libvlc_MediaPlayerPaused: c_int = 0x105;
pub const libvlc_MediaPlayerStopped: c_int = 0x106;
pub const libvlc_MediaPlayerEndReached: c_int = 0x109;
pub const libvlc_MediaPlayerEncounteredError: c_int = 0x10A;
pub const libvlc_MediaPlayerTimeChanged: c_int = 0x10B;
pub const libvlc_MediaPlayerPositionChanged: c_int = 0x10C;
pub const libvlc_MediaPlayerSnapshotTaken: c_int = 0x110;
pub const libvlc_MediaPlayerLengthChanged: c_int = 0x111;

pub const libvlc_RendererDiscovererItemAdded: c_int = 0x502;
pub const libvlc_RendererDiscovererItemDeleted: c_int = 0x503;

// ──────────────────── parse flags / parsed status ────────────────────

// libvlc_media_parse_flag_t
pub const libvlc_media_parse_local: c_int = 0x0;
pub const libvlc_media_parse_network: c_int = 0x1;
pub const libvlc_media_fetch_local: c_int = 0x2;
pub const libvlc_media_fetch_network: c_int = 0x4;
pub const libvlc_media_do_interact: c_int = 0x8;

// libvlc_media_parsed_status_t; 0 is returned by
// libvlc_media_get_parsed_status for a media that was never parsed.
pub const libvlc_media_parsed_status_none: c_int = 0;
pub const libvlc_media_parsed_status_skipped: c_int = 1;
pub const libvlc_media_parsed_status_failed: c_int = 2;
pub const libvlc_media_parsed_status_timeout: c_int = 3;
pub const libvlc_media_parsed_status_done: c_int = 4;

// ──────────────────── event record ────────────────────

/// Event callback signature registered with `libvlc_event_attach`.
pub type libvlc_callback_t =
    unsafe extern "C" fn(p_event: *const libvlc_event_t, p_data: *mut c_void);

#[repr(C)]
#[derive(Copy, Clone)]
pub struct media_meta_changed {
    pub meta_type: c_int,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct media_duration_changed {
    pub new_duration: i64,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct media_parsed_changed {
    pub new_status: c_int,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct media_state_changed {
    pub new_state: c_int,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct media_player_time_changed {
    pub new_time: i64,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct media_player_position_changed {
    pub new_position: c_float,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct media_player_snapshot_taken {
    pub psz_filename: *mut c_char,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct renderer_discoverer_item_added {
    pub item: *mut libvlc_renderer_item_t,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct renderer_discoverer_item_deleted {
    pub item: *mut libvlc_renderer_item_t,
}

/// Payload union of `libvlc_event_t`, keyed by the event type code.
///
/// Only the variants this binding attaches to are declared; `_padding`
/// reserves space for the larger members of the full native union.
#[repr(C)]
#[derive(Copy, Clone)]
pub union libvlc_event_u {
    pub media_meta_changed: media_meta_changed,
    pub media_duration_changed: media_duration_changed,
    pub media_parsed_changed: media_parsed_changed,
    pub media_state_changed: media_state_changed,
    pub media_player_time_changed: media_player_time_changed,
    pub media_player_position_changed: media_player_position_changed,
    pub media_player_snapshot_taken: media_player_snapshot_taken,
    pub renderer_discoverer_item_added: renderer_discoverer_item_added,
    pub renderer_discoverer_item_deleted: renderer_discoverer_item_deleted,
    pub _padding: [u8; 64],
}

/// Native event record. Valid only for the duration of the callback that
/// delivered it; payloads must be copied out before the callback returns.
#[repr(C)]
pub struct libvlc_event_t {
    pub r#type: c_int,
    pub p_obj: *mut c_void,
    pub u: libvlc_event_u,
}

impl libvlc_event_t {
    /// Builds a record with a zeroed payload, for tests and synthetic events.
    pub fn new(event_type: c_int, p_obj: *mut c_void) -> Self {
        Self {
            r#type: event_type,
            p_obj,
            u: libvlc_event_u { _padding: [0; 64] },
        }
    }
}

// ──────────────────── function signatures ────────────────────

pub type fn_libvlc_new =
    unsafe extern "C" fn(argc: c_int, argv: *const *const c_char) -> *mut libvlc_instance_t;
pub type fn_libvlc_release = unsafe extern "C" fn(p_instance: *mut libvlc_instance_t);

pub type fn_libvlc_media_new_location = unsafe extern "C" fn(
    p_instance: *mut libvlc_instance_t,
    psz_mrl: *const c_char,
) -> *mut libvlc_media_t;
pub type fn_libvlc_media_new_path = unsafe extern "C" fn(
    p_instance: *mut libvlc_instance_t,
    path: *const c_char,
) -> *mut libvlc_media_t;
pub type fn_libvlc_media_release = unsafe extern "C" fn(p_md: *mut libvlc_media_t);
pub type fn_libvlc_media_parse_with_options = unsafe extern "C" fn(
    p_md: *mut libvlc_media_t,
    parse_flag: c_int,
    timeout: c_int,
) -> c_int;
pub type fn_libvlc_media_parse_stop = unsafe extern "C" fn(p_md: *mut libvlc_media_t);
pub type fn_libvlc_media_get_parsed_status =
    unsafe extern "C" fn(p_md: *mut libvlc_media_t) -> c_int;
pub type fn_libvlc_media_event_manager =
    unsafe extern "C" fn(p_md: *mut libvlc_media_t) -> *mut libvlc_event_manager_t;

pub type fn_libvlc_media_player_new =
    unsafe extern "C" fn(p_instance: *mut libvlc_instance_t) -> *mut libvlc_media_player_t;
pub type fn_libvlc_media_player_release = unsafe extern "C" fn(p_mi: *mut libvlc_media_player_t);
pub type fn_libvlc_media_player_set_media =
    unsafe extern "C" fn(p_mi: *mut libvlc_media_player_t, p_md: *mut libvlc_media_t);
pub type fn_libvlc_media_player_play =
    unsafe extern "C" fn(p_mi: *mut libvlc_media_player_t) -> c_int;
pub type fn_libvlc_media_player_stop = unsafe extern "C" fn(p_mi: *mut libvlc_media_player_t);
pub type fn_libvlc_media_player_event_manager =
    unsafe extern "C" fn(p_mi: *mut libvlc_media_player_t) -> *mut libvlc_event_manager_t;
pub type fn_libvlc_video_take_snapshot = unsafe extern "C" fn(
    p_mi: *mut libvlc_media_player_t,
    num: c_uint,
    psz_filepath: *const c_char,
    width: c_uint,
    height: c_uint,
) -> c_int;

pub type fn_libvlc_renderer_discoverer_new = unsafe extern "C" fn(
    p_inst: *mut libvlc_instance_t,
    psz_name: *const c_char,
) -> *mut libvlc_renderer_discoverer_t;
pub type fn_libvlc_renderer_discoverer_release =
    unsafe extern "C" fn(p_rd: *mut libvlc_renderer_discoverer_t);
pub type fn_libvlc_renderer_discoverer_start =
    unsafe extern "C" fn(p_rd: *mut libvlc_renderer_discoverer_t) -> c_int;
pub type fn_libvlc_renderer_discoverer_stop =
    unsafe extern "C" fn(p_rd: *mut libvlc_renderer_discoverer_t);
pub type fn_libvlc_renderer_discoverer_event_manager =
    unsafe extern "C" fn(p_rd: *mut libvlc_renderer_discoverer_t) -> *mut libvlc_event_manager_t;

pub type fn_libvlc_renderer_item_name =
    unsafe extern "C" fn(p_item: *const libvlc_renderer_item_t) -> *const c_char;
pub type fn_libvlc_renderer_item_type =
    unsafe extern "C" fn(p_item: *const libvlc_renderer_item_t) -> *const c_char;
pub type fn_libvlc_renderer_item_hold =
    unsafe extern "C" fn(p_item: *mut libvlc_renderer_item_t) -> *mut libvlc_renderer_item_t;
pub type fn_libvlc_renderer_item_release =
    unsafe extern "C" fn(p_item: *mut libvlc_renderer_item_t);

pub type fn_libvlc_event_attach = unsafe extern "C" fn(
    p_event_manager: *mut libvlc_event_manager_t,
    i_event_type: c_int,
    f_callback: libvlc_callback_t,
    user_data: *mut c_void,
) -> c_int;
pub type fn_libvlc_event_detach = unsafe extern "C" fn(
    p_event_manager: *mut libvlc_event_manager_t,
    i_event_type: c_int,
    f_callback: libvlc_callback_t,
    p_user_data: *mut c_void,
);

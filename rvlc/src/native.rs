//! The seam between the safe layer and the native library.
//!
//! Every libvlc entry point the binding uses goes through [`NativeApi`], so
//! the wrappers and the event plumbing can be exercised in tests against a
//! mock without a VLC installation. The production implementation,
//! [`DynamicApi`], forwards to the runtime-loaded symbol table in
//! `rvlc-sys`.

use std::ffi::{CStr, CString};
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use libc::c_void;
use rvlc_sys as sys;

use crate::{Error, Result};

/// An exclusively-owned native handle with a use-after-release guard.
///
/// The slot holds NULL once the handle has been released; `take` makes
/// release idempotent and safe from any thread, and `get` turns any later
/// use into a deterministic [`Error::Released`].
pub(crate) struct Guarded<T> {
    ptr: AtomicPtr<T>,
}

impl<T> Guarded<T> {
    pub(crate) fn new(ptr: *mut T) -> Self {
        Self {
            ptr: AtomicPtr::new(ptr),
        }
    }

    pub(crate) fn get(&self) -> Result<*mut T> {
        let ptr = self.ptr.load(Ordering::Acquire);
        if ptr.is_null() {
            Err(Error::Released)
        } else {
            Ok(ptr)
        }
    }

    /// Takes the handle out, leaving the released marker behind. Returns
    /// `None` if the handle was already taken.
    pub(crate) fn take(&self) -> Option<*mut T> {
        let ptr = self.ptr.swap(ptr::null_mut(), Ordering::AcqRel);
        if ptr.is_null() {
            None
        } else {
            Some(ptr)
        }
    }
}

/// The fixed set of native entry points this binding calls.
///
/// Methods mirror the libvlc C functions one-to-one; return codes are the
/// raw native ones (0 = accepted) and NULL handles are passed through for
/// the caller to check.
pub(crate) trait NativeApi: Send + Sync + 'static {
    fn instance_new(&self, args: &[CString]) -> *mut sys::libvlc_instance_t;
    fn instance_release(&self, instance: *mut sys::libvlc_instance_t);

    fn media_new_location(
        &self,
        instance: *mut sys::libvlc_instance_t,
        mrl: &CStr,
    ) -> *mut sys::libvlc_media_t;
    fn media_new_path(
        &self,
        instance: *mut sys::libvlc_instance_t,
        path: &CStr,
    ) -> *mut sys::libvlc_media_t;
    fn media_release(&self, media: *mut sys::libvlc_media_t);
    fn media_parse_with_options(
        &self,
        media: *mut sys::libvlc_media_t,
        flags: i32,
        timeout_ms: i32,
    ) -> i32;
    fn media_parse_stop(&self, media: *mut sys::libvlc_media_t);
    fn media_parsed_status(&self, media: *mut sys::libvlc_media_t) -> i32;
    fn media_event_attach(
        &self,
        media: *mut sys::libvlc_media_t,
        event_type: i32,
        callback: sys::libvlc_callback_t,
        opaque: *mut c_void,
    ) -> i32;
    fn media_event_detach(
        &self,
        media: *mut sys::libvlc_media_t,
        event_type: i32,
        callback: sys::libvlc_callback_t,
        opaque: *mut c_void,
    );

    fn player_new(&self, instance: *mut sys::libvlc_instance_t) -> *mut sys::libvlc_media_player_t;
    fn player_release(&self, player: *mut sys::libvlc_media_player_t);
    fn player_set_media(
        &self,
        player: *mut sys::libvlc_media_player_t,
        media: *mut sys::libvlc_media_t,
    );
    fn player_play(&self, player: *mut sys::libvlc_media_player_t) -> i32;
    fn player_stop(&self, player: *mut sys::libvlc_media_player_t);
    fn player_take_snapshot(
        &self,
        player: *mut sys::libvlc_media_player_t,
        path: &CStr,
        width: u32,
        height: u32,
    ) -> i32;
    fn player_event_attach(
        &self,
        player: *mut sys::libvlc_media_player_t,
        event_type: i32,
        callback: sys::libvlc_callback_t,
        opaque: *mut c_void,
    ) -> i32;
    fn player_event_detach(
        &self,
        player: *mut sys::libvlc_media_player_t,
        event_type: i32,
        callback: sys::libvlc_callback_t,
        opaque: *mut c_void,
    );

    fn discoverer_new(
        &self,
        instance: *mut sys::libvlc_instance_t,
        name: &CStr,
    ) -> *mut sys::libvlc_renderer_discoverer_t;
    fn discoverer_release(&self, discoverer: *mut sys::libvlc_renderer_discoverer_t);
    fn discoverer_start(&self, discoverer: *mut sys::libvlc_renderer_discoverer_t) -> i32;
    fn discoverer_stop(&self, discoverer: *mut sys::libvlc_renderer_discoverer_t);
    fn discoverer_event_attach(
        &self,
        discoverer: *mut sys::libvlc_renderer_discoverer_t,
        event_type: i32,
        callback: sys::libvlc_callback_t,
        opaque: *mut c_void,
    ) -> i32;
    fn discoverer_event_detach(
        &self,
        discoverer: *mut sys::libvlc_renderer_discoverer_t,
        event_type: i32,
        callback: sys::libvlc_callback_t,
        opaque: *mut c_void,
    );

    fn item_hold(&self, item: *mut sys::libvlc_renderer_item_t)
        -> *mut sys::libvlc_renderer_item_t;
    fn item_release(&self, item: *mut sys::libvlc_renderer_item_t);
    fn item_name(&self, item: *mut sys::libvlc_renderer_item_t) -> Option<String>;
    fn item_kind(&self, item: *mut sys::libvlc_renderer_item_t) -> Option<String>;
}

/// Production [`NativeApi`] over the runtime-loaded libvlc.
pub(crate) struct DynamicApi {
    lib: &'static sys::LibVlc,
}

impl DynamicApi {
    pub(crate) fn load() -> Result<Self> {
        Ok(Self {
            lib: sys::LibVlc::shared()?,
        })
    }
}

fn owned_c_string(ptr: *const libc::c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}

impl NativeApi for DynamicApi {
    fn instance_new(&self, args: &[CString]) -> *mut sys::libvlc_instance_t {
        let argv: Vec<*const libc::c_char> = args.iter().map(|a| a.as_ptr()).collect();
        unsafe { (self.lib.libvlc_new)(argv.len() as i32, argv.as_ptr()) }
    }

    fn instance_release(&self, instance: *mut sys::libvlc_instance_t) {
        unsafe { (self.lib.libvlc_release)(instance) }
    }

    fn media_new_location(
        &self,
        instance: *mut sys::libvlc_instance_t,
        mrl: &CStr,
    ) -> *mut sys::libvlc_media_t {
        unsafe { (self.lib.libvlc_media_new_location)(instance, mrl.as_ptr()) }
    }

    fn media_new_path(
        &self,
        instance: *mut sys::libvlc_instance_t,
        path: &CStr,
    ) -> *mut sys::libvlc_media_t {
        unsafe { (self.lib.libvlc_media_new_path)(instance, path.as_ptr()) }
    }

    fn media_release(&self, media: *mut sys::libvlc_media_t) {
        unsafe { (self.lib.libvlc_media_release)(media) }
    }

    fn media_parse_with_options(
        &self,
        media: *mut sys::libvlc_media_t,
        flags: i32,
        timeout_ms: i32,
    ) -> i32 {
        unsafe { (self.lib.libvlc_media_parse_with_options)(media, flags, timeout_ms) }
    }

    fn media_parse_stop(&self, media: *mut sys::libvlc_media_t) {
        unsafe { (self.lib.libvlc_media_parse_stop)(media) }
    }

    fn media_parsed_status(&self, media: *mut sys::libvlc_media_t) -> i32 {
        unsafe { (self.lib.libvlc_media_get_parsed_status)(media) }
    }

    fn media_event_attach(
        &self,
        media: *mut sys::libvlc_media_t,
        event_type: i32,
        callback: sys::libvlc_callback_t,
        opaque: *mut c_void,
    ) -> i32 {
        unsafe {
            let manager = (self.lib.libvlc_media_event_manager)(media);
            if manager.is_null() {
                return -1;
            }
            (self.lib.libvlc_event_attach)(manager, event_type, callback, opaque)
        }
    }

    fn media_event_detach(
        &self,
        media: *mut sys::libvlc_media_t,
        event_type: i32,
        callback: sys::libvlc_callback_t,
        opaque: *mut c_void,
    ) {
        unsafe {
            let manager = (self.lib.libvlc_media_event_manager)(media);
            if !manager.is_null() {
                (self.lib.libvlc_event_detach)(manager, event_type, callback, opaque);
            }
        }
    }

    fn player_new(&self, instance: *mut sys::libvlc_instance_t) -> *mut sys::libvlc_media_player_t {
        unsafe { (self.lib.libvlc_media_player_new)(instance) }
    }

    fn player_release(&self, player: *mut sys::libvlc_media_player_t) {
        unsafe { (self.lib.libvlc_media_player_release)(player) }
    }

    fn player_set_media(
        &self,
        player: *mut sys::libvlc_media_player_t,
        media: *mut sys::libvlc_media_t,
    ) {
        unsafe { (self.lib.libvlc_media_player_set_media)(player, media) }
    }

    fn player_play(&self, player: *mut sys::libvlc_media_player_t) -> i32 {
        unsafe { (self.lib.libvlc_media_player_play)(player) }
    }

    fn player_stop(&self, player: *mut sys::libvlc_media_player_t) {
        unsafe { (self.lib.libvlc_media_player_stop)(player) }
    }

    fn player_take_snapshot(
        &self,
        player: *mut sys::libvlc_media_player_t,
        path: &CStr,
        width: u32,
        height: u32,
    ) -> i32 {
        unsafe { (self.lib.libvlc_video_take_snapshot)(player, 0, path.as_ptr(), width, height) }
    }

    fn player_event_attach(
        &self,
        player: *mut sys::libvlc_media_player_t,
        event_type: i32,
        callback: sys::libvlc_callback_t,
        opaque: *mut c_void,
    ) -> i32 {
        unsafe {
            let manager = (self.lib.libvlc_media_player_event_manager)(player);
            if manager.is_null() {
                return -1;
            }
            (self.lib.libvlc_event_attach)(manager, event_type, callback, opaque)
        }
    }

    fn player_event_detach(
        &self,
        player: *mut sys::libvlc_media_player_t,
        event_type: i32,
        callback: sys::libvlc_callback_t,
        opaque: *mut c_void,
    ) {
        unsafe {
            let manager = (self.lib.libvlc_media_player_event_manager)(player);
            if !manager.is_null() {
                (self.lib.libvlc_event_detach)(manager, event_type, callback, opaque);
            }
        }
    }

    fn discoverer_new(
        &self,
        instance: *mut sys::libvlc_instance_t,
        name: &CStr,
    ) -> *mut sys::libvlc_renderer_discoverer_t {
        unsafe { (self.lib.libvlc_renderer_discoverer_new)(instance, name.as_ptr()) }
    }

    fn discoverer_release(&self, discoverer: *mut sys::libvlc_renderer_discoverer_t) {
        unsafe { (self.lib.libvlc_renderer_discoverer_release)(discoverer) }
    }

    fn discoverer_start(&self, discoverer: *mut sys::libvlc_renderer_discoverer_t) -> i32 {
        unsafe { (self.lib.libvlc_renderer_discoverer_start)(discoverer) }
    }

    fn discoverer_stop(&self, discoverer: *mut sys::libvlc_renderer_discoverer_t) {
        unsafe { (self.lib.libvlc_renderer_discoverer_stop)(discoverer) }
    }

    fn discoverer_event_attach(
        &self,
        discoverer: *mut sys::libvlc_renderer_discoverer_t,
        event_type: i32,
        callback: sys::libvlc_callback_t,
        opaque: *mut c_void,
    ) -> i32 {
        unsafe {
            let manager = (self.lib.libvlc_renderer_discoverer_event_manager)(discoverer);
            if manager.is_null() {
                return -1;
            }
            (self.lib.libvlc_event_attach)(manager, event_type, callback, opaque)
        }
    }

    fn discoverer_event_detach(
        &self,
        discoverer: *mut sys::libvlc_renderer_discoverer_t,
        event_type: i32,
        callback: sys::libvlc_callback_t,
        opaque: *mut c_void,
    ) {
        unsafe {
            let manager = (self.lib.libvlc_renderer_discoverer_event_manager)(discoverer);
            if !manager.is_null() {
                (self.lib.libvlc_event_detach)(manager, event_type, callback, opaque);
            }
        }
    }

    fn item_hold(
        &self,
        item: *mut sys::libvlc_renderer_item_t,
    ) -> *mut sys::libvlc_renderer_item_t {
        unsafe { (self.lib.libvlc_renderer_item_hold)(item) }
    }

    fn item_release(&self, item: *mut sys::libvlc_renderer_item_t) {
        unsafe { (self.lib.libvlc_renderer_item_release)(item) }
    }

    fn item_name(&self, item: *mut sys::libvlc_renderer_item_t) -> Option<String> {
        owned_c_string(unsafe { (self.lib.libvlc_renderer_item_name)(item) })
    }

    fn item_kind(&self, item: *mut sys::libvlc_renderer_item_t) -> Option<String> {
        owned_c_string(unsafe { (self.lib.libvlc_renderer_item_type)(item) })
    }
}

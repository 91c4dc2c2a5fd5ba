//! Media players.

use std::ffi::CString;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::{Arc, Weak};

use libc::c_void;
use rvlc_sys as sys;

use crate::events::{decode_player_event, MediaPlayerEventListener};
use crate::instance::Instance;
use crate::media::Media;
use crate::native::{Guarded, NativeApi};
use crate::registry::{EventRegistry, ObjectId};
use crate::{Error, Result};

const PLAYER_EVENT_TYPES: &[i32] = &[
    sys::libvlc_MediaPlayerPlaying,
    sys::libvlc_MediaPlayerPaused,
    sys::libvlc_MediaPlayerStopped,
    sys::libvlc_MediaPlayerEndReached,
    sys::libvlc_MediaPlayerEncounteredError,
    sys::libvlc_MediaPlayerTimeChanged,
    sys::libvlc_MediaPlayerPositionChanged,
    sys::libvlc_MediaPlayerSnapshotTaken,
];

pub(crate) struct PlayerCore {
    api: Arc<dyn NativeApi>,
    handle: Guarded<sys::libvlc_media_player_t>,
    id: ObjectId,
    registry: Arc<EventRegistry<dyn MediaPlayerEventListener>>,
    cb_ctx: AtomicPtr<PlayerCtx>,
}

struct PlayerCtx {
    core: Weak<PlayerCore>,
}

impl PlayerCore {
    fn release(&self) {
        if let Some(ptr) = self.handle.take() {
            let ctx = self.cb_ctx.swap(std::ptr::null_mut(), Ordering::AcqRel);
            if !ctx.is_null() {
                for event_type in PLAYER_EVENT_TYPES {
                    self.api.player_event_detach(
                        ptr,
                        *event_type,
                        player_event_callback,
                        ctx as *mut c_void,
                    );
                }
                drop(unsafe { Arc::from_raw(ctx) });
            }
            self.registry.remove_object(self.id);
            self.api.player_release(ptr);
        }
    }
}

impl Drop for PlayerCore {
    fn drop(&mut self) {
        self.release();
    }
}

unsafe extern "C" fn player_event_callback(raw: *const sys::libvlc_event_t, opaque: *mut c_void) {
    let _ = panic::catch_unwind(AssertUnwindSafe(|| {
        if raw.is_null() || opaque.is_null() {
            return;
        }
        let ctx = unsafe { &*(opaque as *const PlayerCtx) };
        if let Some(core) = ctx.core.upgrade() {
            let player = MediaPlayer { core };
            player.deliver(unsafe { &*raw });
        }
    }));
}

/// An owned media player.
///
/// Cloning shares the one underlying native handle.
#[derive(Clone)]
pub struct MediaPlayer {
    pub(crate) core: Arc<PlayerCore>,
}

impl MediaPlayer {
    pub fn new(instance: &Instance) -> Result<Self> {
        let core = instance.core();
        let ptr = core.api.player_new(core.handle.get()?);
        if ptr.is_null() {
            return Err(Error::NullHandle("media player"));
        }
        let player_core = Arc::new(PlayerCore {
            api: core.api.clone(),
            handle: Guarded::new(ptr),
            id: ObjectId::from_ptr(ptr),
            registry: core.player_events.clone(),
            cb_ctx: AtomicPtr::new(std::ptr::null_mut()),
        });

        let ctx = Arc::new(PlayerCtx {
            core: Arc::downgrade(&player_core),
        });
        let ctx_ptr = Arc::into_raw(ctx) as *mut PlayerCtx;
        for event_type in PLAYER_EVENT_TYPES {
            let rc = player_core.api.player_event_attach(
                ptr,
                *event_type,
                player_event_callback,
                ctx_ptr as *mut c_void,
            );
            if rc != 0 {
                tracing::debug!(event_type, rc, "player event attach rejected");
            }
        }
        player_core.cb_ctx.store(ctx_ptr, Ordering::Release);

        Ok(Self { core: player_core })
    }

    /// Sets the media this player will play next.
    pub fn set_media(&self, media: &Media) -> Result<()> {
        let ptr = self.core.handle.get()?;
        self.core.api.player_set_media(ptr, media.raw()?);
        Ok(())
    }

    /// Starts playback. Returns `Ok(true)` when libvlc accepted the
    /// request.
    pub fn play(&self) -> Result<bool> {
        let ptr = self.core.handle.get()?;
        Ok(self.core.api.player_play(ptr) == 0)
    }

    /// Stops playback.
    pub fn stop(&self) -> Result<()> {
        let ptr = self.core.handle.get()?;
        self.core.api.player_stop(ptr);
        Ok(())
    }

    /// Requests a video snapshot into `path`. Completion is signalled by a
    /// [`crate::MediaPlayerEvent::SnapshotTaken`] event carrying the
    /// written filename. Passing 0 for both dimensions keeps the source
    /// size.
    pub fn take_snapshot(&self, path: &str, width: u32, height: u32) -> Result<bool> {
        let ptr = self.core.handle.get()?;
        let path = CString::new(path)?;
        Ok(self.core.api.player_take_snapshot(ptr, &path, width, height) == 0)
    }

    /// Registers a listener for this player's events.
    pub fn register(&self, listener: Arc<dyn MediaPlayerEventListener>) -> Result<()> {
        self.core.handle.get()?;
        self.core.registry.register(self.core.id, listener);
        // A concurrent release may sweep the registry between the liveness
        // check and the insert; re-check so no registration outlives the
        // handle.
        if let Err(err) = self.core.handle.get() {
            self.core.registry.remove_object(self.core.id);
            return Err(err);
        }
        Ok(())
    }

    /// Removes the first matching registration of `listener`.
    pub fn unregister(&self, listener: &Arc<dyn MediaPlayerEventListener>) -> Result<()> {
        self.core.handle.get()?;
        self.core.registry.unregister(self.core.id, listener);
        Ok(())
    }

    /// Releases the native handle now. Idempotent.
    pub fn release(&self) {
        self.core.release();
    }

    fn deliver(&self, raw: &sys::libvlc_event_t) {
        match decode_player_event(raw) {
            Ok(event) => {
                self.core
                    .registry
                    .dispatch(self.core.id, &event, |listener, event| {
                        listener.on_player_event(self, event)
                    });
            }
            Err(err) => {
                tracing::error!(code = raw.r#type, "player event decode failed: {err}");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn raw(&self) -> Result<*mut sys::libvlc_media_player_t> {
        self.core.handle.get()
    }
}

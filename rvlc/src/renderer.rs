//! Renderer discovery (Chromecast and friends).

use std::ffi::CString;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::{Arc, Weak};

use libc::c_void;
use rvlc_sys as sys;

use crate::events::{decode_renderer_event, RendererDiscovererEventListener};
use crate::instance::Instance;
use crate::native::{Guarded, NativeApi};
use crate::registry::{EventRegistry, ObjectId};
use crate::{Error, Result};

const RENDERER_EVENT_TYPES: &[i32] = &[
    sys::libvlc_RendererDiscovererItemAdded,
    sys::libvlc_RendererDiscovererItemDeleted,
];

pub(crate) struct DiscovererCore {
    api: Arc<dyn NativeApi>,
    handle: Guarded<sys::libvlc_renderer_discoverer_t>,
    id: ObjectId,
    registry: Arc<EventRegistry<dyn RendererDiscovererEventListener>>,
    cb_ctx: AtomicPtr<DiscovererCtx>,
}

struct DiscovererCtx {
    core: Weak<DiscovererCore>,
}

impl DiscovererCore {
    fn release(&self) {
        if let Some(ptr) = self.handle.take() {
            let ctx = self.cb_ctx.swap(std::ptr::null_mut(), Ordering::AcqRel);
            if !ctx.is_null() {
                for event_type in RENDERER_EVENT_TYPES {
                    self.api.discoverer_event_detach(
                        ptr,
                        *event_type,
                        renderer_event_callback,
                        ctx as *mut c_void,
                    );
                }
                drop(unsafe { Arc::from_raw(ctx) });
            }
            self.registry.remove_object(self.id);
            self.api.discoverer_release(ptr);
        }
    }
}

impl Drop for DiscovererCore {
    fn drop(&mut self) {
        self.release();
    }
}

unsafe extern "C" fn renderer_event_callback(raw: *const sys::libvlc_event_t, opaque: *mut c_void) {
    let _ = panic::catch_unwind(AssertUnwindSafe(|| {
        if raw.is_null() || opaque.is_null() {
            return;
        }
        let ctx = unsafe { &*(opaque as *const DiscovererCtx) };
        if let Some(core) = ctx.core.upgrade() {
            let discoverer = RendererDiscoverer { core };
            discoverer.deliver(unsafe { &*raw });
        }
    }));
}

/// An owned renderer discoverer for one discovery protocol (for example
/// `"mdns_renderer"`).
///
/// Discovered renderers arrive as
/// [`crate::RendererDiscovererEvent::ItemAdded`] events between
/// [`start`](RendererDiscoverer::start) and
/// [`stop`](RendererDiscoverer::stop).
#[derive(Clone)]
pub struct RendererDiscoverer {
    pub(crate) core: Arc<DiscovererCore>,
}

impl RendererDiscoverer {
    pub fn new(instance: &Instance, service_name: &str) -> Result<Self> {
        let core = instance.core();
        let name = CString::new(service_name)?;
        let ptr = core.api.discoverer_new(core.handle.get()?, &name);
        if ptr.is_null() {
            return Err(Error::NullHandle("renderer discoverer"));
        }
        let discoverer_core = Arc::new(DiscovererCore {
            api: core.api.clone(),
            handle: Guarded::new(ptr),
            id: ObjectId::from_ptr(ptr),
            registry: core.renderer_events.clone(),
            cb_ctx: AtomicPtr::new(std::ptr::null_mut()),
        });

        let ctx = Arc::new(DiscovererCtx {
            core: Arc::downgrade(&discoverer_core),
        });
        let ctx_ptr = Arc::into_raw(ctx) as *mut DiscovererCtx;
        for event_type in RENDERER_EVENT_TYPES {
            let rc = discoverer_core.api.discoverer_event_attach(
                ptr,
                *event_type,
                renderer_event_callback,
                ctx_ptr as *mut c_void,
            );
            if rc != 0 {
                tracing::debug!(event_type, rc, "discoverer event attach rejected");
            }
        }
        discoverer_core.cb_ctx.store(ctx_ptr, Ordering::Release);

        Ok(Self {
            core: discoverer_core,
        })
    }

    /// Starts discovery. Returns `Ok(true)` when libvlc accepted the
    /// request.
    pub fn start(&self) -> Result<bool> {
        let ptr = self.core.handle.get()?;
        Ok(self.core.api.discoverer_start(ptr) == 0)
    }

    /// Stops discovery.
    pub fn stop(&self) -> Result<()> {
        let ptr = self.core.handle.get()?;
        self.core.api.discoverer_stop(ptr);
        Ok(())
    }

    /// Registers a listener for this discoverer's events.
    pub fn register(&self, listener: Arc<dyn RendererDiscovererEventListener>) -> Result<()> {
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
    pub fn unregister(&self, listener: &Arc<dyn RendererDiscovererEventListener>) -> Result<()> {
        self.core.handle.get()?;
        self.core.registry.unregister(self.core.id, listener);
        Ok(())
    }

    /// Releases the native handle now. Idempotent.
    pub fn release(&self) {
        self.core.release();
    }

    fn deliver(&self, raw: &sys::libvlc_event_t) {
        match decode_renderer_event(&self.core.api, raw) {
            Ok(event) => {
                self.core
                    .registry
                    .dispatch(self.core.id, &event, |listener, event| {
                        listener.on_renderer_event(self, event)
                    });
            }
            Err(err) => {
                tracing::error!(code = raw.r#type, "renderer event decode failed: {err}");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn raw(&self) -> Result<*mut sys::libvlc_renderer_discoverer_t> {
        self.core.handle.get()
    }
}

/// An owned reference to a discovered renderer.
///
/// Each value holds its own native reference, released on drop, so items
/// can outlive the event that delivered them and the discoverer itself.
pub struct RendererItem {
    api: Arc<dyn NativeApi>,
    handle: Guarded<sys::libvlc_renderer_item_t>,
}

impl RendererItem {
    /// Retains `ptr` and wraps it. `ptr` must be a valid renderer item.
    pub(crate) fn hold(api: Arc<dyn NativeApi>, ptr: *mut sys::libvlc_renderer_item_t) -> Self {
        let held = api.item_hold(ptr);
        Self {
            api,
            handle: Guarded::new(held),
        }
    }

    /// The renderer's human-readable name, if it advertises one.
    pub fn name(&self) -> Result<Option<String>> {
        Ok(self.api.item_name(self.handle.get()?))
    }

    /// The renderer's kind, such as `"chromecast"`.
    pub fn kind(&self) -> Result<Option<String>> {
        Ok(self.api.item_kind(self.handle.get()?))
    }
}

impl Drop for RendererItem {
    fn drop(&mut self) {
        if let Some(ptr) = self.handle.take() {
            self.api.item_release(ptr);
        }
    }
}

impl fmt::Debug for RendererItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererItem")
            .field("name", &self.name().ok().flatten())
            .field("kind", &self.kind().ok().flatten())
            .finish()
    }
}

//! The libvlc instance: factory for media, players and discoverers, and
//! owner of the per-object-class listener registries.

use std::ffi::CString;
use std::sync::Arc;

use rvlc_sys as sys;

use crate::events::{MediaEventListener, MediaPlayerEventListener, RendererDiscovererEventListener};
use crate::native::{DynamicApi, Guarded, NativeApi};
use crate::registry::EventRegistry;
use crate::{Error, Result};

/// Arguments passed to `libvlc_new`.
#[derive(Default)]
pub struct InstanceArgs {
    args: Vec<CString>,
}

impl InstanceArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw libvlc argument (e.g. `"--no-video"`).
    pub fn arg(mut self, arg: &str) -> Result<Self> {
        self.args.push(CString::new(arg)?);
        Ok(self)
    }

    /// Forbids all network access for metadata and cover art, regardless of
    /// the parse flags later passed to [`crate::Media::parse_with`].
    pub fn no_metadata_network_access(mut self) -> Self {
        self.args.push(c"--no-metadata-network-access".to_owned());
        self
    }

    pub(crate) fn as_slice(&self) -> &[CString] {
        &self.args
    }
}

pub(crate) struct InstanceCore {
    pub(crate) api: Arc<dyn NativeApi>,
    pub(crate) handle: Guarded<sys::libvlc_instance_t>,
    pub(crate) media_events: Arc<EventRegistry<dyn MediaEventListener>>,
    pub(crate) player_events: Arc<EventRegistry<dyn MediaPlayerEventListener>>,
    pub(crate) renderer_events: Arc<EventRegistry<dyn RendererDiscovererEventListener>>,
}

impl InstanceCore {
    fn release(&self) {
        if let Some(ptr) = self.handle.take() {
            self.api.instance_release(ptr);
        }
    }
}

impl Drop for InstanceCore {
    fn drop(&mut self) {
        self.release();
    }
}

/// An owned libvlc instance.
///
/// Cloning is cheap and shares the one underlying native handle; the handle
/// is released when the last clone drops, or eagerly via [`release`].
/// The instance also owns the listener registries for every object class,
/// tying their lifetime to library init/shutdown.
///
/// [`release`]: Instance::release
#[derive(Clone)]
pub struct Instance {
    core: Arc<InstanceCore>,
}

impl Instance {
    /// Loads libvlc and creates an instance with default arguments.
    pub fn new() -> Result<Self> {
        Self::with_args(InstanceArgs::new())
    }

    /// Loads libvlc and creates an instance with the given arguments.
    pub fn with_args(args: InstanceArgs) -> Result<Self> {
        Self::from_api(Arc::new(DynamicApi::load()?), args)
    }

    pub(crate) fn from_api(api: Arc<dyn NativeApi>, args: InstanceArgs) -> Result<Self> {
        let ptr = api.instance_new(args.as_slice());
        if ptr.is_null() {
            return Err(Error::NullHandle("instance"));
        }
        Ok(Self {
            core: Arc::new(InstanceCore {
                api,
                handle: Guarded::new(ptr),
                media_events: Arc::new(EventRegistry::new()),
                player_events: Arc::new(EventRegistry::new()),
                renderer_events: Arc::new(EventRegistry::new()),
            }),
        })
    }

    /// Releases the native instance now. Idempotent; any later operation
    /// needing the handle fails with [`Error::Released`].
    pub fn release(&self) {
        self.core.release();
    }

    pub(crate) fn core(&self) -> &Arc<InstanceCore> {
        &self.core
    }
}

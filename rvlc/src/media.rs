//! Media objects and the parse/status service.

use std::ffi::CString;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicPtr, AtomicU8, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Weak};

use libc::c_void;
use parking_lot::Mutex;
use rvlc_sys as sys;

use crate::enums::{ParseFlag, ParsedStatus};
use crate::events::{decode_media_event, MediaEvent, MediaEventListener};
use crate::instance::Instance;
use crate::native::{Guarded, NativeApi};
use crate::registry::{EventRegistry, ObjectId};
use crate::{Error, Result};

/// Event types attached for every media object.
const MEDIA_EVENT_TYPES: &[i32] = &[
    sys::libvlc_MediaMetaChanged,
    sys::libvlc_MediaDurationChanged,
    sys::libvlc_MediaParsedChanged,
    sys::libvlc_MediaStateChanged,
];

// Binding-side parse progress, consulted only while the native parsed
// status still reads "none".
const PARSE_IDLE: u8 = 0;
const PARSE_REQUESTED: u8 = 1;
const PARSE_STOPPED: u8 = 2;

pub(crate) struct MediaCore {
    api: Arc<dyn NativeApi>,
    handle: Guarded<sys::libvlc_media_t>,
    id: ObjectId,
    registry: Arc<EventRegistry<dyn MediaEventListener>>,
    parse_state: AtomicU8,
    /// `Arc::into_raw` of the callback context handed to libvlc; swapped to
    /// NULL and reclaimed on release, after the events are detached.
    cb_ctx: AtomicPtr<MediaCtx>,
}

struct MediaCtx {
    core: Weak<MediaCore>,
}

impl MediaCore {
    fn release(&self) {
        if let Some(ptr) = self.handle.take() {
            let ctx = self.cb_ctx.swap(std::ptr::null_mut(), Ordering::AcqRel);
            if !ctx.is_null() {
                for event_type in MEDIA_EVENT_TYPES {
                    self.api.media_event_detach(
                        ptr,
                        *event_type,
                        media_event_callback,
                        ctx as *mut c_void,
                    );
                }
                // Detach has completed, so no callback can still be inside
                // the context.
                drop(unsafe { Arc::from_raw(ctx) });
            }
            self.registry.remove_object(self.id);
            self.api.media_release(ptr);
        }
    }
}

impl Drop for MediaCore {
    fn drop(&mut self) {
        self.release();
    }
}

/// Entry point libvlc invokes for media events, on a thread it owns.
unsafe extern "C" fn media_event_callback(raw: *const sys::libvlc_event_t, opaque: *mut c_void) {
    let _ = panic::catch_unwind(AssertUnwindSafe(|| {
        if raw.is_null() || opaque.is_null() {
            return;
        }
        let ctx = unsafe { &*(opaque as *const MediaCtx) };
        if let Some(core) = ctx.core.upgrade() {
            let media = Media { core };
            media.deliver(unsafe { &*raw });
        }
    }));
}

/// An owned media object.
///
/// Cloning shares the one underlying native handle. Parsing is always
/// asynchronous: call [`parse`](Media::parse) (or a variant) and wait for a
/// [`MediaEvent::ParsedChanged`] with a terminal status before reading
/// metadata. Once a media reaches a terminal status it will never be parsed
/// again; repeated parse calls are forwarded to libvlc, which treats them
/// as no-ops.
#[derive(Clone)]
pub struct Media {
    pub(crate) core: Arc<MediaCore>,
}

impl Media {
    /// Creates a media from a media resource locator such as
    /// `"https://example.com/stream.mp4"`.
    pub fn from_location(instance: &Instance, mrl: &str) -> Result<Self> {
        let mrl = CString::new(mrl)?;
        let core = instance.core();
        let ptr = core.api.media_new_location(core.handle.get()?, &mrl);
        Self::from_handle(core.api.clone(), core.media_events.clone(), ptr)
    }

    /// Creates a media from a local filesystem path.
    pub fn from_path(instance: &Instance, path: &str) -> Result<Self> {
        let path = CString::new(path)?;
        let core = instance.core();
        let ptr = core.api.media_new_path(core.handle.get()?, &path);
        Self::from_handle(core.api.clone(), core.media_events.clone(), ptr)
    }

    fn from_handle(
        api: Arc<dyn NativeApi>,
        registry: Arc<EventRegistry<dyn MediaEventListener>>,
        ptr: *mut sys::libvlc_media_t,
    ) -> Result<Self> {
        if ptr.is_null() {
            return Err(Error::NullHandle("media"));
        }
        let core = Arc::new(MediaCore {
            api,
            handle: Guarded::new(ptr),
            id: ObjectId::from_ptr(ptr),
            registry,
            parse_state: AtomicU8::new(PARSE_IDLE),
            cb_ctx: AtomicPtr::new(std::ptr::null_mut()),
        });

        let ctx = Arc::new(MediaCtx {
            core: Arc::downgrade(&core),
        });
        let ctx_ptr = Arc::into_raw(ctx) as *mut MediaCtx;
        for event_type in MEDIA_EVENT_TYPES {
            let rc = core.api.media_event_attach(
                ptr,
                *event_type,
                media_event_callback,
                ctx_ptr as *mut c_void,
            );
            if rc != 0 {
                tracing::debug!(event_type, rc, "media event attach rejected");
            }
        }
        core.cb_ctx.store(ctx_ptr, Ordering::Release);

        Ok(Self { core })
    }

    /// Requests asynchronous parsing with the default preparse timeout and
    /// no flags. Equivalent to `parse_with(-1, &[])`.
    pub fn parse(&self) -> Result<bool> {
        self.parse_with(-1, &[])
    }

    /// Requests asynchronous parsing of this media.
    ///
    /// `timeout_ms` of 0 waits indefinitely, -1 uses the native
    /// "preparse-timeout" default, and positive values are milliseconds.
    /// Returns `Ok(true)` when libvlc accepted the request; completion is
    /// signalled later by a [`MediaEvent::ParsedChanged`] event.
    ///
    /// Parsing may fetch metadata and cover art over the network when
    /// [`ParseFlag::FetchNetwork`] is set. To rule out remote requests,
    /// omit that flag or create the instance with
    /// [`crate::InstanceArgs::no_metadata_network_access`]. Cover art may
    /// still appear in the local VLC cache when it was embedded in the
    /// media itself.
    pub fn parse_with(&self, timeout_ms: i32, flags: &[ParseFlag]) -> Result<bool> {
        let ptr = self.core.handle.get()?;
        let rc = self.core.api.media_parse_with_options(
            ptr,
            ParseFlag::flags_to_int(flags),
            timeout_ms,
        );
        let accepted = rc == 0;
        if accepted {
            self.core
                .parse_state
                .store(PARSE_REQUESTED, Ordering::Release);
        }
        Ok(accepted)
    }

    /// Requests cancellation of an in-flight parse. A no-op when nothing is
    /// being parsed. A stopped parse surfaces as [`ParsedStatus::Failed`]
    /// unless the completion event won the race.
    pub fn parse_stop(&self) -> Result<()> {
        let ptr = self.core.handle.get()?;
        self.core.api.media_parse_stop(ptr);
        let _ = self.core.parse_state.compare_exchange(
            PARSE_REQUESTED,
            PARSE_STOPPED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        Ok(())
    }

    /// Reads the current parse status without blocking.
    pub fn parsed_status(&self) -> Result<ParsedStatus> {
        let ptr = self.core.handle.get()?;
        let raw = self.core.api.media_parsed_status(ptr);
        if raw != sys::libvlc_media_parsed_status_none {
            return Ok(ParsedStatus::from_raw(raw));
        }
        Ok(match self.core.parse_state.load(Ordering::Acquire) {
            PARSE_REQUESTED => ParsedStatus::Parsing,
            PARSE_STOPPED => ParsedStatus::Failed,
            _ => ParsedStatus::NotParsed,
        })
    }

    /// Requests parsing and returns a channel that yields the terminal
    /// status once the completion event arrives, as an alternative to
    /// polling [`parsed_status`](Media::parsed_status).
    ///
    /// The receiver resolves immediately when the media is already in a
    /// terminal status. When libvlc rejects the request, the receiver
    /// resolves with the current status instead, which may not be terminal.
    pub fn parse_await(
        &self,
        timeout_ms: i32,
        flags: &[ParseFlag],
    ) -> Result<mpsc::Receiver<ParsedStatus>> {
        let (tx, rx) = mpsc::channel();

        let current = self.parsed_status()?;
        if current.is_terminal() {
            let _ = tx.send(current);
            return Ok(rx);
        }

        let completion = Arc::new_cyclic(|weak: &Weak<ParseCompletion>| ParseCompletion {
            tx: Mutex::new(Some(tx)),
            this: weak.clone(),
        });
        let as_listener: Arc<dyn MediaEventListener> = completion.clone();
        self.register(as_listener.clone())?;

        // The completion event can fire between the status poll above and
        // the registration. libvlc writes the status before firing, so a
        // terminal status read here means that event is already lost and no
        // further one will arrive.
        let current = self.parsed_status()?;
        if current.is_terminal() {
            self.unregister(&as_listener)?;
            if let Some(tx) = completion.tx.lock().take() {
                let _ = tx.send(current);
            }
            return Ok(rx);
        }

        if !self.parse_with(timeout_ms, flags)? {
            // Nothing will complete; resolve with whatever libvlc reports.
            self.unregister(&as_listener)?;
            if let Some(tx) = completion.tx.lock().take() {
                let _ = tx.send(self.parsed_status()?);
            }
        }
        Ok(rx)
    }

    /// Registers a listener for this media's events. Duplicates are
    /// allowed; each registration is invoked separately, in order.
    pub fn register(&self, listener: Arc<dyn MediaEventListener>) -> Result<()> {
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
    pub fn unregister(&self, listener: &Arc<dyn MediaEventListener>) -> Result<()> {
        self.core.handle.get()?;
        self.core.registry.unregister(self.core.id, listener);
        Ok(())
    }

    /// Releases the native handle now. Idempotent; any later operation
    /// fails with [`Error::Released`].
    pub fn release(&self) {
        self.core.release();
    }

    pub(crate) fn raw(&self) -> Result<*mut sys::libvlc_media_t> {
        self.core.handle.get()
    }

    fn deliver(&self, raw: &sys::libvlc_event_t) {
        match decode_media_event(raw) {
            Ok(event) => {
                self.core
                    .registry
                    .dispatch(self.core.id, &event, |listener, event| {
                        listener.on_media_event(self, event)
                    });
            }
            Err(err) => {
                tracing::error!(code = raw.r#type, "media event decode failed: {err}");
            }
        }
    }
}

/// One-shot listener backing [`Media::parse_await`]; unregisters itself
/// once the terminal status has been delivered.
struct ParseCompletion {
    tx: Mutex<Option<mpsc::Sender<ParsedStatus>>>,
    this: Weak<ParseCompletion>,
}

impl MediaEventListener for ParseCompletion {
    fn on_media_event(&self, media: &Media, event: &MediaEvent) {
        let MediaEvent::ParsedChanged(status) = event else {
            return;
        };
        if !status.is_terminal() {
            return;
        }
        if let Some(tx) = self.tx.lock().take() {
            let _ = tx.send(*status);
        }
        if let Some(me) = self.this.upgrade() {
            let _ = media.unregister(&(me as Arc<dyn MediaEventListener>));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::InstanceArgs;
    use crate::native::mock::MockApi;
    use std::time::Duration;

    struct Recorder {
        events: Mutex<Vec<MediaEvent>>,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
            })
        }
    }

    impl MediaEventListener for Recorder {
        fn on_media_event(&self, _media: &Media, event: &MediaEvent) {
            self.events.lock().push(event.clone());
        }
    }

    fn fixture() -> (Arc<MockApi>, Media) {
        let mock = MockApi::new();
        let instance = Instance::from_api(mock.clone(), InstanceArgs::new()).unwrap();
        let media = Media::from_path(&instance, "/tmp/test.mp4").unwrap();
        (mock, media)
    }

    fn fire_parsed_changed(mock: &MockApi, media: &Media, status: i32) {
        let mut raw = sys::libvlc_event_t::new(
            sys::libvlc_MediaParsedChanged,
            media.raw().unwrap() as *mut c_void,
        );
        raw.u.media_parsed_changed = sys::media_parsed_changed { new_status: status };
        mock.fire(&raw);
    }

    #[test]
    fn parse_uses_default_timeout_and_empty_flags() {
        let (mock, media) = fixture();
        assert!(media.parse().unwrap());
        assert_eq!(*mock.parse_calls.lock(), vec![(0, -1)]);
    }

    #[test]
    fn parse_with_ors_flags_and_forwards_timeout() {
        let (mock, media) = fixture();
        media
            .parse_with(5000, &[ParseFlag::ParseNetwork, ParseFlag::FetchNetwork])
            .unwrap();
        assert_eq!(*mock.parse_calls.lock(), vec![(0x1 | 0x4, 5000)]);
    }

    #[test]
    fn parse_reports_native_rejection_as_false() {
        let (mock, media) = fixture();
        mock.parse_return.store(-1, Ordering::Relaxed);
        assert!(!media.parse().unwrap());
        // A rejected request does not make the media look like it is
        // parsing.
        assert_eq!(media.parsed_status().unwrap(), ParsedStatus::NotParsed);
    }

    #[test]
    fn repeat_parse_forwards_native_result_without_caching() {
        let (mock, media) = fixture();
        assert!(media.parse().unwrap());
        fire_parsed_changed(&mock, &media, sys::libvlc_media_parsed_status_done);
        mock.status_return
            .store(sys::libvlc_media_parsed_status_done, Ordering::Relaxed);

        // libvlc accepts the call but will not re-parse; the binding
        // forwards the literal result and the status stays terminal.
        assert!(media.parse().unwrap());
        assert_eq!(mock.parse_calls.lock().len(), 2);
        assert_eq!(media.parsed_status().unwrap(), ParsedStatus::Done);
    }

    #[test]
    fn status_reports_parsing_while_request_in_flight() {
        let (_mock, media) = fixture();
        assert_eq!(media.parsed_status().unwrap(), ParsedStatus::NotParsed);
        media.parse().unwrap();
        assert_eq!(media.parsed_status().unwrap(), ParsedStatus::Parsing);
    }

    #[test]
    fn stop_without_parse_in_flight_is_a_noop() {
        let (mock, media) = fixture();
        media.parse_stop().unwrap();
        assert_eq!(mock.counters.lock().parse_stops, 1);
        assert_eq!(media.parsed_status().unwrap(), ParsedStatus::NotParsed);
    }

    #[test]
    fn stop_during_parse_reports_failed() {
        let (_mock, media) = fixture();
        media.parse().unwrap();
        media.parse_stop().unwrap();
        assert_eq!(media.parsed_status().unwrap(), ParsedStatus::Failed);
    }

    #[test]
    fn native_terminal_status_wins_over_stop_flag() {
        let (mock, media) = fixture();
        media.parse().unwrap();
        media.parse_stop().unwrap();
        mock.status_return
            .store(sys::libvlc_media_parsed_status_done, Ordering::Relaxed);
        assert_eq!(media.parsed_status().unwrap(), ParsedStatus::Done);
    }

    #[test]
    fn listeners_receive_parsed_changed_in_order() {
        let (mock, media) = fixture();
        let first = Recorder::new();
        let second = Recorder::new();
        media.register(first.clone()).unwrap();
        media.register(second.clone()).unwrap();

        fire_parsed_changed(&mock, &media, sys::libvlc_media_parsed_status_done);

        assert_eq!(
            *first.events.lock(),
            vec![MediaEvent::ParsedChanged(ParsedStatus::Done)]
        );
        assert_eq!(
            *second.events.lock(),
            vec![MediaEvent::ParsedChanged(ParsedStatus::Done)]
        );
    }

    #[test]
    fn unregistered_listener_is_not_invoked() {
        let (mock, media) = fixture();
        let first = Recorder::new();
        let second = Recorder::new();
        media.register(first.clone()).unwrap();
        media.register(second.clone()).unwrap();
        media
            .unregister(&(first.clone() as Arc<dyn MediaEventListener>))
            .unwrap();

        fire_parsed_changed(&mock, &media, sys::libvlc_media_parsed_status_done);

        assert!(first.events.lock().is_empty());
        assert_eq!(second.events.lock().len(), 1);
    }

    #[test]
    fn parse_await_resolves_on_completion_event() {
        let (mock, media) = fixture();
        let rx = media.parse_await(-1, &[]).unwrap();

        fire_parsed_changed(&mock, &media, sys::libvlc_media_parsed_status_done);

        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            ParsedStatus::Done
        );
        // The one-shot listener cleaned itself up.
        assert_eq!(media.core.registry.listener_count(media.core.id), 0);
    }

    #[test]
    fn parse_await_resolves_immediately_for_terminal_media() {
        let (mock, media) = fixture();
        mock.status_return
            .store(sys::libvlc_media_parsed_status_failed, Ordering::Relaxed);

        let rx = media.parse_await(-1, &[]).unwrap();

        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            ParsedStatus::Failed
        );
        assert!(mock.parse_calls.lock().is_empty());
    }

    #[test]
    fn parse_await_resolves_when_completion_precedes_registration() {
        let (mock, media) = fixture();
        // Non-terminal at the first poll, terminal by the time the listener
        // is registered; the completion event itself is never delivered.
        mock.status_sequence.lock().extend([
            sys::libvlc_media_parsed_status_none,
            sys::libvlc_media_parsed_status_done,
        ]);

        let rx = media.parse_await(-1, &[]).unwrap();

        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            ParsedStatus::Done
        );
        assert_eq!(media.core.registry.listener_count(media.core.id), 0);
        assert!(mock.parse_calls.lock().is_empty());
    }

    #[test]
    fn parse_await_rejection_delivers_current_status() {
        let (mock, media) = fixture();
        media.parse().unwrap();
        mock.parse_return.store(-1, Ordering::Relaxed);

        let rx = media.parse_await(-1, &[]).unwrap();

        // The earlier request is still in flight, so the resolved status is
        // not terminal.
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            ParsedStatus::Parsing
        );
        assert_eq!(media.core.registry.listener_count(media.core.id), 0);
    }

    #[test]
    fn parse_await_resolves_when_native_rejects() {
        let (mock, media) = fixture();
        mock.parse_return.store(-1, Ordering::Relaxed);

        let rx = media.parse_await(-1, &[]).unwrap();

        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            ParsedStatus::NotParsed
        );
        assert_eq!(media.core.registry.listener_count(media.core.id), 0);
    }

    #[test]
    fn registration_racing_release_leaves_no_listeners_behind() {
        for _ in 0..100 {
            let (_mock, media) = fixture();
            let id = media.core.id;
            let registry = Arc::clone(&media.core.registry);

            let registrar = {
                let media = media.clone();
                std::thread::spawn(move || {
                    let _ = media.register(Recorder::new());
                })
            };
            let releaser = {
                let media = media.clone();
                std::thread::spawn(move || media.release())
            };
            registrar.join().unwrap();
            releaser.join().unwrap();

            // Whatever the interleaving, a released media keeps no
            // registrations alive.
            assert_eq!(registry.listener_count(id), 0);
        }
    }

    #[test]
    fn operations_after_release_fail_fast() {
        let (_mock, media) = fixture();
        media.release();

        assert!(matches!(media.parse(), Err(Error::Released)));
        assert!(matches!(media.parse_stop(), Err(Error::Released)));
        assert!(matches!(media.parsed_status(), Err(Error::Released)));
        assert!(matches!(
            media.register(Recorder::new()),
            Err(Error::Released)
        ));
    }

    #[test]
    fn release_detaches_events_and_is_idempotent() {
        let (mock, media) = fixture();
        let object = media.raw().unwrap() as *mut c_void;
        assert_eq!(mock.attachment_count(object), MEDIA_EVENT_TYPES.len());

        media.release();
        media.release();

        assert_eq!(mock.attachment_count(object), 0);
        assert_eq!(mock.counters.lock().media_released, 1);
    }

    #[test]
    fn events_after_release_are_dropped() {
        let (mock, media) = fixture();
        let recorder = Recorder::new();
        media.register(recorder.clone()).unwrap();
        let object = media.raw().unwrap() as *mut c_void;
        media.release();

        // The mock no longer has attachments, so firing at the old object
        // reaches nothing.
        let mut raw = sys::libvlc_event_t::new(sys::libvlc_MediaParsedChanged, object);
        raw.u.media_parsed_changed = sys::media_parsed_changed {
            new_status: sys::libvlc_media_parsed_status_done,
        };
        mock.fire(&raw);

        assert!(recorder.events.lock().is_empty());
    }

    #[test]
    fn meta_and_duration_events_are_decoded() {
        let (mock, media) = fixture();
        let recorder = Recorder::new();
        media.register(recorder.clone()).unwrap();
        let object = media.raw().unwrap() as *mut c_void;

        let mut meta = sys::libvlc_event_t::new(sys::libvlc_MediaMetaChanged, object);
        meta.u.media_meta_changed = sys::media_meta_changed { meta_type: 1 };
        mock.fire(&meta);

        let mut duration = sys::libvlc_event_t::new(sys::libvlc_MediaDurationChanged, object);
        duration.u.media_duration_changed = sys::media_duration_changed { new_duration: 90_000 };
        mock.fire(&duration);

        assert_eq!(
            *recorder.events.lock(),
            vec![
                MediaEvent::MetaChanged(crate::enums::Meta::Artist),
                MediaEvent::DurationChanged(90_000),
            ]
        );
    }
}

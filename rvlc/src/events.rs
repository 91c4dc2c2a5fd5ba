//! Typed events decoded from native event records.
//!
//! Each native object class has a closed event enum; the `decode_*`
//! functions demultiplex a raw `libvlc_event_t` by its type code and copy
//! the variant-specific payload out of the union before the callback
//! returns. An event-type code without a variant here means the binding and
//! the installed libvlc disagree about what was attached, so decoding fails
//! loudly instead of guessing.

use std::ffi::CStr;
use std::sync::Arc;

use rvlc_sys as sys;

use crate::enums::{MediaState, Meta, ParsedStatus};
use crate::media::Media;
use crate::native::NativeApi;
use crate::player::MediaPlayer;
use crate::renderer::{RendererDiscoverer, RendererItem};

/// Failure to translate a native event record into a typed event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unrecognized native event type code {0:#x}")]
    UnknownEventType(i32),

    #[error("native event payload field `{0}` was NULL")]
    NullPayload(&'static str),
}

/// Events emitted by a [`Media`].
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// A metadata field changed (or became available after parsing).
    MetaChanged(Meta),
    /// The media duration changed, in milliseconds.
    DurationChanged(i64),
    /// Asynchronous parsing reached a new status. Terminal statuses mean
    /// the media will never be parsed again.
    ParsedChanged(ParsedStatus),
    /// The playback state of the media changed.
    StateChanged(MediaState),
}

/// Events emitted by a [`MediaPlayer`].
#[derive(Debug, Clone, PartialEq)]
pub enum MediaPlayerEvent {
    Playing,
    Paused,
    Stopped,
    EndReached,
    EncounteredError,
    /// Playback time moved, in milliseconds.
    TimeChanged(i64),
    /// Playback position moved, as a fraction in `0.0..=1.0`.
    PositionChanged(f32),
    /// A video snapshot was written to `filename`.
    SnapshotTaken { filename: String },
}

/// Events emitted by a [`RendererDiscoverer`].
///
/// Item events carry a freshly owned [`RendererItem`]: the native item
/// sub-handle is retained when the event is decoded and released when the
/// event is dropped.
#[derive(Debug)]
pub enum RendererDiscovererEvent {
    ItemAdded(RendererItem),
    ItemDeleted(RendererItem),
}

/// Receives [`MediaEvent`]s, synchronously on the delivering thread.
///
/// Implementations must not block: a slow listener delays every later
/// listener and further event delivery on that channel.
pub trait MediaEventListener: Send + Sync {
    fn on_media_event(&self, media: &Media, event: &MediaEvent);
}

/// Receives [`MediaPlayerEvent`]s, synchronously on the delivering thread.
pub trait MediaPlayerEventListener: Send + Sync {
    fn on_player_event(&self, player: &MediaPlayer, event: &MediaPlayerEvent);
}

/// Receives [`RendererDiscovererEvent`]s, synchronously on the delivering
/// thread.
pub trait RendererDiscovererEventListener: Send + Sync {
    fn on_renderer_event(&self, discoverer: &RendererDiscoverer, event: &RendererDiscovererEvent);
}

/// Decodes a raw record delivered for a media object.
pub(crate) fn decode_media_event(raw: &sys::libvlc_event_t) -> Result<MediaEvent, DecodeError> {
    // Union reads are keyed by the event type code, per the libvlc contract.
    match raw.r#type {
        sys::libvlc_MediaMetaChanged => {
            let meta = unsafe { raw.u.media_meta_changed.meta_type };
            Ok(MediaEvent::MetaChanged(Meta::from_raw(meta)))
        }
        sys::libvlc_MediaDurationChanged => {
            let duration = unsafe { raw.u.media_duration_changed.new_duration };
            Ok(MediaEvent::DurationChanged(duration))
        }
        sys::libvlc_MediaParsedChanged => {
            let status = unsafe { raw.u.media_parsed_changed.new_status };
            Ok(MediaEvent::ParsedChanged(ParsedStatus::from_raw(status)))
        }
        sys::libvlc_MediaStateChanged => {
            let state = unsafe { raw.u.media_state_changed.new_state };
            Ok(MediaEvent::StateChanged(MediaState::from_raw(state)))
        }
        other => Err(DecodeError::UnknownEventType(other)),
    }
}

/// Decodes a raw record delivered for a media player.
pub(crate) fn decode_player_event(
    raw: &sys::libvlc_event_t,
) -> Result<MediaPlayerEvent, DecodeError> {
    match raw.r#type {
        sys::libvlc_MediaPlayerPlaying => Ok(MediaPlayerEvent::Playing),
        sys::libvlc_MediaPlayerPaused => Ok(MediaPlayerEvent::Paused),
        sys::libvlc_MediaPlayerStopped => Ok(MediaPlayerEvent::Stopped),
        sys::libvlc_MediaPlayerEndReached => Ok(MediaPlayerEvent::EndReached),
        sys::libvlc_MediaPlayerEncounteredError => Ok(MediaPlayerEvent::EncounteredError),
        sys::libvlc_MediaPlayerTimeChanged => {
            let time = unsafe { raw.u.media_player_time_changed.new_time };
            Ok(MediaPlayerEvent::TimeChanged(time))
        }
        sys::libvlc_MediaPlayerPositionChanged => {
            let position = unsafe { raw.u.media_player_position_changed.new_position };
            Ok(MediaPlayerEvent::PositionChanged(position))
        }
        sys::libvlc_MediaPlayerSnapshotTaken => {
            let ptr = unsafe { raw.u.media_player_snapshot_taken.psz_filename };
            if ptr.is_null() {
                return Err(DecodeError::NullPayload("psz_filename"));
            }
            // The string is only valid for the duration of the callback;
            // copy it out.
            let filename = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
            Ok(MediaPlayerEvent::SnapshotTaken { filename })
        }
        other => Err(DecodeError::UnknownEventType(other)),
    }
}

/// Decodes a raw record delivered for a renderer discoverer, promoting the
/// item sub-handle to an owned [`RendererItem`].
pub(crate) fn decode_renderer_event(
    api: &Arc<dyn NativeApi>,
    raw: &sys::libvlc_event_t,
) -> Result<RendererDiscovererEvent, DecodeError> {
    match raw.r#type {
        sys::libvlc_RendererDiscovererItemAdded => {
            let item = unsafe { raw.u.renderer_discoverer_item_added.item };
            if item.is_null() {
                return Err(DecodeError::NullPayload("item"));
            }
            Ok(RendererDiscovererEvent::ItemAdded(RendererItem::hold(
                Arc::clone(api),
                item,
            )))
        }
        sys::libvlc_RendererDiscovererItemDeleted => {
            let item = unsafe { raw.u.renderer_discoverer_item_deleted.item };
            if item.is_null() {
                return Err(DecodeError::NullPayload("item"));
            }
            Ok(RendererDiscovererEvent::ItemDeleted(RendererItem::hold(
                Arc::clone(api),
                item,
            )))
        }
        other => Err(DecodeError::UnknownEventType(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::mock::MockApi;
    use std::ptr;

    #[test]
    fn decodes_parsed_changed() {
        let mut raw = sys::libvlc_event_t::new(sys::libvlc_MediaParsedChanged, ptr::null_mut());
        raw.u.media_parsed_changed = sys::media_parsed_changed {
            new_status: sys::libvlc_media_parsed_status_done,
        };

        let event = decode_media_event(&raw).unwrap();
        assert_eq!(event, MediaEvent::ParsedChanged(ParsedStatus::Done));
    }

    #[test]
    fn decodes_snapshot_filename_exactly() {
        let filename = c"/tmp/frame-0001.png";
        let mut raw =
            sys::libvlc_event_t::new(sys::libvlc_MediaPlayerSnapshotTaken, ptr::null_mut());
        raw.u.media_player_snapshot_taken = sys::media_player_snapshot_taken {
            psz_filename: filename.as_ptr() as *mut _,
        };

        let event = decode_player_event(&raw).unwrap();
        assert_eq!(
            event,
            MediaPlayerEvent::SnapshotTaken {
                filename: "/tmp/frame-0001.png".to_owned()
            }
        );
    }

    #[test]
    fn snapshot_with_null_filename_is_a_decode_error() {
        let raw = sys::libvlc_event_t::new(sys::libvlc_MediaPlayerSnapshotTaken, ptr::null_mut());
        assert_eq!(
            decode_player_event(&raw),
            Err(DecodeError::NullPayload("psz_filename"))
        );
    }

    #[test]
    fn unknown_event_code_fails_loudly() {
        let raw = sys::libvlc_event_t::new(0x7fff, ptr::null_mut());
        assert_eq!(
            decode_media_event(&raw),
            Err(DecodeError::UnknownEventType(0x7fff))
        );
        assert_eq!(
            decode_player_event(&raw),
            Err(DecodeError::UnknownEventType(0x7fff))
        );
    }

    #[test]
    fn item_added_promotes_a_freshly_held_item() {
        let mock = MockApi::new();
        let api: Arc<dyn NativeApi> = mock.clone();
        let item_ptr = 0x2000 as *mut sys::libvlc_renderer_item_t;
        mock.item_names
            .lock()
            .insert(item_ptr as usize, "Living Room".to_owned());

        let mut raw =
            sys::libvlc_event_t::new(sys::libvlc_RendererDiscovererItemAdded, ptr::null_mut());
        raw.u.renderer_discoverer_item_added = sys::renderer_discoverer_item_added { item: item_ptr };

        let event = decode_renderer_event(&api, &raw).unwrap();
        assert_eq!(mock.counters.lock().item_holds, 1);

        match &event {
            RendererDiscovererEvent::ItemAdded(item) => {
                assert_eq!(item.name().unwrap().as_deref(), Some("Living Room"));
            }
            other => panic!("unexpected event: {other:?}"),
        }

        drop(event);
        assert_eq!(mock.counters.lock().item_releases, 1);
    }

    #[test]
    fn renderer_event_with_null_item_is_a_decode_error() {
        let mock = MockApi::new();
        let api: Arc<dyn NativeApi> = mock;
        let raw =
            sys::libvlc_event_t::new(sys::libvlc_RendererDiscovererItemDeleted, ptr::null_mut());
        match decode_renderer_event(&api, &raw) {
            Err(DecodeError::NullPayload("item")) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

//! Enumerations decoded from (or encoded to) native integer codes.

use rvlc_sys as sys;

/// Options controlling how a media is parsed, combined by bitwise OR into
/// the single flag integer libvlc expects.
///
/// The fetch flags decide where metadata and cover art may be looked up;
/// `FetchNetwork` permits remote requests and therefore has privacy
/// implications (see [`crate::Media::parse_with`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParseFlag {
    /// Parse media if it is a local file.
    ParseLocal,
    /// Parse media even if it is a network resource.
    ParseNetwork,
    /// Fetch metadata and cover art from local sources only.
    FetchLocal,
    /// Fetch metadata and cover art over the network.
    FetchNetwork,
    /// Allow interaction with the user (e.g. credentials dialogs).
    DoInteract,
}

impl ParseFlag {
    /// Native bit value of this flag.
    pub fn to_native(self) -> i32 {
        match self {
            ParseFlag::ParseLocal => sys::libvlc_media_parse_local,
            ParseFlag::ParseNetwork => sys::libvlc_media_parse_network,
            ParseFlag::FetchLocal => sys::libvlc_media_fetch_local,
            ParseFlag::FetchNetwork => sys::libvlc_media_fetch_network,
            ParseFlag::DoInteract => sys::libvlc_media_do_interact,
        }
    }

    /// ORs a set of flags into the integer passed to
    /// `libvlc_media_parse_with_options`. An empty set yields 0.
    pub fn flags_to_int(flags: &[ParseFlag]) -> i32 {
        flags.iter().fold(0, |acc, flag| acc | flag.to_native())
    }
}

/// Parse state of a media.
///
/// libvlc only ever reports "never parsed" (code 0) or one of the terminal
/// codes; `Parsing` is synthesized by the binding while a request it
/// accepted is still in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParsedStatus {
    /// No parse has been requested yet.
    NotParsed,
    /// A parse request was accepted and has not completed.
    Parsing,
    /// The native library skipped parsing this media.
    Skipped,
    /// Parsing failed, or an in-flight parse was stopped.
    Failed,
    /// Parsing hit the requested (or preparse default) timeout.
    Timeout,
    /// Parsing completed; metadata is available.
    Done,
}

impl ParsedStatus {
    /// Decodes the native `libvlc_media_parsed_status_t` code.
    ///
    /// Unknown codes fold to `NotParsed` so that status polling stays
    /// infallible across libvlc versions; event decoding, by contrast,
    /// fails loudly on unknown codes.
    pub(crate) fn from_raw(code: i32) -> Self {
        match code {
            sys::libvlc_media_parsed_status_none => ParsedStatus::NotParsed,
            sys::libvlc_media_parsed_status_skipped => ParsedStatus::Skipped,
            sys::libvlc_media_parsed_status_failed => ParsedStatus::Failed,
            sys::libvlc_media_parsed_status_timeout => ParsedStatus::Timeout,
            sys::libvlc_media_parsed_status_done => ParsedStatus::Done,
            other => {
                tracing::debug!(code = other, "unknown parsed status code");
                ParsedStatus::NotParsed
            }
        }
    }

    /// A media reaching a terminal status will never be parsed again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ParsedStatus::Skipped
                | ParsedStatus::Failed
                | ParsedStatus::Timeout
                | ParsedStatus::Done
        )
    }
}

/// Playback state of a media, from `libvlc_state_t`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaState {
    NothingSpecial,
    Opening,
    Buffering,
    Playing,
    Paused,
    Stopped,
    Ended,
    Error,
}

impl MediaState {
    pub(crate) fn from_raw(code: i32) -> Self {
        match code {
            0 => MediaState::NothingSpecial,
            1 => MediaState::Opening,
            2 => MediaState::Buffering,
            3 => MediaState::Playing,
            4 => MediaState::Paused,
            5 => MediaState::Stopped,
            6 => MediaState::Ended,
            7 => MediaState::Error,
            other => {
                tracing::debug!(code = other, "unknown media state code");
                MediaState::NothingSpecial
            }
        }
    }
}

/// Metadata kinds, from `libvlc_meta_t`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Meta {
    Title,
    Artist,
    Genre,
    Copyright,
    Album,
    TrackNumber,
    Description,
    Rating,
    Date,
    Setting,
    Url,
    Language,
    NowPlaying,
    Publisher,
    EncodedBy,
    ArtworkUrl,
    TrackId,
    TrackTotal,
    Director,
    Season,
    Episode,
    ShowName,
    Actors,
    AlbumArtist,
    DiscNumber,
    DiscTotal,
    /// A meta code this binding does not know about; the raw value is kept.
    Unknown(i32),
}

impl Meta {
    pub(crate) fn from_raw(code: i32) -> Self {
        match code {
            0 => Meta::Title,
            1 => Meta::Artist,
            2 => Meta::Genre,
            3 => Meta::Copyright,
            4 => Meta::Album,
            5 => Meta::TrackNumber,
            6 => Meta::Description,
            7 => Meta::Rating,
            8 => Meta::Date,
            9 => Meta::Setting,
            10 => Meta::Url,
            11 => Meta::Language,
            12 => Meta::NowPlaying,
            13 => Meta::Publisher,
            14 => Meta::EncodedBy,
            15 => Meta::ArtworkUrl,
            16 => Meta::TrackId,
            17 => Meta::TrackTotal,
            18 => Meta::Director,
            19 => Meta::Season,
            20 => Meta::Episode,
            21 => Meta::ShowName,
            22 => Meta::Actors,
            23 => Meta::AlbumArtist,
            24 => Meta::DiscNumber,
            25 => Meta::DiscTotal,
            other => Meta::Unknown(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_to_int_is_bitwise_or() {
        let flags = [ParseFlag::ParseNetwork, ParseFlag::FetchNetwork];
        assert_eq!(ParseFlag::flags_to_int(&flags), 0x1 | 0x4);

        let all = [
            ParseFlag::ParseLocal,
            ParseFlag::ParseNetwork,
            ParseFlag::FetchLocal,
            ParseFlag::FetchNetwork,
            ParseFlag::DoInteract,
        ];
        assert_eq!(ParseFlag::flags_to_int(&all), 0xf);
    }

    #[test]
    fn flags_to_int_empty_is_zero() {
        assert_eq!(ParseFlag::flags_to_int(&[]), 0);
        assert_eq!(ParseFlag::flags_to_int(&[ParseFlag::ParseLocal]), 0);
    }

    #[test]
    fn parsed_status_decodes_native_codes() {
        assert_eq!(ParsedStatus::from_raw(0), ParsedStatus::NotParsed);
        assert_eq!(ParsedStatus::from_raw(1), ParsedStatus::Skipped);
        assert_eq!(ParsedStatus::from_raw(2), ParsedStatus::Failed);
        assert_eq!(ParsedStatus::from_raw(3), ParsedStatus::Timeout);
        assert_eq!(ParsedStatus::from_raw(4), ParsedStatus::Done);
        // Forward compatibility: unknown codes never panic.
        assert_eq!(ParsedStatus::from_raw(99), ParsedStatus::NotParsed);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!ParsedStatus::NotParsed.is_terminal());
        assert!(!ParsedStatus::Parsing.is_terminal());
        assert!(ParsedStatus::Skipped.is_terminal());
        assert!(ParsedStatus::Failed.is_terminal());
        assert!(ParsedStatus::Timeout.is_terminal());
        assert!(ParsedStatus::Done.is_terminal());
    }

    #[test]
    fn meta_keeps_unknown_codes() {
        assert_eq!(Meta::from_raw(0), Meta::Title);
        assert_eq!(Meta::from_raw(25), Meta::DiscTotal);
        assert_eq!(Meta::from_raw(42), Meta::Unknown(42));
    }
}

//! # Playback Snapshot
//!
//! Immutable description of the player's state and the reducer that evolves
//! it in response to engine events.
//!
//! Every published value is complete. Engine events touch only the fields
//! they concern; everything else is carried over from the previous snapshot.
//! The only wholesale reset happens on media load ([`PlaybackSnapshot::reset_for_load`]).

use bridge_traits::{ChapterDescription, EngineEvent, MediaEngine, TrackDescription};
use serde::{Deserialize, Serialize};

/// Id used by the engine for "no track selected / disabled".
pub const NO_TRACK: i32 = -1;

/// Audio or subtitle track exposed to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub id: i32,
    pub name: String,
}

impl From<TrackDescription> for TrackInfo {
    fn from(track: TrackDescription) -> Self {
        let name = track
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Track {}", track.id));
        Self { id: track.id, name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterInfo {
    pub index: i32,
    pub name: String,
    pub time_offset_ms: i64,
    pub duration_ms: i64,
}

impl ChapterInfo {
    fn from_description(index: usize, chapter: ChapterDescription) -> Self {
        let index = i32::try_from(index).unwrap_or(i32::MAX);
        let name = chapter
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Chapter {}", index.saturating_add(1)));
        Self {
            index,
            name,
            time_offset_ms: chapter.time_offset_ms,
            duration_ms: chapter.duration_ms,
        }
    }
}

/// Full track/chapter enumeration read back from the engine.
///
/// Replaces the snapshot's lists and selections wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackListing {
    pub audio_tracks: Vec<TrackInfo>,
    pub subtitle_tracks: Vec<TrackInfo>,
    pub chapters: Vec<ChapterInfo>,
    pub current_audio_track_id: i32,
    pub current_subtitle_track_id: i32,
    pub current_chapter_index: i32,
}

impl TrackListing {
    pub fn read(engine: &dyn MediaEngine) -> Self {
        Self {
            audio_tracks: engine.audio_tracks().into_iter().map(TrackInfo::from).collect(),
            subtitle_tracks: engine.spu_tracks().into_iter().map(TrackInfo::from).collect(),
            chapters: engine
                .chapters()
                .into_iter()
                .enumerate()
                .map(|(index, chapter)| ChapterInfo::from_description(index, chapter))
                .collect(),
            current_audio_track_id: engine.audio_track(),
            current_subtitle_track_id: engine.spu_track(),
            current_chapter_index: engine.chapter(),
        }
    }
}

/// One complete, internally consistent view of playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub is_playing: bool,
    pub current_time_ms: i64,
    /// `0` while unknown
    pub duration_ms: i64,
    /// `[0, 100]`
    pub buffering_percent: f32,
    /// Always `buffering_percent < 100`
    pub is_buffering: bool,
    pub audio_tracks: Vec<TrackInfo>,
    pub subtitle_tracks: Vec<TrackInfo>,
    pub chapters: Vec<ChapterInfo>,
    pub current_audio_track_id: i32,
    pub current_subtitle_track_id: i32,
    pub current_chapter_index: i32,
    pub is_seekable: bool,
    /// Implies `!is_playing`
    pub is_ended: bool,
    pub playback_rate: f32,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            is_playing: false,
            current_time_ms: 0,
            duration_ms: 0,
            buffering_percent: 100.0,
            is_buffering: false,
            audio_tracks: Vec::new(),
            subtitle_tracks: Vec::new(),
            chapters: Vec::new(),
            current_audio_track_id: NO_TRACK,
            current_subtitle_track_id: NO_TRACK,
            current_chapter_index: NO_TRACK,
            is_seekable: false,
            is_ended: false,
            playback_rate: 1.0,
        }
    }
}

impl PlaybackSnapshot {
    /// Defaults for a freshly loaded media, keeping only the playback rate.
    pub fn reset_for_load(&self) -> Self {
        Self {
            playback_rate: self.playback_rate,
            ..Self::default()
        }
    }

    /// Replace track lists and selections with a fresh enumeration.
    pub fn with_track_listing(self, listing: TrackListing) -> Self {
        Self {
            audio_tracks: listing.audio_tracks,
            subtitle_tracks: listing.subtitle_tracks,
            chapters: listing.chapters,
            current_audio_track_id: listing.current_audio_track_id,
            current_subtitle_track_id: listing.current_subtitle_track_id,
            current_chapter_index: listing.current_chapter_index,
            ..self
        }
    }

    /// `true` when both a position and a duration are known.
    pub fn has_progress(&self) -> bool {
        self.current_time_ms > 0 && self.duration_ms > 0
    }
}

/// Apply one engine event to `prev`.
///
/// Track enumeration is not part of the reducer: callers read a
/// [`TrackListing`] from the engine for events where
/// [`EngineEvent::affects_tracks`] holds and apply it to the result.
pub fn reduce(prev: &PlaybackSnapshot, event: &EngineEvent) -> PlaybackSnapshot {
    let mut next = prev.clone();
    match *event {
        EngineEvent::Playing => {
            next.is_playing = true;
            next.is_ended = false;
            next.buffering_percent = 100.0;
            next.is_buffering = false;
        }
        EngineEvent::Paused | EngineEvent::Stopped => {
            next.is_playing = false;
        }
        EngineEvent::EndReached => {
            next.is_playing = false;
            next.is_ended = true;
        }
        EngineEvent::Buffering { percent } => {
            let percent = if percent.is_nan() {
                0.0
            } else {
                percent.clamp(0.0, 100.0)
            };
            next.buffering_percent = percent;
            next.is_buffering = percent < 100.0;
        }
        EngineEvent::TimeChanged { time_ms } => {
            next.current_time_ms = time_ms.max(0);
        }
        EngineEvent::LengthChanged { length_ms } => {
            next.duration_ms = length_ms.max(0);
        }
        EngineEvent::SeekableChanged { seekable } => {
            next.is_seekable = seekable;
        }
        EngineEvent::TrackAdded | EngineEvent::TrackRemoved => {}
    }
    next
}

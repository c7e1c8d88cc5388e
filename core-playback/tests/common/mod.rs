//! Shared fakes for core-playback integration tests.

#![allow(dead_code)]

use bridge_traits::{
    error::Result as BridgeResult, BridgeError, ChapterDescription, EngineEvent,
    EngineEventListener, MediaEngine, MediaSource, SurfaceHandle, TrackDescription, VideoOutput,
    VideoSurfaces,
};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Recording engine
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Open(MediaSource),
    Play,
    Pause,
    Stop,
    Seek(i64),
    SetRate(f32),
    SetAudioTrack(i32),
    SetSpuTrack(i32),
    SetChapter(i32),
    Release,
}

/// Media engine fake: records every control call and lets the test push
/// events through the registered listener.
#[derive(Default)]
pub struct FakeEngine {
    listener: Mutex<Option<EngineEventListener>>,
    calls: Mutex<Vec<Call>>,
    time_ms: AtomicI64,
    length_ms: AtomicI64,
    fail_open: AtomicBool,
    audio_tracks: Mutex<Vec<TrackDescription>>,
    spu_tracks: Mutex<Vec<TrackDescription>>,
    chapters: Mutex<Vec<ChapterDescription>>,
    output: Option<Arc<FakeVideoOutput>>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_video_output(output: Arc<FakeVideoOutput>) -> Arc<Self> {
        Arc::new(Self {
            output: Some(output),
            ..Self::default()
        })
    }

    pub fn fail_next_open(&self) {
        self.fail_open.store(true, Ordering::SeqCst);
    }

    pub fn set_tracks(
        &self,
        audio: Vec<TrackDescription>,
        spu: Vec<TrackDescription>,
        chapters: Vec<ChapterDescription>,
    ) {
        *self.audio_tracks.lock().unwrap() = audio;
        *self.spu_tracks.lock().unwrap() = spu;
        *self.chapters.lock().unwrap() = chapters;
    }

    /// Deliver `event` the way the native engine would, on the caller's thread.
    pub fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::TimeChanged { time_ms } => self.time_ms.store(time_ms, Ordering::SeqCst),
            EngineEvent::LengthChanged { length_ms } => {
                self.length_ms.store(length_ms, Ordering::SeqCst)
            }
            _ => {}
        }
        let listener = self.listener.lock().unwrap().clone();
        if let Some(listener) = listener {
            listener(event);
        }
    }

    pub fn has_listener(&self) -> bool {
        self.listener.lock().unwrap().is_some()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn seeks(&self) -> Vec<i64> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Seek(time_ms) => Some(time_ms),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, expected: &Call) -> usize {
        self.calls().iter().filter(|call| *call == expected).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl MediaEngine for FakeEngine {
    fn set_event_listener(&self, listener: Option<EngineEventListener>) {
        *self.listener.lock().unwrap() = listener;
    }

    fn open(&self, source: &MediaSource) -> BridgeResult<()> {
        if self.fail_open.swap(false, Ordering::SeqCst) {
            return Err(BridgeError::MediaOpenFailed {
                uri: source.uri.clone(),
                reason: "unsupported scheme".to_string(),
            });
        }
        self.time_ms.store(0, Ordering::SeqCst);
        self.length_ms.store(0, Ordering::SeqCst);
        self.record(Call::Open(source.clone()));
        Ok(())
    }

    fn play(&self) -> BridgeResult<()> {
        self.record(Call::Play);
        Ok(())
    }

    fn pause(&self) {
        self.record(Call::Pause);
    }

    fn stop(&self) {
        self.record(Call::Stop);
    }

    fn seek(&self, time_ms: i64) {
        self.record(Call::Seek(time_ms));
    }

    fn set_rate(&self, rate: f32) {
        self.record(Call::SetRate(rate));
    }

    fn set_audio_track(&self, id: i32) {
        self.record(Call::SetAudioTrack(id));
    }

    fn set_spu_track(&self, id: i32) {
        self.record(Call::SetSpuTrack(id));
    }

    fn set_chapter(&self, index: i32) {
        self.record(Call::SetChapter(index));
    }

    fn time(&self) -> i64 {
        self.time_ms.load(Ordering::SeqCst)
    }

    fn length(&self) -> i64 {
        self.length_ms.load(Ordering::SeqCst)
    }

    fn audio_tracks(&self) -> Vec<TrackDescription> {
        self.audio_tracks.lock().unwrap().clone()
    }

    fn spu_tracks(&self) -> Vec<TrackDescription> {
        self.spu_tracks.lock().unwrap().clone()
    }

    fn chapters(&self) -> Vec<ChapterDescription> {
        self.chapters.lock().unwrap().clone()
    }

    fn audio_track(&self) -> i32 {
        self.audio_tracks
            .lock()
            .unwrap()
            .first()
            .map_or(-1, |track| track.id)
    }

    fn spu_track(&self) -> i32 {
        -1
    }

    fn chapter(&self) -> i32 {
        if self.chapters.lock().unwrap().is_empty() {
            -1
        } else {
            0
        }
    }

    fn video_output(&self) -> Option<Arc<dyn VideoOutput>> {
        self.output
            .clone()
            .map(|output| output as Arc<dyn VideoOutput>)
    }

    fn release(&self) {
        self.record(Call::Release);
    }
}

// ============================================================================
// Video output
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum OutputCall {
    Attach(VideoSurfaces),
    Detach,
    WindowSize(u32, u32),
    ResetScaling,
}

#[derive(Default)]
pub struct FakeVideoOutput {
    attached: AtomicBool,
    size: Mutex<Option<(u32, u32)>>,
    calls: Mutex<Vec<OutputCall>>,
}

impl FakeVideoOutput {
    pub fn new(size: Option<(u32, u32)>) -> Arc<Self> {
        Arc::new(Self {
            size: Mutex::new(size),
            ..Self::default()
        })
    }

    /// Simulate the platform tearing the views down behind the player's back.
    pub fn drop_views(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<OutputCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn attach_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, OutputCall::Attach(_)))
            .count()
    }
}

impl VideoOutput for FakeVideoOutput {
    fn are_views_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn attach_views(&self, surfaces: &VideoSurfaces) {
        self.attached.store(true, Ordering::SeqCst);
        self.calls.lock().unwrap().push(OutputCall::Attach(*surfaces));
    }

    fn detach_views(&self) {
        self.attached.store(false, Ordering::SeqCst);
        self.calls.lock().unwrap().push(OutputCall::Detach);
    }

    fn set_window_size(&self, width: u32, height: u32) {
        self.calls
            .lock()
            .unwrap()
            .push(OutputCall::WindowSize(width, height));
    }

    fn reset_scaling(&self) {
        self.calls.lock().unwrap().push(OutputCall::ResetScaling);
    }

    fn surface_size(&self, _surface: SurfaceHandle) -> Option<(u32, u32)> {
        *self.size.lock().unwrap()
    }
}

pub fn surfaces() -> VideoSurfaces {
    VideoSurfaces {
        video: SurfaceHandle(1),
        subtitles: SurfaceHandle(2),
    }
}

/// Let spawned session tasks observe the latest snapshot.
///
/// Tests run on the current-thread runtime, so yielding hands the thread to
/// every task woken by a snapshot change before the test continues. Store
/// writes those tasks queue are awaited with `SessionController::flush`.
pub async fn settle() {
    for _ in 0..SETTLE_YIELDS {
        tokio::task::yield_now().await;
    }
}

const SETTLE_YIELDS: usize = 16;

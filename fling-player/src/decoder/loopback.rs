//! Loopback decoder
//!
//! Wall-clock simulated decoder used by the daemon when no platform decoder is
//! wired in. It accepts `http`, `https` and `file` sources, "prepares" after a
//! configurable delay, advances its position in real time while started and
//! reports natural completion when the position reaches the configured
//! duration. All notifications are raised from short-lived helper threads,
//! never from the calling thread.

use super::{Decoder, DecoderError, DecoderEvents};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const ACCEPTED_SCHEMES: &[&str] = &["http", "https", "file"];

/// Loopback decoder timing and capability configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopbackConfig {
    /// Delay before `prepared` is reported
    pub prepare_delay_ms: u64,
    /// Delay before `seek_complete` is reported
    pub seek_delay_ms: u64,
    /// Simulated media duration
    pub duration_ms: i64,
    pub supported_mime_types: Vec<String>,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            prepare_delay_ms: 200,
            seek_delay_ms: 50,
            duration_ms: 300_000,
            supported_mime_types: vec![
                "video/mp4".to_string(),
                "video/3gpp".to_string(),
                "audio/mp4".to_string(),
                "audio/mpeg".to_string(),
                "audio/ogg".to_string(),
                "audio/wav".to_string(),
                "audio/aac".to_string(),
                "audio/flac".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Initialized,
    Preparing,
    Prepared,
    Started,
    Paused,
    Stopped,
    Completed,
    Released,
}

#[derive(Debug)]
struct Playhead {
    phase: Phase,
    source: Option<String>,
    /// Position at the moment `started_at` was taken (or the frozen position)
    base_position_ms: i64,
    started_at: Option<Instant>,
    /// Bumped on every transition so stale helper threads can tell they lost
    generation: u64,
}

impl Playhead {
    fn position(&self, duration_ms: i64) -> i64 {
        let elapsed = self
            .started_at
            .map(|t| t.elapsed().as_millis() as i64)
            .unwrap_or(0);
        (self.base_position_ms + elapsed).min(duration_ms)
    }

    /// Freeze the running clock into `base_position_ms`
    fn freeze(&mut self, duration_ms: i64) {
        self.base_position_ms = self.position(duration_ms);
        self.started_at = None;
    }

    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

/// Simulated decoder driven by the wall clock
pub struct LoopbackDecoder {
    config: LoopbackConfig,
    events: Mutex<Option<DecoderEvents>>,
    playhead: Arc<Mutex<Playhead>>,
}

impl LoopbackDecoder {
    pub fn new(config: LoopbackConfig) -> Self {
        Self {
            config,
            events: Mutex::new(None),
            playhead: Arc::new(Mutex::new(Playhead {
                phase: Phase::Idle,
                source: None,
                base_position_ms: 0,
                started_at: None,
                generation: 0,
            })),
        }
    }

    /// Source currently loaded, if any
    pub fn source(&self) -> Option<String> {
        self.playhead.lock().source.clone()
    }

    fn events(&self) -> Option<DecoderEvents> {
        self.events.lock().clone()
    }

    fn require(&self, allowed: &[Phase], op: &str) -> Result<(), DecoderError> {
        let phase = self.playhead.lock().phase;
        if allowed.contains(&phase) {
            Ok(())
        } else {
            Err(DecoderError::InvalidState(format!(
                "{} not allowed in phase {:?}",
                op, phase
            )))
        }
    }

    /// Arm a completion watcher for the current generation
    fn watch_completion(&self, generation: u64, remaining_ms: i64) {
        let Some(events) = self.events() else {
            return;
        };
        let playhead = Arc::clone(&self.playhead);
        let duration_ms = self.config.duration_ms;
        let delay = Duration::from_millis(remaining_ms.max(0) as u64);

        thread::spawn(move || {
            thread::sleep(delay);
            {
                let mut head = playhead.lock();
                if head.generation != generation || head.phase != Phase::Started {
                    return;
                }
                head.freeze(duration_ms);
                head.phase = Phase::Completed;
                head.bump();
            }
            debug!("Loopback decoder reached end of stream");
            events.completion();
        });
    }
}

impl Decoder for LoopbackDecoder {
    fn attach(&self, events: DecoderEvents) {
        *self.events.lock() = Some(events);
    }

    fn reset(&self) {
        let mut head = self.playhead.lock();
        if head.phase == Phase::Released {
            return;
        }
        head.phase = Phase::Idle;
        head.source = None;
        head.base_position_ms = 0;
        head.started_at = None;
        head.bump();
    }

    fn set_data_source(&self, uri: &str) -> Result<(), DecoderError> {
        self.require(&[Phase::Idle], "set_data_source")?;

        let url = reqwest::Url::parse(uri)
            .map_err(|e| DecoderError::InvalidArgument(format!("{}: {}", uri, e)))?;
        if !ACCEPTED_SCHEMES.contains(&url.scheme()) {
            return Err(DecoderError::InvalidArgument(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        if url.scheme() == "file" {
            let path = url
                .to_file_path()
                .map_err(|_| DecoderError::InvalidArgument(format!("bad file URI {}", uri)))?;
            if !path.exists() {
                return Err(DecoderError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} does not exist", path.display()),
                )));
            }
        }

        let mut head = self.playhead.lock();
        head.source = Some(uri.to_string());
        head.phase = Phase::Initialized;
        Ok(())
    }

    fn prepare_async(&self) -> Result<(), DecoderError> {
        let generation = {
            let mut head = self.playhead.lock();
            if head.phase != Phase::Initialized && head.phase != Phase::Stopped {
                return Err(DecoderError::InvalidState(format!(
                    "prepare_async not allowed in phase {:?}",
                    head.phase
                )));
            }
            head.phase = Phase::Preparing;
            head.base_position_ms = 0;
            head.bump()
        };

        let Some(events) = self.events() else {
            warn!("Loopback decoder has no event sink attached, prepare will never complete");
            return Ok(());
        };
        let playhead = Arc::clone(&self.playhead);
        let delay = Duration::from_millis(self.config.prepare_delay_ms);

        thread::spawn(move || {
            thread::sleep(delay);
            {
                let mut head = playhead.lock();
                if head.generation != generation || head.phase != Phase::Preparing {
                    return;
                }
                head.phase = Phase::Prepared;
            }
            events.prepared(true);
        });
        Ok(())
    }

    fn start(&self) -> Result<(), DecoderError> {
        let (generation, remaining) = {
            let mut head = self.playhead.lock();
            match head.phase {
                Phase::Prepared | Phase::Paused | Phase::Completed => {}
                Phase::Started => return Ok(()),
                other => {
                    return Err(DecoderError::InvalidState(format!(
                        "start not allowed in phase {:?}",
                        other
                    )))
                }
            }
            if head.phase == Phase::Completed {
                head.base_position_ms = 0;
            }
            head.phase = Phase::Started;
            head.started_at = Some(Instant::now());
            let remaining = self.config.duration_ms - head.base_position_ms;
            (head.bump(), remaining)
        };
        info!("Loopback decoder started");
        self.watch_completion(generation, remaining);
        Ok(())
    }

    fn pause(&self) -> Result<(), DecoderError> {
        self.require(&[Phase::Started, Phase::Paused], "pause")?;
        let mut head = self.playhead.lock();
        head.freeze(self.config.duration_ms);
        head.phase = Phase::Paused;
        head.bump();
        Ok(())
    }

    fn stop(&self) -> Result<(), DecoderError> {
        self.require(
            &[
                Phase::Prepared,
                Phase::Started,
                Phase::Paused,
                Phase::Stopped,
                Phase::Completed,
            ],
            "stop",
        )?;
        let mut head = self.playhead.lock();
        head.freeze(self.config.duration_ms);
        head.phase = Phase::Stopped;
        head.bump();
        Ok(())
    }

    fn seek_to(&self, position_ms: i64) -> Result<(), DecoderError> {
        self.require(
            &[Phase::Prepared, Phase::Started, Phase::Paused, Phase::Completed],
            "seek_to",
        )?;
        let target = position_ms.clamp(0, self.config.duration_ms);

        let restart = {
            let mut head = self.playhead.lock();
            head.base_position_ms = target;
            let generation = head.bump();
            if head.phase == Phase::Started {
                head.started_at = Some(Instant::now());
                Some((generation, self.config.duration_ms - target))
            } else {
                if head.phase == Phase::Completed {
                    head.phase = Phase::Paused;
                }
                None
            }
        };
        if let Some((generation, remaining)) = restart {
            self.watch_completion(generation, remaining);
        }

        let Some(events) = self.events() else {
            return Ok(());
        };
        let delay = Duration::from_millis(self.config.seek_delay_ms);
        let playhead = Arc::clone(&self.playhead);
        thread::spawn(move || {
            thread::sleep(delay);
            if playhead.lock().phase == Phase::Released {
                return;
            }
            events.seek_complete();
        });
        Ok(())
    }

    fn current_position(&self) -> Result<i64, DecoderError> {
        let head = self.playhead.lock();
        match head.phase {
            Phase::Idle | Phase::Released => Err(DecoderError::InvalidState(
                "no source loaded".to_string(),
            )),
            _ => Ok(head.position(self.config.duration_ms)),
        }
    }

    fn duration(&self) -> Result<i64, DecoderError> {
        let phase = self.playhead.lock().phase;
        match phase {
            Phase::Prepared | Phase::Started | Phase::Paused | Phase::Stopped | Phase::Completed => {
                Ok(self.config.duration_ms)
            }
            other => Err(DecoderError::InvalidState(format!(
                "duration unknown in phase {:?}",
                other
            ))),
        }
    }

    fn release(&self) {
        let mut head = self.playhead.lock();
        head.phase = Phase::Released;
        head.source = None;
        head.started_at = None;
        head.bump();
        drop(head);
        *self.events.lock() = None;
        debug!("Loopback decoder released");
    }

    fn supported_mime_types(&self) -> Vec<String> {
        self.config.supported_mime_types.clone()
    }
}

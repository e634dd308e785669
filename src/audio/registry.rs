//! Decode cache: one audio graph per distinct locator.
//!
//! The first acquisition of a locator spawns a decode worker and leaves a
//! pending slot; later acquisitions of the same locator observe that slot
//! and all receive the same `Arc<AudioGraph>` once it resolves.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use super::decode::{DecodedAudio, SourceLoader};
use super::error::AudioError;
use super::graph::{build_graph, AudioGraph, EndedCallback};
use super::mixer::MixerHandle;
use crate::params::AnalyserConfig;

type DecodeResult = Result<DecodedAudio, AudioError>;

/// Outcome of a non-blocking acquisition
#[derive(Debug, Clone)]
pub enum Acquire {
    /// Decode in flight; render nothing for now
    Pending,
    Ready(Arc<AudioGraph>),
    Failed(Arc<AudioError>),
}

enum Slot {
    Pending(Receiver<DecodeResult>),
    Ready(Arc<AudioGraph>),
    Failed(Arc<AudioError>),
}

/// Registry of audio graphs keyed by locator, owned by the app
pub struct GraphRegistry {
    loader: Arc<dyn SourceLoader>,
    mixer: MixerHandle,
    analyser: AnalyserConfig,
    slots: HashMap<String, Slot>,
    decodes_started: usize,
}

impl GraphRegistry {
    pub fn new(loader: Arc<dyn SourceLoader>, mixer: MixerHandle, analyser: AnalyserConfig) -> Self {
        Self {
            loader,
            mixer,
            analyser,
            slots: HashMap::new(),
            decodes_started: 0,
        }
    }

    /// Get the graph for `locator`, starting its decode on first request
    pub fn acquire(&mut self, locator: &str) -> Acquire {
        if !self.slots.contains_key(locator) {
            let slot = self.spawn_decode(locator);
            self.slots.insert(locator.to_string(), slot);
        }

        let resolved = match self.slots.get(locator) {
            Some(Slot::Ready(graph)) => return Acquire::Ready(Arc::clone(graph)),
            Some(Slot::Failed(err)) => return Acquire::Failed(Arc::clone(err)),
            Some(Slot::Pending(rx)) => match rx.try_recv() {
                Ok(result) => result,
                Err(TryRecvError::Empty) => return Acquire::Pending,
                Err(TryRecvError::Disconnected) => {
                    Err(AudioError::WorkerLost(locator.to_string()))
                }
            },
            None => return Acquire::Pending,
        };

        self.settle(locator, resolved)
    }

    /// Like `acquire`, but waits for a pending decode to finish
    pub fn acquire_blocking(&mut self, locator: &str) -> Result<Arc<AudioGraph>, Arc<AudioError>> {
        loop {
            match self.acquire(locator) {
                Acquire::Ready(graph) => return Ok(graph),
                Acquire::Failed(err) => return Err(err),
                Acquire::Pending => {
                    let result = match self.slots.get(locator) {
                        Some(Slot::Pending(rx)) => rx
                            .recv()
                            .unwrap_or_else(|_| Err(AudioError::WorkerLost(locator.to_string()))),
                        _ => continue,
                    };
                    self.settle(locator, result);
                }
            }
        }
    }

    /// Drop the cached entry for `locator`. A decode still in flight is
    /// discarded when it reports. Returns whether an entry existed.
    pub fn release(&mut self, locator: &str) -> bool {
        self.slots.remove(locator).is_some()
    }

    /// Fire end-of-track callbacks of finished graphs, ordered by locator,
    /// and release them so a later acquisition decodes afresh. Returns how
    /// many fired.
    pub fn pump(&mut self) -> usize {
        let mut finished: Vec<(String, EndedCallback)> = self
            .slots
            .iter()
            .filter_map(|(locator, slot)| match slot {
                Slot::Ready(graph) => graph
                    .take_ended_callback()
                    .map(|callback| (locator.clone(), callback)),
                _ => None,
            })
            .collect();
        // Stable order when several voices end in the same block
        finished.sort_by(|a, b| a.0.cmp(&b.0));

        let count = finished.len();
        for (locator, callback) in finished {
            self.slots.remove(&locator);
            log::debug!("{} ended; released from cache", locator);
            callback();
        }
        count
    }

    /// Whether `locator` has any entry (pending, ready or failed)
    pub fn contains(&self, locator: &str) -> bool {
        self.slots.contains_key(locator)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of decode workers started so far
    pub fn decodes_started(&self) -> usize {
        self.decodes_started
    }

    fn spawn_decode(&mut self, locator: &str) -> Slot {
        let (tx, rx) = mpsc::channel();
        let loader = Arc::clone(&self.loader);
        let owned = locator.to_string();
        self.decodes_started += 1;

        let spawned = thread::Builder::new()
            .name("decode".to_string())
            .spawn(move || {
                // Receiver may be gone if the slot was released meanwhile
                let _ = tx.send(loader.load(&owned));
            });

        match spawned {
            Ok(_) => Slot::Pending(rx),
            Err(e) => Slot::Failed(Arc::new(AudioError::Decode {
                locator: locator.to_string(),
                reason: format!("failed to start decode worker: {}", e),
            })),
        }
    }

    fn settle(&mut self, locator: &str, result: DecodeResult) -> Acquire {
        let outcome = result
            .and_then(|audio| build_graph(locator, audio, &self.mixer, &self.analyser))
            .map_err(Arc::new);

        let (slot, acquired) = match outcome {
            Ok(graph) => (Slot::Ready(Arc::clone(&graph)), Acquire::Ready(graph)),
            Err(err) => {
                log::warn!("Audio unavailable: {}", err);
                (Slot::Failed(Arc::clone(&err)), Acquire::Failed(err))
            }
        };
        self.slots.insert(locator.to_string(), slot);
        acquired
    }
}

//! Analysis runner with supersession and a result cache.
//!
//! Every [`AnalysisRunner::submit`] gets a new generation and cancels the
//! token of the request before it. Work runs on a worker thread; a result
//! whose generation is no longer current is discarded as
//! [`Error::Superseded`] when it is collected.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::events::{event_names, NullEmitter, Phase, ProgressEmitter, ProgressEvent};
use tc_common::{Error, Interval, Result};
use tc_engine::{
    CancellationToken, Checkpoint, ConcurrencyStats, ConcurrencyStatsAnalysis, EventSweep,
    HistogramAnalysis, HistogramBucket, PeakOccurrence, PeakOccurrenceAnalysis, PeakPeriod,
    PeakPeriodAnalysis, ResourceModel, SweepAnalysis,
};

/// Default number of results kept by a [`ResultCache`].
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// An immutable interval snapshot and its content fingerprint.
#[derive(Debug, Clone)]
pub struct Dataset {
    intervals: Vec<Interval>,
    fingerprint: String,
}

impl Dataset {
    pub fn new(intervals: Vec<Interval>) -> Self {
        let fingerprint = dataset_fingerprint(&intervals);
        Dataset {
            intervals,
            fingerprint,
        }
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// SHA-256 over the canonical interval list.
///
/// Each interval is encoded as one JSON line and the lines are sorted, so
/// input order does not change the fingerprint. JSON escaping keeps
/// separators inside ids and tag values from aliasing another dataset.
pub fn dataset_fingerprint(intervals: &[Interval]) -> String {
    let mut lines: Vec<String> = intervals
        .iter()
        .map(|iv| serde_json::to_string(iv).unwrap_or_else(|_| format!("{:?}", iv)))
        .collect();
    lines.sort_unstable();

    let mut hasher = Sha256::new();
    for line in &lines {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// One sweep analysis and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "analysis", rename_all = "snake_case")]
pub enum AnalysisRequest {
    Stats,
    Histogram {
        bin_size: u32,
        units_per_resource: u32,
    },
    Periods {
        threshold: i64,
        units_per_resource: u32,
    },
    Occurrences {
        threshold: u64,
        units_per_resource: u32,
    },
}

impl AnalysisRequest {
    pub fn name(&self) -> &'static str {
        match self {
            AnalysisRequest::Stats => "stats",
            AnalysisRequest::Histogram { .. } => "histogram",
            AnalysisRequest::Periods { .. } => "periods",
            AnalysisRequest::Occurrences { .. } => "occurrences",
        }
    }

    /// Run against a built sweep under `checkpoint`.
    pub fn execute(
        &self,
        sweep: &EventSweep<'_>,
        checkpoint: &mut Checkpoint<'_>,
    ) -> Result<AnalysisOutput> {
        match *self {
            AnalysisRequest::Stats => ConcurrencyStatsAnalysis
                .analyze(sweep, checkpoint)
                .map(AnalysisOutput::Stats),
            AnalysisRequest::Histogram {
                bin_size,
                units_per_resource,
            } => HistogramAnalysis::new(bin_size, ResourceModel::new(units_per_resource)?)?
                .analyze(sweep, checkpoint)
                .map(AnalysisOutput::Histogram),
            AnalysisRequest::Periods {
                threshold,
                units_per_resource,
            } => PeakPeriodAnalysis::new(threshold, ResourceModel::new(units_per_resource)?)
                .analyze(sweep, checkpoint)
                .map(AnalysisOutput::Periods),
            AnalysisRequest::Occurrences {
                threshold,
                units_per_resource,
            } => PeakOccurrenceAnalysis::new(threshold, ResourceModel::new(units_per_resource)?)
                .analyze(sweep, checkpoint)
                .map(AnalysisOutput::Occurrences),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisOutput {
    Stats(ConcurrencyStats),
    Histogram(Vec<HistogramBucket>),
    Periods(Vec<PeakPeriod>),
    Occurrences(Vec<PeakOccurrence>),
}

impl AnalysisOutput {
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisOutput::Stats(_) => "stats",
            AnalysisOutput::Histogram(_) => "histogram",
            AnalysisOutput::Periods(_) => "periods",
            AnalysisOutput::Occurrences(_) => "occurrences",
        }
    }

    pub fn into_stats(self) -> Result<ConcurrencyStats> {
        match self {
            AnalysisOutput::Stats(stats) => Ok(stats),
            other => Err(mismatch("stats", &other)),
        }
    }

    pub fn into_histogram(self) -> Result<Vec<HistogramBucket>> {
        match self {
            AnalysisOutput::Histogram(buckets) => Ok(buckets),
            other => Err(mismatch("histogram", &other)),
        }
    }

    pub fn into_periods(self) -> Result<Vec<PeakPeriod>> {
        match self {
            AnalysisOutput::Periods(periods) => Ok(periods),
            other => Err(mismatch("periods", &other)),
        }
    }

    pub fn into_occurrences(self) -> Result<Vec<PeakOccurrence>> {
        match self {
            AnalysisOutput::Occurrences(occurrences) => Ok(occurrences),
            other => Err(mismatch("occurrences", &other)),
        }
    }
}

fn mismatch(expected: &str, got: &AnalysisOutput) -> Error {
    Error::Internal(format!("expected {} output, got {}", expected, got.kind()))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    fingerprint: String,
    request: AnalysisRequest,
}

/// Results keyed by dataset fingerprint and parameters, evicted oldest first.
#[derive(Debug)]
pub struct ResultCache {
    capacity: usize,
    entries: HashMap<CacheKey, AnalysisOutput>,
    order: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        ResultCache {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, fingerprint: &str, request: &AnalysisRequest) -> Option<AnalysisOutput> {
        let key = CacheKey {
            fingerprint: fingerprint.to_string(),
            request: *request,
        };
        match self.entries.get(&key) {
            Some(output) => {
                self.hits += 1;
                Some(output.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, fingerprint: &str, request: AnalysisRequest, output: AnalysisOutput) {
        if self.capacity == 0 {
            return;
        }
        let key = CacheKey {
            fingerprint: fingerprint.to_string(),
            request,
        };
        if self.entries.insert(key.clone(), output).is_none() {
            self.order.push_back(key);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses)
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// Runs sweep analyses on worker threads, newest request wins.
pub struct AnalysisRunner {
    latest: Arc<AtomicU64>,
    current: Mutex<Option<CancellationToken>>,
    slice_len: usize,
    cache: Arc<Mutex<ResultCache>>,
    emitter: Arc<dyn ProgressEmitter>,
}

impl AnalysisRunner {
    pub fn new(slice_len: usize) -> Self {
        AnalysisRunner {
            latest: Arc::new(AtomicU64::new(0)),
            current: Mutex::new(None),
            slice_len,
            cache: Arc::new(Mutex::new(ResultCache::default())),
            emitter: Arc::new(NullEmitter),
        }
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn ProgressEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn with_cache(mut self, cache: ResultCache) -> Self {
        self.cache = Arc::new(Mutex::new(cache));
        self
    }

    /// Generation of the most recent submission (0 before any).
    pub fn current_generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Cancel whatever is in flight without submitting anything new.
    pub fn cancel_current(&self) {
        if let Ok(current) = self.current.lock() {
            if let Some(token) = current.as_ref() {
                token.cancel();
            }
        }
    }

    /// Cache (hits, misses) so far.
    pub fn cache_stats(&self) -> (u64, u64) {
        self.cache.lock().map(|c| c.stats()).unwrap_or_default()
    }

    /// Start `request` on a worker thread, superseding any earlier request.
    pub fn submit(&self, dataset: Arc<Dataset>, request: AnalysisRequest) -> AnalysisHandle {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        if let Ok(mut current) = self.current.lock() {
            if let Some(previous) = current.replace(token.clone()) {
                previous.cancel();
            }
        }

        let (tx, rx) = mpsc::channel();
        let worker = Worker {
            generation,
            token: token.clone(),
            slice_len: self.slice_len,
            cache: Arc::clone(&self.cache),
            emitter: Arc::clone(&self.emitter),
        };
        std::thread::spawn(move || {
            let _ = tx.send(worker.run(&dataset, request));
        });

        AnalysisHandle {
            generation,
            request,
            token,
            latest: Arc::clone(&self.latest),
            emitter: Arc::clone(&self.emitter),
            rx,
        }
    }

    /// Submit and wait, with an optional deadline.
    pub fn run(
        &self,
        dataset: Arc<Dataset>,
        request: AnalysisRequest,
        timeout: Option<Duration>,
    ) -> Result<AnalysisOutput> {
        self.submit(dataset, request).wait_timeout(timeout)
    }
}

struct Worker {
    generation: u64,
    token: CancellationToken,
    slice_len: usize,
    cache: Arc<Mutex<ResultCache>>,
    emitter: Arc<dyn ProgressEmitter>,
}

impl Worker {
    fn run(&self, dataset: &Dataset, request: AnalysisRequest) -> Result<AnalysisOutput> {
        let started = Instant::now();
        let cached = self
            .cache
            .lock()
            .ok()
            .and_then(|mut cache| cache.get(dataset.fingerprint(), &request));
        if let Some(output) = cached {
            tracing::debug!(
                generation = self.generation,
                analysis = request.name(),
                "result served from cache"
            );
            return Ok(output);
        }

        self.emitter.emit(
            ProgressEvent::new(event_names::ANALYSIS_STARTED, Phase::Analyze)
                .with_generation(self.generation)
                .with_detail("analysis", request.name())
                .with_detail("intervals", dataset.len()),
        );

        let sweep = EventSweep::build(dataset.intervals());
        let report = |steps: usize| {
            self.emitter.emit(
                ProgressEvent::new(event_names::ANALYSIS_PROGRESS, Phase::Analyze)
                    .with_generation(self.generation)
                    .with_progress(steps as u64, None),
            );
        };
        let mut checkpoint = Checkpoint::new(&self.token, self.slice_len).with_progress(&report);
        let result = request.execute(&sweep, &mut checkpoint);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(output) => {
                if let Ok(mut cache) = self.cache.lock() {
                    cache.insert(dataset.fingerprint(), request, output.clone());
                }
                self.emitter.emit(
                    ProgressEvent::new(event_names::ANALYSIS_COMPLETE, Phase::Analyze)
                        .with_generation(self.generation)
                        .with_progress(checkpoint.steps_done() as u64, None)
                        .with_elapsed_ms(elapsed_ms),
                );
            }
            Err(Error::Cancelled { steps_done }) => {
                tracing::debug!(
                    generation = self.generation,
                    steps_done = *steps_done,
                    "analysis cancelled"
                );
                self.emitter.emit(
                    ProgressEvent::new(event_names::ANALYSIS_CANCELLED, Phase::Analyze)
                        .with_generation(self.generation)
                        .with_progress(*steps_done as u64, None)
                        .with_elapsed_ms(elapsed_ms),
                );
            }
            Err(_) => {}
        }
        result
    }
}

/// A submitted request.
pub struct AnalysisHandle {
    generation: u64,
    request: AnalysisRequest,
    token: CancellationToken,
    latest: Arc<AtomicU64>,
    emitter: Arc<dyn ProgressEmitter>,
    rx: mpsc::Receiver<Result<AnalysisOutput>>,
}

impl AnalysisHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request(&self) -> AnalysisRequest {
        self.request
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Block until the worker finishes.
    pub fn wait(self) -> Result<AnalysisOutput> {
        self.wait_timeout(None)
    }

    /// Block until the worker finishes; past `timeout` cancel it and report
    /// [`Error::Timeout`].
    pub fn wait_timeout(self, timeout: Option<Duration>) -> Result<AnalysisOutput> {
        let received = match timeout {
            None => self.rx.recv().map_err(|_| worker_lost()),
            Some(limit) => match self.rx.recv_timeout(limit) {
                Ok(result) => Ok(result),
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    self.token.cancel();
                    let _ = self.rx.recv();
                    return Err(Error::Timeout {
                        seconds: limit.as_secs(),
                    });
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => Err(worker_lost()),
            },
        };
        let result = received?;

        let current = self.latest.load(Ordering::SeqCst);
        if current != self.generation {
            self.emitter.emit(
                ProgressEvent::new(event_names::ANALYSIS_SUPERSEDED, Phase::Analyze)
                    .with_generation(self.generation)
                    .with_detail("current", current),
            );
            return Err(Error::Superseded {
                generation: self.generation,
                current,
            });
        }
        result
    }
}

fn worker_lost() -> Error {
    Error::Internal("analysis worker exited without a result".to_string())
}

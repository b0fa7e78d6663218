//! Parallel compile scheduling.
//!
//! Every source is queued up front. A pool of exactly `workers` threads is
//! built for the call; each worker pops a source, fingerprints its expanded
//! text, and compiles it only if the cache says it is stale. Two locks guard
//! the shared state and are never held together:
//!
//! - the queue lock, held only for a pop;
//! - the cache lock, held only for the staleness check and the cache update.
//!
//! Expansion, hashing and compilation all run with no lock held.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chai_cache::BuildCache;
use chai_common::Fingerprint;

use crate::error::BuildError;
use crate::sources::object_path;
use crate::toolchain::Toolchain;

/// Sources waiting to be compiled, shared by all workers.
///
/// The full work list is known before the workers start, so [`pop`](Self::pop)
/// never waits for more work: it returns `None` once the queue is drained.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: Mutex<Vec<PathBuf>>,
}

impl WorkQueue {
    /// Queues `items`; they are handed out in the given order.
    pub fn new(mut items: Vec<PathBuf>) -> Self {
        items.reverse();
        Self {
            items: Mutex::new(items),
        }
    }

    /// Takes the next source, or `None` if the queue is empty.
    pub fn pop(&self) -> Option<PathBuf> {
        lock(&self.items).pop()
    }

    /// Number of sources still queued.
    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    /// Returns `true` if no sources remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A source whose expansion or compilation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedSource {
    /// The source that failed.
    pub source: PathBuf,
    /// Human-readable failure description.
    pub reason: String,
}

/// What happened to each source during one scheduler run, sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    /// Sources that were stale and compiled successfully.
    pub compiled: Vec<PathBuf>,
    /// Sources skipped because their fingerprint and object were current.
    pub fresh: Vec<PathBuf>,
    /// Sources whose cache entry was left untouched because a toolchain step failed.
    pub failed: Vec<FailedSource>,
}

impl ScheduleReport {
    /// Total number of sources processed.
    pub fn processed(&self) -> usize {
        self.compiled.len() + self.fresh.len() + self.failed.len()
    }

    fn merge(&mut self, other: ScheduleReport) {
        self.compiled.extend(other.compiled);
        self.fresh.extend(other.fresh);
        self.failed.extend(other.failed);
    }

    fn sort(&mut self) {
        self.compiled.sort();
        self.fresh.sort();
        self.failed.sort_by(|a, b| a.source.cmp(&b.source));
    }
}

enum Outcome {
    Compiled,
    Fresh,
    Failed(String),
}

/// Drives a fixed-size worker pool over a list of sources.
pub struct Scheduler<'a> {
    toolchain: &'a dyn Toolchain,
    objects_dir: &'a Path,
    temp_dir: &'a Path,
    workers: usize,
}

impl<'a> Scheduler<'a> {
    /// Creates a scheduler writing objects to `objects_dir` and per-worker
    /// expansion output to `temp_dir`.
    pub fn new(
        toolchain: &'a dyn Toolchain,
        objects_dir: &'a Path,
        temp_dir: &'a Path,
        workers: usize,
    ) -> Self {
        Self {
            toolchain,
            objects_dir,
            temp_dir,
            workers,
        }
    }

    /// Processes every source and returns once all workers have exited.
    ///
    /// `cache` is checked and updated in place; it is not flushed.
    pub fn run(
        &self,
        sources: Vec<PathBuf>,
        cache: &mut BuildCache,
    ) -> Result<ScheduleReport, BuildError> {
        if self.workers == 0 {
            return Err(BuildError::NoWorkers);
        }
        std::fs::create_dir_all(self.temp_dir).map_err(|e| BuildError::io(self.temp_dir, e))?;

        tracing::info!(
            sources = sources.len(),
            workers = self.workers,
            "scheduling compilation"
        );

        let queue = WorkQueue::new(sources);
        let cache = Mutex::new(cache);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("chai-worker-{i}"))
            .build()
            .map_err(|e| BuildError::ThreadPool(e.to_string()))?;

        // One call per pool thread; returns after every worker has drained out.
        let per_worker = pool.broadcast(|ctx| self.worker(ctx.index(), &queue, &cache));

        let mut report = ScheduleReport::default();
        for worker_report in per_worker {
            report.merge(worker_report);
        }
        report.sort();
        Ok(report)
    }

    fn worker(
        &self,
        index: usize,
        queue: &WorkQueue,
        cache: &Mutex<&mut BuildCache>,
    ) -> ScheduleReport {
        let temp = self.temp_dir.join(format!("worker_{index}.i"));
        let mut report = ScheduleReport::default();

        while let Some(source) = queue.pop() {
            match self.process(&source, &temp, cache) {
                Outcome::Compiled => report.compiled.push(source),
                Outcome::Fresh => report.fresh.push(source),
                Outcome::Failed(reason) => {
                    tracing::warn!(
                        worker = index,
                        source = %source.display(),
                        %reason,
                        "source not compiled"
                    );
                    report.failed.push(FailedSource { source, reason });
                }
            }
        }

        tracing::debug!(worker = index, "worker finished");
        report
    }

    fn process(&self, source: &Path, temp: &Path, cache: &Mutex<&mut BuildCache>) -> Outcome {
        // The temp file is reused per worker; a leftover must not be hashed
        // as this source's expansion.
        if let Err(e) = remove_if_present(temp) {
            return Outcome::Failed(format!(
                "failed to clear expansion output {}: {e}",
                temp.display()
            ));
        }
        if let Err(e) = self.toolchain.expand(source, temp) {
            return Outcome::Failed(e.to_string());
        }
        let fingerprint = match Fingerprint::from_file(temp) {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                return Outcome::Failed(format!(
                    "failed to read expansion output {}: {e}",
                    temp.display()
                ))
            }
        };

        let object = object_path(self.objects_dir, source);
        if !lock(cache).is_stale(source, fingerprint, &object) {
            tracing::debug!(source = %source.display(), "up to date");
            return Outcome::Fresh;
        }

        tracing::info!(source = %source.display(), "compiling");
        if let Err(e) = self.toolchain.compile(source, &object) {
            return Outcome::Failed(e.to_string());
        }

        lock(cache).update(source.to_path_buf(), fingerprint);
        Outcome::Compiled
    }
}

/// Locks `mutex`, recovering the data if another worker panicked while holding it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeToolchain;
    use std::fs;
    use tempfile::TempDir;

    struct Dirs {
        _tmp: TempDir,
        src: PathBuf,
        objects: PathBuf,
        temp: PathBuf,
        cache_file: PathBuf,
    }

    fn dirs() -> Dirs {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let objects = tmp.path().join("objects");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&objects).unwrap();
        Dirs {
            temp: objects.join("temp"),
            cache_file: tmp.path().join("hashstamps"),
            src,
            objects,
            _tmp: tmp,
        }
    }

    fn write_sources(d: &Dirs, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = d.src.join(format!("unit{i}.cpp"));
                fs::write(&path, format!("int f{i}() {{ return {i}; }}\n")).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn queue_pops_in_order_then_empty() {
        let q = WorkQueue::new(vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(PathBuf::from("a")));
        assert_eq!(q.pop(), Some(PathBuf::from("b")));
        assert_eq!(q.pop(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn compiles_everything_on_empty_cache() {
        let d = dirs();
        let sources = write_sources(&d, 5);
        let tc = FakeToolchain::new();
        let mut cache = BuildCache::new(&d.cache_file);

        let report = Scheduler::new(&tc, &d.objects, &d.temp, 3)
            .run(sources.clone(), &mut cache)
            .unwrap();

        assert_eq!(report.compiled, sources);
        assert!(report.fresh.is_empty());
        assert!(report.failed.is_empty());
        assert_eq!(cache.len(), 5);
        for source in &sources {
            assert!(object_path(&d.objects, source).exists());
        }
    }

    #[test]
    fn each_source_handled_exactly_once() {
        let d = dirs();
        let sources = write_sources(&d, 40);
        let tc = FakeToolchain::new();
        let mut cache = BuildCache::new(&d.cache_file);

        let report = Scheduler::new(&tc, &d.objects, &d.temp, 16)
            .run(sources.clone(), &mut cache)
            .unwrap();

        assert_eq!(report.processed(), 40);
        let mut expanded = tc.expanded();
        expanded.sort();
        assert_eq!(expanded, sources);
        assert_eq!(tc.compile_count(), 40);
    }

    #[test]
    fn rerun_is_idempotent() {
        let d = dirs();
        let sources = write_sources(&d, 4);
        let mut cache = BuildCache::new(&d.cache_file);
        Scheduler::new(&FakeToolchain::new(), &d.objects, &d.temp, 2)
            .run(sources.clone(), &mut cache)
            .unwrap();

        let tc = FakeToolchain::new();
        let report = Scheduler::new(&tc, &d.objects, &d.temp, 2)
            .run(sources.clone(), &mut cache)
            .unwrap();
        assert!(report.compiled.is_empty());
        assert_eq!(report.fresh, sources);
        assert_eq!(tc.compile_count(), 0);
    }

    #[test]
    fn more_workers_than_sources() {
        let d = dirs();
        let sources = write_sources(&d, 1);
        let tc = FakeToolchain::new();
        let mut cache = BuildCache::new(&d.cache_file);
        let report = Scheduler::new(&tc, &d.objects, &d.temp, 16)
            .run(sources, &mut cache)
            .unwrap();
        assert_eq!(report.compiled.len(), 1);
    }

    #[test]
    fn empty_source_list() {
        let d = dirs();
        let tc = FakeToolchain::new();
        let mut cache = BuildCache::new(&d.cache_file);
        let report = Scheduler::new(&tc, &d.objects, &d.temp, 4)
            .run(Vec::new(), &mut cache)
            .unwrap();
        assert_eq!(report, ScheduleReport::default());
    }

    #[test]
    fn zero_workers_rejected() {
        let d = dirs();
        let tc = FakeToolchain::new();
        let mut cache = BuildCache::new(&d.cache_file);
        let err = Scheduler::new(&tc, &d.objects, &d.temp, 0)
            .run(write_sources(&d, 1), &mut cache)
            .unwrap_err();
        assert!(matches!(err, BuildError::NoWorkers));
        assert_eq!(tc.compile_count(), 0);
    }

    #[test]
    fn compile_failure_leaves_cache_untouched() {
        let d = dirs();
        let sources = write_sources(&d, 3);
        let tc = FakeToolchain::failing_compile("unit1.cpp");
        let mut cache = BuildCache::new(&d.cache_file);

        let report = Scheduler::new(&tc, &d.objects, &d.temp, 2)
            .run(sources.clone(), &mut cache)
            .unwrap();

        assert_eq!(report.compiled.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].source, sources[1]);
        assert!(report.failed[0].reason.contains("exit code 1"));
        assert!(cache.get(&sources[1]).is_none());
        assert!(cache.get(&sources[0]).is_some());
    }

    #[test]
    fn expansion_failure_is_reported() {
        let d = dirs();
        let missing = d.src.join("gone.cpp");
        let tc = FakeToolchain::new();
        let mut cache = BuildCache::new(&d.cache_file);
        let report = Scheduler::new(&tc, &d.objects, &d.temp, 1)
            .run(vec![missing.clone()], &mut cache)
            .unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].source, missing);
        assert_eq!(tc.compile_count(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn expansion_without_output_is_a_failure() {
        let d = dirs();
        let first = d.src.join("a.cpp");
        let silent = d.src.join("silent.cpp");
        fs::write(&first, "int a() { return 1; }\n").unwrap();
        fs::write(&silent, "int s() { return 2; }\n").unwrap();
        let tc = FakeToolchain::silent_expand("silent.cpp");
        let mut cache = BuildCache::new(&d.cache_file);

        // One worker, so silent.cpp reuses the temp file a.cpp left behind.
        let report = Scheduler::new(&tc, &d.objects, &d.temp, 1)
            .run(vec![first.clone(), silent.clone()], &mut cache)
            .unwrap();

        assert_eq!(tc.expanded(), vec![first.clone(), silent.clone()]);
        assert_eq!(report.compiled, vec![first.clone()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].source, silent);
        assert!(report.failed[0].reason.contains("expansion output"));
        assert_eq!(tc.compiled(), vec![first.clone()]);
        assert!(cache.get(&first).is_some());
        assert!(cache.get(&silent).is_none());
        assert!(!d.objects.join("silent.o").exists());
    }

    #[test]
    fn temp_files_named_by_worker_index() {
        let d = dirs();
        let sources = write_sources(&d, 8);
        let mut cache = BuildCache::new(&d.cache_file);
        Scheduler::new(&FakeToolchain::new(), &d.objects, &d.temp, 3)
            .run(sources, &mut cache)
            .unwrap();

        for entry in fs::read_dir(&d.temp).unwrap() {
            let name = entry.unwrap().file_name().into_string().unwrap();
            let index: usize = name
                .strip_prefix("worker_")
                .and_then(|n| n.strip_suffix(".i"))
                .unwrap()
                .parse()
                .unwrap();
            assert!(index < 3);
        }
    }
}

//! Path sources
//!
//! A source runs on its own producer thread and pushes numbered paths into
//! the bounded path queue. A full queue blocks the producer only, never the
//! workers reading from it.

use crossbeam_channel::Sender;
use log::{debug, error, warn};
use std::path::PathBuf;
use walkdir::WalkDir;

/// Where candidate paths come from
#[derive(Debug, Clone)]
pub enum PathSource {
    /// Explicit paths, emitted once each in the given order (ingest mode)
    List(Vec<PathBuf>),
    /// Regular files found under each root (rebuild mode)
    Walk(Vec<PathBuf>),
}

/// A path waiting to be hashed
#[derive(Debug, Clone)]
pub struct QueuedPath {
    pub seq: u64,
    pub path: PathBuf,
}

/// What the producer did
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceStats {
    pub emitted: u64,
    pub walk_errors: usize,
}

impl PathSource {
    /// Number of paths the source will emit, when known up front
    pub fn len_hint(&self) -> Option<usize> {
        match self {
            PathSource::List(paths) => Some(paths.len()),
            PathSource::Walk(_) => None,
        }
    }

    /// Emit every path into the queue, then drop the sender to close it.
    ///
    /// Stops early if all receivers are gone.
    pub(crate) fn produce(self, tx: Sender<QueuedPath>) -> SourceStats {
        let mut emitter = Emitter {
            tx,
            stats: SourceStats::default(),
        };

        match self {
            PathSource::List(paths) => {
                for path in paths {
                    if !emitter.emit(path) {
                        break;
                    }
                }
            }
            PathSource::Walk(roots) => walk_roots(&roots, &mut emitter),
        }

        emitter.stats
    }
}

struct Emitter {
    tx: Sender<QueuedPath>,
    stats: SourceStats,
}

impl Emitter {
    /// Returns false once the queue has no readers left
    fn emit(&mut self, path: PathBuf) -> bool {
        let seq = self.stats.emitted;
        if self.tx.send(QueuedPath { seq, path }).is_err() {
            warn!("Path queue closed early, stopping producer");
            return false;
        }
        self.stats.emitted += 1;
        true
    }
}

/// Walk each root, emitting regular files. Entry errors are logged and the
/// walk moves on; one summary error is logged at the end.
fn walk_roots(roots: &[PathBuf], emitter: &mut Emitter) {
    let mut first_error: Option<String> = None;

    for root in roots {
        debug!("Walking {}", root.display());

        let walker = WalkDir::new(root).follow_links(false).sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Walk error: {}", e);
                    emitter.stats.walk_errors += 1;
                    first_error.get_or_insert_with(|| e.to_string());
                    continue;
                }
            };

            let file_type = entry.file_type();
            let is_regular =
                file_type.is_file() || (file_type.is_symlink() && entry.path().is_file());
            if !is_regular {
                continue;
            }

            if !emitter.emit(entry.into_path()) {
                return;
            }
        }
    }

    if let Some(first) = first_error {
        error!(
            "Directory walk finished with {} error(s); first: {}",
            emitter.stats.walk_errors, first
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::fs;
    use tempfile::TempDir;

    fn collect(source: PathSource) -> (Vec<QueuedPath>, SourceStats) {
        let (tx, rx) = unbounded();
        let stats = source.produce(tx);
        (rx.iter().collect(), stats)
    }

    #[test]
    fn test_list_emits_in_order_once() {
        let paths = vec![
            PathBuf::from("b.jpg"),
            PathBuf::from("a.jpg"),
            PathBuf::from("c.mp3"),
        ];
        let (queued, stats) = collect(PathSource::List(paths.clone()));

        assert_eq!(stats.emitted, 3);
        assert_eq!(
            queued.iter().map(|q| q.path.clone()).collect::<Vec<_>>(),
            paths
        );
        assert_eq!(
            queued.iter().map(|q| q.seq).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_len_hint() {
        assert_eq!(PathSource::List(vec![PathBuf::from("x")]).len_hint(), Some(1));
        assert_eq!(PathSource::Walk(vec![PathBuf::from("/")]).len_hint(), None);
    }

    #[test]
    fn test_walk_emits_only_files_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::write(root.join("b.jpg"), b"b").unwrap();
        fs::write(root.join("a.jpg"), b"a").unwrap();
        fs::write(root.join("sub/c.mp3"), b"c").unwrap();
        fs::write(root.join("sub/deeper/d.mov"), b"d").unwrap();

        let (queued, stats) = collect(PathSource::Walk(vec![root.to_path_buf()]));

        assert_eq!(stats.walk_errors, 0);
        let relative: Vec<PathBuf> = queued
            .iter()
            .map(|q| q.path.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("a.jpg"),
                PathBuf::from("b.jpg"),
                PathBuf::from("sub/c.mp3"),
                PathBuf::from("sub/deeper/d.mov"),
            ]
        );
    }

    #[test]
    fn test_walk_missing_root_is_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("kept.png"), b"kept").unwrap();

        let (queued, stats) = collect(PathSource::Walk(vec![
            temp_dir.path().join("does-not-exist"),
            temp_dir.path().to_path_buf(),
        ]));

        assert_eq!(stats.walk_errors, 1);
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].seq, 0);
        assert!(queued[0].path.ends_with("kept.png"));
    }

    #[test]
    fn test_produce_stops_when_receiver_dropped() {
        let (tx, rx) = unbounded();
        drop(rx);

        let stats = PathSource::List(vec![PathBuf::from("a"), PathBuf::from("b")]).produce(tx);
        assert_eq!(stats.emitted, 0);
    }
}

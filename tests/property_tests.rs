use patman::fs::{FileSystem, PathKind};
use patman::manifest::{ManifestStore, PatternEvent};
use patman::precompile::NoopPrecompiler;
use patman::utils;
use proptest::prelude::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// File system that keeps written files in memory
#[derive(Clone, Default)]
struct InMemory {
    files: Rc<RefCell<HashMap<PathBuf, String>>>,
}

impl FileSystem for InMemory {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let text = String::from_utf8_lossy(contents).into_owned();
        self.files.borrow_mut().insert(path.to_path_buf(), text);
        Ok(())
    }

    fn kind(&self, _path: &Path) -> io::Result<Option<PathKind>> {
        Ok(None)
    }
}

const MANIFEST: &str = "/site/patterns/patterns.json";

fn new_store(fs: &InMemory) -> ManifestStore {
    ManifestStore::load(
        PathBuf::from("/site/patterns"),
        PathBuf::from(MANIFEST),
        Box::new(fs.clone()),
        Box::new(NoopPrecompiler),
    )
}

fn pattern_path() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["atoms", "molecules", "organism", "templates", "pages"]),
        "[a-z_][a-z0-9-]{0,8}",
    )
        .prop_map(|(folder, name)| format!("{folder}/{name}.hbs"))
}

fn pattern_event() -> impl Strategy<Value = PatternEvent> {
    prop_oneof![
        pattern_path().prop_map(|path| PatternEvent::Added { path }),
        pattern_path().prop_map(|path| PatternEvent::Changed { path }),
        pattern_path().prop_map(|path| PatternEvent::Deleted { path }),
        (pattern_path(), pattern_path()).prop_map(|(old, path)| PatternEvent::Renamed { old, path }),
    ]
}

proptest! {
    #[test]
    fn test_persisted_manifest_stays_sorted(
        events in prop::collection::vec(pattern_event(), 1..40)
    ) {
        // Invariant: the written array is non-decreasing by filepath, byte-wise
        let fs = InMemory::default();
        let mut store = new_store(&fs);

        for event in &events {
            store.apply(event).unwrap();
        }

        if let Ok(text) = fs.read_to_string(Path::new(MANIFEST)) {
            let manifest = patman::manifest::Manifest::from_json(&text).unwrap();
            for pair in manifest.patterns.windows(2) {
                prop_assert!(pair[0].filepath.as_bytes() <= pair[1].filepath.as_bytes());
            }
        }
    }

    #[test]
    fn test_readding_live_path_never_duplicates(
        events in prop::collection::vec(pattern_event(), 0..20),
        path in pattern_path()
    ) {
        let fs = InMemory::default();
        let mut store = new_store(&fs);
        for event in &events {
            store.apply(event).unwrap();
        }

        let add = PatternEvent::Added { path: path.clone() };
        store.apply(&add).unwrap();
        let count = store.patterns().len();
        store.apply(&add).unwrap();

        prop_assert_eq!(store.patterns().len(), count);
        prop_assert_eq!(
            store.live_patterns().filter(|e| e.filepath == path).count(),
            1
        );
    }

    #[test]
    fn test_manifest_paths_are_normalized(raw in "[a-z./\\\\]{0,24}") {
        // Invariant: no backslashes, no leading or trailing slash, no empty or dot segments
        if let Some(path) = utils::to_manifest_path(Path::new("/site/patterns"), &raw) {
            prop_assert!(!path.contains('\\'));
            prop_assert!(!path.starts_with('/'));
            prop_assert!(!path.ends_with('/'));
            prop_assert!(!path.contains("//"));
            prop_assert!(!path.is_empty());
            prop_assert!(path.split('/').all(|s| s != "." && s != ".."));
        }
    }
}

//! Lazy directory tree model over a [`RemoteFilesystem`].
//!
//! Presents the remote namespace as a generic hierarchical data model
//! (row/column addressing, parent/child navigation) without ever listing
//! more of the remote tree than the caller has expanded. Nodes live in an
//! arena (`Vec<TreeNode>` addressed by [`NodeId`]); parent links are plain
//! indices, never owning, so destruction is simply dropping the model.
//!
//! A node's children are computed at most once and never recomputed, which
//! makes the `(row, parent)` ↔ node mapping stable for the lifetime of the
//! model — tree widgets that cache such addresses stay valid between
//! structural-change notifications.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::fs::path::{basename, extension, normalize};
use crate::fs::{EntryInfo, RemoteFilesystem};

/// Handle to one node in a [`FsTreeModel`] arena.
///
/// Only meaningful for the model that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Fetch/cache state of a file node, mutated only by the fetch
/// orchestrator. `Cached` is terminal for the node's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Fetching,
    Cached,
}

/// Enabled/selectable hints for presentation, mirroring item-flag
/// semantics of tree widgets: a visible-but-inert entry is selectable
/// without being enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemFlags {
    pub enabled: bool,
    pub selectable: bool,
}

/// One materialized entry of the remote namespace.
#[derive(Debug)]
struct TreeNode {
    /// Absolute POSIX-style remote path.
    path: String,
    /// `None` when `stat` failed at construction; such nodes render as
    /// inert and never expand, but their siblings stay usable.
    info: Option<EntryInfo>,
    parent: Option<NodeId>,
    /// `None` until the first `child_count()` on a directory node.
    children: Option<Vec<NodeId>>,
    fetch_state: FetchState,
}

/// Lazily-populated tree model rooted at a configured remote path.
///
/// Column 0 is the display name (path basename), column 1 the
/// human-readable size for files.
pub struct FsTreeModel {
    fs: Arc<dyn RemoteFilesystem>,
    nodes: Vec<TreeNode>,
    openable: HashSet<String>,
}

const COLUMN_COUNT: usize = 2;

impl FsTreeModel {
    /// Build a model rooted at `root_path`, statting the root once.
    ///
    /// `openable_suffixes` are leading-dot suffixes (`".txt"`) that the
    /// host can open; they drive [`flags()`](Self::flags) and the
    /// double-click policy. A root whose `stat` fails yields an inert
    /// root (logged), not an error — the view simply stays empty.
    pub fn new(
        fs: Arc<dyn RemoteFilesystem>,
        root_path: &str,
        openable_suffixes: impl IntoIterator<Item = String>,
    ) -> Self {
        let path = normalize(root_path);
        let info = match fs.stat(&path) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("stat failed for root {path}: {e}");
                None
            }
        };
        let root = TreeNode {
            path,
            info,
            parent: None,
            children: None,
            fetch_state: FetchState::Idle,
        };
        Self {
            fs,
            nodes: vec![root],
            openable: openable_suffixes.into_iter().collect(),
        }
    }

    /// Shared handle to the underlying filesystem.
    pub fn filesystem(&self) -> Arc<dyn RemoteFilesystem> {
        Arc::clone(&self.fs)
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of children, materializing them on first call.
    ///
    /// For a directory this triggers exactly one `list()` ever; the result
    /// is cached on the node for its lifetime. File and inert nodes report
    /// 0 without touching the backend.
    pub fn child_count(&mut self, id: NodeId) -> usize {
        if self.nodes[id.0].children.is_none() && self.is_dir(id) {
            self.populate(id);
        }
        self.nodes[id.0].children.as_ref().map_or(0, Vec::len)
    }

    /// Child at `row`, or `None` past the end. Pure navigation — children
    /// must already be materialized.
    pub fn child(&self, id: NodeId, row: usize) -> Option<NodeId> {
        self.nodes[id.0]
            .children
            .as_ref()
            .and_then(|c| c.get(row).copied())
    }

    /// Parent of a node, `None` for the root. Pure navigation.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Row of a node within its parent's children. The root is row 0.
    pub fn row_of(&self, id: NodeId) -> usize {
        let Some(parent) = self.nodes[id.0].parent else {
            return 0;
        };
        self.nodes[parent.0]
            .children
            .as_ref()
            .and_then(|c| c.iter().position(|&n| n == id))
            .unwrap_or(0)
    }

    /// Whether the node may have children (it is a directory). Never
    /// triggers a backend call.
    pub fn has_children(&self, id: NodeId) -> bool {
        self.is_dir(id)
    }

    /// Display data for a column: 0 → basename, 1 → formatted size for
    /// files, `None` for directories and inert nodes.
    pub fn data(&self, id: NodeId, column: usize) -> Option<String> {
        let node = &self.nodes[id.0];
        match column {
            0 => Some(basename(&node.path).to_string()),
            1 => match node.info {
                Some(info) if info.is_file() => Some(format_size(info.size)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Column header text.
    pub fn header(&self, column: usize) -> Option<&'static str> {
        match column {
            0 => Some("Name"),
            1 => Some("Size"),
            _ => None,
        }
    }

    pub fn column_count(&self) -> usize {
        COLUMN_COUNT
    }

    /// Selectability policy: directories are always enabled and
    /// selectable (to permit navigation); files are selectable, and
    /// enabled only when their suffix is openable; inert nodes are
    /// neither.
    pub fn flags(&self, id: NodeId) -> ItemFlags {
        let node = &self.nodes[id.0];
        match node.info {
            None => ItemFlags {
                enabled: false,
                selectable: false,
            },
            Some(info) if info.is_dir() => ItemFlags {
                enabled: true,
                selectable: true,
            },
            Some(_) => ItemFlags {
                enabled: self.is_openable(id),
                selectable: true,
            },
        }
    }

    /// Whether the node's suffix is in the openable set. Applies to files
    /// (openable for fetch) and to directories (openable as a container
    /// format directly from remote storage).
    pub fn is_openable(&self, id: NodeId) -> bool {
        extension(&self.nodes[id.0].path)
            .map(|ext| self.openable.contains(ext))
            .unwrap_or(false)
    }

    /// Absolute remote path of a node.
    pub fn path(&self, id: NodeId) -> &str {
        &self.nodes[id.0].path
    }

    /// Leading-dot suffix of a node's basename, if any.
    pub fn extension(&self, id: NodeId) -> Option<&str> {
        extension(&self.nodes[id.0].path)
    }

    pub fn is_dir(&self, id: NodeId) -> bool {
        self.nodes[id.0].info.map(|i| i.is_dir()).unwrap_or(false)
    }

    pub fn is_file(&self, id: NodeId) -> bool {
        self.nodes[id.0].info.map(|i| i.is_file()).unwrap_or(false)
    }

    /// Metadata snapshot, `None` for inert nodes.
    pub fn info(&self, id: NodeId) -> Option<EntryInfo> {
        self.nodes[id.0].info
    }

    /// Visual state hint so the presentation layer can substitute an
    /// in-flight/done icon for the generic file icon.
    pub fn fetch_state(&self, id: NodeId) -> FetchState {
        self.nodes[id.0].fetch_state
    }

    pub(crate) fn set_fetch_state(&mut self, id: NodeId, state: FetchState) {
        self.nodes[id.0].fetch_state = state;
    }

    /// Materialize the children of a directory node: one `list()`, one
    /// `stat()` per entry, sorted by basename ascending (case-sensitive).
    /// The node's own path is excluded even if the backend echoes it.
    fn populate(&mut self, id: NodeId) {
        let path = self.nodes[id.0].path.clone();
        let listing = match self.fs.list(&path) {
            Ok(listing) => listing,
            Err(e) => {
                warn!("list failed for {path}: {e}");
                self.nodes[id.0].children = Some(Vec::new());
                return;
            }
        };

        let mut paths: Vec<String> = listing
            .into_iter()
            .map(|p| normalize(&p))
            .filter(|p| p != &path)
            .collect();
        paths.sort_by(|a, b| basename(a).cmp(basename(b)));
        paths.dedup();
        debug!("listed {} entries under {path}", paths.len());

        let mut children = Vec::with_capacity(paths.len());
        for child_path in paths {
            let info = match self.fs.stat(&child_path) {
                Ok(info) => Some(info),
                Err(e) => {
                    warn!("stat failed for {child_path}: {e}");
                    None
                }
            };
            let child_id = NodeId(self.nodes.len());
            self.nodes.push(TreeNode {
                path: child_path,
                info,
                parent: Some(id),
                children: None,
                fetch_state: FetchState::Idle,
            });
            children.push(child_id);
        }
        self.nodes[id.0].children = Some(children);
    }
}

/// Human-readable size: binary-prefixed, rounded to two decimals with
/// trailing zeros trimmed.
pub fn format_size(size: u64) -> String {
    const KIB: u64 = 1024;
    if size < KIB {
        return format!("{size} B");
    }
    let (value, unit) = if size < KIB.pow(2) {
        (size as f64 / KIB as f64, "KB")
    } else if size < KIB.pow(3) {
        (size as f64 / KIB.pow(2) as f64, "MB")
    } else if size < KIB.pow(4) {
        (size as f64 / KIB.pow(3) as f64, "GB")
    } else {
        (size as f64 / KIB.pow(4) as f64, "TB")
    };
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {unit}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FsError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory filesystem with per-operation call counters.
    struct MockFs {
        entries: HashMap<String, EntryInfo>,
        listings: HashMap<String, Vec<String>>,
        list_calls: Mutex<HashMap<String, usize>>,
        stat_calls: Mutex<usize>,
    }

    impl MockFs {
        fn new() -> Self {
            Self {
                entries: HashMap::new(),
                listings: HashMap::new(),
                list_calls: Mutex::new(HashMap::new()),
                stat_calls: Mutex::new(0),
            }
        }

        fn dir(mut self, path: &str, children: &[&str]) -> Self {
            self.entries
                .insert(path.to_string(), EntryInfo::directory());
            self.listings.insert(
                path.to_string(),
                children.iter().map(|c| c.to_string()).collect(),
            );
            self
        }

        fn file(mut self, path: &str, size: u64) -> Self {
            self.entries.insert(path.to_string(), EntryInfo::file(size));
            self
        }

        fn list_count(&self, path: &str) -> usize {
            *self.list_calls.lock().unwrap().get(path).unwrap_or(&0)
        }
    }

    impl RemoteFilesystem for MockFs {
        fn list(&self, path: &str) -> Result<Vec<String>, FsError> {
            *self
                .list_calls
                .lock()
                .unwrap()
                .entry(path.to_string())
                .or_insert(0) += 1;
            self.listings
                .get(path)
                .cloned()
                .ok_or_else(|| FsError::NotFound(path.to_string()))
        }

        fn stat(&self, path: &str) -> Result<EntryInfo, FsError> {
            *self.stat_calls.lock().unwrap() += 1;
            self.entries
                .get(path)
                .copied()
                .ok_or_else(|| FsError::NotFound(path.to_string()))
        }

        fn fetch(&self, _remote: &str, _local: &std::path::Path) -> Result<(), FsError> {
            Ok(())
        }
    }

    fn sample_fs() -> Arc<MockFs> {
        Arc::new(
            MockFs::new()
                .dir("/data", &["/data/sub", "/data/a.txt", "/data/b.dat"])
                .dir("/data/sub", &[])
                .file("/data/a.txt", 2048)
                .file("/data/b.dat", 10),
        )
    }

    fn openable() -> Vec<String> {
        vec![".txt".to_string(), ".zarr".to_string()]
    }

    #[test]
    fn root_is_statted_once_at_construction() {
        let fs = sample_fs();
        let model = FsTreeModel::new(fs.clone(), "/data", openable());
        assert_eq!(model.path(model.root()), "/data");
        assert!(model.is_dir(model.root()));
        assert_eq!(*fs.stat_calls.lock().unwrap(), 1);
    }

    #[test]
    fn children_sorted_by_name_ascending() {
        let fs = sample_fs();
        let mut model = FsTreeModel::new(fs, "/data", openable());
        let root = model.root();
        assert_eq!(model.child_count(root), 3);

        let names: Vec<String> = (0..3)
            .map(|row| model.data(model.child(root, row).unwrap(), 0).unwrap())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.dat", "sub"]);
    }

    #[test]
    fn child_count_lists_exactly_once() {
        let fs = sample_fs();
        let mut model = FsTreeModel::new(fs.clone(), "/data", openable());
        let root = model.root();

        let first = model.child_count(root);
        let first_children: Vec<NodeId> =
            (0..first).filter_map(|row| model.child(root, row)).collect();

        let second = model.child_count(root);
        let second_children: Vec<NodeId> =
            (0..second).filter_map(|row| model.child(root, row)).collect();

        assert_eq!(first, second);
        assert_eq!(first_children, second_children);
        assert_eq!(fs.list_count("/data"), 1);
    }

    #[test]
    fn own_path_excluded_from_listing() {
        // Backend echoes the directory itself, like a `.`-equivalent entry.
        let fs = Arc::new(
            MockFs::new()
                .dir("/data", &["/data", "/data/a.txt"])
                .file("/data/a.txt", 1),
        );
        let mut model = FsTreeModel::new(fs, "/data", openable());
        let root = model.root();
        assert_eq!(model.child_count(root), 1);
        assert_eq!(model.data(model.child(root, 0).unwrap(), 0).unwrap(), "a.txt");
    }

    #[test]
    fn file_node_reports_zero_children_without_listing() {
        let fs = sample_fs();
        let mut model = FsTreeModel::new(fs.clone(), "/data", openable());
        let root = model.root();
        model.child_count(root);
        let file = model.child(root, 0).unwrap();
        assert!(model.is_file(file));

        assert_eq!(model.child_count(file), 0);
        assert!(!model.has_children(file));
        assert_eq!(fs.list_count("/data/a.txt"), 0);
    }

    #[test]
    fn parent_navigation() {
        let fs = sample_fs();
        let mut model = FsTreeModel::new(fs, "/data", openable());
        let root = model.root();
        model.child_count(root);

        let sub = model.child(root, 2).unwrap();
        assert_eq!(model.parent_of(sub), Some(root));
        assert_eq!(model.parent_of(root), None);
        assert_eq!(model.row_of(sub), 2);
    }

    #[test]
    fn size_column_for_files_only() {
        let fs = sample_fs();
        let mut model = FsTreeModel::new(fs, "/data", openable());
        let root = model.root();
        model.child_count(root);

        let a_txt = model.child(root, 0).unwrap();
        let sub = model.child(root, 2).unwrap();
        assert_eq!(model.data(a_txt, 1).unwrap(), "2 KB");
        assert_eq!(model.data(sub, 1), None);
        assert_eq!(model.data(root, 1), None);
    }

    #[test]
    fn selectability_policy() {
        let fs = sample_fs();
        let mut model = FsTreeModel::new(fs, "/data", openable());
        let root = model.root();
        model.child_count(root);

        // Directory: enabled + selectable.
        assert_eq!(
            model.flags(root),
            ItemFlags {
                enabled: true,
                selectable: true
            }
        );
        // Openable file: enabled + selectable.
        let a_txt = model.child(root, 0).unwrap();
        assert_eq!(
            model.flags(a_txt),
            ItemFlags {
                enabled: true,
                selectable: true
            }
        );
        // Non-openable file: selectable but not enabled.
        let b_dat = model.child(root, 1).unwrap();
        assert_eq!(
            model.flags(b_dat),
            ItemFlags {
                enabled: false,
                selectable: true
            }
        );
    }

    #[test]
    fn stat_failure_isolated_to_entry() {
        // /data/broken is listed but cannot be statted.
        let fs = Arc::new(
            MockFs::new()
                .dir("/data", &["/data/broken", "/data/ok.txt"])
                .file("/data/ok.txt", 5),
        );
        let mut model = FsTreeModel::new(fs, "/data", openable());
        let root = model.root();
        assert_eq!(model.child_count(root), 2);

        let broken = model.child(root, 0).unwrap();
        assert!(model.info(broken).is_none());
        assert_eq!(
            model.flags(broken),
            ItemFlags {
                enabled: false,
                selectable: false
            }
        );
        assert_eq!(model.child_count(broken), 0);

        let ok = model.child(root, 1).unwrap();
        assert!(model.is_file(ok));
        assert_eq!(
            model.flags(ok),
            ItemFlags {
                enabled: true,
                selectable: true
            }
        );
    }

    #[test]
    fn list_failure_yields_empty_cached_children() {
        let mut mock = MockFs::new().dir("/data", &["/data/sub"]).dir("/data/sub", &[]);
        // Remove the listing to force a list error on the root.
        mock.listings.remove("/data");
        let fs = Arc::new(mock);
        let mut model = FsTreeModel::new(fs.clone(), "/data", openable());
        let root = model.root();
        assert_eq!(model.child_count(root), 0);
        assert_eq!(model.child_count(root), 0);
        // Failed listing is cached too; no retry storm against the backend.
        assert_eq!(fs.list_count("/data"), 1);
    }

    #[test]
    fn container_directory_is_openable() {
        let fs = Arc::new(
            MockFs::new()
                .dir("/data", &["/data/vol.zarr"])
                .dir("/data/vol.zarr", &[]),
        );
        let mut model = FsTreeModel::new(fs, "/data", openable());
        let root = model.root();
        model.child_count(root);
        let zarr = model.child(root, 0).unwrap();
        assert!(model.is_dir(zarr));
        assert!(model.is_openable(zarr));
    }

    #[test]
    fn headers_and_columns() {
        let fs = sample_fs();
        let model = FsTreeModel::new(fs, "/data", openable());
        assert_eq!(model.column_count(), 2);
        assert_eq!(model.header(0), Some("Name"));
        assert_eq!(model.header(1), Some("Size"));
        assert_eq!(model.header(2), None);
    }

    #[test]
    fn format_size_boundaries() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1 MB");
        assert_eq!(format_size(1024u64.pow(3)), "1 GB");
        assert_eq!(format_size(1024u64.pow(4)), "1 TB");
    }

    #[test]
    fn format_size_rounds_to_two_decimals() {
        // 1.. KB with a repeating fraction.
        assert_eq!(format_size(1234), "1.21 KB");
        assert_eq!(format_size(5 * 1024 * 1024 + 512 * 1024), "5.5 MB");
    }
}

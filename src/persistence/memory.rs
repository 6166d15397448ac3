use crate::activity::model::Activity;
use crate::case::model::TestCase;
use crate::directory::model::DirectoryNode;
use crate::project::model::Project;
use crate::suite::model::TestSuite;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process backend. Each collection is guarded separately; there is no
/// atomicity across operations, so concurrent writers are last-write-wins.
#[derive(Default)]
pub struct MemoryStore {
    pub(crate) projects: RwLock<Vec<Project>>,
    pub(crate) suites: RwLock<Vec<TestSuite>>,
    pub(crate) test_cases: RwLock<Vec<TestCase>>,
    /// Directory trees keyed by project id.
    pub(crate) directories: RwLock<HashMap<String, Vec<DirectoryNode>>>,
    /// Append-only, oldest first.
    pub(crate) activity: RwLock<Vec<Activity>>,
}

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use thiserror::Error;
use versa_classfile::ClassFile;
use versa_core::QualifiedName;

use crate::archive::{self, is_non_type_classfile, JMOD_CLASSES_PREFIX};
use crate::discovery::{JdkDiscoveryError, JdkInstallation, JdkLayout};
use crate::JdkClassStub;

#[derive(Debug)]
struct ClassArchive {
    path: PathBuf,
    prefix: &'static str,
    entries: OnceCell<HashSet<String>>,
}

impl ClassArchive {
    fn entries(&self) -> Result<&HashSet<String>, JdkIndexError> {
        self.entries.get_or_try_init(|| {
            let zip = archive::open_archive(&self.path)?;
            let entries: HashSet<String> = zip
                .file_names()
                .filter_map(|name| archive::entry_to_internal_name(name, self.prefix))
                .filter(|internal| !is_non_type_classfile(internal))
                .map(str::to_owned)
                .collect();
            tracing::debug!(archive = %self.path.display(), classes = entries.len(), "indexed JDK archive");
            Ok(entries)
        })
    }
}

/// Lazily populated view of a JDK's standard-library classes.
#[derive(Debug)]
pub struct JdkIndex {
    archives: Vec<ClassArchive>,
    stubs: Mutex<HashMap<String, Arc<JdkClassStub>>>,
    missing: Mutex<HashSet<String>>,
}

impl JdkIndex {
    pub fn discover(home_override: Option<&Path>) -> Result<Self, JdkIndexError> {
        let install = JdkInstallation::discover(home_override)?;
        Self::from_installation(&install)
    }

    pub fn from_jdk_root(root: impl AsRef<Path>) -> Result<Self, JdkIndexError> {
        let install = JdkInstallation::from_root(root)?;
        Self::from_installation(&install)
    }

    pub fn from_installation(install: &JdkInstallation) -> Result<Self, JdkIndexError> {
        let archives = match install.layout() {
            JdkLayout::Jmods(dir) => {
                let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| p.extension().is_some_and(|ext| ext == "jmod"))
                    .collect();
                if paths.is_empty() {
                    return Err(JdkIndexError::NoModulesFound { dir: dir.clone() });
                }
                // `java.base` holds nearly every lookup; search it first.
                paths.sort_by_key(|p| {
                    let file_name = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
                    (file_name != "java.base.jmod", file_name.to_owned())
                });
                paths
                    .into_iter()
                    .map(|path| ClassArchive {
                        path,
                        prefix: JMOD_CLASSES_PREFIX,
                        entries: OnceCell::new(),
                    })
                    .collect()
            }
            JdkLayout::RtJar(path) => vec![ClassArchive {
                path: path.clone(),
                prefix: "",
                entries: OnceCell::new(),
            }],
        };

        tracing::debug!(
            root = %install.root().display(),
            archives = archives.len(),
            "opened JDK class archives"
        );

        Ok(Self {
            archives,
            stubs: Mutex::new(HashMap::new()),
            missing: Mutex::new(HashSet::new()),
        })
    }

    /// Parsed stub for `name`, or `None` when no archive contains it.
    pub fn lookup(&self, name: &QualifiedName) -> Result<Option<Arc<JdkClassStub>>, JdkIndexError> {
        let internal = name.to_slash_qualified();
        if let Some(stub) = self.stubs.lock().get(&internal).cloned() {
            return Ok(Some(stub));
        }
        if is_non_type_classfile(&internal) || self.missing.lock().contains(&internal) {
            return Ok(None);
        }

        for archive in &self.archives {
            if !archive.entries()?.contains(&internal) {
                continue;
            }
            let Some(bytes) = archive::read_class_bytes(&archive.path, archive.prefix, &internal)? else {
                continue;
            };
            let stub = Arc::new(JdkClassStub::from(ClassFile::parse(&bytes)?));
            tracing::trace!(class = %internal, archive = %archive.path.display(), "loaded JDK class");
            // Concurrent lookups may race here; the first stored stub wins.
            let stored = self
                .stubs
                .lock()
                .entry(internal)
                .or_insert(stub)
                .clone();
            return Ok(Some(stored));
        }

        self.missing.lock().insert(internal);
        Ok(None)
    }
}

#[derive(Debug, Error)]
pub enum JdkIndexError {
    #[error(transparent)]
    Discovery(#[from] JdkDiscoveryError),

    #[error("no `.jmod` modules found under `{dir}`")]
    NoModulesFound { dir: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    ClassFile(#[from] versa_classfile::Error),
}

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use versa_classfile::MethodDescriptor;
use versa_core::QualifiedName;
use versa_jdk::JdkIndex;

use crate::entry::{ClassEntry, MethodEntry, MethodIdentifier};
use crate::scan::scan_root;
use crate::ClasspathError;

/// Source of the host platform's standard-library classes.
pub trait HostPlatform: Send + Sync {
    /// `Ok(None)` when the host does not know the class.
    fn resolve(&self, name: &QualifiedName) -> Result<Option<ClassEntry>, ClasspathError>;
}

impl HostPlatform for JdkIndex {
    fn resolve(&self, name: &QualifiedName) -> Result<Option<ClassEntry>, ClasspathError> {
        Ok(self.lookup(name)?.map(|stub| ClassEntry::from(stub.as_ref())))
    }
}

/// Name → [`ClassEntry`] table built from classpath roots.
///
/// The scanned table is immutable after construction. The only later mutation
/// is the memo cache of host-platform entries.
pub struct ClasspathIndex {
    classes: HashMap<QualifiedName, Arc<ClassEntry>>,
    host: Option<Box<dyn HostPlatform>>,
    host_cache: Mutex<HashMap<QualifiedName, Arc<ClassEntry>>>,
}

impl fmt::Debug for ClasspathIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClasspathIndex")
            .field("classes", &self.classes.len())
            .field("host", &self.host.is_some())
            .field("host_cached", &self.host_cache.lock().len())
            .finish()
    }
}

impl ClasspathIndex {
    /// Scans `roots` in order and layers `additional` on top. On duplicate
    /// names the earliest root wins; `additional` entries win over everything.
    pub fn build(
        roots: &[PathBuf],
        additional: HashMap<QualifiedName, ClassEntry>,
    ) -> Result<Self, ClasspathError> {
        let mut classes = HashMap::new();
        for root in roots {
            for entry in scan_root(root)? {
                classes
                    .entry(entry.name.clone())
                    .or_insert_with(|| Arc::new(entry));
            }
        }
        for (name, entry) in additional {
            classes.insert(name, Arc::new(entry));
        }
        tracing::debug!(roots = roots.len(), classes = classes.len(), "built classpath index");
        Ok(Self::from_table(classes))
    }

    /// An index over exactly `entries`, without scanning anything.
    pub fn from_entries(entries: impl IntoIterator<Item = ClassEntry>) -> Self {
        let classes = entries
            .into_iter()
            .map(|entry| (entry.name.clone(), Arc::new(entry)))
            .collect();
        Self::from_table(classes)
    }

    fn from_table(classes: HashMap<QualifiedName, Arc<ClassEntry>>) -> Self {
        Self {
            classes,
            host: None,
            host_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves `java.*` classes through `host` instead of the scanned table.
    pub fn with_host_platform(mut self, host: impl HostPlatform + 'static) -> Self {
        self.host = Some(Box::new(host));
        self
    }

    /// Number of scanned (and supplementary) classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class_entry(&self, name: &QualifiedName) -> Result<Arc<ClassEntry>, ClasspathError> {
        if let Some(host) = self.host.as_deref().filter(|_| is_host_class(name)) {
            return self.host_entry(host, name);
        }
        self.classes
            .get(name)
            .cloned()
            .ok_or_else(|| unresolved(name))
    }

    fn host_entry(
        &self,
        host: &dyn HostPlatform,
        name: &QualifiedName,
    ) -> Result<Arc<ClassEntry>, ClasspathError> {
        if let Some(entry) = self.host_cache.lock().get(name).cloned() {
            return Ok(entry);
        }
        // Resolved outside the lock; a racing lookup of the same name computes
        // an identical entry and the first insert wins.
        let entry = host.resolve(name)?.ok_or_else(|| unresolved(name))?;
        tracing::trace!(class = %name, "resolved host platform class");
        Ok(self
            .host_cache
            .lock()
            .entry(name.clone())
            .or_insert_with(|| Arc::new(entry))
            .clone())
    }

    /// Exact (name, descriptor) lookup among the methods `class` declares.
    pub fn get_method(
        &self,
        class: &QualifiedName,
        name: &str,
        descriptor: &MethodDescriptor,
    ) -> Result<Option<MethodEntry>, ClasspathError> {
        let id = MethodIdentifier::new(name, descriptor.to_string());
        Ok(self.class_entry(class)?.methods.get(&id).cloned())
    }

    pub fn access_of(&self, class: &QualifiedName) -> Result<u16, ClasspathError> {
        Ok(self.class_entry(class)?.access)
    }

    pub fn is_interface(&self, class: &QualifiedName) -> Result<bool, ClasspathError> {
        Ok(self.class_entry(class)?.is_interface())
    }

    /// Superinterfaces followed by the superclass.
    pub fn direct_super_types(&self, class: &QualifiedName) -> Result<Vec<QualifiedName>, ClasspathError> {
        Ok(self.class_entry(class)?.direct_super_types())
    }

    /// Every transitive supertype of `class`. `java/lang/Object` is always
    /// present, exactly once, and is never looked up itself.
    pub fn super_types_recursively(
        &self,
        class: &QualifiedName,
    ) -> Result<BTreeSet<QualifiedName>, ClasspathError> {
        let object = QualifiedName::java_lang_object();
        let mut out = BTreeSet::new();
        let mut pending = if class.is_java_lang_object() {
            Vec::new()
        } else {
            self.direct_super_types(class)?
        };
        while let Some(next) = pending.pop() {
            if next == object || !out.insert(next.clone()) {
                continue;
            }
            pending.extend(self.direct_super_types(&next)?);
        }
        out.insert(object);
        Ok(out)
    }

    /// The superclass chain of `class`, nearest first, ending with
    /// `java/lang/Object`.
    pub fn super_classes_recursively(
        &self,
        class: &QualifiedName,
    ) -> Result<Vec<QualifiedName>, ClasspathError> {
        let mut out = Vec::new();
        if !class.is_java_lang_object() {
            let mut seen = HashSet::new();
            let mut next = self.class_entry(class)?.super_class.clone();
            while let Some(super_class) = next {
                if super_class.is_java_lang_object() || !seen.insert(super_class.clone()) {
                    break;
                }
                next = self.class_entry(&super_class)?.super_class.clone();
                out.push(super_class);
            }
        }
        out.push(QualifiedName::java_lang_object());
        Ok(out)
    }

    /// Whether `extended` is somewhere in the superclass chain of `extending`.
    pub fn does_class_eventually_extend(
        &self,
        extending: &QualifiedName,
        extended: &QualifiedName,
    ) -> Result<bool, ClasspathError> {
        Ok(self.super_classes_recursively(extending)?.contains(extended))
    }
}

fn is_host_class(name: &QualifiedName) -> bool {
    name.package().is_some_and(|package| package.starts_with(&["java"]))
}

fn unresolved(name: &QualifiedName) -> ClasspathError {
    ClasspathError::UnresolvedClass { name: name.clone() }
}

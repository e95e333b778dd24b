use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;

use versa_classfile::ClassFile;

use crate::{ClassEntry, ClasspathError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    Jar,
    Jmod,
}

/// Every class declared under `root`. A missing root contributes nothing.
pub(crate) fn scan_root(root: &Path) -> Result<Vec<ClassEntry>, ClasspathError> {
    if !root.exists() {
        tracing::debug!(root = %root.display(), "skipping missing classpath root");
        return Ok(Vec::new());
    }
    if root.is_dir() {
        return scan_class_dir(root);
    }

    let kind = match root.extension().and_then(OsStr::to_str) {
        Some("jar" | "zip") => ArchiveKind::Jar,
        Some("jmod") => ArchiveKind::Jmod,
        _ => {
            return Err(ClasspathError::UnsupportedRoot {
                path: root.to_path_buf(),
            })
        }
    };
    scan_archive(root, kind)
}

fn scan_class_dir(dir: &Path) -> Result<Vec<ClassEntry>, ClasspathError> {
    let mut out = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension() != Some(OsStr::new("class")) {
            continue;
        }

        let bytes = std::fs::read(entry.path())?;
        let cf = ClassFile::parse(&bytes)?;
        if is_ignored_class(&cf.this_class) {
            continue;
        }
        out.push(ClassEntry::from(cf));
    }
    tracing::debug!(root = %dir.display(), classes = out.len(), "scanned class directory");
    Ok(out)
}

fn scan_archive(path: &Path, kind: ArchiveKind) -> Result<Vec<ClassEntry>, ClasspathError> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut out = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if !file.is_file() {
            continue;
        }
        let name = file.name().to_owned();
        if !name.ends_with(".class") || name.starts_with("META-INF/") {
            continue;
        }
        // JMODs place class files under `classes/`.
        if kind == ArchiveKind::Jmod && !name.starts_with("classes/") {
            continue;
        }

        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;
        let cf = ClassFile::parse(&bytes)?;
        if is_ignored_class(&cf.this_class) {
            continue;
        }
        out.push(ClassEntry::from(cf));
    }
    tracing::debug!(root = %path.display(), classes = out.len(), "scanned class archive");
    Ok(out)
}

fn is_ignored_class(internal_name: &str) -> bool {
    internal_name == "module-info"
        || internal_name == "package-info"
        || internal_name.ends_with("/package-info")
}

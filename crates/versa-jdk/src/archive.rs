use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::ZipArchive;

/// Entry prefix under which a `.jmod` keeps its class files.
pub(crate) const JMOD_CLASSES_PREFIX: &str = "classes/";

pub(crate) fn open_archive(path: &Path) -> Result<ZipArchive<File>, crate::JdkIndexError> {
    let file = File::open(path)?;
    Ok(ZipArchive::new(file)?)
}

/// Maps an archive entry to the internal class name it holds, or `None` for
/// resources and for entries outside `prefix`.
pub(crate) fn entry_to_internal_name<'a>(entry_name: &'a str, prefix: &str) -> Option<&'a str> {
    entry_name
        .strip_prefix(prefix)?
        .strip_suffix(".class")
        .filter(|name| !name.is_empty() && !name.starts_with("META-INF/"))
}

pub(crate) fn is_non_type_classfile(internal_name: &str) -> bool {
    internal_name == "module-info"
        || internal_name.ends_with("/module-info")
        || internal_name == "package-info"
        || internal_name.ends_with("/package-info")
}

pub(crate) fn read_class_bytes(
    archive_path: &Path,
    prefix: &str,
    internal_name: &str,
) -> Result<Option<Vec<u8>>, crate::JdkIndexError> {
    let mut archive = open_archive(archive_path)?;
    let entry_name = format!("{prefix}{internal_name}.class");

    let res = match archive.by_name(&entry_name) {
        Ok(mut zf) => {
            let mut bytes = Vec::with_capacity(zf.size() as usize);
            zf.read_to_end(&mut bytes)?;
            Ok(Some(bytes))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    };

    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_entries_to_internal_names() {
        assert_eq!(
            entry_to_internal_name("classes/java/lang/String.class", JMOD_CLASSES_PREFIX),
            Some("java/lang/String")
        );
        assert_eq!(
            entry_to_internal_name("java/util/Map$Entry.class", ""),
            Some("java/util/Map$Entry")
        );
        assert_eq!(entry_to_internal_name("lib/security/cacerts", ""), None);
        assert_eq!(entry_to_internal_name("java/lang/String.class", JMOD_CLASSES_PREFIX), None);
        assert_eq!(entry_to_internal_name("META-INF/versions/9/Foo.class", ""), None);
    }

    #[test]
    fn recognizes_non_type_classfiles() {
        assert!(is_non_type_classfile("module-info"));
        assert!(is_non_type_classfile("java/lang/package-info"));
        assert!(!is_non_type_classfile("java/lang/PackageInfoHolder"));
    }
}

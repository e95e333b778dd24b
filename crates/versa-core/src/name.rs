use std::fmt;
use std::path::PathBuf;

use crate::JAVA_LANG_OBJECT;

/// A (non-empty) package path such as `java/util`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName {
    segments: Vec<String>,
}

impl PackageName {
    /// Returns `None` for an empty segment list (the default package).
    pub fn new(segments: Vec<String>) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Self { segments })
        }
    }

    /// Parse `java/util`. An empty string is the default package.
    pub fn from_slashed(package: &str) -> Option<Self> {
        Self::split(package, '/')
    }

    /// Parse `java.util`. An empty string is the default package.
    pub fn from_dotted(package: &str) -> Option<Self> {
        Self::split(package, '.')
    }

    fn split(package: &str, separator: char) -> Option<Self> {
        if package.is_empty() {
            return None;
        }
        Self::new(package.split(separator).map(str::to_owned).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Segment-wise prefix test: `net/minecraft/world` starts with `["net", "minecraft"]`
    /// but `network` does not start with `["net"]`.
    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        prefix.len() <= self.segments.len()
            && prefix
                .iter()
                .zip(&self.segments)
                .all(|(expected, actual)| *expected == actual)
    }

    /// `prefix` followed by the segments of `self`.
    pub fn prepend(&self, prefix: &PackageName) -> PackageName {
        let mut segments = prefix.segments.clone();
        segments.extend(self.segments.iter().cloned());
        PackageName { segments }
    }

    pub fn to_slashed(&self) -> String {
        self.segments.join("/")
    }

    pub fn to_dotted(&self) -> String {
        self.segments.join(".")
    }

    /// Relative directory holding the package's files.
    pub fn to_path(&self) -> PathBuf {
        self.segments.iter().collect()
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}

/// The class part of a qualified name: the outermost class followed by any
/// nested-class components (`Map$Entry` is `["Map", "Entry"]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShortClassName {
    components: Vec<String>,
}

impl ShortClassName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            components: vec![name.into()],
        }
    }

    /// Returns `None` when `components` is empty.
    pub fn from_components(components: Vec<String>) -> Option<Self> {
        if components.is_empty() {
            None
        } else {
            Some(Self { components })
        }
    }

    /// Parse `Outer$Inner`.
    pub fn from_dollar_qualified(name: &str) -> Self {
        Self {
            components: name.split('$').map(str::to_owned).collect(),
        }
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn outermost(&self) -> &str {
        &self.components[0]
    }

    pub fn innermost(&self) -> &str {
        &self.components[self.components.len() - 1]
    }

    /// Every component after the outermost one.
    pub fn inner_classes(&self) -> &[String] {
        &self.components[1..]
    }

    /// Same nesting chain with the outermost component replaced.
    pub fn with_outermost(&self, outermost: impl Into<String>) -> Self {
        let mut components = self.components.clone();
        components[0] = outermost.into();
        Self { components }
    }

    pub fn inner_class(&self, name: impl Into<String>) -> Self {
        let mut components = self.components.clone();
        components.push(name.into());
        Self { components }
    }

    pub fn outer_class(&self) -> Option<Self> {
        if self.components.len() < 2 {
            return None;
        }
        Some(Self {
            components: self.components[..self.components.len() - 1].to_vec(),
        })
    }

    pub fn to_dollar_qualified(&self) -> String {
        self.components.join("$")
    }

    pub fn to_dot_qualified(&self) -> String {
        self.components.join(".")
    }
}

impl fmt::Display for ShortClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dollar_qualified())
    }
}

/// A fully qualified JVM class name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    package: Option<PackageName>,
    short_name: ShortClassName,
}

impl QualifiedName {
    pub fn new(package: Option<PackageName>, short_name: ShortClassName) -> Self {
        Self {
            package,
            short_name,
        }
    }

    /// Parse an internal name such as `java/util/Map$Entry`.
    pub fn from_slash_qualified(name: &str) -> Self {
        Self::split(name, '/')
    }

    /// Parse a binary name such as `java.util.Map$Entry`.
    pub fn from_dot_qualified(name: &str) -> Self {
        Self::split(name, '.')
    }

    fn split(name: &str, separator: char) -> Self {
        let (package, class) = match name.rsplit_once(separator) {
            Some((package, class)) => (PackageName::split(package, separator), class),
            None => (None, name),
        };
        Self {
            package,
            short_name: ShortClassName::from_dollar_qualified(class),
        }
    }

    pub fn java_lang_object() -> Self {
        Self::from_slash_qualified(JAVA_LANG_OBJECT)
    }

    pub fn is_java_lang_object(&self) -> bool {
        self.package
            .as_ref()
            .is_some_and(|p| p.segments() == ["java", "lang"])
            && self.short_name.components() == ["Object"]
    }

    pub fn package(&self) -> Option<&PackageName> {
        self.package.as_ref()
    }

    pub fn short_name(&self) -> &ShortClassName {
        &self.short_name
    }

    pub fn into_parts(self) -> (Option<PackageName>, ShortClassName) {
        (self.package, self.short_name)
    }

    pub fn inner_class(&self, name: impl Into<String>) -> Self {
        Self {
            package: self.package.clone(),
            short_name: self.short_name.inner_class(name),
        }
    }

    pub fn outer_class(&self) -> Option<Self> {
        Some(Self {
            package: self.package.clone(),
            short_name: self.short_name.outer_class()?,
        })
    }

    /// Internal form: `java/util/Map$Entry`.
    pub fn to_slash_qualified(&self) -> String {
        self.join('/', &self.short_name.to_dollar_qualified())
    }

    /// Binary form: `java.util.Map$Entry`.
    pub fn to_binary_name(&self) -> String {
        self.join('.', &self.short_name.to_dollar_qualified())
    }

    /// Source form: `java.util.Map.Entry`.
    pub fn to_source_name(&self) -> String {
        self.join('.', &self.short_name.to_dot_qualified())
    }

    fn join(&self, separator: char, class: &str) -> String {
        match &self.package {
            Some(package) => {
                let mut out = package.segments.join(&separator.to_string());
                out.push(separator);
                out.push_str(class);
                out
            }
            None => class.to_owned(),
        }
    }

    /// Relative output path: package directories, then the `$`-joined class
    /// name with `extension` (`java/util/Map$Entry.class`).
    pub fn to_path(&self, extension: &str) -> PathBuf {
        let mut path = self
            .package
            .as_ref()
            .map(PackageName::to_path)
            .unwrap_or_default();
        path.push(format!("{}.{extension}", self.short_name.to_dollar_qualified()));
        path
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_slash_qualified())
    }
}

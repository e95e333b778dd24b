use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

/// Where an installation keeps its standard-library class files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JdkLayout {
    /// JDK 9+: one `.jmod` per module under `jmods/`.
    Jmods(PathBuf),
    /// JDK 8: a single `rt.jar`.
    RtJar(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JdkInstallation {
    root: PathBuf,
    layout: JdkLayout,
}

impl JdkInstallation {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> &JdkLayout {
        &self.layout
    }

    pub fn from_root(root: impl AsRef<Path>) -> Result<Self, JdkDiscoveryError> {
        let root = root.as_ref().to_path_buf();
        match layout_of(&root) {
            Some(layout) => Ok(Self { root, layout }),
            None => Err(JdkDiscoveryError::MissingClassArchives { root }),
        }
    }

    /// Discover a JDK installation.
    ///
    /// `home_override` wins regardless of environment. Otherwise discovery
    /// sources are tried in this order:
    /// 1. `JAVA_HOME`
    /// 2. `java` on `PATH` (via `java -XshowSettings:properties -version`, then symlink resolution)
    pub fn discover(home_override: Option<&Path>) -> Result<Self, JdkDiscoveryError> {
        if let Some(home) = home_override {
            let candidate = coerce_to_jdk_root(home.to_path_buf()).unwrap_or_else(|| home.to_path_buf());
            return Self::from_root(candidate);
        }

        let discovered = discover_from_java_home()
            .and_then(|p| Self::from_root(p).ok())
            .or_else(|| discover_from_java_on_path().and_then(|p| Self::from_root(p).ok()));

        match discovered {
            Some(install) => {
                tracing::debug!(root = %install.root.display(), "discovered JDK");
                Ok(install)
            }
            None => Err(JdkDiscoveryError::NotFound),
        }
    }
}

#[derive(Debug, Error)]
pub enum JdkDiscoveryError {
    #[error("could not discover a JDK installation (tried JAVA_HOME and `java` on PATH)")]
    NotFound,

    #[error("JDK root `{root}` contains neither `jmods/` nor `lib/rt.jar`")]
    MissingClassArchives { root: PathBuf },
}

fn layout_of(root: &Path) -> Option<JdkLayout> {
    let jmods = root.join("jmods");
    if jmods.is_dir() {
        return Some(JdkLayout::Jmods(jmods));
    }
    ["lib/rt.jar", "jre/lib/rt.jar"]
        .iter()
        .map(|rel| root.join(rel))
        .find(|candidate| candidate.is_file())
        .map(JdkLayout::RtJar)
}

fn discover_from_java_home() -> Option<PathBuf> {
    std::env::var_os("JAVA_HOME")
        .map(PathBuf::from)
        .and_then(coerce_to_jdk_root)
}

fn discover_from_java_on_path() -> Option<PathBuf> {
    discover_from_java_command().or_else(discover_from_java_symlink)
}

fn discover_from_java_command() -> Option<PathBuf> {
    let output = Command::new("java")
        .args(["-XshowSettings:properties", "-version"])
        .output()
        .ok()?;

    // HotSpot prints settings to stderr, but we accept both.
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    let java_home = combined.lines().find_map(|line| {
        let (k, v) = line.trim().split_once('=')?;
        (k.trim() == "java.home").then(|| v.trim().to_owned())
    })?;

    coerce_to_jdk_root(PathBuf::from(java_home))
}

fn discover_from_java_symlink() -> Option<PathBuf> {
    let java_bin = find_java_on_path()?.canonicalize().ok()?;
    let root = java_bin.parent()?.parent()?.to_path_buf();
    coerce_to_jdk_root(root)
}

fn find_java_on_path() -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    let exe_name = if cfg!(windows) { "java.exe" } else { "java" };

    std::env::split_paths(&path_var)
        .map(|dir| dir.join(exe_name))
        .find(|candidate| candidate.is_file())
}

fn coerce_to_jdk_root(mut candidate: PathBuf) -> Option<PathBuf> {
    // `java.home` points at `$JDK/jre` on Java 8 layouts.
    if layout_of(&candidate).is_some() {
        return Some(candidate);
    }

    candidate.pop();
    layout_of(&candidate).map(|_| candidate)
}

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use versa_classpath::{ClasspathError, ClasspathIndex};
use versa_codegen::{BytecodeGenerator, ClassInfo, CodeGenerator, CodegenError, JavaSourceGenerator};
use versa_config::{OutputFormat, VersaConfig};
use versa_core::PackageName;
use versa_jdk::{JdkIndex, JdkIndexError};

use crate::VersionPackage;

#[derive(Debug, Error)]
pub enum AbstractorError {
    #[error("invalid version package `{0}`")]
    InvalidVersionPackage(String),
    #[error("jdk error: {0}")]
    Jdk(#[from] JdkIndexError),
    #[error("classpath error: {0}")]
    Classpath(#[from] ClasspathError),
    #[error("codegen error: {0}")]
    Codegen(#[from] CodegenError),
}

/// One generation session: naming policy, classpath and output settings.
#[derive(Debug)]
pub struct Abstractor {
    version: VersionPackage,
    index: ClasspathIndex,
    format: OutputFormat,
    out_dir: PathBuf,
}

impl Abstractor {
    /// Indexes the configured classpath. `java.*` classes resolve through the
    /// configured JDK home, or one discovered from the environment; without a
    /// JDK they must be on the classpath.
    pub fn new(config: &VersaConfig) -> Result<Self, AbstractorError> {
        let version = VersionPackage::from_config(config)?;
        let mut index = ClasspathIndex::build(&config.classpath, HashMap::new())?;
        match (JdkIndex::discover(config.jdk.home.as_deref()), &config.jdk.home) {
            (Ok(jdk), _) => index = index.with_host_platform(jdk),
            (Err(err), Some(_)) => return Err(err.into()),
            (Err(err), None) => {
                tracing::warn!(error = %err, "no JDK found; java.* classes resolve from the classpath only");
            }
        }
        Ok(Self::from_parts(version, index, config.output.format, config.output.dir.clone()))
    }

    pub fn from_parts(
        version: VersionPackage,
        index: ClasspathIndex,
        format: OutputFormat,
        out_dir: PathBuf,
    ) -> Self {
        Self {
            version,
            index,
            format,
            out_dir,
        }
    }

    pub fn version(&self) -> &VersionPackage {
        &self.version
    }

    pub fn index(&self) -> &ClasspathIndex {
        &self.index
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Generates `info` in `package` with the configured backend, returning
    /// the files written.
    pub fn write_class(
        &self,
        info: ClassInfo,
        package: Option<&PackageName>,
    ) -> Result<Vec<PathBuf>, AbstractorError> {
        let written = match self.format {
            OutputFormat::Bytecode => {
                BytecodeGenerator::new(&self.index).write_class(info, package, &self.out_dir)?
            }
            OutputFormat::Java => JavaSourceGenerator::new().write_class(info, package, &self.out_dir)?,
        };
        tracing::debug!(files = written.len(), format = ?self.format, "generated class");
        Ok(written)
    }
}

//! Versioned companion classes for the `net.minecraft` namespace.
//!
//! Every in-scope class `net.minecraft.x.Foo` has two companions in a
//! versioned package: the interface `<version>.net.minecraft.x.IFoo` and the
//! base class `<version>.net.minecraft.x.BaseFoo`. [`VersionPackage`] derives
//! those names and rewrites whole types through [`Remap`]; [`Abstractor`]
//! wires configuration, classpath and a code generator into one session.

mod session;

use versa_classfile::{GenericReturnType, Remap};
use versa_config::VersaConfig;
use versa_core::{PackageName, QualifiedName};

pub use session::{Abstractor, AbstractorError};

/// Leading package segments of the classes companions are derived for.
pub const IN_SCOPE_ROOT: [&str; 2] = ["net", "minecraft"];

const INTERFACE_PREFIX: &str = "I";
const BASE_PREFIX: &str = "Base";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionPackage {
    prefix: PackageName,
}

impl VersionPackage {
    /// `prefix` in dot (`v1_16_5.api`) or slash (`v1_16_5/api`) form.
    pub fn new(prefix: &str) -> Result<Self, AbstractorError> {
        let parsed = if prefix.contains('/') {
            PackageName::from_slashed(prefix)
        } else {
            PackageName::from_dotted(prefix)
        };
        match parsed {
            Some(prefix) if prefix.segments().iter().all(|segment| !segment.is_empty()) => {
                Ok(Self { prefix })
            }
            _ => Err(AbstractorError::InvalidVersionPackage(prefix.to_owned())),
        }
    }

    pub fn from_config(config: &VersaConfig) -> Result<Self, AbstractorError> {
        Self::new(config.version_package.trim())
    }

    pub fn prefix(&self) -> &PackageName {
        &self.prefix
    }

    pub fn is_in_scope(&self, name: &QualifiedName) -> bool {
        name.package()
            .is_some_and(|package| package.starts_with(&IN_SCOPE_ROOT))
    }

    /// True when any class mentioned by `ty` (type arguments included) is in
    /// scope.
    pub fn is_in_scope_type(&self, ty: &GenericReturnType) -> bool {
        ty.contained_classes().iter().any(|name| self.is_in_scope(name))
    }

    /// `net/minecraft/x/Foo$Bar` becomes `<prefix>/net/minecraft/x/IFoo$Bar`.
    pub fn interface_name(&self, name: &QualifiedName) -> QualifiedName {
        self.companion(name, INTERFACE_PREFIX)
    }

    /// `net/minecraft/x/Foo$Bar` becomes `<prefix>/net/minecraft/x/BaseFoo$Bar`.
    pub fn base_name(&self, name: &QualifiedName) -> QualifiedName {
        self.companion(name, BASE_PREFIX)
    }

    pub fn remap_to_interface<T: Remap>(&self, value: &T) -> T {
        value.remap(&|name: &QualifiedName| {
            self.is_in_scope(name).then(|| self.interface_name(name))
        })
    }

    pub fn remap_to_base<T: Remap>(&self, value: &T) -> T {
        value.remap(&|name: &QualifiedName| self.is_in_scope(name).then(|| self.base_name(name)))
    }

    fn companion(&self, name: &QualifiedName, class_prefix: &str) -> QualifiedName {
        let Some(package) = name.package().filter(|_| self.is_in_scope(name)) else {
            return name.clone();
        };
        let short_name = name.short_name();
        QualifiedName::new(
            Some(package.prepend(&self.prefix)),
            short_name.with_outermost(format!("{class_prefix}{}", short_name.outermost())),
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn name(internal: &str) -> QualifiedName {
        QualifiedName::from_slash_qualified(internal)
    }

    #[test]
    fn prefix_accepts_dots_and_slashes() {
        let dotted = VersionPackage::new("v1_16_5.api").unwrap();
        let slashed = VersionPackage::new("v1_16_5/api").unwrap();
        assert_eq!(dotted, slashed);
        assert_eq!(dotted.prefix().to_slashed(), "v1_16_5/api");
        assert!(VersionPackage::new("").is_err());
        assert!(VersionPackage::new("v1..api").is_err());
    }

    #[test]
    fn scope_is_the_first_two_segments() {
        let version = VersionPackage::new("v1").unwrap();
        assert!(version.is_in_scope(&name("net/minecraft/world/World")));
        assert!(!version.is_in_scope(&name("net/minecraftforge/Event")));
        assert!(!version.is_in_scope(&name("net/Minecraft")));
        assert!(!version.is_in_scope(&name("com/net/minecraft/Foo")));
        assert!(!version.is_in_scope(&name("Foo")));
    }

    #[test]
    fn companion_names() {
        let version = VersionPackage::new("v1").unwrap();
        let inner = name("net/minecraft/world/World$Chunk");
        assert_eq!(
            version.interface_name(&inner).to_slash_qualified(),
            "v1/net/minecraft/world/IWorld$Chunk"
        );
        assert_eq!(
            version.base_name(&inner).to_slash_qualified(),
            "v1/net/minecraft/world/BaseWorld$Chunk"
        );
        let outside = name("java/util/Map$Entry");
        assert_eq!(version.interface_name(&outside), outside);
        assert_eq!(version.base_name(&outside), outside);
    }
}

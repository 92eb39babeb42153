//! Package classification: standard distribution or project code.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Where a package comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageClass {
    /// Part of the language's standard distribution
    Standard,
    /// Project code or a third-party dependency
    Project,
}

impl PackageClass {
    pub fn is_standard(self) -> bool {
        self == PackageClass::Standard
    }
}

/// Package metadata lookup keyed by import path.
pub trait PackageLookup {
    fn classify(&self, import_path: &str) -> PackageClass;
}

impl<L: PackageLookup + ?Sized> PackageLookup for &L {
    fn classify(&self, import_path: &str) -> PackageClass {
        (**self).classify(import_path)
    }
}

impl<L: PackageLookup + ?Sized> PackageLookup for Box<L> {
    fn classify(&self, import_path: &str) -> PackageClass {
        (**self).classify(import_path)
    }
}

/// Classifies by the shape of the import path alone.
///
/// Standard packages have no dot in their first path element
/// (`net/http`), remote ones do (`github.com/x/y`). Local module paths such
/// as `myapp/internal/db` are misread as standard, so this only applies when
/// no toolchain root is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportPathHeuristic;

impl PackageLookup for ImportPathHeuristic {
    fn classify(&self, import_path: &str) -> PackageClass {
        if import_path.is_empty() || matches!(import_path, "main" | "command-line-arguments") {
            return PackageClass::Project;
        }
        let first = import_path.split('/').next().unwrap_or(import_path);
        if first.contains('.') {
            PackageClass::Project
        } else {
            PackageClass::Standard
        }
    }
}

/// Classifies by probing the source tree of an installed toolchain root.
#[derive(Debug, Clone)]
pub struct GorootLookup {
    root: PathBuf,
}

impl GorootLookup {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Lookup over the first candidate that holds a `src` directory.
    pub fn from_candidates<I>(candidates: I) -> Option<Self>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        candidates
            .into_iter()
            .find(|root| Self::is_toolchain_root(root))
            .map(Self::new)
    }

    pub fn is_toolchain_root(root: &Path) -> bool {
        root.join("src").is_dir()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PackageLookup for GorootLookup {
    fn classify(&self, import_path: &str) -> PackageClass {
        if import_path.is_empty() {
            return PackageClass::Project;
        }
        let dir = self.root.join("src").join(import_path);
        if dir.is_dir() {
            PackageClass::Standard
        } else {
            PackageClass::Project
        }
    }
}

/// Fixed set of standard import paths.
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    standard: HashSet<String>,
}

impl StaticLookup {
    pub fn new<I, S>(standard: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            standard: standard.into_iter().map(Into::into).collect(),
        }
    }
}

impl PackageLookup for StaticLookup {
    fn classify(&self, import_path: &str) -> PackageClass {
        if self.standard.contains(import_path) {
            PackageClass::Standard
        } else {
            PackageClass::Project
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_path_heuristic() {
        let lookup = ImportPathHeuristic;
        assert_eq!(lookup.classify("fmt"), PackageClass::Standard);
        assert_eq!(lookup.classify("net/http"), PackageClass::Standard);
        assert_eq!(lookup.classify("github.com/spf13/cobra"), PackageClass::Project);
        assert_eq!(lookup.classify("example.com/app/internal/db"), PackageClass::Project);
        assert_eq!(lookup.classify("main"), PackageClass::Project);
        assert_eq!(lookup.classify(""), PackageClass::Project);
    }

    #[test]
    fn test_goroot_lookup() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("src").join("net").join("http")).unwrap();

        let lookup = GorootLookup::new(root.path());
        assert!(lookup.classify("net/http").is_standard());
        assert!(lookup.classify("net").is_standard());
        assert!(!lookup.classify("example.com/app").is_standard());
        assert!(!lookup.classify("").is_standard());
    }

    #[test]
    fn test_goroot_from_candidates() {
        let empty = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("src").join("fmt")).unwrap();

        let candidates = vec![
            empty.path().join("missing"),
            empty.path().to_path_buf(),
            root.path().to_path_buf(),
        ];
        let lookup = GorootLookup::from_candidates(candidates).unwrap();
        assert_eq!(lookup.root(), root.path());
        assert!(lookup.classify("fmt").is_standard());
        assert!(!lookup.classify("myapp/internal/db").is_standard());

        assert!(GorootLookup::from_candidates(vec![empty.path().to_path_buf()]).is_none());
    }

    #[test]
    fn test_static_lookup_through_reference() {
        let lookup = StaticLookup::new(["fmt", "os"]);
        let by_ref: &dyn PackageLookup = &lookup;
        assert!(by_ref.classify("fmt").is_standard());
        assert!(!by_ref.classify("example.com/fmt").is_standard());
    }
}

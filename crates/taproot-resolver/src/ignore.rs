//! Glob-based exclusion rules for dependency discovery

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::ResolveError;

/// A compiled set of glob patterns; paths matching any of them are excluded
/// from discovery.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    set: GlobSet,
}

impl IgnoreRules {
    pub fn empty() -> Self {
        IgnoreRules {
            set: GlobSet::empty(),
        }
    }

    pub fn new<I, S>(patterns: I) -> Result<Self, ResolveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern.as_ref())?);
        }
        Ok(IgnoreRules {
            set: builder.build()?,
        })
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        self.set.is_match(path)
    }
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::empty()
    }
}

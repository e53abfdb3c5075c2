//! Optional capabilities resolved from cargo features.
//!
//! Each capability is either compiled in or not. Operations that need a missing
//! capability fail with [`Error::CapabilityUnavailable`] instead of silently
//! degrading, and [`warn_missing_once`] reports absent capabilities a single time
//! per process.

use std::fmt;
use std::sync::Once;

use tracing::warn;

use crate::error::{Error, Result};

/// Feature-gated functionality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Seeded random projections (`random-projection` feature).
    RandomProjection,
    /// JSON export of Mapper graphs (`serde` feature).
    GraphExport,
    /// Hierarchical density clustering (`hdbscan` feature).
    Hdbscan,
}

impl Capability {
    /// Every capability known to this crate.
    pub const ALL: [Capability; 3] = [
        Capability::RandomProjection,
        Capability::GraphExport,
        Capability::Hdbscan,
    ];

    /// Short, stable name.
    pub fn name(self) -> &'static str {
        match self {
            Capability::RandomProjection => "random-projection",
            Capability::GraphExport => "graph-export",
            Capability::Hdbscan => "hdbscan",
        }
    }

    /// Cargo feature that enables this capability.
    pub fn feature(self) -> &'static str {
        match self {
            Capability::RandomProjection => "random-projection",
            Capability::GraphExport => "serde",
            Capability::Hdbscan => "hdbscan",
        }
    }

    /// Whether this build includes the capability.
    pub fn is_available(self) -> bool {
        match self {
            Capability::RandomProjection => cfg!(feature = "random-projection"),
            Capability::GraphExport => cfg!(feature = "serde"),
            Capability::Hdbscan => cfg!(feature = "hdbscan"),
        }
    }

    /// Fail fast when the capability is missing.
    pub fn require(self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(Error::CapabilityUnavailable(self))
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (enable the `{}` feature)", self.name(), self.feature())
    }
}

/// Capabilities compiled into this build.
pub fn available() -> Vec<Capability> {
    Capability::ALL
        .into_iter()
        .filter(|c| c.is_available())
        .collect()
}

/// Capabilities this build was compiled without.
pub fn missing() -> Vec<Capability> {
    Capability::ALL
        .into_iter()
        .filter(|c| !c.is_available())
        .collect()
}

static WARN_MISSING: Once = Once::new();

/// Log one warning per missing capability, at most once per process.
pub fn warn_missing_once() {
    WARN_MISSING.call_once(|| {
        for capability in missing() {
            warn!(
                capability = capability.name(),
                feature = capability.feature(),
                "optional capability not compiled in"
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_and_missing_partition_all() {
        let mut all = available();
        all.extend(missing());
        assert_eq!(all.len(), Capability::ALL.len());
        for c in Capability::ALL {
            assert!(all.contains(&c));
        }
    }

    #[test]
    fn require_matches_availability() {
        for c in Capability::ALL {
            match c.require() {
                Ok(()) => assert!(c.is_available()),
                Err(Error::CapabilityUnavailable(missing)) => {
                    assert_eq!(missing, c);
                    assert!(!c.is_available());
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn display_names_the_feature() {
        let text = Capability::GraphExport.to_string();
        assert!(text.contains("graph-export"));
        assert!(text.contains("`serde`"));
    }

    #[test]
    fn warning_is_idempotent() {
        warn_missing_once();
        warn_missing_once();
        assert!(WARN_MISSING.is_completed());
    }
}

//! Package index knowledge: requirement lines, JSON metadata, wheel tags and
//! version selection.
//!
//! # Example
//!
//! ```
//! use pymirror_index::{ReleaseFile, TagFilter};
//!
//! let filter = TagFilter::new().python(Some("cp311")).platform(Some("manylinux_2_17_x86_64"));
//! let wheel = ReleaseFile::new(
//!     "numpy-1.26.4-cp311-cp311-manylinux_2_17_x86_64.manylinux2014_x86_64.whl",
//!     "https://files.pythonhosted.org/packages/numpy.whl",
//! );
//! assert!(filter.matches(&wheel));
//! ```

pub use self::client::{DEFAULT_METADATA_TIMEOUT, MetadataClient};
pub use self::error::{IndexError, Result};
pub use self::matcher::TagFilter;
pub use self::release::{PackageMetadata, ReleaseFile};
pub use self::select::{ReleaseVersion, Selected, VersionSelection};
pub use self::spec::{PackageSpec, parse_requirements};
pub use self::tags::{TagSet, Tags, WheelName, is_python3_tag, split_tags};

mod client;
mod error;
mod matcher;
mod release;
mod select;
mod spec;
mod tags;

//! Persistent property store for decoded export entities.
//!
//! Every decoded entity is persisted as one [`PropertyRecord`] addressed by
//! a [`RecordKey`]. The logical keyspace mirrors a directory tree:
//!
//! ```text
//! pages/<pageId>
//! spaces/<spaceId>
//! spaces/<spaceId>/permissions/<permissionId>
//! <pageId>/attachments/<attachmentId>
//! objects/<objectId>
//! internalusers/<userId>
//! userimpls/<userKey>
//! groups/<groupId>
//! contentPermissionSets/<setId>
//! contentPermissionSets/<setId>/<setId>/<permissionId>
//! ```
//!
//! # Storage Backends
//!
//! All backends implement the [`PropertyStore`] trait:
//!
//! - [`FsPropertyStore`] -- one `properties.json` file per record directory
//! - [`InMemoryPropertyStore`] -- `BTreeMap`-based store for tests
//!
//! # Design Rules
//!
//! 1. `put` overwrites; records are never merged implicitly.
//! 2. Group membership is the one read-modify-write path, via
//!    [`PropertyStore::merge`].
//! 3. A reader never observes a half-written record.
//! 4. The store is written during one pass, then sealed read-only.
//! 5. Concurrent reads of a sealed store are always safe.
//!
//! [`PropertyRecord`]: cxi_types::PropertyRecord

pub mod error;
pub mod fs;
pub mod index;
pub mod key;
pub mod memory;
pub mod traits;
pub mod workdir;

pub use error::{StoreError, StoreResult};
pub use fs::FsPropertyStore;
pub use index::{ExportIndex, ImportStats, IndexBuilder};
pub use key::{RecordKey, RecordSet};
pub use memory::InMemoryPropertyStore;
pub use traits::PropertyStore;
pub use workdir::{Cleanup, Teardown, WorkDir};

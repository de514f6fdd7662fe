//! Streaming decoder for object graph exports.
//!
//! An export is a directory or zip archive holding `entities.xml` (the
//! object graph), `exportDescriptor.properties` and attachment blobs under
//! `attachments/<pageId>/<attachmentId>/<version>`. The decoder reads the
//! object graph exactly once, forward only, and writes every decoded object
//! into a [`PropertyStore`](cxi_store::PropertyStore):
//!
//! - pages and blog posts go to `pages/<id>` and, unless they are
//!   historical revisions, into the per-space indexes;
//! - spaces are registered by key;
//! - group memberships are folded into their parent group record;
//! - attachments and permissions are keyed by their owner;
//! - every other class is stored under `objects/<id>`.
//!
//! [`ExportPackage`] ties the pieces together for an export on disk.

pub mod config;
pub mod decoder;
pub mod descriptor;
pub mod error;
pub mod package;
pub mod progress;
pub mod repair;
mod xml;

pub use config::ImportConfig;
pub use decoder::{attachment_version, ExportDecoder};
pub use descriptor::ExportDescriptor;
pub use error::{DecodeError, DecodeResult};
pub use package::ExportPackage;
pub use progress::{CountingReader, ImportListener, NoopListener};
pub use repair::repair;

// model = "claude-opus-4-5"
// created = "2026-10-19"
// modified = "2026-10-19"
// driver = "Isaac Clayton"

//! Concord - A replicated text sequence for collaborative editing.
//!
//! # Quick Start
//!
//! ```
//! use concord::Document;
//! use concord::key::KeyPair;
//!
//! // Create a replica identity
//! let user = KeyPair::generate();
//!
//! // Create a new document
//! let mut doc = Document::new(user.actor_id());
//!
//! // Hand it the editor's buffer, get back ops for peers
//! let ops = doc.merge("Hello, World!");
//! assert_eq!(doc.visible_text(), "Hello, World!");
//! assert_eq!(ops.len(), 13);
//! ```

pub mod crdt;
pub mod document;
pub mod key;

pub use crdt::Crdt;
pub use crdt::error::ApplyError;
pub use crdt::error::BatchError;
pub use crdt::error::DeleteError;
pub use crdt::error::InsertError;
pub use crdt::id::ActorId;
pub use crdt::id::OpId;
pub use crdt::op::Op;
pub use crdt::op::TextOp;
pub use crdt::sequence::Sequence;
pub use crdt::sequence::SequenceConfig;
pub use document::Document;

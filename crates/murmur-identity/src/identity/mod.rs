//! Identity management — DID derivation, the local identity handle,
//! and the recovery codec.
//!
//! Key material is always carried in an explicit [`LocalIdentity`]
//! value passed between components; there is no ambient or global key
//! state anywhere in the crate.

pub mod did;
pub mod local;
pub mod recovery;

pub use did::Did;
pub use local::LocalIdentity;
pub use recovery::{export_bundle, import_bundle, RecoveryBundle};

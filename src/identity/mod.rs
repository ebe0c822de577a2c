//! Identity pool for request disguise
//!
//! Every outgoing request presents an identity: a browser user-agent plus a
//! header bundle that is consistent with that browser family. Mixing, say, a
//! Firefox user-agent with Chrome client hints is exactly the kind of
//! inconsistency server-side fingerprinting looks for, so the bundle is always
//! derived from the chosen user-agent.

mod pool;

pub use pool::{Identity, IdentityPool};

//! Frame rendering: captions, content fingerprints and the frame compositor.

/// Caption renderers.
pub mod caption;
/// Ledger-to-frames compositing.
pub mod compositor;
/// Content hashing for the frame cache.
pub mod fingerprint;

#[cfg(feature = "core")]
#[doc(inline)]
pub use bintrack_core as core;

#[cfg(feature = "binlist")]
#[doc(inline)]
pub use bintrack_binlist as binlist;

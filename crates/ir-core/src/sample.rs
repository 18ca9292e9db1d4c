//! Sample types

/// Type alias for host audio samples (the host hands us f64 blocks)
pub type Sample = f64;

/// Type alias for impulse-response samples and kernel taps.
///
/// IR files store at most 32-bit data, so the kernel and the input
/// history are kept in single precision.
pub type Tap = f32;

//! FIR filter design and application.
//!
//! - [`design`]: Hamming-windowed sinc highpass, lowpass and band-pass
//!   kernels with MNE's automatic length and transition rules.
//! - [`apply`]: overlap-add zero-phase convolution.

pub mod apply;
pub mod design;

pub use design::{
    auto_filter_length, auto_lowpass_trans_bandwidth, auto_trans_bandwidth, create_filter,
    design_bandpass, design_highpass, design_lowpass, firwin, hamming,
};
pub use apply::{apply_fir_zero_phase, filter_1d};

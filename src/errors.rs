//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`AfterglowError`] covers all failure modes:
//! - GPU initialization failures
//! - Invalid compositor configuration (rejected at construction time)
//! - Render-target lookups that name a missing buffer or chain position
//!
//! Configuration errors are deliberately fail-fast: an invalid level count or
//! a reference to a chain position outside the allocated range is a programming
//! or configuration mistake, never something to paper over at render time.
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, AfterglowError>`.

use thiserror::Error;

/// The main error type for the afterglow compositor.
///
/// Each variant provides specific context about what went wrong.
#[derive(Error, Debug)]
pub enum AfterglowError {
    // ========================================================================
    // GPU Initialization Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// The bloom chain level count is outside the supported range.
    #[error("Invalid bloom level count: {levels} (must be 1..={max})")]
    InvalidLevelCount {
        /// The rejected level count
        levels: u32,
        /// The maximum supported count
        max: u32,
    },

    /// A render target was requested by a name the pool does not hold.
    #[error("Render target not found: {0}")]
    TargetNotFound(String),

    /// A chain position outside the allocated range was referenced.
    #[error("Chain index out of range: {context} (level: {level}, levels: {levels})")]
    ChainIndexOutOfRange {
        /// Description of what was being accessed
        context: &'static str,
        /// The invalid chain level
        level: u32,
        /// The configured level count
        levels: u32,
    },
}

/// Alias for `Result<T, AfterglowError>`.
pub type Result<T> = std::result::Result<T, AfterglowError>;

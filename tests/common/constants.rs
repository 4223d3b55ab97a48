//! Shared constants for end-to-end tests
//!
//! When test data changes (user credentials, clip ids, etc.), update only
//! this file.

#![allow(dead_code)] // Not every test binary uses every constant

// ============================================================================
// Test User Credentials
// ============================================================================

pub const TEST_USER: &str = "testuser";
pub const TEST_PASS: &str = "testpass123";

pub const OTHER_USER: &str = "otheruser";
pub const OTHER_PASS: &str = "otherpass123";

// ============================================================================
// Test Clips
// ============================================================================

/// Clip id for "harbor/morning.wav"
pub const CLIP_1_ID: &str = "clip-1";
/// Clip id for "harbor/noon.wav"
pub const CLIP_2_ID: &str = "clip-2";
/// Clip id for "market/evening.wav"
pub const CLIP_3_ID: &str = "clip-3";

pub const CLIP_1_PATH: &str = "harbor/morning.wav";
pub const CLIP_2_PATH: &str = "harbor/noon.wav";
pub const CLIP_3_PATH: &str = "market/evening.wav";

/// Maximum annotations a clip accepts before leaving the random pool.
pub const QUOTA: usize = 3;

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

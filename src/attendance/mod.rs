//! Attendance service integration: client, normalization, dispatch.
//!
//! The attendance REST API is the external collaborator behind the
//! tool-call protocol. [`client`] wraps its endpoints, [`types`] normalizes
//! its heterogeneous response shapes, and [`dispatcher`] maps a detected
//! directive to exactly one call and builds the second-pass prompt.

pub mod client;
pub mod dispatcher;
pub mod types;

pub use client::{AttendanceApi, AttendanceClient};
pub use dispatcher::{QueryKind, dispatch, second_pass_prompt};
pub use types::{AttendanceRecord, AttendanceResult};

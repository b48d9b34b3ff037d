//! Live browser integration
//!
//! This module provides:
//! - BrowserSession: launch or attach to Chrome over the DevTools Protocol
//! - LabelingDriver: the polling loop that labels clicks in a real tab

pub mod config;
pub mod driver;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use driver::{DriverOptions, DriverReport, FormSubmission, LabelingDriver, LabelingPage};
pub use session::BrowserSession;

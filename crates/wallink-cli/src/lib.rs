//! wallink CLI Library
//!
//! Terminal front end for the deep-link connect flow. The terminal stands in
//! for the platform: the connect URL is printed for the user to open, and
//! redirect URLs are pasted back on stdin.

pub mod config_cmd;
pub mod connect_cmd;

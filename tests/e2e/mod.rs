//! End-to-end tests for debian-upgrader.
//!
//! Each test builds a fake host root in a temporary directory and drives a
//! full [`debian_upgrader::Upgrader`] run against it with recorded commands,
//! canned key downloads and scripted operator answers.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod harness;
mod upgrade_flow;

#![cfg(unix)]

//! Integration tests for launching and stopping a localnet.
//!
//! # Overview
//!
//! These tests drive the launcher end to end against a stand-in node binary:
//! a shell script that answers `localnet` by writing node directories the way
//! the real binary does, and answers `run` by idling until it is terminated.
//! Every test runs in its own temporary home and state directory, so tests do
//! not share ports, PID files or logs.
//!
//! # What is checked
//!
//! - Node directories are patched with their allocated listen addresses.
//! - One PID line per node is written in `pid|name|localnet` form.
//! - Every node gets its own log file, and only non-boot nodes are given the
//!   boot node address.
//! - `stop` terminates exactly the recorded processes.
//! - The `nearup` binary ties the above together from the command line.

mod cli_tests;
mod harness;
mod launch_tests;

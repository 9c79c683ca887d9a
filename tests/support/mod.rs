//! Test support utilities for kvdn-pillar integration tests.
//!
//! Provides an isolated test environment with a store snapshot and a
//! mapping document, plus helpers to run the binary against them.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::path::PathBuf;
use tempfile::TempDir;

/// Test environment with isolated temp directories.
///
/// `dir` holds the store snapshot and mapping document, `home` stands in
/// for the user's home directory. No process-global state is mutated, so
/// tests can safely run in parallel.
pub struct Test {
    /// Temporary directory for fixtures
    pub dir: TempDir,
    /// Temporary home directory
    pub home: TempDir,
}

impl Test {
    /// Create a new empty test environment.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");

        Self { dir, home }
    }

    /// Create a test environment with the standard store and mapping.
    pub fn standard() -> Self {
        let t = Self::new();
        t.write("store.yml", STORE_YAML);
        t.write("kvdn.yml", MAPPING_YAML);
        t
    }

    /// Write a file into the test directory and return its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create fixture dir");
        }
        std::fs::write(&path, contents).expect("failed to write fixture");
        path
    }

    /// Path of a file in the test directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Path of a file as a `String`, for CLI arguments.
    pub fn arg(&self, name: &str) -> String {
        self.path(name).to_string_lossy().to_string()
    }
}

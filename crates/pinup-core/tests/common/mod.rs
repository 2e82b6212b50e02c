#![allow(dead_code)]

pub mod add_server;

use std::fs;
use std::path::Path;

/// Create `name` under `dir` with `contents`.
pub fn write_file(dir: &Path, name: &str, contents: &[u8]) {
    fs::write(dir.join(name), contents).expect("write fixture file");
}

//! JSON samples of server responses and webhook bodies, stored in `src/fixtures`.

use std::path::PathBuf;

use anyhow::Context;
use serde::de::DeserializeOwned;

fn fixture_path(name: &str) -> anyhow::Result<PathBuf> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").context("CARGO_MANIFEST_DIR not set")?;
    Ok(PathBuf::from(manifest_dir).join("src").join("fixtures").join(name))
}

/// Raw contents of a fixture, without surrounding whitespace.
pub fn read_fixture(name: &str) -> anyhow::Result<String> {
    let path = fixture_path(name)?;
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading fixture {}", path.display()))?;
    Ok(raw.trim().to_owned())
}

pub fn read_fixture_as<T: DeserializeOwned>(name: &str) -> anyhow::Result<T> {
    serde_json::from_str(&read_fixture(name)?).with_context(|| format!("decoding fixture {name}"))
}

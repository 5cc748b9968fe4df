//! Build script for the playlist shuffler CLI.
//!
//! Copies the `.env.example` configuration template into the user's local
//! data directory so the application finds a ready-made template next to the
//! place where it looks for its `.env` file:
//! - Linux: `~/.local/share/shufflecli/.env.example`
//! - macOS: `~/Library/Application Support/shufflecli/.env.example`
//! - Windows: `%LOCALAPPDATA%/shufflecli/.env.example`
//!
//! A missing template only produces a cargo warning.

use std::{env, fs, path::PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let template = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("shufflecli");
    fs::create_dir_all(&out_dir)?;

    if template.is_file() {
        fs::copy(&template, out_dir.join(".env.example"))?;
    } else {
        println!(
            "cargo:warning=.env.example not found at {}",
            template.display()
        );
    }

    Ok(())
}

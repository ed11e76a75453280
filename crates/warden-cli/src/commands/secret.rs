//! Secret management commands.
//!
//! `warden secret generate` - Generate a random HMAC signing secret.

use base64::{Engine, engine::general_purpose::STANDARD as B64};
use rand::RngCore;
use std::fs;
use std::path::PathBuf;

/// Smallest secret size accepted by `generate`, in bytes.
pub const MIN_SECRET_BYTES: usize = 16;

/// Produce `bytes` random bytes, base64 encoded.
pub fn random_secret(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::rng().fill_bytes(&mut buf);
    B64.encode(buf)
}

/// Generate a new signing secret.
pub fn generate(bytes: usize, output: Option<PathBuf>) -> anyhow::Result<()> {
    anyhow::ensure!(
        bytes >= MIN_SECRET_BYTES,
        "Secret must be at least {MIN_SECRET_BYTES} bytes, got {bytes}"
    );

    let secret = random_secret(bytes);

    if let Some(path) = output {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &secret)?;

        println!("✔ Generated signing secret: {}", path.display());
        println!();
        println!("⚠️  Keep your secret safe! Never commit it to version control.");
        println!();
        println!("Reference it from warden.yaml:");
        println!("  secret_file: {}", path.display());
        println!("or export it:");
        println!("  export WARDEN_SECRET=$(cat {})", path.display());
    } else {
        println!("{secret}");
    }

    Ok(())
}

mod local;
mod object;

pub use local::LocalAssets;
pub use object::{ObjectStorage, StorageError};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;

/// Storage name for an upload: 32 random bytes, URL-safe base64, plus the extension.
pub fn random_key(extension: &str) -> String {
    let mut random = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut random);
    format!("{}.{}", URL_SAFE_NO_PAD.encode(random), extension)
}

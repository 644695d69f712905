//! Server synthesis for client-side rendered builds

use super::OutputBundleOptions;
use crate::error::{AdapterError, Result};
use crate::fs::FileSystem;
use tracing::info;

/// Prebuilt static-file server, copied verbatim into the bundle
pub const BUNDLED_SERVER: &str = include_str!("../../assets/bundled_server.mjs");

/// Writes the bundled server to `opts.server_file_path`, creating parents
///
/// Only meaningful when `opts.needs_server_generated` is set; callers check.
///
/// The server serves `<server dir>/../browser` unless `BROWSER_DIR` is set at
/// runtime. That matches the builder's `dist/<app>/{browser,server}` layout;
/// a browser bundle anywhere else is not found by the generated server.
pub fn generate_server(fs: &dyn FileSystem, opts: &OutputBundleOptions) -> Result<()> {
    let server_path = &opts.server_file_path;
    fs.write_with_parents(server_path, BUNDLED_SERVER)
        .map_err(|e| AdapterError::from_fs(server_path, e))?;

    info!(path = %server_path.display(), "Generated static server for client-side rendered app");
    Ok(())
}

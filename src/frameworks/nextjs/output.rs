//! Standalone output layout
//!
//! Next's standalone build nests the app under `<distDir>/standalone`, mirroring
//! its position relative to the build root, so a monorepo app `apps/web` ends up
//! in `apps/web/.next/standalone/apps/web`. Static assets and `public/` are not
//! part of that tree and have to be copied in.

use crate::bundle::{OutputBundleOptions, BUNDLE_DIR, DESCRIPTOR_FILE};
use crate::error::{AdapterError, Result};
use crate::fs::FileSystem;
use crate::util::{normalize_path, relative_path};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SERVER_FILE: &str = "server.js";

/// Bundle layout of a Next.js standalone build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextOutputBundleOptions {
    pub bundle: OutputBundleOptions,
    /// `<distDir>/standalone`
    pub output_directory_base_path: PathBuf,
    /// The app inside the standalone tree
    pub output_directory_app_path: PathBuf,
    pub output_public_directory: PathBuf,
    pub output_static_directory: PathBuf,
}

/// Pure path arithmetic over the build root, project and Next build directory
pub fn populate_next_output_bundle_options(
    root: &Path,
    project_dir: &Path,
    next_build_dir: &Path,
    dist_dir: &str,
) -> NextOutputBundleOptions {
    let standalone = normalize_path(&next_build_dir.join("standalone"));
    let app_path = normalize_path(&standalone.join(relative_path(root, project_dir)));
    let static_dir = normalize_path(&app_path.join(dist_dir).join("static"));

    NextOutputBundleOptions {
        bundle: OutputBundleOptions {
            bundle_descriptor_path: normalize_path(&root.join(BUNDLE_DIR).join(DESCRIPTOR_FILE)),
            server_file_path: app_path.join(SERVER_FILE),
            browser_directory: static_dir.clone(),
            needs_server_generated: false,
        },
        output_directory_base_path: standalone,
        output_public_directory: app_path.join("public"),
        output_static_directory: static_dir,
        output_directory_app_path: app_path,
    }
}

/// Copies `<project>/public` (when present) and `<distDir>/static` into the
/// standalone app
pub fn copy_resources(
    fs: &dyn FileSystem,
    project_dir: &Path,
    next_build_dir: &Path,
    opts: &NextOutputBundleOptions,
) -> Result<()> {
    let public = project_dir.join("public");
    if fs.is_dir(&public) {
        fs.copy_dir(&public, &opts.output_public_directory)
            .map_err(|e| AdapterError::from_fs(&opts.output_public_directory, e))?;
        debug!(from = %public.display(), to = %opts.output_public_directory.display(), "Copied public directory");
    }

    let static_assets = next_build_dir.join("static");
    if fs.is_dir(&static_assets) {
        fs.copy_dir(&static_assets, &opts.output_static_directory)
            .map_err(|e| AdapterError::from_fs(&opts.output_static_directory, e))?;
        debug!(from = %static_assets.display(), to = %opts.output_static_directory.display(), "Copied static assets");
    }

    info!(app = %opts.output_directory_app_path.display(), "Copied resources into standalone output");
    Ok(())
}

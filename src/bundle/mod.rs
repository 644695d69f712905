//! Output bundle assembly
//!
//! A bundle is the hidden `.apphosting` directory plus the server entrypoint and
//! browser assets it points at. The modules here resolve where those live,
//! synthesize a server when the build produced none, write the versioned
//! descriptor and finally check that everything landed on disk.

pub mod descriptor;
pub mod options;
pub mod server;
pub mod validator;

pub use descriptor::{
    assemble_descriptor, descriptor_path, env_var_overrides, read_descriptor, write_descriptor,
    AdapterMetadata, AdapterPackage, Availability, EnvVarConfig, Framework, OutputBundleConfig,
    OutputFiles, RunConfig,
};
pub use options::{populate_output_bundle_options, OutputBundleOptions};
pub use server::{generate_server, BUNDLED_SERVER};
pub use validator::{BundleRule, BundleValidator};

/// Hidden bundle directory, relative to the build root
pub const BUNDLE_DIR: &str = ".apphosting";

/// Descriptor file name inside [`BUNDLE_DIR`]
pub const DESCRIPTOR_FILE: &str = "bundle.yaml";

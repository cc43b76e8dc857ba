use clap::Parser;
use std::path::PathBuf;

/// Mirror a Cloud Storage bucket prefix into the current directory
///
/// Zero-byte objects are skipped. Objects whose names are absolute paths or
/// contain `..` are skipped with a warning rather than written outside the
/// current directory.
#[derive(Debug, Parser)]
#[command(name = "bucket-mirror", version)]
pub struct Cli {
    /// Bucket to mirror
    #[arg(value_name = "bucket_name")]
    pub bucket_name: String,

    /// Key prefix to mirror; also the local destination directory
    #[arg(value_name = "prefix")]
    pub prefix: String,

    /// Service account key file (JSON)
    #[arg(value_name = "service_file")]
    pub service_file: PathBuf,
}

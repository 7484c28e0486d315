#![allow(unknown_lints)]
#![allow(require_stability_comment)]

use data_encoding::HEXUPPER;
use sha2::{Digest, Sha256};

#[cfg(not(tarpaulin_include))]
pub mod imagegen;

/// SHA-256 of the whole image file, upper-case hex.
pub fn image_digest(path: &str) -> String {
    let bytes = std::fs::read(path).unwrap();
    HEXUPPER.encode(&Sha256::digest(&bytes))
}

/// Loads both metadata copies of the image at `path`.
pub fn load_metadata(path: &str) -> fvm::FvmResult<fvm::MetadataImage> {
    let mut d = fvm::DiskFile::open_readonly(path)?;
    fvm::MetadataImage::load(&mut d, fvm::DEFAULT_DEVICE_BLOCK_SIZE)
}

/// Runs the checker over the image at `path`.
pub fn check_image(path: &str) -> fvm::FvmResult<fvm::operations::Report> {
    let d = fvm::DiskFile::open_readonly(path)?;
    fvm::operations::Checker::new(d, fvm::DEFAULT_DEVICE_BLOCK_SIZE)
        .silent(true)
        .validate()
}

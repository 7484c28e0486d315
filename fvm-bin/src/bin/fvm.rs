#![cfg(not(tarpaulin_include))]
#![allow(unknown_lints)]
#![allow(require_stability_comment)]

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use fvm::{
    operations::{pave, Checker},
    Compression, Container, DiskFile, KnownType, RawContainer, SparseContainer,
    DEFAULT_DEVICE_BLOCK_SIZE,
};

#[derive(Parser)]
#[command(name = "fvm", about = "Builds, extends, checks and paves FVM volume images")]
struct Cli {
    /// Path to the volume or sparse image.
    image:   PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a volume, or a sparse image with --sparse.
    Create {
        /// Bytes per slice.
        #[arg(long)]
        slice:         u64,
        /// Fixed volume length in bytes. Without it the volume grows as needed.
        #[arg(long)]
        length:        Option<u64>,
        /// Write a sparse image instead of a volume.
        #[arg(long)]
        sparse:        bool,
        /// Compression of the sparse data stream (`none` or `lz4`).
        #[arg(long, default_value = "none")]
        compress:      Compression,
        /// Smallest device the sparse image may be paved onto, 0 for any.
        #[arg(long, default_value = "0")]
        max_disk_size: u64,
        /// Payload to add, as `<type>=<path>`. Partitions are added in the order given.
        #[arg(long = "partition")]
        partitions:    Vec<PartitionArg>,
    },
    /// Add a partition to an existing volume.
    AddPartition {
        /// Partition type (`data`, `blob`, `system`, `install`, ...).
        #[arg(long = "type")]
        kind: KnownType,
        /// Path to the payload.
        #[arg(long)]
        path: PathBuf,
    },
    /// Grow an existing volume.
    Extend {
        /// New volume length in bytes.
        #[arg(long)]
        length: u64,
    },
    /// Check a volume and print its report.
    Check {
        /// Device block size in bytes.
        #[arg(long, default_value_t = DEFAULT_DEVICE_BLOCK_SIZE)]
        block_size: u64,
        /// Print nothing, only set the exit code.
        #[arg(long)]
        silent:     bool,
    },
    /// Pave a sparse image onto the volume path.
    Pave {
        /// Sparse image to pave.
        #[arg(long)]
        sparse: PathBuf,
    },
}

/// A `<type>=<path>` payload given to `create`.
#[derive(Debug, Clone)]
struct PartitionArg {
    kind: KnownType,
    path: PathBuf,
}

impl FromStr for PartitionArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, path) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected <type>=<path>, got {:?}", s))?;
        let kind = kind
            .parse()
            .map_err(|_| anyhow!("unknown partition type {:?}", kind))?;
        Ok(PartitionArg {
            kind,
            path: PathBuf::from(path),
        })
    }
}

fn create(
    image: &Path,
    slice: u64,
    length: Option<u64>,
    sparse: Option<(Compression, u64)>,
    partitions: &[PartitionArg],
) -> Result<()> {
    let mut disk =
        DiskFile::create(image).with_context(|| format!("creating {}", image.display()))?;
    disk.set_len(0)?;
    let mut c: Box<dyn Container> = match sparse {
        Some((compression, max)) => Box::new(SparseContainer::create(disk, slice, compression, max)?),
        None => Box::new(RawContainer::create(disk, slice, length)?),
    };
    for p in partitions {
        c.add_partition(&p.path, p.kind.into())
            .with_context(|| format!("adding {} partition {}", p.kind, p.path.display()))?;
    }
    c.commit()?;
    c.verify().context("verifying image")?;
    Ok(())
}

fn add_partition(image: &Path, kind: KnownType, path: &Path) -> Result<()> {
    let disk = DiskFile::open(image).with_context(|| format!("opening {}", image.display()))?;
    let mut c = RawContainer::open(disk)?;
    c.add_partition(path, kind.into())
        .with_context(|| format!("adding partition {}", path.display()))?;
    c.commit()?;
    c.verify().context("verifying volume")?;
    Ok(())
}

fn extend(image: &Path, length: u64) -> Result<()> {
    let disk = DiskFile::open(image).with_context(|| format!("opening {}", image.display()))?;
    let mut c = RawContainer::open(disk)?;
    c.extend(length)?;
    c.commit()?;
    c.verify().context("verifying volume")?;
    Ok(())
}

fn check(image: &Path, block_size: u64, silent: bool) -> Result<bool> {
    let disk =
        DiskFile::open_readonly(image).with_context(|| format!("opening {}", image.display()))?;
    // The report is printed below, not logged line by line.
    let report = Checker::new(disk, block_size)
        .silent(true)
        .validate()
        .with_context(|| format!("checking {}", image.display()))?;
    if !silent {
        print!("{}", report);
    }
    Ok(report.valid)
}

fn pave_image(image: &Path, sparse: &Path) -> Result<()> {
    let source =
        DiskFile::open_readonly(sparse).with_context(|| format!("opening {}", sparse.display()))?;
    let mut target =
        DiskFile::create(image).with_context(|| format!("creating {}", image.display()))?;
    target.set_len(0)?;
    let c = pave(source, target).with_context(|| format!("paving {}", sparse.display()))?;
    c.verify().context("verifying paved volume")?;
    Ok(())
}

fn run(cli: Cli) -> Result<bool> {
    let image = &cli.image;
    match cli.command {
        Command::Create {
            slice,
            length,
            sparse,
            compress,
            max_disk_size,
            partitions,
        } => {
            let sparse = if sparse {
                Some((compress, max_disk_size))
            } else {
                None
            };
            create(image, slice, length, sparse, &partitions)?
        }
        Command::AddPartition { kind, path } => add_partition(image, kind, &path)?,
        Command::Extend { length } => extend(image, length)?,
        Command::Check { block_size, silent } => return check(image, block_size, silent),
        Command::Pave { sparse } => pave_image(image, &sparse)?,
    }
    Ok(true)
}

fn main() {
    let cli = Cli::parse();
    fvm::test::logging::init_log();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("fvm: {:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use fvm::test::{payload::raw_image, volume::create_volume_file};

    #[test]
    fn partitions_keep_their_order() {
        let cli = Cli::try_parse_from([
            "fvm",
            "out.img",
            "create",
            "--slice",
            "8192",
            "--partition",
            "blob=b.img",
            "--partition",
            "data=d.img",
            "--sparse",
            "--compress",
            "lz4",
        ])
        .unwrap();
        match cli.command {
            Command::Create {
                slice,
                sparse,
                compress,
                partitions,
                ..
            } => {
                assert_eq!(slice, 8192);
                assert!(sparse);
                assert_eq!(compress, Compression::Lz4);
                let kinds: Vec<_> = partitions.iter().map(|p| p.kind).collect();
                assert_eq!(kinds, [KnownType::Blob, KnownType::Data]);
                assert_eq!(partitions[1].path, PathBuf::from("d.img"));
            }
            _ => panic!("parsed the wrong command"),
        }
    }

    #[test]
    fn bad_arguments_rejected() {
        assert!(Cli::try_parse_from(["fvm", "a.img", "create", "--partition", "data"]).is_err());
        assert!(Cli::try_parse_from([
            "fvm", "a.img", "add-partition", "--type", "swap", "--path", "p"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["fvm", "a.img", "extend"]).is_err());
        let cli = Cli::try_parse_from(["fvm", "a.img", "check"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Check {
                block_size: DEFAULT_DEVICE_BLOCK_SIZE,
                silent: false
            }
        ));
    }

    #[test]
    fn check_reports_volume() {
        let name = "fvm_cli_check.img";
        create_volume_file(name, 4096, vec![(KnownType::Data, raw_image(3 * 4096, 1))]);
        assert!(check(Path::new(name), DEFAULT_DEVICE_BLOCK_SIZE, false).unwrap());
        assert!(check(Path::new(name), DEFAULT_DEVICE_BLOCK_SIZE, true).unwrap());
        extend(Path::new(name), 8 << 20).unwrap();
        assert!(check(Path::new(name), DEFAULT_DEVICE_BLOCK_SIZE, true).unwrap());
        assert_eq!(std::fs::metadata(name).unwrap().len(), 8 << 20);
        std::fs::remove_file(name).unwrap();
    }
}

use fvm::{
    format_from_disk,
    test::payload::{blobfs_image, minfs_image, raw_image},
    Compression, Container, KnownType, RawContainer, SparseContainer, SuperblockType,
};

use super::utils::{create_file, create_zeroed, patch_header, pin_instances, tamper_active};

/// Bytes per slice of the small raw volumes
pub const SMALL_SLICE: u64 = 8192;

/// Bytes per slice of volumes holding filesystem payloads
pub const FS_SLICE: u64 = 1 << 20;

/// Zero-filled file
pub fn generate_0000(path: &str) {
    create_zeroed(path, 1 << 20);
}

/// Growable volume, one 3 slice data partition
pub fn generate_0001(path: &str) {
    let d = create_file(path);
    let mut c = RawContainer::create(d, 4096, None).unwrap();
    c.add_format(format_from_disk(raw_image(3 * 4096, 5), KnownType::Data).unwrap())
        .unwrap();
    c.commit().unwrap();
    pin_instances(path);
}

/// Slice 2 of image 0001 handed to partition 99
pub fn generate_0002(path: &str) {
    use fvm::SliceEntry;

    generate_0001(path);
    tamper_active(path, |m| {
        m.set_slice(2, &SliceEntry::allocated(99, 1)).unwrap();
    });
}

/// Primary header of image 0001 declares a 1 TiB allocation table
pub fn generate_0003(path: &str) {
    generate_0001(path);
    patch_header(path, SuperblockType::Primary, |h| {
        h.allocation_table_size = 1 << 40;
    });
}

/// Primary copy of image 0001 claims a newer generation but lost its magic
pub fn generate_0004(path: &str) {
    generate_0001(path);
    patch_header(path, SuperblockType::Primary, |h| {
        h.magic = 0;
        h.generation += 10;
    });
}

/// Fixed size volume with minfs, blobfs and raw partitions, added over three commits
pub fn generate_0005(path: &str) {
    let d = create_file(path);
    let mut c = RawContainer::create(d.clone(), FS_SLICE, Some(24 * FS_SLICE)).unwrap();
    c.add_format(format_from_disk(minfs_image(64, 40), KnownType::Data).unwrap())
        .unwrap();
    c.commit().unwrap();

    let mut c = RawContainer::open(d.clone()).unwrap();
    c.add_format(format_from_disk(blobfs_image(64, 200, 8, &[0, 3, 17]), KnownType::Blob).unwrap())
        .unwrap();
    c.commit().unwrap();

    let mut c = RawContainer::open(d).unwrap();
    c.add_format(format_from_disk(raw_image(5000, 9), KnownType::System).unwrap())
        .unwrap();
    c.commit().unwrap();
    pin_instances(path);
}

/// LZ4 sparse image with minfs, blobfs and raw partitions
pub fn generate_0006(path: &str) {
    let d = create_file(path);
    let mut c = SparseContainer::create(d, FS_SLICE, Compression::Lz4, 0).unwrap();
    c.add_format(format_from_disk(minfs_image(64, 40), KnownType::Data).unwrap())
        .unwrap();
    c.add_format(format_from_disk(blobfs_image(64, 200, 8, &[1, 2, 150]), KnownType::Blob).unwrap())
        .unwrap();
    c.add_format(format_from_disk(raw_image(3 * 4096 + 100, 3), KnownType::Install).unwrap())
        .unwrap();
    c.commit().unwrap();
}

/// Image 0006 paved onto a fresh volume
pub fn generate_0007(path: &str) {
    let sparse = format!("{}.sparse", path);
    generate_0006(&sparse);
    let target = create_file(path);
    fvm::operations::pave(fvm::DiskFile::open_readonly(&sparse).unwrap(), target).unwrap();
    pin_instances(path);
}

/// One megabyte volume holding a 5 slice raw partition, extended to 16 megabytes
pub fn generate_0008(path: &str) {
    let d = create_file(path);
    let mut c = RawContainer::create(d.clone(), SMALL_SLICE, Some(1 << 20)).unwrap();
    c.add_format(format_from_disk(raw_image(5 * SMALL_SLICE as usize, 7), KnownType::Data).unwrap())
        .unwrap();
    c.commit().unwrap();

    let mut c = RawContainer::open(d).unwrap();
    c.extend(16 << 20).unwrap();
    c.commit().unwrap();
    pin_instances(path);
}

/// Primary header of image 0001 declares a 1 TiB partition table
pub fn generate_0009(path: &str) {
    generate_0001(path);
    patch_header(path, SuperblockType::Primary, |h| {
        h.partition_table_size = 1 << 40;
    });
}

use fvm::{
    Disk, DiskFile, Guid, MetadataImage, SuperblockType, DEFAULT_DEVICE_BLOCK_SIZE,
    MAX_VPARTITIONS,
};

/// Replaces the file at `path` with an empty one.
pub fn create_file(path: &str) -> Disk {
    let _ = std::fs::remove_file(path);
    DiskFile::create(path).unwrap()
}

/// Replaces the file at `path` with `len` zero bytes.
pub fn create_zeroed(path: &str, len: u64) -> Disk {
    let mut d = create_file(path);
    d.set_len(len).unwrap();
    d
}

/// Instance GUIDs are random; pin them to the slot index so images are reproducible.
/// Copies whose checksum doesn't verify are left alone.
pub fn pin_instances(path: &str) {
    let mut d = DiskFile::open(path).unwrap();
    let image = MetadataImage::load(&mut d, DEFAULT_DEVICE_BLOCK_SIZE).unwrap();
    let len = image.header().metadata_allocated_bytes();
    for which in [SuperblockType::Primary, SuperblockType::Secondary] {
        let mut m = image.copy(which).clone();
        if !m.verify_checksum() {
            continue;
        }
        for i in 1..MAX_VPARTITIONS {
            if let Some(mut e) = m.partition(i).filter(|e| !e.is_free()) {
                let mut g = [0u8; 16];
                g[..8].copy_from_slice(&(i as u64).to_le_bytes());
                e.instance = Guid(g);
                m.set_partition(i, &e).unwrap();
            }
        }
        m.update_checksum();
        d.write_at(which.offset(len), m.as_bytes()).unwrap();
    }
}

/// Rewrites the authoritative copy through `f`, resealing its checksum.
pub fn tamper_active<F: FnOnce(&mut fvm::MetadataBuffer)>(path: &str, f: F) {
    let mut d = DiskFile::open(path).unwrap();
    fvm::test::volume::tamper(&mut d, f);
}

/// Overwrites header fields of the copy at `which` without touching its checksum.
pub fn patch_header<F: FnOnce(&mut fvm::Header)>(path: &str, which: SuperblockType, f: F) {
    let mut d = DiskFile::open(path).unwrap();
    let len = MetadataImage::load(&mut d, DEFAULT_DEVICE_BLOCK_SIZE)
        .unwrap()
        .header()
        .metadata_allocated_bytes();
    let offset = which.offset(len);
    let mut raw = [0u8; 88];
    d.read_at(offset, &mut raw).unwrap();
    let mut h = fvm::Header::read(&raw).unwrap();
    f(&mut h);
    h.write(&mut raw);
    d.write_at(offset, &raw).unwrap();
}

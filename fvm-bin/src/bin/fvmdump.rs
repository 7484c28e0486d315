#![cfg(not(tarpaulin_include))]
#![allow(clippy::all)]
#![allow(unknown_lints)]
#![allow(require_stability_comment)]

use fvm::*;

use colored::*;

fn main() {
    let path = match std::env::args().nth(1) {
        Some(p) => p,
        None => {
            eprintln!("usage: fvmdump <image>");
            std::process::exit(2);
        }
    };
    let mut d = match DiskFile::open_readonly(&path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("fvmdump: {}: {}", path, e);
            std::process::exit(1);
        }
    };
    println!("Image is {} bytes long", d.size().unwrap_or(0));
    let image = match MetadataImage::load(&mut d, DEFAULT_DEVICE_BLOCK_SIZE) {
        Ok(i) => i,
        Err(e) => {
            println!("{}", format!("No usable metadata: {}", e).red());
            let mut raw = [0u8; 88];
            if d.read_at(0, &mut raw).is_ok() {
                if let Ok(h) = Header::read(&raw) {
                    println!("Primary header:");
                    print_header(&raw, &h, false);
                }
            }
            std::process::exit(1);
        }
    };
    for which in [SuperblockType::Primary, SuperblockType::Secondary] {
        print_copy(which, image.copy(which), which == image.active());
        println!();
    }
}

fn print_copy(which: SuperblockType, m: &MetadataBuffer, active: bool) {
    let h = m.header();
    if active {
        println!("{}", format!("{} copy (active):", which).green().bold());
    } else {
        println!("{} copy:", which);
    }
    print_header(m.as_bytes(), &h, m.verify_checksum());
    if h.check_bounds().is_err() {
        println!("\t{}", "table sizes out of bounds, tables skipped".red());
        return;
    }

    println!("Partitions:");
    for i in 1..MAX_VPARTITIONS {
        let e = match m.partition(i) {
            Some(e) if !e.is_free() => e,
            _ => continue,
        };
        let kind = KnownType::from_guid(&e.type_guid)
            .map_or_else(|| "unknown".to_string(), |t| t.to_string());
        print!("\t{:4} : {:24} ", i, e.name.to_string().cyan());
        print!("type:{} ({}) ", e.type_guid, kind);
        print!("inst:{} ", e.instance);
        print!("slices:{} ", e.slices);
        if e.is_active() {
            print!("flags:{:#x}", e.flags);
        } else {
            print!("flags:{}", format!("{:#x}", e.flags).yellow());
        }
        println!();
    }

    println!("Slices:");
    let mut run: Option<(u64, u64, SliceEntry)> = None;
    for p in 1..=h.pslice_count {
        let s = match m.slice(p) {
            Some(s) if s.allocated => s,
            _ => {
                print_run(run.take());
                continue;
            }
        };
        run = match run {
            Some((start, len, first))
                if first.vpart_index == s.vpart_index
                    && first.vslice_index + len == s.vslice_index =>
            {
                Some((start, len + 1, first))
            }
            prev => {
                print_run(prev);
                Some((p, 1, s))
            }
        };
    }
    print_run(run);
}

fn print_run(run: Option<(u64, u64, SliceEntry)>) {
    if let Some((start, len, s)) = run {
        let owner = if s.vpart_in_range() {
            format!("vpart {}", s.vpart_index).normal()
        } else {
            format!("vpart {}", s.vpart_index).red()
        };
        println!(
            "\t{:6}-{:<6} : {} vslice {}-{}",
            start,
            start + len - 1,
            owner,
            s.vslice_index,
            s.vslice_index + len - 1
        );
    }
}

fn print_header(buf: &[u8], h: &Header, checksum_ok: bool) {
    let fields: [(&str, u64); 10] = [
        ("magic", h.magic),
        ("version", h.version),
        ("pslices", h.pslice_count),
        ("slice", h.slice_size),
        ("device", h.device_size),
        ("ptab_off", h.partition_table_offset),
        ("ptab_size", h.partition_table_size),
        ("atab_off", h.allocation_table_offset),
        ("atab_size", h.allocation_table_size),
        ("gen", h.generation),
    ];
    for (i, (name, value)) in fields.iter().enumerate() {
        print_hex(i * 8, &buf[i * 8..i * 8 + 8]);
        if *name == "magic" {
            if *value == MAGIC {
                print!("{}:{}", name, format!("{:016x}", value).green());
            } else {
                print!("{}:{}", name, format!("{:016x}", value).red());
            }
        } else {
            print!("{}:{}", name, value);
        }
        println!();
    }
    print_hex(80, &buf[80..88]);
    if checksum_ok {
        print!("sum:{}", format!("{:08x}", h.checksum).green());
    } else {
        print!("sum:{}", format!("{:08x}", h.checksum).red());
    }
    println!();
}

fn print_hex(offset: usize, data: &[u8]) {
    print!("\t{:06x} : ", offset);
    for b in data {
        print!("{:02x} ", b);
    }
    print!("| ");
}

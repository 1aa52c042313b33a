use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use vlbi_storage::chunk::SuffixInterner;
use vlbi_storage::openfile::OpenFile;
use vlbi_storage::vbs;

#[derive(Args)]
pub struct VbsOpenArgs {
    /// Recording name (the "SCAN" part of `SCAN` / `SCAN_dsSUFFIX`)
    recording: String,

    /// Mountpoint directories to scan
    #[arg(required = true)]
    mountpoints: Vec<PathBuf>,

    /// Dump a byte range as hex: `OFFSET:LEN`
    #[arg(long, value_name = "OFFSET:LEN")]
    read: Option<String>,
}

fn parse_range(text: &str) -> Result<(u64, usize), String> {
    let (offset, len) = text.split_once(':').ok_or("expected OFFSET:LEN")?;
    Ok((offset.parse().map_err(|e| format!("bad offset: {e}"))?, len.parse().map_err(|e| format!("bad len: {e}"))?))
}

pub fn run(args: &VbsOpenArgs) -> Result<(), Box<dyn Error>> {
    let interner = SuffixInterner::new();
    let mut chunks = Vec::new();
    for mountpoint in &args.mountpoints {
        chunks.extend(vbs::scan_mountpoint(mountpoint, &args.recording, &interner)?);
    }
    vbs::check_no_duplicates(&chunks)?;

    let mut file = OpenFile::new(chunks);
    println!("recording {:?}: {} bytes across {} mountpoint(s)", args.recording, file.file_size(), args.mountpoints.len());

    if let Some(range) = &args.read {
        let (offset, len) = parse_range(range)?;
        file.seek(std::io::SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        let n = file.read(&mut buf)?;
        buf.truncate(n);
        println!("{n} bytes at offset {offset}:");
        for chunk in buf.chunks(16) {
            let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
            println!("{}", hex.join(" "));
        }
    }

    Ok(())
}

use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use vlbi_storage::chunk::SuffixInterner;
use vlbi_storage::mk6;
use vlbi_storage::openfile::OpenFile;

#[derive(Args)]
pub struct Mk6OpenArgs {
    /// Mark6 container file
    file: PathBuf,

    /// Dump a byte range as hex: `OFFSET:LEN`
    #[arg(long, value_name = "OFFSET:LEN")]
    read: Option<String>,
}

fn parse_range(text: &str) -> Result<(u64, usize), String> {
    let (offset, len) = text.split_once(':').ok_or("expected OFFSET:LEN")?;
    Ok((offset.parse().map_err(|e| format!("bad offset: {e}"))?, len.parse().map_err(|e| format!("bad len: {e}"))?))
}

pub fn run(args: &Mk6OpenArgs) -> Result<(), Box<dyn Error>> {
    let interner = SuffixInterner::new();
    let stem = args
        .file
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or("file has no usable stem")?;
    let chunks = mk6::scan_mk6_file(&args.file, stem, &interner)?;

    let mut file = OpenFile::new(chunks);
    println!("{:?}: {} bytes", args.file, file.file_size());

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

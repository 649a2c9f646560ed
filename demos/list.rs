use streamzip::{error::ArchiveError, uncompress::ArchiveReader};
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() -> Result<(), ArchiveError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "archive.zip".to_owned());
    let archive = ArchiveReader::open(&path).await?;

    for entry in archive.list_entries().await? {
        if entry.is_directory {
            println!("{:>10}  {}  {}", "-", entry.mtime, entry.filename);
            continue;
        }

        let mut content = Vec::new();
        archive
            .open_entry(&entry)
            .await?
            .read_to_end(&mut content)
            .await?;
        let crc = crc32fast::hash(&content);
        println!(
            "{:>10}  {}  {}  {}",
            content.len(),
            entry.mtime,
            entry.filename,
            if crc == entry.crc { "ok" } else { "CRC MISMATCH" }
        );
    }

    Ok(())
}

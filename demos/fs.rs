use streamzip::{
    compress::{encode, ArchiveOptions, ZipEntry},
    compression::CompressionMethod,
    types::FileDateTime,
};
use tokio::fs::File;

#[tokio::main]
async fn main() {
    let entries = vec![
        ZipEntry::file("file1.txt", &b"hello\n"[..])
            .size(6)
            .mtime(FileDateTime::Now),
        ZipEntry::file("file2.txt", &b"world\n"[..]).compression(CompressionMethod::Deflate),
        ZipEntry::directory("empty"),
    ];

    let file = File::create("archive.zip").await.unwrap();
    let (size, _) = encode(entries, ArchiveOptions::default())
        .write_to(file)
        .await
        .unwrap();

    println!("archive.zip: {} bytes", size);
}

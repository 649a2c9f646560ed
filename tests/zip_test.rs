mod common;

use std::io::{Cursor, Read, Write};

use common::{archive_bytes, read_entry, sample_content};
use streamzip::{
    compress::{encode, ArchiveOptions, ZipEntry},
    compression::CompressionMethod,
    uncompress::{list_entries, MemoryReader},
};

fn read_with_zip_crate(archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>, name: &str) -> Vec<u8> {
    let mut file = archive.by_name(name).unwrap();
    let mut content = Vec::new();
    file.read_to_end(&mut content).unwrap();
    content
}

#[tokio::test]
async fn zip_crate_reads_streamed_archive() {
    let content = sample_content(80_000);
    let entries = vec![
        ZipEntry::file("hello.txt", &b"hello"[..]).size(5),
        ZipEntry::directory("docs"),
        ZipEntry::file("docs/data.txt", Cursor::new(content.clone()))
            .compression(CompressionMethod::Deflate),
        ZipEntry::file("unsized.bin", Cursor::new(vec![7u8; 3000])),
    ];
    let bytes = archive_bytes(encode(entries, ArchiveOptions::default().comments("zip"))).await;

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 4);
    assert_eq!(archive.comment(), b"zip");

    assert_eq!(read_with_zip_crate(&mut archive, "hello.txt"), b"hello");
    assert_eq!(read_with_zip_crate(&mut archive, "docs/data.txt"), content);
    assert_eq!(read_with_zip_crate(&mut archive, "unsized.bin"), vec![7u8; 3000]);

    let directory = archive.by_name("docs/").unwrap();
    assert!(directory.is_dir());
    assert_eq!(directory.size(), 0);
}

#[tokio::test]
async fn streamed_reader_lists_zip_crate_archive() {
    let content = sample_content(50_000);

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let deflated = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    let stored = deflated.compression_method(zip::CompressionMethod::Stored);

    writer.add_directory("assets/", stored).unwrap();
    writer.start_file("assets/data.txt", deflated).unwrap();
    writer.write_all(&content).unwrap();
    writer.start_file("raw.bin", stored).unwrap();
    writer.write_all(&[1, 2, 3, 4]).unwrap();
    writer.start_file("empty.txt", stored).unwrap();
    writer.set_comment("written by zip");
    let bytes = writer.finish().unwrap().into_inner();

    let reader = MemoryReader::new(bytes);
    let listed = list_entries(&reader).await.unwrap();

    let names: Vec<&str> = listed.iter().map(|e| e.filename.as_str()).collect();
    assert_eq!(names, ["assets/", "assets/data.txt", "raw.bin", "empty.txt"]);

    assert!(listed[0].is_directory);
    assert_eq!(listed[1].compression, CompressionMethod::Deflate);
    assert_eq!(read_entry(&reader, &listed[1]).await, content);
    assert_eq!(listed[2].compression, CompressionMethod::Store);
    assert_eq!(read_entry(&reader, &listed[2]).await, [1u8, 2, 3, 4]);
    assert_eq!(listed[3].byte_range(), None);
    assert!(read_entry(&reader, &listed[3]).await.is_empty());
}

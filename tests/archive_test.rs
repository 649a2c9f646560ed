mod common;

use chrono::{TimeZone, Utc};
use common::{archive_bytes, read_entry, sample_content, MockAsyncReader};
use streamzip::{
    compress::{encode, encode_source, ArchiveOptions, ZipEntry},
    compression::{CompressionMethod, Level},
    error::ArchiveError,
    tools::archive_size,
    types::{DateTimeCS, FileDateTime},
    uncompress::{list_entries, MemoryReader},
};

#[tokio::test]
async fn mock_reader_produces_exact_size() {
    let mut content = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut MockAsyncReader::new(100_005), &mut content)
        .await
        .unwrap();

    assert_eq!(content.len(), 100_005);
    assert!(content.iter().all(|b| *b == b'0'));
}

#[tokio::test]
async fn store_and_deflate_round_trip() {
    let content = sample_content(200_000);
    let entries = vec![
        ZipEntry::file("hello.txt", &b"hello world"[..]).size(11),
        ZipEntry::file("data.bin", std::io::Cursor::new(content.clone()))
            .compression(CompressionMethod::Deflate),
        ZipEntry::directory("nested"),
        ZipEntry::file("nested/empty.txt", tokio::io::empty()).size(0),
    ];

    let bytes = archive_bytes(encode(entries, ArchiveOptions::default())).await;
    let reader = MemoryReader::new(bytes);
    let listed = list_entries(&reader).await.unwrap();

    let names: Vec<&str> = listed.iter().map(|e| e.filename.as_str()).collect();
    assert_eq!(names, ["hello.txt", "data.bin", "nested/", "nested/empty.txt"]);
    let directories: Vec<bool> = listed.iter().map(|e| e.is_directory).collect();
    assert_eq!(directories, [false, false, true, false]);

    assert_eq!(listed[0].compression, CompressionMethod::Store);
    assert_eq!(listed[0].end - listed[0].start + 1, 11);
    assert_eq!(read_entry(&reader, &listed[0]).await, b"hello world");

    assert_eq!(listed[1].compression, CompressionMethod::Deflate);
    assert_eq!(listed[1].size, content.len() as u64);
    assert!(listed[1].compressed_size < listed[1].size);
    assert_eq!(read_entry(&reader, &listed[1]).await, content);
    assert_eq!(listed[1].crc, crc32fast::hash(&content));

    assert_eq!((listed[2].start, listed[2].end), (0, 0));

    assert_eq!((listed[3].start, listed[3].end), (0, 0));
    assert!(read_entry(&reader, &listed[3]).await.is_empty());
}

#[tokio::test]
async fn fixed_local_header_bytes() {
    let mtime = FileDateTime::from(Utc.with_ymd_and_hms(2024, 12, 13, 11, 12, 36).unwrap());
    let entries = vec![ZipEntry::file("foo.txt", &b"foo content\n"[..])
        .size(12)
        .mtime(mtime)];

    let bytes = archive_bytes(encode(entries, ArchiveOptions::default())).await;

    let mut expected = vec![
        0x50, 0x4b, 0x03, 0x04, // signature
        0x14, 0x00, // version 2.0
        0x08, 0x08, // data descriptor, utf-8 name
        0x00, 0x00, // store
        0x92, 0x59, // time
        0x8d, 0x59, // date
        0x00, 0x00, 0x00, 0x00, // crc
        0x00, 0x00, 0x00, 0x00, // compressed size
        0x00, 0x00, 0x00, 0x00, // size
        0x07, 0x00, // name length
        0x00, 0x00, // extra length
    ];
    expected.extend(b"foo.txt");
    assert_eq!(&bytes[..expected.len()], &expected[..]);
    assert_eq!(&bytes[expected.len()..expected.len() + 12], b"foo content\n");
}

#[tokio::test]
async fn old_timestamps_are_floored() {
    let mtime = FileDateTime::from(Utc.with_ymd_and_hms(1970, 6, 1, 12, 0, 0).unwrap());
    let entries = vec![ZipEntry::file("old.txt", &b"x"[..]).mtime(mtime)];

    let bytes = archive_bytes(encode(entries, ArchiveOptions::default())).await;
    let listed = list_entries(&MemoryReader::new(bytes)).await.unwrap();

    assert_eq!(
        listed[0].mtime,
        Utc.with_ymd_and_hms(1980, 1, 1, 0, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn invalid_timestamps_become_now() {
    let before = Utc::now();
    let entries = vec![
        ZipEntry::file("bad.txt", &b"x"[..])
            .mtime(FileDateTime::Custom(DateTimeCS::new(2024, 13, 41, 25, 0, 0))),
        ZipEntry::file("unparsed.txt", &b"y"[..]).mtime(FileDateTime::parse("yesterday-ish")),
    ];

    let bytes = archive_bytes(encode(entries, ArchiveOptions::default())).await;
    let listed = list_entries(&MemoryReader::new(bytes)).await.unwrap();

    for entry in listed {
        // DOS times have a 2 second resolution
        let drift = (entry.mtime - before).num_seconds().abs();
        assert!(drift <= 5, "{} is {}s away from now", entry.filename, drift);
    }
}

#[tokio::test]
async fn missing_stream_fails_the_archive() {
    let mut entry = ZipEntry::file("ghost.txt", tokio::io::empty());
    entry.stream = None;

    let mut stream = encode(vec![entry], ArchiveOptions::default());
    match stream.next_chunk().await {
        Some(Err(ArchiveError::MissingEntryStream(name))) => assert_eq!(name, "ghost.txt"),
        other => panic!("unexpected {:?}", other.map(|r| r.map(|c| c.len()))),
    }
    assert!(stream.next_chunk().await.is_none());
}

#[tokio::test]
async fn unsupported_method_is_refused() {
    let entries = vec![
        ZipEntry::file("a.txt", &b"a"[..]),
        ZipEntry::file("b.bz2", &b"b"[..]).compression(CompressionMethod::Other(12)),
    ];

    let error = encode(entries, ArchiveOptions::default())
        .write_to(Vec::new())
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "Unsupported compression method : BZIP2");
}

#[tokio::test]
async fn level_none_stores_deflate_entries() {
    let content = sample_content(10_000);
    let entries = vec![ZipEntry::file("plain.txt", std::io::Cursor::new(content.clone()))
        .compression(CompressionMethod::Deflate)];

    let options = ArchiveOptions::default().compression_level(Level::None);
    let bytes = archive_bytes(encode(entries, options)).await;
    let reader = MemoryReader::new(bytes);
    let listed = list_entries(&reader).await.unwrap();

    assert_eq!(listed[0].compression, CompressionMethod::Store);
    assert_eq!(listed[0].compressed_size, 10_000);
    assert_eq!(read_entry(&reader, &listed[0]).await, content);
}

#[tokio::test]
async fn entries_from_a_channel() {
    let (sender, receiver) = tokio::sync::mpsc::channel(2);

    let producer = tokio::spawn(async move {
        for i in 0..5u8 {
            let content = vec![b'a' + i; 100 * (i as usize + 1)];
            let entry = ZipEntry::file(format!("file{}.txt", i), std::io::Cursor::new(content))
                .compression(CompressionMethod::Deflate);
            sender.send(entry).await.unwrap();
        }
    });

    let bytes = archive_bytes(encode_source(receiver, ArchiveOptions::default())).await;
    producer.await.unwrap();

    let reader = MemoryReader::new(bytes);
    let listed = list_entries(&reader).await.unwrap();
    assert_eq!(listed.len(), 5);
    for (i, entry) in listed.iter().enumerate() {
        assert_eq!(entry.filename, format!("file{}.txt", i));
        let content = read_entry(&reader, entry).await;
        assert_eq!(content, vec![b'a' + i as u8; 100 * (i + 1)]);
    }
}

#[tokio::test]
async fn archive_comment_is_kept() {
    let options = ArchiveOptions::default().comments("streamed archive");
    let bytes = archive_bytes(encode(vec![ZipEntry::directory("d/")], options)).await;

    assert!(bytes.ends_with(b"streamed archive"));
    let listed = list_entries(&MemoryReader::new(bytes)).await.unwrap();
    assert_eq!(listed[0].filename, "d/");
}

#[tokio::test]
async fn predicted_size_matches_stream() {
    let files = [
        ("file1.txt", 6u64),
        ("dir/", 0),
        ("dir/file2.txt", 70_000),
        ("empty.txt", 0),
    ];

    let entries = files.iter().map(|(name, size)| {
        if name.ends_with('/') {
            ZipEntry::directory(*name)
        } else {
            ZipEntry::file(*name, MockAsyncReader::new(*size)).size(*size)
        }
    });
    let entries: Vec<ZipEntry> = entries.collect();

    let (size, _) = encode(entries, ArchiveOptions::default().comments("abc"))
        .write_to(tokio::io::sink())
        .await
        .unwrap();
    assert_eq!(size, archive_size(files, 3));
}

#[tokio::test]
async fn progress_is_reported_while_streaming() {
    let entries = vec![ZipEntry::file("big.bin", MockAsyncReader::new(300_000)).size(300_000)];
    let mut stream = encode(entries, ArchiveOptions::default());

    let mut total = 0u64;
    let mut chunks = 0;
    while let Some(chunk) = stream.next_chunk().await {
        total += chunk.unwrap().len() as u64;
        chunks += 1;
        assert!(stream.archive_size() >= total);
    }

    assert!(chunks > 3);
    assert_eq!(stream.archive_size(), total);
    assert_eq!(total, archive_size([("big.bin", 300_000)], 0));
}

/// Writes more than 4 GiB, run with `cargo test -- --ignored`.
#[tokio::test]
#[ignore]
async fn huge_entry_uses_zip64() {
    let size = 0x1_0000_0000 + 1000;
    let files = [("small.txt", 5u64), ("huge.bin", size), ("after.txt", 5)];

    let entries: Vec<ZipEntry> = files
        .iter()
        .map(|(name, size)| ZipEntry::file(*name, MockAsyncReader::new(*size)).size(*size))
        .collect();

    let (written, _) = encode(entries, ArchiveOptions::default())
        .write_to(tokio::io::sink())
        .await
        .unwrap();
    assert_eq!(written, archive_size(files, 0));
}

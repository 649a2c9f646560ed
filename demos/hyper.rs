use hyper::service::{make_service_fn, service_fn};
use hyper::{header, Body, Request, Response, Server, StatusCode};
use streamzip::{
    compress::{encode, ArchiveOptions, ZipEntry},
    compression::CompressionMethod,
    tools::archive_size,
    types::FileDateTime,
};
use tokio::io::duplex;
use tokio_util::io::ReaderStream;

async fn zip_archive(_req: Request<Body>) -> Result<Response<Body>, hyper::http::Error> {
    let (w, r) = duplex(4096);
    let entries = vec![
        ZipEntry::file("file1.txt", &b"hello\n"[..])
            .size(6)
            .mtime(FileDateTime::Now),
        ZipEntry::file("file2.txt", &b"world\n"[..])
            .size(6)
            .mtime(FileDateTime::Now),
    ];
    let content_length = archive_size([("file1.txt", 6), ("file2.txt", 6)], 0);

    tokio::spawn(async move {
        if let Err(e) = encode(entries, ArchiveOptions::default()).write_to(w).await {
            eprintln!("archive aborted: {}", e);
        }
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(header::CONTENT_LENGTH, content_length)
        .body(Body::wrap_stream(ReaderStream::new(r)))
}

async fn deflated_archive(_req: Request<Body>) -> Result<Response<Body>, hyper::http::Error> {
    let (w, r) = duplex(4096);
    let entries = (1..=3).map(|i| {
        ZipEntry::file(format!("file{}.txt", i), &b"compressible content, "[..])
            .compression(CompressionMethod::Deflate)
    });

    tokio::spawn(async move {
        if let Err(e) = encode(entries, ArchiveOptions::default()).write_to(w).await {
            eprintln!("archive aborted: {}", e);
        }
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .body(Body::wrap_stream(ReaderStream::new(r)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let address = ([127, 0, 0, 1], 8080).into();
    let service = make_service_fn(|_| async {
        Ok::<_, hyper::http::Error>(service_fn(|req: Request<Body>| async move {
            if req.uri().path() == "/deflate" {
                deflated_archive(req).await
            } else {
                zip_archive(req).await
            }
        }))
    });
    let server = Server::bind(&address).serve(service);

    println!("Listening on http://{} (try /deflate)", address);
    server.await?;

    Ok(())
}

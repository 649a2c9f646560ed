use std::collections::VecDeque;

use crc32fast::Hasher;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::archive_common::ArchiveDescriptor;
use crate::compression::{CompressionMethod, Compressor, Level};
use crate::constants::{
    DATA_DESCRIPTOR_FLAG, DEFAULT_FLAGS, DOS_DIRECTORY_ATTRIBUTE, READ_BUFFER_SIZE,
    UNIX_DIRECTORY_MODE, UNIX_FILE_MODE, VERSION_DEFAULT, VERSION_MADE_BY,
    VERSION_MADE_BY_ZIP64, VERSION_ZIP64, ZIP64_BYTES_THR,
};
use crate::error::ArchiveError;
use crate::spec::{
    CentralDirectoryHeader, DataDescriptor, EndOfCentralDirectory, LocalFileHeader,
    Zip64EndOfCentralDirectory, Zip64ExtraField,
};
use crate::types::FileDateTime;

use super::{ArchiveOptions, AsyncWriteWrapper, EntrySource, EntryStream, ZipEntry};

enum State {
    /// Waiting for the next entry from the source.
    Entries,
    Payload(Box<PayloadState>),
    CentralDirectory,
    Done,
}

struct PayloadState {
    /// Central header being completed while the payload streams.
    header: CentralDirectoryHeader,
    zip64: bool,
    stream: EntryStream,
    compressor: Compressor,
    hasher: Hasher,
    buffer: Vec<u8>,
}

/// Lazy sequence of archive chunks.
///
/// Each call to [`ZipStream::next_chunk`] pulls just enough input to produce the next chunk.
/// After an error the sequence is over. Dropping the stream cancels the archive and releases the
/// entry streams it holds.
pub struct ZipStream<S: EntrySource> {
    source: S,
    options: ArchiveOptions,
    state: State,
    pending: VecDeque<Vec<u8>>,
    central_directory: ArchiveDescriptor,
    files_count: u64,
    archive_size: u64,
}

impl<S: EntrySource> ZipStream<S> {
    pub(crate) fn new(source: S, options: ArchiveOptions) -> Self {
        Self {
            source,
            options,
            state: State::Entries,
            pending: VecDeque::new(),
            central_directory: ArchiveDescriptor::default(),
            files_count: 0,
            archive_size: 0,
        }
    }

    /// Number of archive bytes produced so far, including chunks not yet handed out.
    pub fn archive_size(&self) -> u64 {
        self.archive_size
    }

    /// Next chunk of the archive, `None` once the end of central directory has been handed out.
    pub async fn next_chunk(&mut self) -> Option<Result<Vec<u8>, ArchiveError>> {
        loop {
            if let Some(chunk) = self.pending.pop_front() {
                return Some(Ok(chunk));
            }

            let step = match std::mem::replace(&mut self.state, State::Done) {
                State::Entries => self.start_entry().await,
                State::Payload(payload) => self.pump_payload(payload).await,
                State::CentralDirectory => Ok(self.finish_archive()),
                State::Done => return None,
            };

            match step {
                Ok(state) => self.state = state,
                Err(e) => {
                    self.pending.clear();
                    return Some(Err(e));
                }
            }
        }
    }

    /// Drains the whole archive into `sink`, returning the archive size and the sink.
    pub async fn write_to<W: AsyncWrite + Unpin>(
        mut self,
        sink: W,
    ) -> Result<(u64, W), ArchiveError> {
        let mut writer = AsyncWriteWrapper::new(sink);

        while let Some(chunk) = self.next_chunk().await {
            writer.write_all(&chunk?).await?;
        }
        writer.flush().await?;

        Ok((writer.written_bytes_count(), writer.retrieve_writer()))
    }

    fn emit(&mut self, chunk: Vec<u8>) {
        self.archive_size += chunk.len() as u64;
        self.pending.push_back(chunk);
    }

    async fn start_entry(&mut self) -> Result<State, ArchiveError> {
        let entry = match self.source.next_entry().await {
            Some(entry) => entry,
            None => return Ok(State::CentralDirectory),
        };

        let ZipEntry {
            mut filename,
            mtime,
            is_directory,
            compression,
            size,
            stream,
        } = entry;

        if is_directory && !filename.ends_with('/') {
            filename.push('/');
        }
        if filename.len() > u16::MAX as usize {
            return Err(ArchiveError::bad_structure(format!(
                "File name of {} bytes does not fit in a header",
                filename.len()
            )));
        }

        if is_directory {
            self.add_directory(filename, mtime);
            return Ok(State::Entries);
        }

        let stream = stream.ok_or_else(|| ArchiveError::MissingEntryStream(filename.clone()))?;

        let mut compression = compression.unwrap_or_default();
        if compression == CompressionMethod::Deflate && self.options.compression_level == Level::None
        {
            compression = CompressionMethod::Store;
        }
        let compressor = Compressor::new(compression, self.options.compression_level)?;

        let offset = self.archive_size;
        let zip64 = size.map_or(true, |size| size >= ZIP64_BYTES_THR) || offset >= ZIP64_BYTES_THR;
        if zip64 {
            log::debug!(
                "{}: reserving zip64 extra field (declared size {:?}, offset {})",
                filename,
                size,
                offset
            );
        }
        log::debug!("{}: {} at offset {}", filename, compression, offset);

        let version_needed = u16::from(if zip64 { VERSION_ZIP64 } else { VERSION_DEFAULT });
        let mtime = mtime.resolve();

        let mut local_header = LocalFileHeader {
            version_needed,
            flags: DEFAULT_FLAGS,
            compression,
            mtime,
            filename: filename.clone(),
            ..Default::default()
        };
        if zip64 {
            local_header
                .extra
                .insert(Zip64ExtraField::HEADER_ID, Zip64ExtraField::placeholder());
        }
        self.emit(local_header.encode());

        let header = CentralDirectoryHeader {
            version_made_by: if zip64 {
                VERSION_MADE_BY_ZIP64
            } else {
                VERSION_MADE_BY
            },
            version_needed,
            flags: DEFAULT_FLAGS,
            compression,
            mtime,
            unix_mode: UNIX_FILE_MODE,
            offset,
            filename,
            ..Default::default()
        };

        Ok(State::Payload(Box::new(PayloadState {
            header,
            zip64,
            stream,
            compressor,
            hasher: Hasher::new(),
            buffer: vec![0; READ_BUFFER_SIZE],
        })))
    }

    async fn pump_payload(&mut self, mut payload: Box<PayloadState>) -> Result<State, ArchiveError> {
        let PayloadState {
            header,
            stream,
            compressor,
            hasher,
            buffer,
            ..
        } = &mut *payload;

        let read = stream.read(buffer).await?;
        if read == 0 {
            self.finish_entry(*payload)?;
            return Ok(State::Entries);
        }

        hasher.update(&buffer[..read]);
        header.size += read as u64;

        let compressed = compressor.compress(&buffer[..read])?;
        if !compressed.is_empty() {
            header.compressed_size += compressed.len() as u64;
            self.emit(compressed);
        }

        Ok(State::Payload(payload))
    }

    fn finish_entry(&mut self, payload: PayloadState) -> Result<(), ArchiveError> {
        let PayloadState {
            mut header,
            zip64,
            compressor,
            hasher,
            ..
        } = payload;

        let tail = compressor.finish()?;
        if !tail.is_empty() {
            header.compressed_size += tail.len() as u64;
            self.emit(tail);
        }
        header.crc = hasher.finalize();

        // the local header already told sequential readers to expect 32-bit descriptor sizes
        if header.overflows_32_bits() && !zip64 {
            return Err(ArchiveError::bad_structure(format!(
                "{}: declared size exceeded, {} bytes ({} compressed) do not fit without a zip64 field",
                header.filename, header.size, header.compressed_size
            )));
        }

        let descriptor = DataDescriptor {
            crc: header.crc,
            compressed_size: header.compressed_size,
            size: header.size,
        };
        self.emit(descriptor.encode(zip64));

        if zip64 {
            header.version_made_by = VERSION_MADE_BY_ZIP64;
            header.version_needed = VERSION_ZIP64 as u16;
        }
        let zip64_field = zip64.then(|| header.zip64_extra_field());
        header.write(&mut self.central_directory, zip64_field.as_ref());
        self.files_count += 1;

        log::debug!(
            "{}: {} bytes, {} compressed, crc {:08x}",
            header.filename,
            header.size,
            header.compressed_size,
            header.crc
        );

        Ok(())
    }

    /// Directories carry no payload and no data descriptor.
    fn add_directory(&mut self, filename: String, mtime: FileDateTime) {
        let flags = DEFAULT_FLAGS & !DATA_DESCRIPTOR_FLAG;
        let mtime = mtime.resolve();
        let offset = self.archive_size;

        let local_header = LocalFileHeader {
            flags,
            mtime,
            filename: filename.clone(),
            ..Default::default()
        };
        self.emit(local_header.encode());

        let mut header = CentralDirectoryHeader {
            flags,
            mtime,
            dos_mode: DOS_DIRECTORY_ATTRIBUTE,
            unix_mode: UNIX_DIRECTORY_MODE,
            offset,
            filename,
            ..Default::default()
        };
        let zip64_field = header
            .overflows_32_bits()
            .then(|| header.zip64_extra_field());
        if zip64_field.is_some() {
            header.version_made_by = VERSION_MADE_BY_ZIP64;
            header.version_needed = VERSION_ZIP64 as u16;
        }
        header.write(&mut self.central_directory, zip64_field.as_ref());
        self.files_count += 1;

        log::debug!("{}: directory at offset {}", header.filename, offset);
    }

    fn finish_archive(&mut self) -> State {
        let central_directory = std::mem::take(&mut self.central_directory).finish();

        let mut end = EndOfCentralDirectory {
            files_count: self.files_count,
            cd_length: central_directory.len() as u64,
            data_length: self.archive_size,
            comments: Vec::new(),
        };
        end.set_archive_comment(&self.options.comments);

        if !central_directory.is_empty() {
            self.emit(central_directory);
        }

        if end.needs_zip64_format_extensions() {
            log::debug!(
                "zip64 end of central directory: {} entries, directory of {} bytes at {}",
                end.files_count,
                end.cd_length,
                end.data_length
            );
            self.emit(Zip64EndOfCentralDirectory::from(&end).encode());
        }
        self.emit(end.encode());

        State::Done
    }
}

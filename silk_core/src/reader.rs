use std::io::{self, BufRead, ErrorKind, Read};

use tracing::{debug, info, trace, warn};

use crate::error::{FormatError, Result, SilkError};
use crate::format::{
    ContainerHeader, BLOCK_LEN_SIZE, HEADER_LEN, INITIAL_BLOCK_CAPACITY, MAGIC, STX,
};

/// One length-prefixed unit of compressed payload.
///
/// The payload borrows the reader's reusable buffer, so it is only valid
/// until the next call to [`ContainerReader::next_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    /// Zero-based position of this block in the stream.
    pub index: u64,
    /// Byte offset of the block's length prefix from the start of the stream.
    pub offset: u64,
    pub payload: &'a [u8],
}

/// Sequential reader for SILK v3 containers.
///
/// # Stream layout
/// ```text
/// [0x02]?                     optional marker, discarded
/// "#!SILK_V3"                 9-byte magic
/// [len:i16 LE][payload; len]  repeated
/// [len < 0]                   optional footer, ends the stream
/// ```
///
/// [`validate`] runs exactly once, before any block is read. [`next_block`]
/// then yields blocks until the footer or a clean end of stream. A block whose
/// payload is cut short is corruption, never a shorter block.
///
/// [`validate`]: ContainerReader::validate
/// [`next_block`]: ContainerReader::next_block
pub struct ContainerReader<R> {
    inner: R,
    /// Reused for every block; grown when a block is larger, never shrunk.
    buf: Vec<u8>,
    position: u64,
    blocks_read: u64,
    header: Option<ContainerHeader>,
    finished: bool,
    footer: bool,
    /// Set once a block is found truncated; every later read repeats it.
    corrupt: Option<Corruption>,
}

#[derive(Debug, Clone, Copy)]
struct Corruption {
    block: u64,
    offset: u64,
    declared: usize,
    available: usize,
}

impl From<Corruption> for SilkError {
    fn from(c: Corruption) -> Self {
        SilkError::StreamCorruption {
            block: c.block,
            offset: c.offset,
            declared: c.declared,
            available: c.available,
        }
    }
}

impl<R: BufRead> ContainerReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: vec![0u8; INITIAL_BLOCK_CAPACITY],
            position: 0,
            blocks_read: 0,
            header: None,
            finished: false,
            footer: false,
            corrupt: None,
        }
    }

    /// Check the optional marker byte and the magic string.
    pub fn validate(&mut self) -> Result<ContainerHeader> {
        if self.header.is_some() {
            return Err(FormatError::AlreadyValidated.into());
        }

        let peeked = loop {
            match self.inner.fill_buf() {
                Ok(buf) => break buf.first().copied(),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!("failed to peek first byte: {err}");
                    return Err(SilkError::Io {
                        offset: self.position,
                        source: err,
                    });
                }
            }
        };
        let Some(first) = peeked else {
            warn!("empty stream, no SILK header");
            return Err(FormatError::TruncatedHeader { read: 0 }.into());
        };

        let has_marker = first == STX;
        if has_marker {
            info!("first byte is STX (0x{STX:02x}), discarding it");
            let mut stx = [0u8; 1];
            if self.fill(&mut stx)? == 0 {
                return Err(FormatError::TruncatedHeader { read: 0 }.into());
            }
            if stx[0] != STX {
                warn!("first byte read back as 0x{:02x}, not STX", stx[0]);
                return Err(FormatError::UnexpectedMarker { found: stx[0] }.into());
            }
        }

        let mut magic = [0u8; HEADER_LEN];
        let read = self.fill(&mut magic)?;
        if read < HEADER_LEN {
            warn!(read, expected = HEADER_LEN, "truncated file header");
            return Err(FormatError::TruncatedHeader { read }.into());
        }
        if &magic != MAGIC {
            warn!("invalid file header {:?}", magic.escape_ascii().to_string());
            return Err(FormatError::BadMagic {
                found: magic.to_vec(),
            }
            .into());
        }

        let header = ContainerHeader { has_marker };
        self.header = Some(header);
        Ok(header)
    }

    /// Read the next block, or `None` once the stream has ended cleanly.
    ///
    /// Validates the header first if [`validate`](Self::validate) was not
    /// called yet.
    pub fn next_block(&mut self) -> Result<Option<Block<'_>>> {
        if self.header.is_none() {
            self.validate()?;
        }
        if let Some(corrupt) = self.corrupt {
            return Err(corrupt.into());
        }
        if self.finished {
            return Ok(None);
        }

        let index = self.blocks_read;
        let offset = self.position;

        let mut len_buf = [0u8; BLOCK_LEN_SIZE];
        match self.fill(&mut len_buf)? {
            0 => {
                debug!(blocks = index, "end of stream without footer");
                self.finished = true;
                return Ok(None);
            }
            BLOCK_LEN_SIZE => {}
            available => {
                return Err(self.poison(Corruption {
                    block: index,
                    offset,
                    declared: BLOCK_LEN_SIZE,
                    available,
                }));
            }
        }

        let declared = i16::from_le_bytes(len_buf);
        if declared < 0 {
            debug!(blocks = index, offset, "footer reached");
            self.finished = true;
            self.footer = true;
            return Ok(None);
        }

        let len = declared as usize;
        if len > self.buf.len() {
            self.buf.resize(len, 0);
        }
        let available = read_full(&mut self.inner, &mut self.buf[..len]).map_err(|err| {
            SilkError::Io {
                offset: self.position,
                source: err,
            }
        })?;
        self.position += available as u64;
        if available < len {
            warn!(
                block = index,
                offset,
                declared = len,
                available,
                "block payload truncated"
            );
            return Err(self.poison(Corruption {
                block: index,
                offset,
                declared: len,
                available,
            }));
        }

        self.blocks_read += 1;
        trace!(block = index, offset, len, "read block");
        Ok(Some(Block {
            index,
            offset,
            payload: &self.buf[..len],
        }))
    }

    /// Header found by [`validate`](Self::validate), if it has run.
    pub fn header(&self) -> Option<ContainerHeader> {
        self.header
    }

    /// Bytes consumed from the underlying stream so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Complete blocks returned so far.
    pub fn blocks_read(&self) -> u64 {
        self.blocks_read
    }

    /// Whether a truncated block has been found. Once set, [`next_block`]
    /// keeps returning the same `StreamCorruption` error.
    ///
    /// [`next_block`]: Self::next_block
    pub fn is_corrupt(&self) -> bool {
        self.corrupt.is_some()
    }

    /// Whether the footer or a clean end of stream has been reached.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether iteration stopped at a negative-length footer rather than at
    /// the end of the stream.
    pub fn footer_reached(&self) -> bool {
        self.footer
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn poison(&mut self, corrupt: Corruption) -> SilkError {
        self.corrupt = Some(corrupt);
        corrupt.into()
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = read_full(&mut self.inner, buf).map_err(|err| SilkError::Io {
            offset: self.position,
            source: err,
        })?;
        self.position += n as u64;
        Ok(n)
    }
}

/// Read until `buf` is full or the stream ends; returns the bytes read.
fn read_full<R: Read>(inner: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match inner.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

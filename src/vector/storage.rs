//! Memory-mapped segment files holding the raw vectors of one language index.
//!
//! ANN backends keep their working structures in memory; on `save` they dump
//! the raw vectors here and on `load` they re-insert them. Reading goes
//! through `memmap2` so a large segment is paged in lazily by the OS.
//!
//! # Storage Format
//!
//! - Header (16 bytes): magic `GVEC`, version, dimension, vector count
//! - Records: `[id: u32][f32; dimension]`, little-endian, contiguous
//!
//! Ids on disk are [`VectorId`]s (slot + 1) so a zeroed record is rejected
//! instead of silently becoming slot 0.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapOptions};
use thiserror::Error;
use tracing::debug;

use crate::vector::types::{SegmentOrdinal, VectorDimension, VectorError, VectorId, VectorSlot};

/// Current storage format version.
const STORAGE_VERSION: u32 = 1;

/// Size of the storage header in bytes.
const HEADER_SIZE: usize = 16;

/// Magic bytes to identify vector segment files.
const MAGIC_BYTES: &[u8; 4] = b"GVEC";

const BYTES_PER_F32: usize = 4;
const BYTES_PER_ID: usize = 4;

/// Errors specific to vector segment operations.
#[derive(Error, Debug)]
pub enum VectorStorageError {
    #[error("IO error: {0}\nSuggestion: Check that the data directory exists and is writable")]
    Io(#[from] io::Error),

    #[error(
        "Invalid segment format: {0}\nSuggestion: Delete the segment file; it will be rebuilt from the metadata snapshot"
    )]
    InvalidFormat(String),

    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),
}

/// A single on-disk vector segment.
#[derive(Debug)]
pub struct MmapVectorStorage {
    path: PathBuf,
    mmap: Option<Mmap>,
    dimension: VectorDimension,
    vector_count: usize,
    segment: SegmentOrdinal,
}

impl MmapVectorStorage {
    /// Path of the segment file for `segment` inside `base_path`.
    pub fn segment_path(base_path: &Path, segment: SegmentOrdinal) -> PathBuf {
        base_path.join(format!("segment_{}.vec", segment.get()))
    }

    /// Writes `vectors` as a fresh segment, replacing any previous file.
    ///
    /// The file is written to a temporary sibling and renamed into place so
    /// a crash mid-write never leaves a truncated segment behind.
    pub fn write_segment(
        base_path: impl AsRef<Path>,
        segment: SegmentOrdinal,
        dimension: VectorDimension,
        vectors: &[(VectorSlot, &[f32])],
    ) -> Result<Self, VectorStorageError> {
        let base_path = base_path.as_ref();
        std::fs::create_dir_all(base_path)?;

        for (_, vector) in vectors {
            dimension.validate_vector(vector)?;
        }

        let path = Self::segment_path(base_path, segment);
        let tmp_path = path.with_extension("vec.tmp");

        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            write_header(&mut writer, dimension, vectors.len())?;

            for (slot, vector) in vectors {
                let id = slot
                    .to_vector_id()
                    .ok_or(VectorError::SlotExhausted(slot.get()))?;
                writer.write_all(&id.to_bytes())?;
                for &value in *vector {
                    writer.write_all(&value.to_le_bytes())?;
                }
            }

            writer.flush()?;
        }

        std::fs::rename(&tmp_path, &path)?;
        debug!(
            "wrote {} vectors to segment {} at {}",
            vectors.len(),
            segment,
            path.display()
        );

        Ok(Self {
            path,
            mmap: None,
            dimension,
            vector_count: vectors.len(),
            segment,
        })
    }

    /// Opens an existing segment from disk.
    ///
    /// Returns an error if the file doesn't exist or has an invalid header.
    pub fn open(
        base_path: impl AsRef<Path>,
        segment: SegmentOrdinal,
    ) -> Result<Self, VectorStorageError> {
        let path = Self::segment_path(base_path.as_ref(), segment);

        let file = File::open(&path)?;
        // SAFETY: segment files are only replaced by rename, never mutated in place
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        let (version, dimension, vector_count) = read_header(&mmap)?;

        if version != STORAGE_VERSION {
            return Err(VectorError::VersionMismatch {
                expected: STORAGE_VERSION,
                actual: version,
            }
            .into());
        }

        Ok(Self {
            path,
            mmap: Some(mmap),
            dimension,
            vector_count,
            segment,
        })
    }

    /// Returns `true` if a segment file exists for `segment`.
    #[must_use]
    pub fn exists(base_path: impl AsRef<Path>, segment: SegmentOrdinal) -> bool {
        Self::segment_path(base_path.as_ref(), segment).exists()
    }

    /// Reads every record from the segment, in file order.
    pub fn read_all_vectors(&mut self) -> Result<Vec<(VectorSlot, Vec<f32>)>, VectorStorageError> {
        if self.mmap.is_none() {
            let file = File::open(&self.path)?;
            // SAFETY: see `open`
            self.mmap = Some(unsafe { MmapOptions::new().map(&file)? });
        }
        let Some(mmap) = self.mmap.as_ref() else {
            return Ok(Vec::new());
        };

        let dimension = self.dimension.get();
        let record_size = BYTES_PER_ID + dimension * BYTES_PER_F32;
        let body = &mmap[HEADER_SIZE.min(mmap.len())..];

        if body.len() != self.vector_count * record_size {
            return Err(VectorStorageError::InvalidFormat(format!(
                "expected {} records of {record_size} bytes, found {} bytes",
                self.vector_count,
                body.len()
            )));
        }

        let mut vectors = Vec::with_capacity(self.vector_count);
        for record in body.chunks_exact(record_size) {
            let id = VectorId::from_bytes(le_word(&record[..BYTES_PER_ID])).ok_or_else(|| {
                VectorStorageError::InvalidFormat("zero vector id in segment".to_string())
            })?;

            let vector: Vec<f32> = record[BYTES_PER_ID..]
                .chunks_exact(BYTES_PER_F32)
                .map(|bytes| f32::from_le_bytes(le_word(bytes)))
                .collect();

            vectors.push((VectorSlot::from_vector_id(id), vector));
        }

        Ok(vectors)
    }

    #[must_use]
    pub fn vector_count(&self) -> usize {
        self.vector_count
    }

    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    #[must_use]
    pub fn segment(&self) -> SegmentOrdinal {
        self.segment
    }

    /// Returns the size of the segment file in bytes.
    pub fn file_size(&self) -> Result<u64, io::Error> {
        Ok(std::fs::metadata(&self.path)?.len())
    }
}

fn le_word(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

fn write_header(
    writer: &mut impl Write,
    dimension: VectorDimension,
    count: usize,
) -> Result<(), VectorStorageError> {
    let dim = u32::try_from(dimension.get())
        .map_err(|_| VectorStorageError::InvalidFormat("dimension exceeds u32".to_string()))?;
    let count = u32::try_from(count)
        .map_err(|_| VectorStorageError::InvalidFormat("too many vectors".to_string()))?;

    writer.write_all(MAGIC_BYTES)?;
    writer.write_all(&STORAGE_VERSION.to_le_bytes())?;
    writer.write_all(&dim.to_le_bytes())?;
    writer.write_all(&count.to_le_bytes())?;
    Ok(())
}

fn read_header(mmap: &[u8]) -> Result<(u32, VectorDimension, usize), VectorStorageError> {
    if mmap.len() < HEADER_SIZE {
        return Err(VectorStorageError::InvalidFormat(
            "File too small to contain header".to_string(),
        ));
    }

    if &mmap[0..4] != MAGIC_BYTES {
        return Err(VectorStorageError::InvalidFormat(
            "Invalid magic bytes".to_string(),
        ));
    }

    let version = u32::from_le_bytes(le_word(&mmap[4..8]));
    let dimension = u32::from_le_bytes(le_word(&mmap[8..12])) as usize;
    let count = u32::from_le_bytes(le_word(&mmap[12..16])) as usize;

    Ok((version, VectorDimension::new(dimension)?, count))
}

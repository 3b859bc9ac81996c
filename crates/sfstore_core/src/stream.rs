//! Record streams.
//!
//! A [`RecordStream`] is a cursor over one record's segment chain. Only the
//! tail segment and the directory's `last_segment_index`/`length` fields
//! change size; every other segment keeps its full 8192 bytes.
//!
//! ## Deferred writes
//!
//! Payload bytes and headers of segments that stop being the tail are
//! written immediately. The tail segment's header and the directory fields
//! are kept in memory and written on [`RecordStream::close`] (or
//! [`RecordStream::flush`], or drop). Truncation is the exception: it writes
//! everything at once so the shorter record is visible before close.

use crate::directory::RecordDescription;
use crate::error::{CoreError, CoreResult};
use crate::layout::{MAX_RECORD_LENGTH, SEGMENT_DATA_SIZE};
use crate::segment::{write_state, Segment, SegmentBuffer, SegmentState};
use crate::storage::SharedCore;
use crate::types::RecordAccess;
use std::io::{self, SeekFrom};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Seekable, truncatable byte stream over one record.
///
/// Streams also implement [`std::io::Read`], [`std::io::Write`] and
/// [`std::io::Seek`].
///
/// Two streams over the same record see each other's bytes but not each
/// other's deferred length updates; using them concurrently is not supported.
pub struct RecordStream {
    core: SharedCore,
    access: RecordAccess,
    record: RecordDescription,
    segments: SegmentBuffer,
    /// Segment holding the cursor.
    current: u32,
    /// Cursor offset inside `current`'s payload.
    offset: u32,
    position: u64,
    record_dirty: bool,
    closed: bool,
}

impl RecordStream {
    pub(crate) fn open(
        core: SharedCore,
        record: RecordDescription,
        access: RecordAccess,
    ) -> CoreResult<Self> {
        let mut segments = SegmentBuffer::new();
        let first = {
            let guard = core.lock();
            segments.load_chained(guard.backend.as_ref(), record.first_segment_index)?
        };
        trace!(record = %record.name, %access, "opened record stream");

        Ok(Self {
            core,
            access,
            current: first.index,
            offset: 0,
            position: 0,
            record,
            segments,
            record_dirty: false,
            closed: false,
        })
    }

    /// Record name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Access mode of this stream.
    #[must_use]
    pub fn access(&self) -> RecordAccess {
        self.access
    }

    /// Logical cursor position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Moves the cursor to an absolute position.
    pub fn set_position(&mut self, position: u64) -> CoreResult<()> {
        self.seek(SeekFrom::Start(position)).map(|_| ())
    }

    /// Record length, including writes not yet flushed.
    #[must_use]
    pub fn len(&self) -> u64 {
        u64::from(self.record.length)
    }

    /// Returns true if the record holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.record.length == 0
    }

    /// Reads up to `buf.len()` bytes from the cursor.
    ///
    /// Returns the number of bytes read; fewer than requested (possibly 0)
    /// means the end of the record was reached.
    pub fn read(&mut self, buf: &mut [u8]) -> CoreResult<usize> {
        let guard = self.core.lock();
        let backend = guard.backend.as_ref();

        let mut total = 0;
        while total < buf.len() {
            let segment = self.segments.load_chained(backend, self.current)?;
            let available = segment.data_length.saturating_sub(self.offset) as usize;
            if available == 0 {
                match segment.next() {
                    Some(next) => {
                        self.current = next;
                        self.offset = 0;
                        continue;
                    }
                    None => break,
                }
            }

            let count = available.min(buf.len() - total);
            backend.read_at(
                segment.data_offset() + u64::from(self.offset),
                &mut buf[total..total + count],
            )?;
            self.offset += count as u32;
            total += count;
        }

        self.position += total as u64;
        Ok(total)
    }

    /// Writes all of `buf` at the cursor, growing the record as needed.
    pub fn write(&mut self, buf: &[u8]) -> CoreResult<usize> {
        self.ensure_writable("write")?;
        if buf.is_empty() {
            return Ok(0);
        }

        let end = self.position + buf.len() as u64;
        if end > MAX_RECORD_LENGTH {
            return Err(CoreError::RecordTooLarge {
                max: MAX_RECORD_LENGTH,
            });
        }

        let shared = Arc::clone(&self.core);
        let mut guard = shared.lock();
        let core = &mut *guard;

        // Cursor and length advance per chunk, so a failure part way through
        // leaves the stream describing exactly the bytes that landed.
        let mut written = 0;
        while written < buf.len() {
            let mut segment = self.segments.load_chained(core.backend.as_ref(), self.current)?;
            let room = SEGMENT_DATA_SIZE - self.offset as usize;

            if room == 0 {
                if let Some(next) = segment.next() {
                    self.current = next;
                    self.offset = 0;
                    continue;
                }

                // The tail is full: chain a fresh segment holding the next chunk.
                let chunk = (buf.len() - written).min(SEGMENT_DATA_SIZE);
                let index = core
                    .allocator
                    .allocate(core.backend.as_mut(), &buf[written..written + chunk])?;
                segment.chain_to(index);
                if let Err(err) = segment.write_header(core.backend.as_mut()) {
                    if let Err(cleanup) = core.allocator.free(core.backend.as_mut(), index) {
                        warn!(segment = index, error = %cleanup, "failed to free unlinked segment");
                    }
                    return Err(err);
                }
                self.segments.insert(segment);
                self.segments.insert(Segment::last(index, chunk as u32));

                self.record.last_segment_index = index;
                self.record_dirty = true;
                self.current = index;
                self.offset = chunk as u32;
                written += chunk;
                self.advance(chunk);
                continue;
            }

            let count = room.min(buf.len() - written);
            core.backend.write_at(
                segment.data_offset() + u64::from(self.offset),
                &buf[written..written + count],
            )?;
            self.offset += count as u32;
            written += count;

            if segment.is_last() && self.offset > segment.data_length {
                segment.data_length = self.offset;
                segment.dirty = true;
                self.segments.insert(segment);
            }
            self.advance(count);
        }

        Ok(written)
    }

    /// Moves the cursor forward over freshly written bytes, extending the
    /// record when the cursor passes its end.
    fn advance(&mut self, count: usize) {
        self.position += count as u64;
        if self.position > u64::from(self.record.length) {
            self.record.length = self.position as u32;
            self.record_dirty = true;
        }
    }

    /// Moves the cursor and returns the new absolute position.
    ///
    /// The target must lie in `0..=len()`.
    pub fn seek(&mut self, pos: SeekFrom) -> CoreResult<u64> {
        let length = self.len();
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.position) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(length) + i128::from(delta),
        };
        if target < 0 || target > i128::from(length) {
            return Err(CoreError::InvalidSeekPosition { target, length });
        }
        let target = target as u64;

        let guard = self.core.lock();
        let backend = guard.backend.as_ref();

        let current_start = self.position - u64::from(self.offset);
        let current = self.segments.load_chained(backend, self.current)?;
        if target >= current_start && target <= current_start + u64::from(current.data_length) {
            self.offset = (target - current_start) as u32;
            self.position = target;
            return Ok(target);
        }

        // Walk from the closest segment whose logical start is known.
        let tail = self
            .segments
            .load_chained(backend, self.record.last_segment_index)?;
        let tail_start = length - u64::from(tail.data_length);
        let (mut index, mut start) = if target >= tail_start {
            (tail.index, tail_start)
        } else if target > current_start {
            (self.current, current_start)
        } else {
            (self.record.first_segment_index, 0)
        };

        loop {
            let segment = self.segments.load_chained(backend, index)?;
            let end = start + u64::from(segment.data_length);
            if target <= end {
                break;
            }
            index = segment.next().ok_or_else(|| {
                CoreError::corrupted(format!(
                    "record '{}' chain ends before its length {length}",
                    self.record.name
                ))
            })?;
            start = end;
        }

        self.current = index;
        self.offset = (target - start) as u32;
        self.position = target;
        Ok(target)
    }

    /// Truncates the record to `value` bytes.
    ///
    /// Segments past the new end return to the free pool and the directory
    /// is updated immediately. Growing a record is not supported.
    pub fn set_len(&mut self, value: u64) -> CoreResult<()> {
        self.ensure_writable("set length")?;

        let length = self.len();
        if value == length {
            return Ok(());
        }
        if value > length {
            return Err(CoreError::GrowNotSupported {
                length,
                requested: value,
            });
        }

        let mut guard = self.core.lock();
        let core = &mut *guard;

        // Segment that will hold the last byte (or the head for an empty record).
        let mut start = 0u64;
        let mut boundary = self
            .segments
            .load_chained(core.backend.as_ref(), self.record.first_segment_index)?;
        while value > start + u64::from(boundary.data_length) {
            let next = boundary.next().ok_or_else(|| {
                CoreError::corrupted(format!(
                    "record '{}' chain ends before its length {length}",
                    self.record.name
                ))
            })?;
            start += u64::from(boundary.data_length);
            boundary = self.segments.load_chained(core.backend.as_ref(), next)?;
        }

        let mut freed = Vec::new();
        let mut next = boundary.next();
        while let Some(index) = next {
            let segment = self.segments.load_chained(core.backend.as_ref(), index)?;
            write_state(core.backend.as_mut(), index, SegmentState::Free)?;
            self.segments.remove(index);
            freed.push(index);
            next = segment.next();
        }
        if let Some(&lowest) = freed.iter().min() {
            core.allocator.release(lowest);
        }

        boundary.make_last((value - start) as u32);
        boundary.write_header(core.backend.as_mut())?;
        self.segments.insert(boundary);

        self.record.last_segment_index = boundary.index;
        self.record.length = value as u32;
        self.record.write_tail(core.backend.as_mut())?;
        self.record_dirty = false;

        if self.position > value || freed.contains(&self.current) {
            self.current = boundary.index;
            self.offset = boundary.data_length;
            self.position = value;
        }

        debug!(
            record = %self.record.name,
            from = length,
            to = value,
            freed = freed.len(),
            "truncated record"
        );
        Ok(())
    }

    /// Writes deferred tail headers and directory fields, then flushes the
    /// backend.
    pub fn flush(&mut self) -> CoreResult<()> {
        if !self.access.can_write() {
            return Ok(());
        }

        let mut guard = self.core.lock();
        let core = &mut *guard;

        for index in self.segments.dirty_indexes() {
            let mut segment = self.segments.load(core.backend.as_ref(), index)?;
            segment.write_header(core.backend.as_mut())?;
            self.segments.insert(segment);
        }
        if self.record_dirty {
            self.record.write_tail(core.backend.as_mut())?;
            self.record_dirty = false;
        }

        if core.config.sync_on_close {
            core.backend.sync()?;
        } else {
            core.backend.flush()?;
        }
        Ok(())
    }

    /// Flushes deferred updates and closes the stream.
    pub fn close(mut self) -> CoreResult<()> {
        self.closed = true;
        self.flush()
    }

    fn ensure_writable(&self, operation: &str) -> CoreResult<()> {
        if !self.access.can_write() {
            return Err(CoreError::not_writable(format!(
                "cannot {operation} record '{}' opened with read access",
                self.record.name
            )));
        }
        Ok(())
    }
}

impl Drop for RecordStream {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.flush() {
            warn!(record = %self.record.name, error = %err, "failed to flush record stream on drop");
        }
    }
}

impl std::fmt::Debug for RecordStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStream")
            .field("record", &self.record.name)
            .field("access", &self.access)
            .field("position", &self.position)
            .field("length", &self.record.length)
            .finish_non_exhaustive()
    }
}

impl io::Read for RecordStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(RecordStream::read(self, buf)?)
    }
}

impl io::Write for RecordStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(RecordStream::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(RecordStream::flush(self)?)
    }
}

impl io::Seek for RecordStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(RecordStream::seek(self, pos)?)
    }
}

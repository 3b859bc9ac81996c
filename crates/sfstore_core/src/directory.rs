//! Record directory (slot table).
//!
//! The directory is a fixed array of [`MAX_RECORDS_COUNT`] slots at the start
//! of the file. Each scan reads the whole region in one backend call and
//! works on the in-memory image; updates are written back to the slot in
//! place.

use crate::error::{CoreError, CoreResult};
use crate::layout::{
    slot_offset, DIRECTORY_SIZE, MAX_RECORDS_COUNT, RECORD_NAME_SIZE, RECORD_SLOT_SIZE,
    SLOT_FIRST_SEGMENT_OFFSET, SLOT_LAST_SEGMENT_OFFSET, SLOT_LENGTH_OFFSET, SLOT_NAME_OFFSET,
};
use crate::name::RecordName;
use sfstore_storage::StorageBackend;

/// Bit 0 of the slot state byte marks the slot as used.
const SLOT_USED: u8 = 0x01;

/// Decoded view of one used directory slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDescription {
    /// Record name.
    pub name: String,
    /// Slot position in the directory.
    pub slot: usize,
    /// Head of the segment chain.
    pub first_segment_index: u32,
    /// Tail of the segment chain.
    pub last_segment_index: u32,
    /// Record length in bytes.
    pub length: u32,
}

impl RecordDescription {
    /// File offset of this record's slot.
    #[must_use]
    pub fn slot_offset(&self) -> u64 {
        slot_offset(self.slot)
    }

    /// File offset of the last-segment-index field.
    #[must_use]
    pub fn last_segment_index_offset(&self) -> u64 {
        self.slot_offset() + SLOT_LAST_SEGMENT_OFFSET as u64
    }

    /// File offset of the length field.
    #[must_use]
    pub fn length_offset(&self) -> u64 {
        self.slot_offset() + SLOT_LENGTH_OFFSET as u64
    }

    /// Writes `last_segment_index` and `length` back to the slot.
    pub(crate) fn write_tail(&self, backend: &mut dyn StorageBackend) -> CoreResult<()> {
        let mut buf = [0u8; 8];
        buf[..4].copy_from_slice(&self.last_segment_index.to_le_bytes());
        buf[4..].copy_from_slice(&self.length.to_le_bytes());
        backend.write_at(self.last_segment_index_offset(), &buf)?;
        Ok(())
    }
}

/// In-memory image of the directory region.
#[derive(Debug)]
pub(crate) struct Directory {
    image: Vec<u8>,
}

impl Directory {
    /// Returns the zeroed bytes of an empty directory.
    pub(crate) fn empty_region() -> Vec<u8> {
        vec![0u8; DIRECTORY_SIZE]
    }

    /// Reads the directory region.
    pub(crate) fn load(backend: &dyn StorageBackend) -> CoreResult<Self> {
        let mut image = Self::empty_region();
        backend.read_at(0, &mut image)?;
        Ok(Self { image })
    }

    fn slot(&self, slot: usize) -> &[u8] {
        let start = slot * RECORD_SLOT_SIZE;
        &self.image[start..start + RECORD_SLOT_SIZE]
    }

    fn is_used(&self, slot: usize) -> bool {
        self.slot(slot)[0] & SLOT_USED != 0
    }

    fn name_field(&self, slot: usize) -> &[u8] {
        &self.slot(slot)[SLOT_NAME_OFFSET..SLOT_NAME_OFFSET + RECORD_NAME_SIZE]
    }

    fn describe(&self, slot: usize) -> RecordDescription {
        let bytes = self.slot(slot);
        RecordDescription {
            name: RecordName::decode(self.name_field(slot)),
            slot,
            first_segment_index: read_u32(bytes, SLOT_FIRST_SEGMENT_OFFSET),
            last_segment_index: read_u32(bytes, SLOT_LAST_SEGMENT_OFFSET),
            length: read_u32(bytes, SLOT_LENGTH_OFFSET),
        }
    }

    /// Finds the first free slot and marks it used in the image.
    ///
    /// Nothing reaches the backend until [`Directory::write_new_record`]
    /// fills the slot, so a failed create leaves the file untouched.
    pub(crate) fn find_free(&mut self) -> CoreResult<usize> {
        let slot = (0..MAX_RECORDS_COUNT)
            .find(|&slot| !self.is_used(slot))
            .ok_or(CoreError::DirectoryFull {
                capacity: MAX_RECORDS_COUNT,
            })?;

        self.image[slot * RECORD_SLOT_SIZE] |= SLOT_USED;
        Ok(slot)
    }

    /// Finds a used slot whose name matches.
    pub(crate) fn find_by_name(&self, name: &RecordName) -> Option<RecordDescription> {
        (0..MAX_RECORDS_COUNT)
            .filter(|&slot| self.is_used(slot))
            .find(|&slot| name.matches(self.name_field(slot)))
            .map(|slot| self.describe(slot))
    }

    /// Names of all used slots, in slot order.
    pub(crate) fn list_used(&self) -> Vec<String> {
        self.records().map(|record| record.name).collect()
    }

    /// Descriptions of all used slots, in slot order.
    pub(crate) fn records(&self) -> impl Iterator<Item = RecordDescription> + '_ {
        (0..MAX_RECORDS_COUNT)
            .filter(|&slot| self.is_used(slot))
            .map(|slot| self.describe(slot))
    }

    /// Writes a whole slot for a new, empty record: used bit, name and
    /// chain fields in one backend call.
    pub(crate) fn write_new_record(
        backend: &mut dyn StorageBackend,
        slot: usize,
        name: &RecordName,
        first_segment_index: u32,
    ) -> CoreResult<()> {
        let mut buf = [0u8; RECORD_SLOT_SIZE];
        buf[0] = SLOT_USED;
        buf[SLOT_NAME_OFFSET..SLOT_NAME_OFFSET + RECORD_NAME_SIZE].copy_from_slice(name.as_bytes());
        let fields = &mut buf[SLOT_NAME_OFFSET + RECORD_NAME_SIZE..];
        fields[..4].copy_from_slice(&first_segment_index.to_le_bytes());
        fields[4..8].copy_from_slice(&first_segment_index.to_le_bytes());
        fields[8..12].copy_from_slice(&0u32.to_le_bytes());
        backend.write_at(slot_offset(slot), &buf)?;
        Ok(())
    }

    /// Overwrites a slot's name field.
    pub(crate) fn write_name(
        backend: &mut dyn StorageBackend,
        slot: usize,
        name: &RecordName,
    ) -> CoreResult<()> {
        backend.write_at(slot_offset(slot) + SLOT_NAME_OFFSET as u64, name.as_bytes())?;
        Ok(())
    }

    /// Marks a slot free.
    pub(crate) fn free_slot(backend: &mut dyn StorageBackend, slot: usize) -> CoreResult<()> {
        backend.write_at(slot_offset(slot), &[0])?;
        Ok(())
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfstore_storage::InMemoryBackend;

    fn empty_backend() -> InMemoryBackend {
        InMemoryBackend::with_data(Directory::empty_region())
    }

    fn name(text: &str) -> RecordName {
        RecordName::parse(text).unwrap()
    }

    #[test]
    fn find_free_reserves_slots_in_order() {
        let mut backend = empty_backend();
        let mut directory = Directory::load(&backend).unwrap();

        assert_eq!(directory.find_free().unwrap(), 0);
        assert_eq!(directory.find_free().unwrap(), 1);
        assert!(directory.is_used(0));
        assert!(directory.is_used(1));
        assert!(!directory.is_used(2));

        // Reservations stay in the image until the slot is written.
        let reloaded = Directory::load(&backend).unwrap();
        assert!(!reloaded.is_used(0));
        assert_eq!(backend.data(), Directory::empty_region());

        Directory::write_new_record(&mut backend, 1, &name("b"), 4).unwrap();
        let reloaded = Directory::load(&backend).unwrap();
        assert!(!reloaded.is_used(0));
        assert!(reloaded.is_used(1));
    }

    #[test]
    fn find_free_fails_when_full() {
        let backend = empty_backend();
        let mut directory = Directory::load(&backend).unwrap();
        for _ in 0..MAX_RECORDS_COUNT {
            directory.find_free().unwrap();
        }

        let err = directory.find_free().unwrap_err();
        assert!(matches!(err, CoreError::DirectoryFull { capacity: 1000 }));
    }

    #[test]
    fn new_record_is_found_by_name() {
        let mut backend = empty_backend();
        let mut directory = Directory::load(&backend).unwrap();
        let slot = directory.find_free().unwrap();
        Directory::write_new_record(&mut backend, slot, &name("alpha"), 7).unwrap();

        let directory = Directory::load(&backend).unwrap();
        let record = directory.find_by_name(&name("alpha")).unwrap();
        assert_eq!(record.name, "alpha");
        assert_eq!(record.slot, 0);
        assert_eq!(record.first_segment_index, 7);
        assert_eq!(record.last_segment_index, 7);
        assert_eq!(record.length, 0);
        assert!(directory.find_by_name(&name("alph")).is_none());
        assert!(directory.find_by_name(&name("alphabet")).is_none());
    }

    #[test]
    fn list_used_skips_free_slots() {
        let mut backend = empty_backend();
        let mut directory = Directory::load(&backend).unwrap();
        for text in ["a", "b", "c"] {
            let slot = directory.find_free().unwrap();
            Directory::write_new_record(&mut backend, slot, &name(text), 0).unwrap();
        }
        Directory::free_slot(&mut backend, 1).unwrap();

        let directory = Directory::load(&backend).unwrap();
        assert_eq!(directory.list_used(), vec!["a", "c"]);
    }

    #[test]
    fn rename_keeps_slot_position() {
        let mut backend = empty_backend();
        let mut directory = Directory::load(&backend).unwrap();
        for text in ["first", "second"] {
            let slot = directory.find_free().unwrap();
            Directory::write_new_record(&mut backend, slot, &name(text), 0).unwrap();
        }
        Directory::write_name(&mut backend, 0, &name("z")).unwrap();

        let directory = Directory::load(&backend).unwrap();
        assert_eq!(directory.list_used(), vec!["z", "second"]);
    }

    #[test]
    fn write_tail_updates_last_index_and_length() {
        let mut backend = empty_backend();
        let mut directory = Directory::load(&backend).unwrap();
        let slot = directory.find_free().unwrap();
        Directory::write_new_record(&mut backend, slot, &name("r"), 3).unwrap();

        let directory = Directory::load(&backend).unwrap();
        let mut record = directory.find_by_name(&name("r")).unwrap();
        record.last_segment_index = 9;
        record.length = 12_345;
        record.write_tail(&mut backend).unwrap();

        let reloaded = Directory::load(&backend).unwrap();
        let record = reloaded.find_by_name(&name("r")).unwrap();
        assert_eq!(record.first_segment_index, 3);
        assert_eq!(record.last_segment_index, 9);
        assert_eq!(record.length, 12_345);
    }
}

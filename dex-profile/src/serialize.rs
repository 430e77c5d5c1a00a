//! The binary profile file format.
//!
//! A profile file starts with a plain header:
//!
//! ```plain
//! magic "pro\0" | version | num_dex_files | uncompressed_size u32 |
//! compressed_size u32 | zlib blob
//! ```
//!
//! The version tag selects the kind (see [`ProfileKind`]), which in turn
//! fixes the width of `num_dex_files` and of every serialized profile index
//! (`u8` for regular profiles, `u16` for boot image profiles). The blob
//! inflates to exactly `uncompressed_size` bytes holding one line header per
//! dex file followed by one body per dex file, both in profile-index order:
//!
//! ```plain
//! line header: key_length u16 | class_set_size u16 | method_region u32 |
//!              checksum u32 | num_method_ids u32 | key bytes
//! body:        bitmap bytes | method region | class_set_size x u16
//! ```
//!
//! The method region packs, per hot method: `method_index u16`,
//! `dex_pc_count u16`, then per call site `dex_pc u16`, a flag byte
//! (0 = types, 1 = megamorphic, 2 = missing types), `class_count u8` and
//! `class_count` class references. All integers are little-endian.
//!
//! A profile may also be embedded as the `primary.prof` entry of a zip
//! archive; loading detects this and extracts the entry transparently.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::annotation::{base_key_of, base_key_view};
use crate::bitmap::MethodBitmap;
use crate::dex::DexFile;
use crate::dex_data::DexFileData;
use crate::hotness::ProfileKind;
use crate::inline_cache::DexPcData;
use crate::store::ProfileStore;
use crate::{ProfileError, ProfileIndex};

/// The four magic bytes at the start of every profile file.
const MAGIC: [u8; 4] = *b"pro\0";

/// Name of the profile entry inside a dex metadata archive.
const DEX_METADATA_PROFILE_ENTRY: &str = "primary.prof";

const ZIP_LOCAL_SIGNATURE: [u8; 4] = *b"PK\x03\x04";
const ZIP_CENTRAL_SIGNATURE: [u8; 4] = *b"PK\x01\x02";
const ZIP_EOCD_SIGNATURE: [u8; 4] = *b"PK\x05\x06";

fn bad_data(message: impl Into<String>) -> ProfileError {
    ProfileError::BadData(message.into())
}

/// Returns true if the source starts with the profile magic.
///
/// Consumes up to four bytes from the source.
pub fn is_profile_file<R: Read>(source: &mut R) -> bool {
    let mut magic = [0u8; 4];
    source.read_exact(&mut magic).is_ok() && magic == MAGIC
}

/// The information present in the header of each profile line.
struct ProfileLineHeader {
    profile_key: String,
    class_set_size: u16,
    method_region_bytes: u32,
    checksum: u32,
    num_method_ids: u32,
}

/// A bounded reader over a byte slice. Every read past the end fails
/// instead of panicking, so parsing loops cannot run off the buffer.
struct SafeBuffer<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> SafeBuffer<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    fn read_slice(&mut self, length: usize) -> Result<&'a [u8], ProfileError> {
        let end = self
            .position
            .checked_add(length)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| bad_data("unexpected end of profile data"))?;
        let slice = &self.data[self.position..end];
        self.position = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ProfileError> {
        let mut out = [0; N];
        out.copy_from_slice(self.read_slice(N)?);
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8, ProfileError> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_u16(&mut self) -> Result<u16, ProfileError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    fn read_u32(&mut self) -> Result<u32, ProfileError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }
}

fn write_u16(buffer: &mut Vec<u8>, value: u16) {
    buffer.extend_from_slice(&value.to_le_bytes());
}

fn write_u32(buffer: &mut Vec<u8>, value: u32) {
    buffer.extend_from_slice(&value.to_le_bytes());
}

/// Writes a profile index with the width of the given kind. Regular stores
/// never assign indices beyond `u8`, so the narrowing cast is lossless.
fn write_profile_index(buffer: &mut Vec<u8>, kind: ProfileKind, value: ProfileIndex) {
    match kind {
        ProfileKind::Regular => {
            debug_assert!(value <= ProfileIndex::from(u8::MAX));
            buffer.push(value as u8);
        }
        ProfileKind::BootImage => write_u16(buffer, value),
    }
}

fn read_profile_index(
    buffer: &mut SafeBuffer<'_>,
    kind: ProfileKind,
) -> Result<ProfileIndex, ProfileError> {
    match kind {
        ProfileKind::Regular => Ok(ProfileIndex::from(buffer.read_u8()?)),
        ProfileKind::BootImage => buffer.read_u16(),
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, ProfileError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Inflates a zlib stream that must decompress to exactly `expected_size`
/// bytes and consume the whole input. Any mismatch is bad data.
fn inflate(input: &[u8], expected_size: u32) -> Result<Vec<u8>, ProfileError> {
    let mut decoder = ZlibDecoder::new(input);
    let mut out = Vec::with_capacity(expected_size as usize);
    (&mut decoder)
        .take(u64::from(expected_size) + 1)
        .read_to_end(&mut out)
        .map_err(|_| bad_data("corrupt compressed data"))?;
    if out.len() != expected_size as usize {
        return Err(bad_data("uncompressed size does not match the stream"));
    }
    if decoder.total_in() != input.len() as u64 {
        return Err(bad_data("compressed size does not match the stream"));
    }
    Ok(out)
}

impl ProfileStore {
    /// Serializes the store into the destination and returns the number of
    /// bytes written.
    ///
    /// The whole file is materialized in memory first, so the destination
    /// never sees a partial write; atomic replacement of an existing file
    /// remains the caller's responsibility.
    pub fn save<W: Write>(&self, destination: &mut W) -> Result<u64, ProfileError> {
        let kind = self.kind();

        let mut method_regions = Vec::with_capacity(self.records().len());
        for data in self.records() {
            method_regions.push(encode_method_region(data, kind)?);
        }

        let mut blob = Vec::new();
        for (data, region) in self.records().iter().zip(&method_regions) {
            let key_length = u16::try_from(data.profile_key.len())
                .map_err(|_| ProfileError::LimitExceeded)?;
            let class_set_size = u16::try_from(data.class_set.len())
                .map_err(|_| ProfileError::LimitExceeded)?;
            let method_region_bytes =
                u32::try_from(region.len()).map_err(|_| ProfileError::LimitExceeded)?;
            write_u16(&mut blob, key_length);
            write_u16(&mut blob, class_set_size);
            write_u32(&mut blob, method_region_bytes);
            write_u32(&mut blob, data.checksum);
            write_u32(&mut blob, data.num_method_ids);
            blob.extend_from_slice(data.profile_key.as_bytes());
        }
        for (data, region) in self.records().iter().zip(&method_regions) {
            blob.extend_from_slice(data.bitmap.as_bytes());
            blob.extend_from_slice(region);
            for &type_index in &data.class_set {
                write_u16(&mut blob, type_index);
            }
        }

        let uncompressed_size =
            u32::try_from(blob.len()).map_err(|_| ProfileError::LimitExceeded)?;
        let header_size = MAGIC.len() + 4 + kind.profile_index_width() + 4 + 4;
        let required = header_size + blob.len();
        if required > kind.error_threshold_bytes() {
            return Err(ProfileError::LimitExceeded);
        }
        if required > kind.warn_threshold_bytes() {
            tracing::warn!(bytes = required, "profile file is unusually large");
        }

        let compressed = deflate(&blob)?;
        let compressed_size =
            u32::try_from(compressed.len()).map_err(|_| ProfileError::LimitExceeded)?;

        let mut out = Vec::with_capacity(header_size + compressed.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&kind.version_bytes());
        write_profile_index(&mut out, kind, self.records().len() as ProfileIndex);
        write_u32(&mut out, uncompressed_size);
        write_u32(&mut out, compressed_size);
        out.extend_from_slice(&compressed);

        destination.write_all(&out)?;
        Ok(out.len() as u64)
    }

    /// Saves the store to a file, truncating any previous content.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<u64, ProfileError> {
        let mut file = File::create(path)?;
        self.save(&mut file)
    }

    /// Loads profile data from the source.
    ///
    /// The store must be empty; its kind is taken from the file's version
    /// tag. Dex files for which `filter(base_key, checksum)` returns false
    /// are skipped: their data is consumed but discarded, and the remaining
    /// records get dense indices as if the skipped lines did not exist.
    /// Classes are only loaded when `merge_classes` is set.
    ///
    /// The data is parsed into a scratch store and committed only on
    /// success, so a failed load leaves the store unchanged. The source is
    /// read to its end but never closed.
    pub fn load<R: Read>(
        &mut self,
        source: &mut R,
        merge_classes: bool,
        filter: impl Fn(&str, u32) -> bool,
    ) -> Result<(), ProfileError> {
        if !self.is_empty() {
            return Err(ProfileError::WouldOverwrite);
        }
        let mut raw = Vec::new();
        source.read_to_end(&mut raw)?;
        if raw.is_empty() {
            // An empty source is an empty profile.
            return Ok(());
        }

        let extracted;
        let bytes: &[u8] = if raw.starts_with(&ZIP_LOCAL_SIGNATURE) {
            extracted = extract_zip_entry(&raw, DEX_METADATA_PROFILE_ENTRY)?;
            &extracted
        } else {
            &raw
        };

        let mut scratch = ProfileStore::new(self.kind());
        scratch.load_bytes(bytes, merge_classes, &filter)?;
        *self = scratch;
        Ok(())
    }

    /// Loads profile data from a file.
    ///
    /// If `clear_if_invalid` is set and the file content is not a valid
    /// profile, the file is truncated and the load reports success with an
    /// empty store. I/O failures are never cleared away.
    pub fn load_from_file(
        &mut self,
        path: impl AsRef<Path>,
        clear_if_invalid: bool,
    ) -> Result<(), ProfileError> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .read(true)
            .write(clear_if_invalid)
            .open(path)?;
        match self.load(&mut file, true, |_, _| true) {
            Err(
                error @ (ProfileError::VersionMismatch
                | ProfileError::BadData(_)
                | ProfileError::LimitExceeded),
            ) if clear_if_invalid => {
                tracing::warn!(
                    path = %path.display(),
                    error = %error,
                    "clearing invalid profile file"
                );
                file.set_len(0)?;
                Ok(())
            }
            result => result,
        }
    }

    fn load_bytes(
        &mut self,
        data: &[u8],
        merge_classes: bool,
        filter: &dyn Fn(&str, u32) -> bool,
    ) -> Result<(), ProfileError> {
        let mut outer = SafeBuffer::new(data);
        if outer.read_array::<4>()? != MAGIC {
            return Err(bad_data("profile magic mismatch"));
        }
        let kind = ProfileKind::from_version_bytes(outer.read_array()?)
            .ok_or(ProfileError::VersionMismatch)?;
        self.clear_and_adjust_kind(kind);

        let number_of_dex_files = read_profile_index(&mut outer, kind)?;
        let uncompressed_size = outer.read_u32()?;
        let compressed_size = outer.read_u32()?;
        if uncompressed_size as usize > kind.error_threshold_bytes()
            || compressed_size as usize > kind.error_threshold_bytes()
        {
            return Err(ProfileError::LimitExceeded);
        }
        if uncompressed_size as usize > kind.warn_threshold_bytes() {
            tracing::warn!(bytes = uncompressed_size, "profile file is unusually large");
        }
        if outer.remaining() != compressed_size as usize {
            return Err(bad_data("compressed payload length mismatch"));
        }

        let blob = inflate(outer.read_slice(compressed_size as usize)?, uncompressed_size)?;
        let mut buffer = SafeBuffer::new(&blob);

        let mut line_headers = Vec::with_capacity(usize::from(number_of_dex_files));
        for _ in 0..number_of_dex_files {
            line_headers.push(read_line_header(&mut buffer)?);
        }

        // Profile lines are stored in profile-index order, so the position
        // of a line is the profile index its inline caches are encoded
        // against. Skipped lines get no new index.
        let mut remap: Vec<Option<ProfileIndex>> = Vec::with_capacity(line_headers.len());
        for header in &line_headers {
            if filter(base_key_of(&header.profile_key), header.checksum) {
                let data = self.get_or_add(
                    &header.profile_key,
                    header.checksum,
                    header.num_method_ids,
                )?;
                remap.push(Some(data.profile_index));
            } else {
                tracing::debug!(profile_key = %header.profile_key, "profile line filtered out");
                remap.push(None);
            }
        }

        for (position, header) in line_headers.iter().enumerate() {
            self.read_line_body(&mut buffer, header, remap[position], &remap, merge_classes)?;
        }
        if buffer.remaining() != 0 {
            return Err(bad_data("trailing data after the last profile line"));
        }
        Ok(())
    }

    fn read_line_body(
        &mut self,
        buffer: &mut SafeBuffer<'_>,
        header: &ProfileLineHeader,
        target: Option<ProfileIndex>,
        remap: &[Option<ProfileIndex>],
        merge_classes: bool,
    ) -> Result<(), ProfileError> {
        let bitmap_bytes = buffer.read_slice(MethodBitmap::storage_size(
            header.num_method_ids,
            self.kind().flag_count(),
        ))?;
        let method_region = buffer.read_slice(header.method_region_bytes as usize)?;
        if let Some(target) = target {
            self.record_mut(target).bitmap.or_bytes(bitmap_bytes);
            self.read_methods(method_region, header, target, remap)?;
        }
        for _ in 0..header.class_set_size {
            let type_index = buffer.read_u16()?;
            if let (Some(target), true) = (target, merge_classes) {
                self.record_mut(target).class_set.insert(type_index);
            }
        }
        Ok(())
    }

    fn read_methods(
        &mut self,
        region: &[u8],
        header: &ProfileLineHeader,
        target: ProfileIndex,
        remap: &[Option<ProfileIndex>],
    ) -> Result<(), ProfileError> {
        let kind = self.kind();
        let data = self.record_mut(target);
        let mut buffer = SafeBuffer::new(region);
        while buffer.remaining() > 0 {
            let method_index = buffer.read_u16()?;
            if u32::from(method_index) >= header.num_method_ids {
                return Err(bad_data("method index out of range"));
            }
            let dex_pc_count = buffer.read_u16()?;
            let inline_caches = data.find_or_add_hot_method(method_index);
            for _ in 0..dex_pc_count {
                let dex_pc = buffer.read_u16()?;
                let flag = buffer.read_u8()?;
                let class_count = buffer.read_u8()?;
                let site = inline_caches.entry(dex_pc).or_default();
                match flag {
                    0 => {
                        for _ in 0..class_count {
                            let reference = read_profile_index(&mut buffer, kind)?;
                            let type_index = buffer.read_u16()?;
                            match remap.get(usize::from(reference)) {
                                None => {
                                    return Err(bad_data(
                                        "inline cache references an unknown dex file",
                                    ));
                                }
                                // The receiver's dex file was filtered out,
                                // so its types cannot be represented.
                                Some(None) => site.set_missing_types(),
                                Some(Some(mapped)) => site.add_class(*mapped, type_index),
                            }
                        }
                    }
                    1 => {
                        if class_count != 0 {
                            return Err(bad_data("megamorphic call site with classes"));
                        }
                        site.set_megamorphic();
                    }
                    2 => {
                        if class_count != 0 {
                            return Err(bad_data("missing-types call site with classes"));
                        }
                        site.set_missing_types();
                    }
                    _ => return Err(bad_data("unknown inline cache flag")),
                }
            }
        }
        Ok(())
    }

    /// Verifies the store against the given dex files.
    ///
    /// Records are matched to dex files by base key. For every matched
    /// record the checksum and method count must agree with the dex file,
    /// all class and method indices must be within the dex file's tables,
    /// and every inline cache class reference must resolve to a matched
    /// record whose type table contains the referenced index.
    pub fn verify(&self, dex_files: &[DexFile]) -> Result<(), ProfileError> {
        let mut matched: HashMap<ProfileIndex, &DexFile> = HashMap::new();
        for dex_file in dex_files {
            let base = base_key_view(dex_file.location());
            for data in self.records() {
                if base_key_of(&data.profile_key) != base {
                    continue;
                }
                if data.checksum != dex_file.checksum() {
                    return Err(bad_data(format!(
                        "checksum mismatch for `{}`",
                        data.profile_key
                    )));
                }
                if data.num_method_ids != dex_file.num_method_ids() {
                    return Err(bad_data(format!(
                        "method count mismatch for `{}`",
                        data.profile_key
                    )));
                }
                matched.insert(data.profile_index, dex_file);
            }
        }

        for data in self.records() {
            let Some(dex_file) = matched.get(&data.profile_index) else {
                continue;
            };
            for &type_index in &data.class_set {
                if u32::from(type_index) >= dex_file.num_type_ids() {
                    return Err(bad_data(format!(
                        "class index {type_index} out of range for `{}`",
                        data.profile_key
                    )));
                }
            }
            for (&method_index, inline_caches) in &data.method_map {
                if u32::from(method_index) >= dex_file.num_method_ids() {
                    return Err(bad_data(format!(
                        "method index {method_index} out of range for `{}`",
                        data.profile_key
                    )));
                }
                for site in inline_caches.values() {
                    for class in site.classes() {
                        let Some(receiver) = matched.get(&class.dex_profile_index) else {
                            return Err(bad_data(
                                "inline cache references an unverified dex file",
                            ));
                        };
                        if u32::from(class.type_index) >= receiver.num_type_ids() {
                            return Err(bad_data(format!(
                                "inline cache class index {} out of range",
                                class.type_index
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn encode_method_region(data: &DexFileData, kind: ProfileKind) -> Result<Vec<u8>, ProfileError> {
    let mut buffer = Vec::new();
    for (&method_index, inline_caches) in &data.method_map {
        write_u16(&mut buffer, method_index);
        let dex_pc_count =
            u16::try_from(inline_caches.len()).map_err(|_| ProfileError::LimitExceeded)?;
        write_u16(&mut buffer, dex_pc_count);
        for (&dex_pc, site) in inline_caches {
            write_u16(&mut buffer, dex_pc);
            match site {
                DexPcData::Types(classes) => {
                    buffer.push(0);
                    buffer.push(classes.len() as u8);
                    for class in classes {
                        write_profile_index(&mut buffer, kind, class.dex_profile_index);
                        write_u16(&mut buffer, class.type_index);
                    }
                }
                DexPcData::Megamorphic => {
                    buffer.push(1);
                    buffer.push(0);
                }
                DexPcData::MissingTypes => {
                    buffer.push(2);
                    buffer.push(0);
                }
            }
        }
    }
    Ok(buffer)
}

fn read_line_header(buffer: &mut SafeBuffer<'_>) -> Result<ProfileLineHeader, ProfileError> {
    let key_length = buffer.read_u16()?;
    let class_set_size = buffer.read_u16()?;
    let method_region_bytes = buffer.read_u32()?;
    let checksum = buffer.read_u32()?;
    let num_method_ids = buffer.read_u32()?;
    if key_length == 0 {
        return Err(bad_data("empty profile key"));
    }
    let profile_key = std::str::from_utf8(buffer.read_slice(usize::from(key_length))?)
        .map_err(|_| bad_data("profile key is not valid utf-8"))?
        .to_owned();
    Ok(ProfileLineHeader {
        profile_key,
        class_set_size,
        method_region_bytes,
        checksum,
        num_method_ids,
    })
}

fn read_u16_at(data: &[u8], offset: usize) -> Result<u16, ProfileError> {
    let bytes = data
        .get(offset..offset + 2)
        .ok_or_else(|| bad_data("truncated zip archive"))?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32_at(data: &[u8], offset: usize) -> Result<u32, ProfileError> {
    let bytes = data
        .get(offset..offset + 4)
        .ok_or_else(|| bad_data("truncated zip archive"))?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Extracts a single entry from a zip archive held in memory.
///
/// Only stored and deflated entries are supported, which covers dex
/// metadata archives. Sizes are taken from the central directory, so
/// entries with data descriptors work as well.
fn extract_zip_entry(data: &[u8], entry_name: &str) -> Result<Vec<u8>, ProfileError> {
    const EOCD_SIZE: usize = 22;
    if data.len() < EOCD_SIZE {
        return Err(bad_data("truncated zip archive"));
    }
    let scan_start = data.len().saturating_sub(EOCD_SIZE + usize::from(u16::MAX));
    let eocd = (scan_start..=data.len() - EOCD_SIZE)
        .rev()
        .find(|&offset| data[offset..offset + 4] == ZIP_EOCD_SIGNATURE)
        .ok_or_else(|| bad_data("zip end of central directory not found"))?;

    let entries = read_u16_at(data, eocd + 10)?;
    let mut cursor = read_u32_at(data, eocd + 16)? as usize;
    for _ in 0..entries {
        if data.get(cursor..cursor + 4) != Some(&ZIP_CENTRAL_SIGNATURE[..]) {
            return Err(bad_data("corrupt zip central directory"));
        }
        let method = read_u16_at(data, cursor + 10)?;
        let compressed_size = read_u32_at(data, cursor + 20)? as usize;
        let uncompressed_size = read_u32_at(data, cursor + 24)? as usize;
        let name_length = usize::from(read_u16_at(data, cursor + 28)?);
        let extra_length = usize::from(read_u16_at(data, cursor + 30)?);
        let comment_length = usize::from(read_u16_at(data, cursor + 32)?);
        let local_offset = read_u32_at(data, cursor + 42)? as usize;
        let name = data
            .get(cursor + 46..cursor + 46 + name_length)
            .ok_or_else(|| bad_data("truncated zip archive"))?;
        if name == entry_name.as_bytes() {
            return read_zip_entry(data, local_offset, method, compressed_size, uncompressed_size);
        }
        cursor += 46 + name_length + extra_length + comment_length;
    }
    Err(bad_data(format!("zip entry `{entry_name}` not found")))
}

fn read_zip_entry(
    data: &[u8],
    local_offset: usize,
    method: u16,
    compressed_size: usize,
    uncompressed_size: usize,
) -> Result<Vec<u8>, ProfileError> {
    // Keep zip bombs from inflating past anything a profile could be.
    if uncompressed_size > ProfileKind::BootImage.error_threshold_bytes() + 4096 {
        return Err(ProfileError::LimitExceeded);
    }
    if data.get(local_offset..local_offset + 4) != Some(&ZIP_LOCAL_SIGNATURE[..]) {
        return Err(bad_data("corrupt zip local header"));
    }
    let name_length = usize::from(read_u16_at(data, local_offset + 26)?);
    let extra_length = usize::from(read_u16_at(data, local_offset + 28)?);
    let start = local_offset + 30 + name_length + extra_length;
    let raw = data
        .get(start..start + compressed_size)
        .ok_or_else(|| bad_data("truncated zip entry"))?;
    match method {
        0 => {
            if compressed_size != uncompressed_size {
                return Err(bad_data("stored zip entry with mismatched sizes"));
            }
            Ok(raw.to_vec())
        }
        8 => {
            let mut out = Vec::with_capacity(uncompressed_size);
            DeflateDecoder::new(raw)
                .take(uncompressed_size as u64 + 1)
                .read_to_end(&mut out)
                .map_err(|_| bad_data("corrupt zip entry"))?;
            if out.len() != uncompressed_size {
                return Err(bad_data("zip entry size does not match the stream"));
            }
            Ok(out)
        }
        _ => Err(bad_data("unsupported zip compression method")),
    }
}

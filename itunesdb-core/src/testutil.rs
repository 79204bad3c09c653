//! Synthetic iTunesDB construction for tests
//!
//! Header fields are written at their absolute offsets within the chunk,
//! mirroring the layouts documented in the parser modules.

/// Builds one chunk: a zeroed header of fixed length plus a body of
/// concatenated children. Length fields are filled in by `build`.
pub(crate) struct ChunkBuilder {
    header: Vec<u8>,
    body: Vec<u8>,
}

impl ChunkBuilder {
    pub fn new(tag: &[u8; 4], header_len: usize) -> Self {
        let mut header = vec![0u8; header_len.max(12)];
        header[0..4].copy_from_slice(tag);
        Self {
            header,
            body: Vec::new(),
        }
    }

    pub fn u8_at(mut self, offset: usize, value: u8) -> Self {
        self.header[offset] = value;
        self
    }

    pub fn u16_at(mut self, offset: usize, value: u16) -> Self {
        self.header[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u32_at(mut self, offset: usize, value: u32) -> Self {
        self.header[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u64_at(mut self, offset: usize, value: u64) -> Self {
        self.header[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn child(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    pub fn body(self, bytes: &[u8]) -> Self {
        self.child(bytes)
    }

    pub fn build(mut self) -> Vec<u8> {
        let header_len = self.header.len() as u32;
        let total_len = header_len + self.body.len() as u32;
        self.header[4..8].copy_from_slice(&header_len.to_le_bytes());
        self.header[8..12].copy_from_slice(&total_len.to_le_bytes());
        self.header.extend_from_slice(&self.body);
        self.header
    }
}

pub(crate) fn utf16(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

/// UTF-16 string `mhod`
pub(crate) fn string_object(kind: u32, text: &str) -> Vec<u8> {
    let bytes = utf16(text);
    let mut body = Vec::with_capacity(16 + bytes.len());
    body.extend_from_slice(&1u32.to_le_bytes());
    body.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    body.extend_from_slice(&[0u8; 8]);
    body.extend_from_slice(&bytes);

    ChunkBuilder::new(b"mhod", 0x18)
        .u32_at(0x0C, kind)
        .body(&body)
        .build()
}

/// Integer `mhod` (position objects on track references)
pub(crate) fn int_object(kind: u32, value: u32) -> Vec<u8> {
    let mut body = value.to_le_bytes().to_vec();
    body.extend_from_slice(&[0u8; 16]);
    ChunkBuilder::new(b"mhod", 0x18)
        .u32_at(0x0C, kind)
        .body(&body)
        .build()
}

/// Track description used to build `mhit` chunks
#[derive(Clone)]
pub(crate) struct TrackFixture {
    pub id: u32,
    pub title: &'static str,
    pub artist: &'static str,
    pub album: &'static str,
    pub genre: &'static str,
    pub rating_raw: u8,
    pub year: u32,
}

impl TrackFixture {
    pub fn new(id: u32, title: &'static str) -> Self {
        Self {
            id,
            title,
            artist: "",
            album: "",
            genre: "",
            rating_raw: 0,
            year: 0,
        }
    }

    pub fn artist(mut self, artist: &'static str) -> Self {
        self.artist = artist;
        self
    }

    pub fn album(mut self, album: &'static str) -> Self {
        self.album = album;
        self
    }

    pub fn genre(mut self, genre: &'static str) -> Self {
        self.genre = genre;
        self
    }

    pub fn rating(mut self, stars: u8) -> Self {
        self.rating_raw = stars * 20;
        self
    }

    pub fn year(mut self, year: u32) -> Self {
        self.year = year;
        self
    }

    pub fn objects(&self) -> Vec<Vec<u8>> {
        [(1, self.title), (4, self.artist), (3, self.album), (5, self.genre)]
            .into_iter()
            .filter(|(_, text)| !text.is_empty())
            .map(|(kind, text)| string_object(kind, text))
            .collect()
    }

    pub fn build(&self) -> Vec<u8> {
        track_chunk(self, &self.objects())
    }
}

/// `mhit` with a full 0x9C-byte header and the given data objects
pub(crate) fn track_chunk(fixture: &TrackFixture, objects: &[Vec<u8>]) -> Vec<u8> {
    let mut builder = ChunkBuilder::new(b"mhit", 0x9C)
        .u32_at(0x0C, objects.len() as u32)
        .u32_at(0x10, fixture.id)
        .u8_at(0x1F, fixture.rating_raw)
        .u32_at(0x24, 4_200_000)
        .u32_at(0x28, 215_000)
        .u32_at(0x2C, 1)
        .u32_at(0x30, 10)
        .u32_at(0x34, fixture.year)
        .u32_at(0x38, 256)
        .u32_at(0x3C, 44_100 << 16)
        .u64_at(0x70, 0x1000 + fixture.id as u64);
    for object in objects {
        builder = builder.child(object);
    }
    builder.build()
}

/// `mhip` referencing a track, with a position object
pub(crate) fn track_ref(track_id: u32, position: u32) -> Vec<u8> {
    ChunkBuilder::new(b"mhip", 0x4C)
        .u32_at(0x0C, 1)
        .u32_at(0x18, track_id)
        .child(&int_object(100, position))
        .build()
}

/// `mhyp` with a title object followed by track references
pub(crate) fn playlist_chunk(name: &str, master: bool, track_ids: &[u32]) -> Vec<u8> {
    let mut builder = ChunkBuilder::new(b"mhyp", 0x6C)
        .u32_at(0x0C, 1)
        .u32_at(0x10, track_ids.len() as u32)
        .u8_at(0x14, master as u8)
        .u64_at(0x1C, 0xABCD_0000 + track_ids.len() as u64)
        .child(&string_object(1, name));
    for (position, id) in track_ids.iter().enumerate() {
        builder = builder.child(&track_ref(*id, position as u32));
    }
    builder.build()
}

/// `mhlt`/`mhlp` list header followed by its items
pub(crate) fn list(tag: &[u8; 4], items: &[Vec<u8>]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(tag);
    data.extend_from_slice(&0x5Cu32.to_le_bytes());
    data.extend_from_slice(&(items.len() as u32).to_le_bytes());
    data.resize(0x5C, 0);
    for item in items {
        data.extend_from_slice(item);
    }
    data
}

/// `mhsd` of the given kind wrapping one list
pub(crate) fn dataset(kind: u32, list: &[u8]) -> Vec<u8> {
    ChunkBuilder::new(b"mhsd", 0x60)
        .u32_at(0x0C, kind)
        .child(list)
        .build()
}

pub(crate) fn tracks_dataset(tracks: &[Vec<u8>]) -> Vec<u8> {
    dataset(1, &list(b"mhlt", tracks))
}

pub(crate) fn playlists_dataset(playlists: &[Vec<u8>]) -> Vec<u8> {
    dataset(2, &list(b"mhlp", playlists))
}

/// Root `mhbd`
pub(crate) fn database(datasets: &[Vec<u8>]) -> Vec<u8> {
    let mut builder = ChunkBuilder::new(b"mhbd", 0x68)
        .u32_at(0x0C, 1)
        .u32_at(0x10, 0x19)
        .u32_at(0x14, datasets.len() as u32)
        .u64_at(0x18, 0x0123_4567_89AB_CDEF);
    for ds in datasets {
        builder = builder.child(ds);
    }
    builder.build()
}

/// `Play Counts` file with one entry per count
pub(crate) fn play_counts(counts: &[u32], entry_len: usize) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"mhdp");
    data.extend_from_slice(&0x60u32.to_le_bytes());
    data.extend_from_slice(&(entry_len as u32).to_le_bytes());
    data.extend_from_slice(&(counts.len() as u32).to_le_bytes());
    data.resize(0x60, 0);
    for (i, count) in counts.iter().enumerate() {
        let mut entry = vec![0u8; entry_len];
        entry[0..4].copy_from_slice(&count.to_le_bytes());
        if entry_len >= 8 {
            entry[4..8].copy_from_slice(&(3_600_000_000u32 + i as u32).to_le_bytes());
        }
        data.extend_from_slice(&entry);
    }
    data
}

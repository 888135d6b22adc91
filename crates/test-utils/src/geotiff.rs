//! Minimal GeoTIFF writer for tests.
//!
//! Produces little-endian files. The default layout is one uncompressed,
//! pixel-interleaved strip so the byte layout stays easy to reason about in
//! failing tests; separate planes, tiles, deflate and horizontal
//! differencing can be switched on per builder.

use std::io::Write;

const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_DOUBLE: u16 = 12;

/// Sample storage for every band of the image, all of one type.
#[derive(Debug, Clone)]
enum Bands {
    U8(Vec<Vec<u8>>),
    U16(Vec<Vec<u16>>),
    U32(Vec<Vec<u32>>),
    F32(Vec<Vec<f32>>),
    F64(Vec<Vec<f64>>),
}

impl Bands {
    fn count(&self) -> usize {
        match self {
            Bands::U8(b) => b.len(),
            Bands::U16(b) => b.len(),
            Bands::U32(b) => b.len(),
            Bands::F32(b) => b.len(),
            Bands::F64(b) => b.len(),
        }
    }

    fn bits(&self) -> u16 {
        match self {
            Bands::U8(_) => 8,
            Bands::U16(_) => 16,
            Bands::U32(_) | Bands::F32(_) => 32,
            Bands::F64(_) => 64,
        }
    }

    /// TIFF SampleFormat: 1 unsigned integer, 3 IEEE float.
    fn sample_format(&self) -> u16 {
        match self {
            Bands::F32(_) | Bands::F64(_) => 3,
            _ => 1,
        }
    }

    fn sample_bytes(&self) -> usize {
        self.bits() as usize / 8
    }

    /// Samples of band `band` alone.
    fn plane(&self, band: usize, pixels: usize) -> Vec<u8> {
        fn write<T: Copy>(samples: &[T], pixels: usize, to_le: impl Fn(T, &mut Vec<u8>)) -> Vec<u8> {
            let mut out = Vec::new();
            for &v in &samples[..pixels] {
                to_le(v, &mut out);
            }
            out
        }

        match self {
            Bands::U8(b) => write(&b[band], pixels, |v, o| o.push(v)),
            Bands::U16(b) => write(&b[band], pixels, |v, o| o.extend_from_slice(&v.to_le_bytes())),
            Bands::U32(b) => write(&b[band], pixels, |v, o| o.extend_from_slice(&v.to_le_bytes())),
            Bands::F32(b) => write(&b[band], pixels, |v, o| o.extend_from_slice(&v.to_le_bytes())),
            Bands::F64(b) => write(&b[band], pixels, |v, o| o.extend_from_slice(&v.to_le_bytes())),
        }
    }

    fn interleaved(&self, pixels: usize) -> Vec<u8> {
        fn write<T: Copy>(bands: &[Vec<T>], pixels: usize, out: &mut Vec<u8>, to_le: impl Fn(T, &mut Vec<u8>)) {
            for px in 0..pixels {
                for band in bands {
                    to_le(band[px], out);
                }
            }
        }

        let mut out = Vec::new();
        match self {
            Bands::U8(b) => write(b, pixels, &mut out, |v, o| o.push(v)),
            Bands::U16(b) => write(b, pixels, &mut out, |v, o| o.extend_from_slice(&v.to_le_bytes())),
            Bands::U32(b) => write(b, pixels, &mut out, |v, o| o.extend_from_slice(&v.to_le_bytes())),
            Bands::F32(b) => write(b, pixels, &mut out, |v, o| o.extend_from_slice(&v.to_le_bytes())),
            Bands::F64(b) => write(b, pixels, &mut out, |v, o| o.extend_from_slice(&v.to_le_bytes())),
        }
        out
    }
}

#[derive(Debug, Clone)]
enum GeoKeyEntry {
    Short(u16),
    Double(f64),
    Ascii(String),
}

/// Builder for synthetic GeoTIFF payloads.
///
/// ```ignore
/// let bytes = GeoTiffBuilder::new(4, 2)
///     .band_u8(vec![1; 8])
///     .origin(576000.0, 4145000.0)
///     .pixel_size(0.5, 0.5)
///     .utm(10, true)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct GeoTiffBuilder {
    width: u32,
    height: u32,
    bands: Option<Bands>,
    tiepoint: Option<[f64; 6]>,
    scale: Option<[f64; 3]>,
    transformation: Option<[f64; 16]>,
    geo_keys: Vec<(u16, GeoKeyEntry)>,
    planar: u16,
    tile: Option<(u32, u32)>,
    deflate: bool,
    horizontal_predictor: bool,
}

macro_rules! band_setter {
    ($name:ident, $variant:ident, $ty:ty) => {
        /// Append a band. Panics when mixed with another sample type or
        /// when the length does not match `width * height`.
        pub fn $name(mut self, samples: Vec<$ty>) -> Self {
            assert_eq!(samples.len(), self.pixel_count(), "band length must be width * height");
            match &mut self.bands {
                None => self.bands = Some(Bands::$variant(vec![samples])),
                Some(Bands::$variant(bands)) => bands.push(samples),
                Some(_) => panic!("all bands must share one sample type"),
            }
            self
        }
    };
}

impl GeoTiffBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bands: None,
            tiepoint: None,
            scale: None,
            transformation: None,
            geo_keys: Vec::new(),
            planar: 1,
            tile: None,
            deflate: false,
            horizontal_predictor: false,
        }
    }

    fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    band_setter!(band_u8, U8, u8);
    band_setter!(band_u16, U16, u16);
    band_setter!(band_u32, U32, u32);
    band_setter!(band_f32, F32, f32);
    band_setter!(band_f64, F64, f64);

    /// Tie raster pixel (0, 0) to model coordinate `(x, y)`.
    pub fn origin(mut self, x: f64, y: f64) -> Self {
        self.tiepoint = Some([0.0, 0.0, 0.0, x, y, 0.0]);
        self
    }

    pub fn pixel_size(mut self, sx: f64, sy: f64) -> Self {
        self.scale = Some([sx, sy, 0.0]);
        self
    }

    /// Row-major 4x4 ModelTransformation matrix.
    pub fn affine(mut self, matrix: [f64; 16]) -> Self {
        self.transformation = Some(matrix);
        self
    }

    pub fn geo_key_short(mut self, key: u16, value: u16) -> Self {
        self.geo_keys.push((key, GeoKeyEntry::Short(value)));
        self
    }

    pub fn geo_key_double(mut self, key: u16, value: f64) -> Self {
        self.geo_keys.push((key, GeoKeyEntry::Double(value)));
        self
    }

    pub fn geo_key_ascii(mut self, key: u16, value: &str) -> Self {
        self.geo_keys.push((key, GeoKeyEntry::Ascii(value.to_string())));
        self
    }

    /// WGS 84 / UTM zone `zone`, metres.
    pub fn utm(self, zone: u16, north: bool) -> Self {
        let code = if north { 32600 + zone } else { 32700 + zone };
        self.geo_key_short(1024, 1)
            .geo_key_short(1025, 1)
            .geo_key_short(3072, code)
            .geo_key_short(3076, 9001)
    }

    /// WGS 84 geographic, degrees.
    pub fn geographic(self) -> Self {
        self.geo_key_short(1024, 2).geo_key_short(1025, 1).geo_key_short(2048, 4326)
    }

    /// Store each band in its own strip (PlanarConfiguration 2).
    pub fn planar_separate(mut self) -> Self {
        self.planar = 2;
        self
    }

    /// Store pixels in `width` x `height` tiles, zero-padded at the edges.
    pub fn tiled(mut self, width: u32, height: u32) -> Self {
        self.tile = Some((width, height));
        self
    }

    /// Deflate-compress every chunk.
    pub fn deflate(mut self) -> Self {
        self.deflate = true;
        self
    }

    /// Horizontal differencing (Predictor 2). 8-bit bands only.
    pub fn horizontal_predictor(mut self) -> Self {
        self.horizontal_predictor = true;
        self
    }

    /// Serialize the image.
    pub fn build(self) -> Vec<u8> {
        let bands = self.bands.clone().expect("at least one band");
        assert!(
            !self.horizontal_predictor || bands.bits() == 8,
            "horizontal predictor needs 8-bit samples"
        );
        let samples = bands.count() as u16;
        let chunks = self.chunks(&bands);

        let photometric = match (&bands, samples) {
            (Bands::U8(_), 3) => 2,
            _ => 1,
        };
        let compression = if self.deflate { 8 } else { 1 };
        let byte_counts: Vec<u32> = chunks.iter().map(|c| c.len() as u32).collect();
        // Offsets are patched once the layout is known.
        let placeholder = vec![0u32; chunks.len()];

        let mut entries: Vec<Entry> = vec![
            Entry::long(256, self.width),
            Entry::long(257, self.height),
            Entry::shorts(258, vec![bands.bits(); samples as usize]),
            Entry::shorts(259, vec![compression]),
            Entry::shorts(262, vec![photometric]),
            Entry::shorts(277, vec![samples]),
            Entry::shorts(284, vec![self.planar]),
            Entry::shorts(339, vec![bands.sample_format(); samples as usize]),
        ];
        let offsets_tag = match self.tile {
            None => {
                entries.push(Entry::longs(273, placeholder));
                entries.push(Entry::long(278, self.height));
                entries.push(Entry::longs(279, byte_counts));
                273
            }
            Some((tw, th)) => {
                entries.push(Entry::long(322, tw));
                entries.push(Entry::long(323, th));
                entries.push(Entry::longs(324, placeholder));
                entries.push(Entry::longs(325, byte_counts));
                324
            }
        };
        if self.horizontal_predictor {
            entries.push(Entry::shorts(317, vec![2]));
        }
        if let Some(scale) = self.scale {
            entries.push(Entry::doubles(33550, scale.to_vec()));
        }
        if let Some(tiepoint) = self.tiepoint {
            entries.push(Entry::doubles(33922, tiepoint.to_vec()));
        }
        if let Some(matrix) = self.transformation {
            entries.push(Entry::doubles(34264, matrix.to_vec()));
        }
        entries.extend(self.geo_key_entries());
        entries.sort_by_key(|e| e.tag);

        // header | IFD | out-of-line values | chunks
        let ifd_len = 2 + entries.len() * 12 + 4;
        let (_, blobs) = place_values(&entries, 8 + ifd_len);
        let mut chunk_offset = (8 + ifd_len + blobs.len()) as u32;
        let offsets: Vec<u32> = chunks
            .iter()
            .map(|c| {
                let at = chunk_offset;
                chunk_offset += c.len() as u32;
                at
            })
            .collect();
        for entry in entries.iter_mut().filter(|e| e.tag == offsets_tag) {
            *entry = Entry::longs(offsets_tag, offsets.clone());
        }
        let (value_offsets, blobs) = place_values(&entries, 8 + ifd_len);

        let mut out = Vec::new();
        out.extend_from_slice(b"II");
        out.extend_from_slice(&42u16.to_le_bytes());
        out.extend_from_slice(&8u32.to_le_bytes());
        out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for (entry, offset) in entries.iter().zip(&value_offsets) {
            out.extend_from_slice(&entry.tag.to_le_bytes());
            out.extend_from_slice(&entry.field_type.to_le_bytes());
            out.extend_from_slice(&entry.count.to_le_bytes());
            match offset {
                Some(offset) => out.extend_from_slice(&offset.to_le_bytes()),
                None => {
                    let mut inline = entry.data.clone();
                    inline.resize(4, 0);
                    out.extend_from_slice(&inline);
                }
            }
        }
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&blobs);
        for chunk in chunks {
            out.extend_from_slice(&chunk);
        }
        out
    }

    /// Encoded chunks in file order: every chunk of plane 0, then plane 1...
    fn chunks(&self, bands: &Bands) -> Vec<Vec<u8>> {
        let pixels = self.pixel_count();
        let (planes, per_pixel): (Vec<Vec<u8>>, usize) = if self.planar == 2 {
            ((0..bands.count()).map(|b| bands.plane(b, pixels)).collect(), 1)
        } else {
            (vec![bands.interleaved(pixels)], bands.count())
        };
        let pixel_bytes = per_pixel * bands.sample_bytes();
        let (width, height) = (self.width as usize, self.height as usize);

        let mut chunks = Vec::new();
        for plane in &planes {
            match self.tile {
                None => chunks.push((plane.clone(), width)),
                Some((tw, th)) => {
                    let (tw, th) = (tw as usize, th as usize);
                    for ty in 0..height.div_ceil(th) {
                        for tx in 0..width.div_ceil(tw) {
                            let mut tile = vec![0u8; tw * th * pixel_bytes];
                            for row in 0..th {
                                let y = ty * th + row;
                                if y >= height {
                                    break;
                                }
                                let cols = tw.min(width - tx * tw);
                                let src = (y * width + tx * tw) * pixel_bytes;
                                let dst = row * tw * pixel_bytes;
                                tile[dst..dst + cols * pixel_bytes].copy_from_slice(&plane[src..src + cols * pixel_bytes]);
                            }
                            chunks.push((tile, tw));
                        }
                    }
                }
            }
        }

        chunks
            .into_iter()
            .map(|(mut chunk, chunk_width)| {
                if self.horizontal_predictor {
                    let row_len = chunk_width * per_pixel;
                    for row in chunk.chunks_mut(row_len) {
                        for i in (per_pixel..row.len()).rev() {
                            row[i] = row[i].wrapping_sub(row[i - per_pixel]);
                        }
                    }
                }
                if self.deflate {
                    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                    encoder.write_all(&chunk).expect("deflate chunk");
                    chunk = encoder.finish().expect("finish deflate");
                }
                chunk
            })
            .collect()
    }

    fn geo_key_entries(&self) -> Vec<Entry> {
        if self.geo_keys.is_empty() {
            return Vec::new();
        }
        let mut keys = self.geo_keys.clone();
        keys.sort_by_key(|(k, _)| *k);

        let mut directory = vec![1u16, 1, 0, keys.len() as u16];
        let mut doubles = Vec::new();
        let mut ascii = String::new();
        for (key, value) in &keys {
            match value {
                GeoKeyEntry::Short(v) => directory.extend_from_slice(&[*key, 0, 1, *v]),
                GeoKeyEntry::Double(v) => {
                    directory.extend_from_slice(&[*key, 34736, 1, doubles.len() as u16]);
                    doubles.push(*v);
                }
                GeoKeyEntry::Ascii(s) => {
                    let text = format!("{}|", s);
                    directory.extend_from_slice(&[*key, 34737, text.len() as u16, ascii.len() as u16]);
                    ascii.push_str(&text);
                }
            }
        }

        let mut entries = vec![Entry::shorts(34735, directory)];
        if !doubles.is_empty() {
            entries.push(Entry::doubles(34736, doubles));
        }
        if !ascii.is_empty() {
            entries.push(Entry::ascii(34737, &ascii));
        }
        entries
    }
}

/// Offset of every out-of-line value, and the values themselves, when the
/// value area starts at `start`.
fn place_values(entries: &[Entry], start: usize) -> (Vec<Option<u32>>, Vec<u8>) {
    let mut blobs = Vec::new();
    let mut offsets = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.data.len() > 4 {
            offsets.push(Some((start + blobs.len()) as u32));
            blobs.extend_from_slice(&entry.data);
            if entry.data.len() % 2 == 1 {
                blobs.push(0);
            }
        } else {
            offsets.push(None);
        }
    }
    (offsets, blobs)
}

#[derive(Debug, Clone)]
struct Entry {
    tag: u16,
    field_type: u16,
    count: u32,
    data: Vec<u8>,
}

impl Entry {
    fn long(tag: u16, value: u32) -> Self {
        Self {
            tag,
            field_type: TYPE_LONG,
            count: 1,
            data: value.to_le_bytes().to_vec(),
        }
    }

    fn longs(tag: u16, values: Vec<u32>) -> Self {
        Self {
            tag,
            field_type: TYPE_LONG,
            count: values.len() as u32,
            data: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    fn shorts(tag: u16, values: Vec<u16>) -> Self {
        Self {
            tag,
            field_type: TYPE_SHORT,
            count: values.len() as u32,
            data: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    fn doubles(tag: u16, values: Vec<f64>) -> Self {
        Self {
            tag,
            field_type: TYPE_DOUBLE,
            count: values.len() as u32,
            data: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    fn ascii(tag: u16, value: &str) -> Self {
        let mut data = value.as_bytes().to_vec();
        data.push(0);
        Self {
            tag,
            field_type: TYPE_ASCII,
            count: data.len() as u32,
            data,
        }
    }
}

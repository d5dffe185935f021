use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ConfigurationError;
use crate::paint::Rgba8;

use super::index::{IndexBuffer, IndexFormat};
use super::layout::{compute_layout, ElementType, PackedLayout, StreamDesc};

pub const VERTICES_PER_QUAD: usize = 4;
pub const INDICES_PER_QUAD: usize = 6;

pub const POSITION_COMPONENTS: u32 = 3; // x, y, z
pub const TEXCOORD_COMPONENTS: u32 = 2; // u, v
pub const COLOR_COMPONENTS: u32 = 4; // r, g, b, a

/// Stream names used in a quad batch layout.
pub const POSITION: &str = "position";
pub const TEXCOORD: &str = "texcoord";
pub const COLOR: &str = "color";

//  v1------v0      texcoords
//  |       |       v0 (1,1)  v1 (0,1)
//  |       |       v2 (0,0)  v3 (1,0)
//  v2------v3
const QUAD_TEXCOORDS: [u16; 8] = [1, 1, 0, 1, 0, 0, 1, 0];

// (v0, v1, v2), (v0, v2, v3): counter-clockwise seen from +z looking down -z.
const QUAD_INDEX_PATTERN: [u32; INDICES_PER_QUAD] = [0, 1, 2, 0, 2, 3];

static NEXT_BATCH_ID: AtomicU64 = AtomicU64::new(1);

/// Growable quad mesh held as parallel attribute streams.
///
/// Every quad contributes 4 vertices and 6 indices. The index base of a new quad
/// is always derived from the current position stream length, so clearing or
/// rebuilding a batch cannot leave a stale vertex counter behind.
#[derive(Debug, Clone)]
pub struct QuadBatch {
    id: u64,
    positions: Vec<f32>,
    texcoords: Vec<u16>,
    colors: Option<Vec<u8>>,
    indices: IndexBuffer,

    /// Bumped whenever any stream length changes.
    generation: u64,

    warned_untracked_color: bool,
}

impl Default for QuadBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadBatch {
    /// Batch with position and texcoord streams only.
    pub fn new() -> Self {
        Self {
            id: NEXT_BATCH_ID.fetch_add(1, Ordering::Relaxed),
            positions: Vec::new(),
            texcoords: Vec::new(),
            colors: None,
            indices: IndexBuffer::new(),
            generation: 0,
            warned_untracked_color: false,
        }
    }

    /// Batch that also tracks one flat color per quad.
    pub fn with_colors() -> Self {
        Self {
            colors: Some(Vec::new()),
            ..Self::new()
        }
    }

    #[inline]
    pub fn tracks_colors(&self) -> bool {
        self.colors.is_some()
    }

    /// Appends a `width x height` rectangle centered on the z axis at `depth`.
    ///
    /// A color-tracking batch uses opaque white when `color` is `None`; a batch
    /// without a color stream ignores `color`.
    pub fn append_quad(
        &mut self,
        width: f32,
        height: f32,
        depth: f32,
        color: Option<Rgba8>,
    ) -> Result<(), ConfigurationError> {
        let valid = width.is_finite() && height.is_finite() && depth.is_finite();
        if !valid || width <= 0.0 || height <= 0.0 {
            return Err(ConfigurationError::InvalidQuad {
                width,
                height,
                depth,
            });
        }

        let base = self.next_index_base()?;

        let (hw, hh) = (width * 0.5, height * 0.5);
        self.positions.extend_from_slice(&[
            hw, hh, depth, // v0 top-right
            -hw, hh, depth, // v1 top-left
            -hw, -hh, depth, // v2 bottom-left
            hw, -hh, depth, // v3 bottom-right
        ]);

        self.texcoords.extend_from_slice(&QUAD_TEXCOORDS);

        match (&mut self.colors, color) {
            (Some(colors), c) => {
                let rgba = c.unwrap_or(Rgba8::WHITE).to_array();
                for _ in 0..VERTICES_PER_QUAD {
                    colors.extend_from_slice(&rgba);
                }
            }
            (None, Some(_)) if !self.warned_untracked_color => {
                log::debug!("QuadBatch: color given to a batch without a color stream; ignored");
                self.warned_untracked_color = true;
            }
            (None, _) => {}
        }

        let indices = QUAD_INDEX_PATTERN.map(|i| base + i);
        self.indices.extend_from(&indices);

        self.generation += 1;
        Ok(())
    }

    /// Index of the first vertex the next quad will own.
    fn next_index_base(&self) -> Result<u32, ConfigurationError> {
        let vertices = self.vertex_count();
        // The new quad's highest index is `base + 3`.
        u32::try_from(vertices + VERTICES_PER_QUAD - 1)
            .map(|_| vertices as u32)
            .map_err(|_| ConfigurationError::TooManyVertices {
                vertices: vertices + VERTICES_PER_QUAD,
            })
    }

    /// Rewrites the color of quad `quad` on all four of its vertices.
    ///
    /// Stream lengths do not change, so an existing layout stays valid and only
    /// the color byte range needs re-uploading. No-op for batches without colors.
    pub fn set_quad_color(&mut self, quad: usize, color: Rgba8) -> Result<(), ConfigurationError> {
        let count = self.quad_count();
        let Some(colors) = self.colors.as_mut() else {
            return Ok(());
        };
        if quad >= count {
            return Err(ConfigurationError::QuadOutOfRange { index: quad, count });
        }

        let stride = VERTICES_PER_QUAD * COLOR_COMPONENTS as usize;
        let rgba = color.to_array();
        for vertex in colors[quad * stride..(quad + 1) * stride].chunks_exact_mut(4) {
            vertex.copy_from_slice(&rgba);
        }
        Ok(())
    }

    /// Removes every quad from all streams together.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.texcoords.clear();
        if let Some(colors) = self.colors.as_mut() {
            colors.clear();
        }
        self.indices.clear();
        self.generation += 1;
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / POSITION_COMPONENTS as usize
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.indices.len() / INDICES_PER_QUAD
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn texcoords(&self) -> &[u16] {
        &self.texcoords
    }

    pub fn colors(&self) -> Option<&[u8]> {
        self.colors.as_deref()
    }

    pub fn indices(&self) -> &IndexBuffer {
        &self.indices
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stream descriptions in packing order: position, texcoord, then color.
    pub fn stream_descs(&self) -> Vec<StreamDesc> {
        let mut streams = vec![
            StreamDesc::per_vertex(POSITION, self.positions.len(), ElementType::F32, POSITION_COMPONENTS),
            StreamDesc::per_vertex(TEXCOORD, self.texcoords.len(), ElementType::U16, TEXCOORD_COMPONENTS),
        ];
        if let Some(colors) = &self.colors {
            streams.push(StreamDesc::per_vertex(COLOR, colors.len(), ElementType::U8, COLOR_COMPONENTS));
        }
        streams
    }

    pub fn layout(&self) -> Result<PackedLayout, ConfigurationError> {
        compute_layout(&self.stream_descs())
    }

    /// Concatenates the vertex streams into one byte buffer described by [`layout`](Self::layout).
    pub fn pack(&self) -> Result<PackedMesh, ConfigurationError> {
        let layout = self.layout()?;

        let mut vertex_bytes = Vec::with_capacity(layout.total_bytes());
        vertex_bytes.extend_from_slice(bytemuck::cast_slice(&self.positions));
        vertex_bytes.extend_from_slice(bytemuck::cast_slice(&self.texcoords));
        if let Some(colors) = &self.colors {
            vertex_bytes.extend_from_slice(colors);
        }
        debug_assert_eq!(vertex_bytes.len(), layout.total_bytes());

        Ok(PackedMesh {
            batch_id: self.id,
            generation: self.generation,
            layout,
            vertex_bytes,
            index_bytes: self.indices.as_bytes().to_vec(),
            index_format: self.indices.format(),
            index_count: self.indices.len() as u32,
        })
    }

    /// Human-readable element counts, one stream per line.
    pub fn summarize(&self) -> String {
        let mut out = String::new();
        let colors = self.colors.as_ref().map_or(0, Vec::len);

        let _ = writeln!(out, "Rectangles: {}", self.quad_count());
        let _ = writeln!(out, "Vertices:   {} ({} per rectangle)", self.vertex_count(), VERTICES_PER_QUAD);
        let _ = writeln!(out, "Positions:  {} ({}-per-vertex)", self.positions.len(), POSITION_COMPONENTS);
        let _ = writeln!(out, "TexCoords:  {} ({}-per-vertex)", self.texcoords.len(), TEXCOORD_COMPONENTS);
        let _ = writeln!(out, "Colors:     {} ({}-per-vertex)", colors, COLOR_COMPONENTS);
        let _ = write!(
            out,
            "Indices:    {} ({}-per-rectangle, {:?})",
            self.indices.len(),
            INDICES_PER_QUAD,
            self.indices.format()
        );
        out
    }
}

/// A batch flattened into upload-ready bytes.
///
/// Owns its data, so it can be built away from the render thread and handed over
/// whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedMesh {
    batch_id: u64,
    generation: u64,
    pub layout: PackedLayout,
    pub vertex_bytes: Vec<u8>,
    pub index_bytes: Vec<u8>,
    pub index_format: IndexFormat,
    pub index_count: u32,
}

impl PackedMesh {
    /// True while `batch` has not changed shape since this mesh was packed.
    pub fn is_current(&self, batch: &QuadBatch) -> bool {
        self.batch_id == batch.id && self.generation == batch.generation
    }

    /// Bytes of one stream inside `vertex_bytes`.
    pub fn stream_bytes(&self, name: &str) -> Option<&[u8]> {
        let span = self.layout.get(name)?;
        self.vertex_bytes.get(span.offset..span.end())
    }

    pub fn has_stream(&self, name: &str) -> bool {
        self.layout.get(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_of(n: usize) -> QuadBatch {
        let mut b = QuadBatch::with_colors();
        for k in 0..n {
            let s = 1.0 + k as f32;
            b.append_quad(s, s, -(k as f32), Some(Rgba8::RED)).unwrap();
        }
        b
    }

    // ── stream lengths ────────────────────────────────────────────────────

    #[test]
    fn stream_lengths_scale_with_quad_count() {
        for n in 0..40 {
            let b = batch_of(n);
            assert_eq!(b.indices().len(), 6 * n);
            assert_eq!(b.positions().len(), 12 * n);
            assert_eq!(b.texcoords().len(), 8 * n);
            assert_eq!(b.colors().unwrap().len(), 16 * n);
            assert_eq!(b.quad_count(), n);
        }
    }

    #[test]
    fn untracked_batch_has_no_color_stream() {
        let mut b = QuadBatch::new();
        b.append_quad(1.0, 1.0, 0.0, Some(Rgba8::BLUE)).unwrap();
        assert!(b.colors().is_none());
        assert_eq!(b.stream_descs().len(), 2);
    }

    #[test]
    fn tracked_batch_defaults_to_white() {
        let mut b = QuadBatch::with_colors();
        b.append_quad(1.0, 1.0, 0.0, None).unwrap();
        assert!(b.colors().unwrap().iter().all(|&c| c == 255));
    }

    // ── indices ───────────────────────────────────────────────────────────

    #[test]
    fn max_index_is_four_n_minus_one() {
        for n in 1..40 {
            let b = batch_of(n);
            assert_eq!(b.indices().iter().max(), Some(4 * n as u32 - 1));
        }
    }

    #[test]
    fn each_quad_references_only_its_own_vertices() {
        let b = batch_of(25);
        let all: Vec<u32> = b.indices().iter().collect();
        for (k, quad) in all.chunks_exact(6).enumerate() {
            let lo = 4 * k as u32;
            assert!(quad.iter().all(|&i| (lo..=lo + 3).contains(&i)), "quad {k}: {quad:?}");
            assert_eq!(quad, &[lo, lo + 1, lo + 2, lo, lo + 2, lo + 3]);
        }
    }

    #[test]
    fn index_base_follows_buffer_after_clear() {
        let mut b = batch_of(3);
        b.clear();
        b.append_quad(1.0, 1.0, 0.0, None).unwrap();
        assert_eq!(b.indices().iter().collect::<Vec<_>>(), vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn independent_batches_do_not_share_counters() {
        let offscreen = batch_of(5);
        let mut screen = QuadBatch::new();
        screen.append_quad(2.0, 2.0, 0.0, None).unwrap();
        assert_eq!(offscreen.indices().iter().max(), Some(19));
        assert_eq!(screen.indices().iter().max(), Some(3));
    }

    #[test]
    fn indices_widen_past_u16_range() {
        // 16384 quads use vertices 0..=65535; one more needs index 65536.
        let mut b = QuadBatch::new();
        for _ in 0..16384 {
            b.append_quad(1.0, 1.0, 0.0, None).unwrap();
        }
        assert_eq!(b.indices().format(), IndexFormat::U16);

        b.append_quad(1.0, 1.0, 0.0, None).unwrap();
        assert_eq!(b.indices().format(), IndexFormat::U32);
        assert_eq!(b.indices().iter().max(), Some(65539));
        assert_eq!(b.indices().get(6 * 16384), Some(65536));
    }

    // ── geometry ──────────────────────────────────────────────────────────

    #[test]
    fn vertex_order_is_tr_tl_bl_br() {
        let mut b = QuadBatch::new();
        b.append_quad(4.0, 2.0, -1.5, None).unwrap();
        assert_eq!(
            b.positions(),
            &[2.0, 1.0, -1.5, -2.0, 1.0, -1.5, -2.0, -1.0, -1.5, 2.0, -1.0, -1.5]
        );
        assert_eq!(b.texcoords(), &[1, 1, 0, 1, 0, 0, 1, 0]);
    }

    #[test]
    fn triangles_wind_counter_clockwise() {
        let mut b = QuadBatch::new();
        b.append_quad(3.0, 2.0, 0.0, None).unwrap();
        let p = b.positions();
        let v = |i: u32| (p[i as usize * 3], p[i as usize * 3 + 1]);
        let idx: Vec<u32> = b.indices().iter().collect();
        for tri in idx.chunks_exact(3) {
            let (a, bb, c) = (v(tri[0]), v(tri[1]), v(tri[2]));
            let cross = (bb.0 - a.0) * (c.1 - a.1) - (bb.1 - a.1) * (c.0 - a.0);
            assert!(cross > 0.0, "triangle {tri:?} is clockwise");
        }
    }

    #[test]
    fn invalid_sizes_leave_batch_untouched() {
        let mut b = batch_of(1);
        let before = b.generation();
        assert!(b.append_quad(0.0, 1.0, 0.0, None).is_err());
        assert!(b.append_quad(1.0, -1.0, 0.0, None).is_err());
        assert!(b.append_quad(1.0, 1.0, f32::NAN, None).is_err());
        assert_eq!(b.quad_count(), 1);
        assert_eq!(b.generation(), before);
    }

    // ── colors ────────────────────────────────────────────────────────────

    #[test]
    fn colors_are_flat_per_quad() {
        let mut b = QuadBatch::with_colors();
        b.append_quad(1.0, 1.0, 0.0, Some(Rgba8::RED)).unwrap();
        b.append_quad(1.0, 1.0, 0.0, Some(Rgba8::BLUE)).unwrap();
        let colors = b.colors().unwrap();
        assert!(colors[..16].chunks_exact(4).all(|c| c == [255, 0, 0, 255]));
        assert!(colors[16..].chunks_exact(4).all(|c| c == [0, 0, 255, 255]));
    }

    #[test]
    fn recolor_keeps_layout_current() {
        let mut b = batch_of(3);
        let mesh = b.pack().unwrap();
        b.set_quad_color(1, Rgba8::BLUE).unwrap();
        assert!(mesh.is_current(&b));
        assert_eq!(&b.colors().unwrap()[16..20], &[0, 0, 255, 255]);
        assert_eq!(&b.colors().unwrap()[32..36], &[255, 0, 0, 255]);
        assert!(b.set_quad_color(3, Rgba8::BLUE).is_err());
    }

    // ── packing ───────────────────────────────────────────────────────────

    #[test]
    fn pack_places_streams_at_layout_offsets() {
        let b = batch_of(2);
        let mesh = b.pack().unwrap();
        assert_eq!(mesh.layout.total_bytes(), 96 + 32 + 32);
        assert_eq!(mesh.vertex_bytes.len(), mesh.layout.total_bytes());
        assert_eq!(mesh.stream_bytes(POSITION).unwrap(), bytemuck::cast_slice::<f32, u8>(b.positions()));
        assert_eq!(mesh.stream_bytes(COLOR).unwrap(), b.colors().unwrap());
        assert_eq!(mesh.index_count, 12);
        assert_eq!(mesh.index_bytes.len(), 24);
    }

    #[test]
    fn mesh_goes_stale_when_batch_grows() {
        let mut b = batch_of(1);
        let mesh = b.pack().unwrap();
        b.append_quad(1.0, 1.0, 0.0, None).unwrap();
        assert!(!mesh.is_current(&b));
        assert!(!mesh.is_current(&batch_of(1)));
    }

    // ── end to end ────────────────────────────────────────────────────────

    #[test]
    fn two_rectangle_scene() {
        let mut b = QuadBatch::with_colors();
        b.append_quad(2.0, 2.0, -1.2, Some(Rgba8::RED)).unwrap();
        b.append_quad(1.0, 1.0, -1.1, Some(Rgba8::BLUE)).unwrap();

        assert_eq!(b.quad_count(), 2);
        assert_eq!(b.vertex_count(), 8);
        assert_eq!(b.indices().len(), 12);

        let summary = b.summarize();
        assert!(summary.starts_with("Rectangles: 2\n"), "{summary}");
        assert!(summary.contains("Positions:  24"));
        assert!(summary.contains("Indices:    12"));
    }
}

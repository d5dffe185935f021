//! Attribute packing: several typed streams concatenated into one buffer.

use crate::error::ConfigurationError;

/// Scalar representation of one stream element.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ElementType {
    F32,
    U8,
    U16,
    U32,
}

impl ElementType {
    #[inline]
    pub const fn byte_size(self) -> usize {
        match self {
            ElementType::U8 => 1,
            ElementType::U16 => 2,
            ElementType::F32 | ElementType::U32 => 4,
        }
    }
}

/// Description of one stream to be packed.
///
/// `element_count` counts scalars, not vertices: a position stream of four
/// `xyz` vertices has `element_count == 12` and `components == 3`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StreamDesc {
    pub name: &'static str,
    pub element_count: usize,
    pub element: ElementType,
    pub components: u32,
    /// Per-vertex streams must agree on the vertex count they imply.
    pub per_vertex: bool,
}

impl StreamDesc {
    pub const fn per_vertex(
        name: &'static str,
        element_count: usize,
        element: ElementType,
        components: u32,
    ) -> Self {
        Self {
            name,
            element_count,
            element,
            components,
            per_vertex: true,
        }
    }

    /// A stream exempt from the vertex count check (e.g. indices).
    pub const fn independent(name: &'static str, element_count: usize, element: ElementType) -> Self {
        Self {
            name,
            element_count,
            element,
            components: 1,
            per_vertex: false,
        }
    }

    #[inline]
    pub const fn byte_len(&self) -> usize {
        self.element_count * self.element.byte_size()
    }
}

/// Placement of one stream inside the packed buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StreamSpan {
    pub name: &'static str,
    pub offset: usize,
    pub length: usize,
    pub element: ElementType,
    pub components: u32,
}

impl StreamSpan {
    #[inline]
    pub const fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Byte distance between consecutive vertices of this stream.
    #[inline]
    pub const fn stride(&self) -> usize {
        self.element.byte_size() * self.components as usize
    }
}

/// Result of [`compute_layout`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackedLayout {
    spans: Vec<StreamSpan>,
    total_bytes: usize,
    vertex_count: usize,
}

impl PackedLayout {
    pub fn get(&self, name: &str) -> Option<&StreamSpan> {
        self.spans.iter().find(|s| s.name == name)
    }

    /// Spans in declaration order.
    pub fn spans(&self) -> &[StreamSpan] {
        &self.spans
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Vertex count shared by all per-vertex streams (0 for an empty set).
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }
}

/// Assigns each stream an offset equal to the byte length of everything before it.
///
/// No padding is inserted. Fails when per-vertex streams disagree on how many
/// vertices they describe.
pub fn compute_layout(streams: &[StreamDesc]) -> Result<PackedLayout, ConfigurationError> {
    for (i, s) in streams.iter().enumerate() {
        if streams[..i].iter().any(|prev| prev.name == s.name) {
            return Err(ConfigurationError::DuplicateStream(s.name));
        }
        if s.components == 0 || s.element_count % s.components as usize != 0 {
            return Err(ConfigurationError::PartialVertex {
                name: s.name,
                count: s.element_count,
                components: s.components,
            });
        }
    }

    let vertex_count = check_vertex_counts(streams)?;

    let mut spans = Vec::with_capacity(streams.len());
    let mut offset = 0usize;
    for s in streams {
        let length = s.byte_len();
        spans.push(StreamSpan {
            name: s.name,
            offset,
            length,
            element: s.element,
            components: s.components,
        });
        offset += length;
    }

    Ok(PackedLayout {
        spans,
        total_bytes: offset,
        vertex_count,
    })
}

fn check_vertex_counts(streams: &[StreamDesc]) -> Result<usize, ConfigurationError> {
    let vertices = |s: &StreamDesc| s.element_count / s.components as usize;

    let Some(reference) = streams
        .iter()
        .filter(|s| s.per_vertex)
        .map(vertices)
        .find(|&n| n > 0)
    else {
        return Ok(0);
    };

    for s in streams.iter().filter(|s| s.per_vertex) {
        match vertices(s) {
            0 => {
                return Err(ConfigurationError::EmptyStream {
                    name: s.name,
                    expected: reference,
                });
            }
            n if n != reference => {
                return Err(ConfigurationError::VertexCountMismatch {
                    name: s.name,
                    expected: reference,
                    actual: n,
                });
            }
            _ => {}
        }
    }

    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_streams(quads: usize) -> [StreamDesc; 3] {
        [
            StreamDesc::per_vertex("position", quads * 12, ElementType::F32, 3),
            StreamDesc::per_vertex("texcoord", quads * 8, ElementType::U16, 2),
            StreamDesc::per_vertex("color", quads * 16, ElementType::U8, 4),
        ]
    }

    // ── offsets ───────────────────────────────────────────────────────────

    #[test]
    fn offsets_follow_declaration_order() {
        let layout = compute_layout(&quad_streams(2)).unwrap();

        let pos = layout.get("position").unwrap();
        let tex = layout.get("texcoord").unwrap();
        let col = layout.get("color").unwrap();

        assert_eq!((pos.offset, pos.length), (0, 96));
        assert_eq!((tex.offset, tex.length), (96, 32));
        assert_eq!((col.offset, col.length), (128, 32));
        assert_eq!(layout.total_bytes(), 160);
        assert_eq!(layout.vertex_count(), 8);
    }

    #[test]
    fn mixed_width_streams_are_not_padded() {
        let layout = compute_layout(&[
            StreamDesc::per_vertex("a", 3, ElementType::U8, 1),
            StreamDesc::per_vertex("b", 3, ElementType::F32, 1),
        ])
        .unwrap();
        assert_eq!(layout.get("b").unwrap().offset, 3);
        assert_eq!(layout.total_bytes(), 15);
    }

    #[test]
    fn stride_is_element_size_times_components() {
        let layout = compute_layout(&quad_streams(1)).unwrap();
        assert_eq!(layout.get("position").unwrap().stride(), 12);
        assert_eq!(layout.get("texcoord").unwrap().stride(), 4);
        assert_eq!(layout.get("color").unwrap().stride(), 4);
    }

    #[test]
    fn identical_input_gives_identical_layout() {
        let streams = quad_streams(5);
        assert_eq!(compute_layout(&streams), compute_layout(&streams));
    }

    #[test]
    fn spans_never_overlap() {
        for quads in [0usize, 1, 3, 17] {
            let layout = compute_layout(&quad_streams(quads)).unwrap();
            let spans = layout.spans();
            for (i, a) in spans.iter().enumerate() {
                for b in &spans[i + 1..] {
                    assert!(a.end() <= b.offset || b.end() <= a.offset, "{a:?} overlaps {b:?}");
                }
            }
            assert_eq!(spans.last().unwrap().end(), layout.total_bytes());
        }
    }

    // ── validation ────────────────────────────────────────────────────────

    #[test]
    fn empty_set_is_valid() {
        let layout = compute_layout(&quad_streams(0)).unwrap();
        assert_eq!(layout.total_bytes(), 0);
        assert_eq!(layout.vertex_count(), 0);
    }

    #[test]
    fn mismatched_vertex_counts_rejected() {
        let err = compute_layout(&[
            StreamDesc::per_vertex("position", 12, ElementType::F32, 3),
            StreamDesc::per_vertex("texcoord", 6, ElementType::U16, 2),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::VertexCountMismatch {
                name: "texcoord",
                expected: 4,
                actual: 3,
            }
        );
    }

    #[test]
    fn empty_stream_beside_filled_rejected() {
        let err = compute_layout(&[
            StreamDesc::per_vertex("position", 12, ElementType::F32, 3),
            StreamDesc::per_vertex("color", 0, ElementType::U8, 4),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::EmptyStream {
                name: "color",
                expected: 4,
            }
        );
    }

    #[test]
    fn partial_vertex_rejected() {
        let err = compute_layout(&[StreamDesc::per_vertex("position", 10, ElementType::F32, 3)])
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::PartialVertex { name: "position", .. }));
    }

    #[test]
    fn index_stream_exempt_from_count_check() {
        let layout = compute_layout(&[
            StreamDesc::per_vertex("position", 12, ElementType::F32, 3),
            StreamDesc::independent("index", 6, ElementType::U16),
        ])
        .unwrap();
        assert_eq!(layout.vertex_count(), 4);
        assert_eq!(layout.get("index").unwrap().offset, 48);
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = compute_layout(&[
            StreamDesc::per_vertex("position", 3, ElementType::F32, 3),
            StreamDesc::per_vertex("position", 3, ElementType::F32, 3),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateStream("position"));
    }
}

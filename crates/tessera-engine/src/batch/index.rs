/// Index element width of a packed batch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    #[inline]
    pub const fn byte_size(self) -> usize {
        match self {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }

    #[inline]
    pub fn to_wgpu(self) -> wgpu::IndexFormat {
        match self {
            IndexFormat::U16 => wgpu::IndexFormat::Uint16,
            IndexFormat::U32 => wgpu::IndexFormat::Uint32,
        }
    }
}

/// Triangle indices of one batch.
///
/// Starts at 16 bits and widens to 32 bits the first time an index above
/// `u16::MAX` is pushed. Widening never happens the other way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexBuffer {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Default for IndexBuffer {
    fn default() -> Self {
        IndexBuffer::U16(Vec::new())
    }
}

impl IndexBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        match self {
            IndexBuffer::U16(v) => v.len(),
            IndexBuffer::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn format(&self) -> IndexFormat {
        match self {
            IndexBuffer::U16(_) => IndexFormat::U16,
            IndexBuffer::U32(_) => IndexFormat::U32,
        }
    }

    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            IndexBuffer::U16(v) => v.get(i).map(|&x| u32::from(x)),
            IndexBuffer::U32(v) => v.get(i).copied(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Appends indices, widening the buffer first if any of them needs 32 bits.
    pub fn extend_from(&mut self, indices: &[u32]) {
        let needs_wide = indices.iter().any(|&i| i > u32::from(u16::MAX));
        if needs_wide {
            self.widen();
        }

        match self {
            IndexBuffer::U16(v) => v.extend(indices.iter().map(|&i| i as u16)),
            IndexBuffer::U32(v) => v.extend_from_slice(indices),
        }
    }

    fn widen(&mut self) {
        if let IndexBuffer::U16(v) = self {
            log::debug!("index buffer widened to 32 bits at {} indices", v.len());
            let wide = v.iter().map(|&i| u32::from(i)).collect();
            *self = IndexBuffer::U32(wide);
        }
    }

    /// Raw little-endian bytes in the current format.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexBuffer::U16(v) => bytemuck::cast_slice(v),
            IndexBuffer::U32(v) => bytemuck::cast_slice(v),
        }
    }

    /// Drops all indices and returns to 16-bit storage.
    pub fn clear(&mut self) {
        *self = IndexBuffer::default();
    }
}

use crate::error::FramebufferError;
use crate::target::{TargetCaps, TargetDesc, TargetKind};

use super::scope;

/// Combined depth + stencil attachment used by every target that has depth.
pub(super) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

pub(super) struct Attachment {
    pub(super) texture: wgpu::Texture,
    pub(super) view: wgpu::TextureView,
}

impl Attachment {
    fn new(
        device: &wgpu::Device,
        label: &str,
        desc: &TargetDesc,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: desc.extent.to_wgpu(),
            mip_level_count: 1,
            sample_count: desc.sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// Attachments of one render target. The screen has no color attachment of
/// its own; it draws into the acquired surface image.
pub struct WgpuTarget {
    pub(super) desc: TargetDesc,
    pub(super) color: Option<Attachment>,
    pub(super) depth: Option<Attachment>,
}

impl WgpuTarget {
    pub fn desc(&self) -> &TargetDesc {
        &self.desc
    }

    pub(super) fn destroy(self) {
        for attachment in self.color.into_iter().chain(self.depth) {
            attachment.texture.destroy();
        }
    }
}

pub(super) fn create(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    desc: &TargetDesc,
) -> Result<WgpuTarget, FramebufferError> {
    let (target, faults) = scope::capture(device, || {
        let color = match desc.kind {
            TargetKind::Screen => None,
            TargetKind::Offscreen => Some(Attachment::new(
                device,
                &format!("{} color", desc.label),
                desc,
                color_format,
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            )),
            TargetKind::OffscreenMultisample => Some(Attachment::new(
                device,
                &format!("{} color (msaa)", desc.label),
                desc,
                color_format,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            )),
        };
        let depth = desc.depth.then(|| {
            Attachment::new(
                device,
                &format!("{} depth", desc.label),
                desc,
                DEPTH_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            )
        });
        WgpuTarget {
            desc: *desc,
            color,
            depth,
        }
    });

    if !faults.is_empty() {
        target.destroy();
        return Err(FramebufferError::new(format!(
            "allocating `{}`: {}",
            desc.label,
            faults.join("; ")
        )));
    }
    Ok(target)
}

/// Limits and sample counts usable for both the surface color format and
/// [`DEPTH_FORMAT`].
pub(super) fn query_caps(
    adapter: &wgpu::Adapter,
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
) -> TargetCaps {
    let adapter_specific = device
        .features()
        .contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES);
    let color = adapter.get_texture_format_features(color_format).flags;
    let depth = adapter.get_texture_format_features(DEPTH_FORMAT).flags;

    let sample_counts = [1, 2, 4, 8, 16]
        .into_iter()
        .filter(|&n| {
            if n == 1 {
                return true;
            }
            // Without adapter-specific features the device only accepts 4x.
            (adapter_specific || n == 4)
                && color.sample_count_supported(n)
                && depth.sample_count_supported(n)
        })
        .collect();

    TargetCaps {
        max_dimension: device.limits().max_texture_dimension_2d,
        sample_counts,
    }
}

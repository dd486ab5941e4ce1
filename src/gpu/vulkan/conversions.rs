use ash::vk;
use crate::{
    BufferUsage, CompareOp, FilterMode, PixelFormat, SamplerDesc, TextureDimension, TextureUsage,
    WrapMode,
};

impl From<FilterMode> for vk::Filter {
    fn from(filter: FilterMode) -> Self {
        match filter {
            FilterMode::Nearest => vk::Filter::NEAREST,
            FilterMode::Linear => vk::Filter::LINEAR,
        }
    }
}

impl From<FilterMode> for vk::SamplerMipmapMode {
    fn from(filter: FilterMode) -> Self {
        match filter {
            FilterMode::Nearest => vk::SamplerMipmapMode::NEAREST,
            FilterMode::Linear => vk::SamplerMipmapMode::LINEAR,
        }
    }
}

impl From<WrapMode> for vk::SamplerAddressMode {
    fn from(mode: WrapMode) -> Self {
        match mode {
            WrapMode::Wrap => vk::SamplerAddressMode::REPEAT,
            WrapMode::Mirror => vk::SamplerAddressMode::MIRRORED_REPEAT,
            WrapMode::Clamp => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        }
    }
}

impl From<CompareOp> for vk::CompareOp {
    fn from(op: CompareOp) -> Self {
        match op {
            CompareOp::Never => vk::CompareOp::NEVER,
            CompareOp::Less => vk::CompareOp::LESS,
            CompareOp::Equal => vk::CompareOp::EQUAL,
            CompareOp::Lequal => vk::CompareOp::LESS_OR_EQUAL,
            CompareOp::Greater => vk::CompareOp::GREATER,
            CompareOp::Gequal => vk::CompareOp::GREATER_OR_EQUAL,
            CompareOp::Always => vk::CompareOp::ALWAYS,
        }
    }
}

impl From<TextureUsage> for vk::ImageUsageFlags {
    fn from(usage: TextureUsage) -> Self {
        let mut flags = vk::ImageUsageFlags::TRANSFER_DST
            | vk::ImageUsageFlags::TRANSFER_SRC
            | vk::ImageUsageFlags::SAMPLED;
        if usage.contains(TextureUsage::RENDER_TARGET) {
            flags |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
        }
        if usage.contains(TextureUsage::DEPTH_STENCIL) {
            flags |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT;
        }
        flags
    }
}

impl From<BufferUsage> for vk::BufferUsageFlags {
    fn from(usage: BufferUsage) -> Self {
        let base = vk::BufferUsageFlags::TRANSFER_DST | vk::BufferUsageFlags::TRANSFER_SRC;
        base | match usage {
            BufferUsage::Index => vk::BufferUsageFlags::INDEX_BUFFER,
            BufferUsage::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER,
            BufferUsage::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
            BufferUsage::Storage => vk::BufferUsageFlags::STORAGE_BUFFER,
            BufferUsage::Indirect => vk::BufferUsageFlags::INDIRECT_BUFFER,
        }
    }
}

pub(super) fn lib_to_vk_format(format: PixelFormat) -> vk::Format {
    match format {
        PixelFormat::Unknown => vk::Format::UNDEFINED,
        PixelFormat::R8_Unorm => vk::Format::R8_UNORM,
        PixelFormat::R16_Float => vk::Format::R16_SFLOAT,
        PixelFormat::R16_Uint => vk::Format::R16_UINT,
        PixelFormat::R32_Float => vk::Format::R32_SFLOAT,
        PixelFormat::R32_Uint => vk::Format::R32_UINT,
        PixelFormat::R8G8_Unorm => vk::Format::R8G8_UNORM,
        PixelFormat::R16G16_Float => vk::Format::R16G16_SFLOAT,
        PixelFormat::R32G32_Float => vk::Format::R32G32_SFLOAT,
        PixelFormat::R8G8B8_Unorm => vk::Format::R8G8B8_UNORM,
        PixelFormat::R32G32B32_Float => vk::Format::R32G32B32_SFLOAT,
        PixelFormat::R8G8B8A8_Unorm => vk::Format::R8G8B8A8_UNORM,
        PixelFormat::R8G8B8A8_Srgb => vk::Format::R8G8B8A8_SRGB,
        PixelFormat::B8G8R8A8_Unorm => vk::Format::B8G8R8A8_UNORM,
        PixelFormat::B8G8R8A8_Srgb => vk::Format::B8G8R8A8_SRGB,
        PixelFormat::R16G16B16A16_Float => vk::Format::R16G16B16A16_SFLOAT,
        PixelFormat::R16G16B16A16_Unorm => vk::Format::R16G16B16A16_UNORM,
        PixelFormat::R32G32B32A32_Float => vk::Format::R32G32B32A32_SFLOAT,
        PixelFormat::D24_Unorm_S8_Uint => vk::Format::D24_UNORM_S8_UINT,
        PixelFormat::D32_Float => vk::Format::D32_SFLOAT,
        PixelFormat::D32_Float_S8_Uint => vk::Format::D32_SFLOAT_S8_UINT,
    }
}

pub(super) fn aspect_mask(format: PixelFormat) -> vk::ImageAspectFlags {
    if format.has_stencil() {
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    } else if format.is_depth() {
        vk::ImageAspectFlags::DEPTH
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

/// How a texture dimension is expressed as a Vulkan image and its views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct ImageKind {
    pub image_type: vk::ImageType,
    pub view_type: vk::ImageViewType,
    pub flags: vk::ImageCreateFlags,
}

/// `cube_array` says whether the device enabled `imageCubeArray`; without it
/// multi-cube textures are viewed as plain 2D arrays.
pub(super) fn image_kind(dimension: TextureDimension, layers: u32, cube_array: bool) -> ImageKind {
    let (image_type, view_type, flags) = match dimension {
        TextureDimension::Texture1D if layers > 1 => (
            vk::ImageType::TYPE_1D,
            vk::ImageViewType::TYPE_1D_ARRAY,
            vk::ImageCreateFlags::empty(),
        ),
        TextureDimension::Texture1D => (
            vk::ImageType::TYPE_1D,
            vk::ImageViewType::TYPE_1D,
            vk::ImageCreateFlags::empty(),
        ),
        TextureDimension::Texture2D if layers > 1 => (
            vk::ImageType::TYPE_2D,
            vk::ImageViewType::TYPE_2D_ARRAY,
            vk::ImageCreateFlags::empty(),
        ),
        TextureDimension::Texture2D => (
            vk::ImageType::TYPE_2D,
            vk::ImageViewType::TYPE_2D,
            vk::ImageCreateFlags::empty(),
        ),
        TextureDimension::Texture3D => (
            vk::ImageType::TYPE_3D,
            vk::ImageViewType::TYPE_3D,
            vk::ImageCreateFlags::empty(),
        ),
        TextureDimension::TextureCube if layers > 6 && cube_array => (
            vk::ImageType::TYPE_2D,
            vk::ImageViewType::CUBE_ARRAY,
            vk::ImageCreateFlags::CUBE_COMPATIBLE,
        ),
        TextureDimension::TextureCube if layers > 6 => (
            vk::ImageType::TYPE_2D,
            vk::ImageViewType::TYPE_2D_ARRAY,
            vk::ImageCreateFlags::CUBE_COMPATIBLE,
        ),
        TextureDimension::TextureCube => (
            vk::ImageType::TYPE_2D,
            vk::ImageViewType::CUBE,
            vk::ImageCreateFlags::CUBE_COMPATIBLE,
        ),
    };
    ImageKind {
        image_type,
        view_type,
        flags,
    }
}

impl From<&SamplerDesc> for vk::SamplerCreateInfo {
    fn from(desc: &SamplerDesc) -> Self {
        let address: vk::SamplerAddressMode = desc.wrap.into();
        let compare = desc.compare != CompareOp::Never;
        vk::SamplerCreateInfo {
            mag_filter: desc.filter.into(),
            min_filter: desc.filter.into(),
            mipmap_mode: desc.filter.into(),
            address_mode_u: address,
            address_mode_v: address,
            address_mode_w: address,
            mip_lod_bias: desc.mip_lod_bias,
            compare_enable: if compare { vk::TRUE } else { vk::FALSE },
            compare_op: desc.compare.into(),
            min_lod: desc.min_lod,
            max_lod: desc.max_lod,
            border_color: vk::BorderColor::FLOAT_TRANSPARENT_BLACK,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_format_has_a_vulkan_format() {
        for format in PixelFormat::ALL {
            let vk_format = lib_to_vk_format(format);
            assert_eq!(vk_format == vk::Format::UNDEFINED, format == PixelFormat::Unknown);
        }
    }

    #[test]
    fn depth_aspects() {
        assert_eq!(aspect_mask(PixelFormat::R8G8B8A8_Unorm), vk::ImageAspectFlags::COLOR);
        assert_eq!(aspect_mask(PixelFormat::D32_Float), vk::ImageAspectFlags::DEPTH);
        assert_eq!(
            aspect_mask(PixelFormat::D24_Unorm_S8_Uint),
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        );
    }

    #[test]
    fn cube_textures_are_cube_compatible_2d_images() {
        let kind = image_kind(TextureDimension::TextureCube, 6, false);
        assert_eq!(kind.image_type, vk::ImageType::TYPE_2D);
        assert_eq!(kind.view_type, vk::ImageViewType::CUBE);
        assert!(kind.flags.contains(vk::ImageCreateFlags::CUBE_COMPATIBLE));
        assert_eq!(
            image_kind(TextureDimension::TextureCube, 12, true).view_type,
            vk::ImageViewType::CUBE_ARRAY
        );
    }

    #[test]
    fn cube_arrays_fall_back_without_the_feature() {
        let kind = image_kind(TextureDimension::TextureCube, 12, false);
        assert_eq!(kind.view_type, vk::ImageViewType::TYPE_2D_ARRAY);
        assert!(kind.flags.contains(vk::ImageCreateFlags::CUBE_COMPATIBLE));
        assert_eq!(
            image_kind(TextureDimension::TextureCube, 6, false).view_type,
            vk::ImageViewType::CUBE
        );
    }

    #[test]
    fn usage_flags() {
        let flags: vk::ImageUsageFlags = TextureUsage::RENDER_TARGET.into();
        assert!(flags.contains(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED));
        assert!(!flags.contains(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT));

        let flags: vk::BufferUsageFlags = BufferUsage::Uniform.into();
        assert!(flags.contains(vk::BufferUsageFlags::UNIFORM_BUFFER));
    }

    #[test]
    fn sampler_compares_only_when_asked() {
        let info: vk::SamplerCreateInfo = (&SamplerDesc::default()).into();
        assert_eq!(info.compare_enable, vk::FALSE);
        assert_eq!(info.max_lod, 64.0);

        let info: vk::SamplerCreateInfo = (&SamplerDesc {
            compare: CompareOp::Less,
            ..Default::default()
        })
            .into();
        assert_eq!(info.compare_enable, vk::TRUE);
        assert_eq!(info.compare_op, vk::CompareOp::LESS);
    }
}

use super::native::{
    self, ComparisonFunc, DxgiFormat, Filter, ResourceDimension, ResourceFlags,
    ShaderResourceViewDesc, SrvDimension, TextureAddressMode,
    DEFAULT_SHADER_4_COMPONENT_MAPPING,
};
use crate::assert_no_entry;
use crate::{
    CompareOp, FilterMode, PixelFormat, SamplerDesc, TextureDesc, TextureDimension, TextureUsage,
    TextureViewDesc, WrapMode,
};

pub fn to_native_format(format: PixelFormat) -> DxgiFormat {
    match format {
        PixelFormat::Unknown => DxgiFormat::UNKNOWN,
        PixelFormat::R8_Unorm => DxgiFormat::R8_UNORM,
        PixelFormat::R16_Float => DxgiFormat::R16_FLOAT,
        PixelFormat::R16_Uint => DxgiFormat::R16_UINT,
        PixelFormat::R32_Float => DxgiFormat::R32_FLOAT,
        PixelFormat::R32_Uint => DxgiFormat::R32_UINT,
        PixelFormat::R8G8_Unorm => DxgiFormat::R8G8_UNORM,
        PixelFormat::R16G16_Float => DxgiFormat::R16G16_FLOAT,
        PixelFormat::R32G32_Float => DxgiFormat::R32G32_FLOAT,
        // DXGI has no 24-bit RGB format.
        PixelFormat::R8G8B8_Unorm => assert_no_entry!(
            DxgiFormat::UNKNOWN,
            "{:?} has no DXGI equivalent",
            format
        ),
        PixelFormat::R32G32B32_Float => DxgiFormat::R32G32B32_FLOAT,
        PixelFormat::R8G8B8A8_Unorm => DxgiFormat::R8G8B8A8_UNORM,
        PixelFormat::R8G8B8A8_Srgb => DxgiFormat::R8G8B8A8_UNORM_SRGB,
        PixelFormat::B8G8R8A8_Unorm => DxgiFormat::B8G8R8A8_UNORM,
        PixelFormat::B8G8R8A8_Srgb => DxgiFormat::B8G8R8A8_UNORM_SRGB,
        PixelFormat::R16G16B16A16_Float => DxgiFormat::R16G16B16A16_FLOAT,
        PixelFormat::R16G16B16A16_Unorm => DxgiFormat::R16G16B16A16_UNORM,
        PixelFormat::R32G32B32A32_Float => DxgiFormat::R32G32B32A32_FLOAT,
        PixelFormat::D24_Unorm_S8_Uint => DxgiFormat::D24_UNORM_S8_UINT,
        PixelFormat::D32_Float => DxgiFormat::D32_FLOAT,
        PixelFormat::D32_Float_S8_Uint => DxgiFormat::D32_FLOAT_S8X24_UINT,
    }
}

/// Inverse of [`to_native_format`]; anything the backend never emits comes
/// back as `Unknown`.
pub fn from_native_format(format: DxgiFormat) -> PixelFormat {
    match format {
        DxgiFormat::R8_UNORM => PixelFormat::R8_Unorm,
        DxgiFormat::R16_FLOAT => PixelFormat::R16_Float,
        DxgiFormat::R16_UINT => PixelFormat::R16_Uint,
        DxgiFormat::R32_FLOAT => PixelFormat::R32_Float,
        DxgiFormat::R32_UINT => PixelFormat::R32_Uint,
        DxgiFormat::R8G8_UNORM => PixelFormat::R8G8_Unorm,
        DxgiFormat::R16G16_FLOAT => PixelFormat::R16G16_Float,
        DxgiFormat::R32G32_FLOAT => PixelFormat::R32G32_Float,
        DxgiFormat::R32G32B32_FLOAT => PixelFormat::R32G32B32_Float,
        DxgiFormat::R8G8B8A8_UNORM => PixelFormat::R8G8B8A8_Unorm,
        DxgiFormat::R8G8B8A8_UNORM_SRGB => PixelFormat::R8G8B8A8_Srgb,
        DxgiFormat::B8G8R8A8_UNORM => PixelFormat::B8G8R8A8_Unorm,
        DxgiFormat::B8G8R8A8_UNORM_SRGB => PixelFormat::B8G8R8A8_Srgb,
        DxgiFormat::R16G16B16A16_FLOAT => PixelFormat::R16G16B16A16_Float,
        DxgiFormat::R16G16B16A16_UNORM => PixelFormat::R16G16B16A16_Unorm,
        DxgiFormat::R32G32B32A32_FLOAT => PixelFormat::R32G32B32A32_Float,
        DxgiFormat::D24_UNORM_S8_UINT => PixelFormat::D24_Unorm_S8_Uint,
        DxgiFormat::D32_FLOAT => PixelFormat::D32_Float,
        DxgiFormat::D32_FLOAT_S8X24_UINT => PixelFormat::D32_Float_S8_Uint,
        _ => PixelFormat::Unknown,
    }
}

/// Whether the D3D12 backend can create resources in `format`.
pub fn is_format_supported(format: PixelFormat) -> bool {
    !matches!(format, PixelFormat::R8G8B8_Unorm)
}

impl From<TextureDimension> for ResourceDimension {
    fn from(dimension: TextureDimension) -> Self {
        match dimension {
            TextureDimension::Texture1D => ResourceDimension::Texture1D,
            TextureDimension::Texture2D => ResourceDimension::Texture2D,
            TextureDimension::Texture3D => ResourceDimension::Texture3D,
            // Cube maps are 2D arrays with six faces per cube.
            TextureDimension::TextureCube => ResourceDimension::Texture2D,
        }
    }
}

pub fn to_native_resource_dimension(dimension: TextureDimension) -> ResourceDimension {
    dimension.into()
}

impl From<TextureUsage> for ResourceFlags {
    fn from(usage: TextureUsage) -> Self {
        let mut flags = ResourceFlags::NONE;
        if usage.contains(TextureUsage::RENDER_TARGET) {
            flags |= ResourceFlags::ALLOW_RENDER_TARGET;
        }
        if usage.contains(TextureUsage::DEPTH_STENCIL) {
            flags |= ResourceFlags::ALLOW_DEPTH_STENCIL;
        }
        flags
    }
}

pub fn to_native_resource_flags(usage: TextureUsage) -> ResourceFlags {
    usage.into()
}

impl From<CompareOp> for ComparisonFunc {
    fn from(op: CompareOp) -> Self {
        match op {
            CompareOp::Never => ComparisonFunc::Never,
            CompareOp::Less => ComparisonFunc::Less,
            CompareOp::Equal => ComparisonFunc::Equal,
            CompareOp::Lequal => ComparisonFunc::LessEqual,
            CompareOp::Greater => ComparisonFunc::Greater,
            CompareOp::Gequal => ComparisonFunc::GreaterEqual,
            CompareOp::Always => ComparisonFunc::Always,
        }
    }
}

pub fn to_native_comparison_func(op: CompareOp) -> ComparisonFunc {
    op.into()
}

impl From<WrapMode> for TextureAddressMode {
    fn from(mode: WrapMode) -> Self {
        match mode {
            WrapMode::Wrap => TextureAddressMode::Wrap,
            WrapMode::Mirror => TextureAddressMode::Mirror,
            WrapMode::Clamp => TextureAddressMode::Clamp,
        }
    }
}

/// `Never` means the sampler does not compare at all.
pub fn to_native_sampler_desc(desc: &SamplerDesc) -> native::SamplerDesc {
    let comparing = desc.compare != CompareOp::Never;
    let filter = match (desc.filter, comparing) {
        (FilterMode::Nearest, false) => Filter::MinMagMipPoint,
        (FilterMode::Linear, false) => Filter::MinMagMipLinear,
        (FilterMode::Nearest, true) => Filter::ComparisonMinMagMipPoint,
        (FilterMode::Linear, true) => Filter::ComparisonMinMagMipLinear,
    };
    let address = desc.wrap.into();

    native::SamplerDesc {
        filter,
        address_u: address,
        address_v: address,
        address_w: address,
        mip_lod_bias: desc.mip_lod_bias,
        max_anisotropy: 1,
        comparison_func: desc.compare.into(),
        border_color: [0.0; 4],
        min_lod: desc.min_lod,
        max_lod: desc.max_lod,
    }
}

/// Builds the SRV description for a view over a texture created from
/// `texture`.
pub fn to_native_srv_desc(view: &TextureViewDesc, texture: &TextureDesc) -> ShaderResourceViewDesc {
    let format = if view.format == PixelFormat::Unknown {
        texture.format
    } else {
        view.format
    };

    let layers = texture.depth_or_array_size.max(1) as u32;
    let (view_dimension, array_size) = match texture.dimension {
        TextureDimension::Texture1D if layers > 1 => (SrvDimension::Texture1DArray, layers),
        TextureDimension::Texture1D => (SrvDimension::Texture1D, 1),
        TextureDimension::Texture2D if layers > 1 => (SrvDimension::Texture2DArray, layers),
        TextureDimension::Texture2D => (SrvDimension::Texture2D, 1),
        TextureDimension::Texture3D => (SrvDimension::Texture3D, 1),
        TextureDimension::TextureCube if layers > 6 => (SrvDimension::TextureCubeArray, layers / 6),
        TextureDimension::TextureCube => (SrvDimension::TextureCube, 1),
    };

    let mip_levels = view.mip_levels.clamp(1, texture.mip_levels.max(1)) as u32;

    ShaderResourceViewDesc {
        format: to_native_format(format).shader_readable(),
        view_dimension,
        shader_4_component_mapping: DEFAULT_SHADER_4_COMPONENT_MAPPING,
        most_detailed_mip: 0,
        mip_levels,
        first_array_slice: 0,
        array_size,
        resource_min_lod_clamp: 0.0,
    }
}

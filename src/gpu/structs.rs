use crate::utils::Handle;
use crate::{Result, RhiError};
use bitflags::bitflags;

#[cfg(feature = "slate-serde")]
use serde::{Deserialize, Serialize};

/// Tag type for buffer handles.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Buffer;

/// Tag type for texture handles.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Texture;

#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "slate-serde", derive(Serialize, Deserialize))]
#[allow(non_camel_case_types)]
pub enum PixelFormat {
    #[default]
    Unknown,

    R8_Unorm,
    R16_Float,
    R16_Uint,
    R32_Float,
    R32_Uint,
    R8G8_Unorm,
    R16G16_Float,
    R32G32_Float,
    R8G8B8_Unorm,
    R32G32B32_Float,
    R8G8B8A8_Unorm,
    R8G8B8A8_Srgb,
    B8G8R8A8_Unorm,
    B8G8R8A8_Srgb,
    R16G16B16A16_Float,
    R16G16B16A16_Unorm,
    R32G32B32A32_Float,

    D24_Unorm_S8_Uint,
    D32_Float,
    D32_Float_S8_Uint,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 21] = [
        PixelFormat::Unknown,
        PixelFormat::R8_Unorm,
        PixelFormat::R16_Float,
        PixelFormat::R16_Uint,
        PixelFormat::R32_Float,
        PixelFormat::R32_Uint,
        PixelFormat::R8G8_Unorm,
        PixelFormat::R16G16_Float,
        PixelFormat::R32G32_Float,
        PixelFormat::R8G8B8_Unorm,
        PixelFormat::R32G32B32_Float,
        PixelFormat::R8G8B8A8_Unorm,
        PixelFormat::R8G8B8A8_Srgb,
        PixelFormat::B8G8R8A8_Unorm,
        PixelFormat::B8G8R8A8_Srgb,
        PixelFormat::R16G16B16A16_Float,
        PixelFormat::R16G16B16A16_Unorm,
        PixelFormat::R32G32B32A32_Float,
        PixelFormat::D24_Unorm_S8_Uint,
        PixelFormat::D32_Float,
        PixelFormat::D32_Float_S8_Uint,
    ];

    pub fn is_depth(self) -> bool {
        matches!(
            self,
            PixelFormat::D24_Unorm_S8_Uint | PixelFormat::D32_Float | PixelFormat::D32_Float_S8_Uint
        )
    }

    pub fn has_stencil(self) -> bool {
        matches!(
            self,
            PixelFormat::D24_Unorm_S8_Uint | PixelFormat::D32_Float_S8_Uint
        )
    }

    pub fn is_srgb(self) -> bool {
        matches!(self, PixelFormat::R8G8B8A8_Srgb | PixelFormat::B8G8R8A8_Srgb)
    }
}

#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "slate-serde", derive(Serialize, Deserialize))]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "slate-serde", derive(Serialize, Deserialize))]
pub enum CompareOp {
    #[default]
    Never,
    Less,
    Equal,
    Lequal,
    Greater,
    Gequal,
    Always,
}

#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "slate-serde", derive(Serialize, Deserialize))]
pub enum WrapMode {
    #[default]
    Wrap,
    Mirror,
    Clamp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "slate-serde", derive(Serialize, Deserialize))]
pub struct SamplerDesc {
    pub compare: CompareOp,
    pub mip_lod_bias: f32,
    pub min_lod: f32,
    pub max_lod: f32,
    pub filter: FilterMode,
    pub wrap: WrapMode,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            compare: CompareOp::Never,
            mip_lod_bias: 0.0,
            min_lod: 0.0,
            max_lod: 64.0,
            filter: FilterMode::Linear,
            wrap: WrapMode::Wrap,
        }
    }
}

#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "slate-serde", derive(Serialize, Deserialize))]
pub enum TextureDimension {
    Texture1D,
    #[default]
    Texture2D,
    Texture3D,
    TextureCube,
}

bitflags! {
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "slate-serde", derive(Serialize, Deserialize))]
    pub struct TextureUsage: u8 {
        const NONE          = 0;
        const DEPTH_STENCIL = 0b0000_0001;
        const RENDER_TARGET = 0b0000_0010;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "slate-serde", derive(Serialize, Deserialize))]
pub struct TextureDesc {
    pub dimension: TextureDimension,
    pub width: u32,
    pub height: u32,
    /// Depth for 3D textures, layer count otherwise.
    pub depth_or_array_size: u16,
    pub mip_levels: u16,
    pub format: PixelFormat,
    pub usage: TextureUsage,
    pub debug_name: Option<String>,
}

impl Default for TextureDesc {
    fn default() -> Self {
        Self {
            dimension: TextureDimension::Texture2D,
            width: 1,
            height: 1,
            depth_or_array_size: 1,
            mip_levels: 1,
            format: PixelFormat::R8G8B8A8_Srgb,
            usage: TextureUsage::NONE,
            debug_name: None,
        }
    }
}

impl TextureDesc {
    /// Rejects descriptions no backend can create.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RhiError::InvalidDescriptor("texture extent must be non-zero"));
        }
        if self.depth_or_array_size == 0 {
            return Err(RhiError::InvalidDescriptor(
                "texture depth_or_array_size must be non-zero",
            ));
        }
        if self.mip_levels == 0 {
            return Err(RhiError::InvalidDescriptor("texture mip_levels must be non-zero"));
        }
        if self.dimension == TextureDimension::Texture1D && self.height != 1 {
            return Err(RhiError::InvalidDescriptor("1D textures have a height of 1"));
        }
        if self.dimension == TextureDimension::TextureCube && self.depth_or_array_size % 6 != 0 {
            return Err(RhiError::InvalidDescriptor(
                "cube textures need a multiple of six layers",
            ));
        }
        if self
            .usage
            .contains(TextureUsage::DEPTH_STENCIL | TextureUsage::RENDER_TARGET)
        {
            return Err(RhiError::InvalidDescriptor(
                "a texture is either a render target or a depth-stencil target",
            ));
        }
        if self.usage.contains(TextureUsage::DEPTH_STENCIL) && !self.format.is_depth() {
            return Err(RhiError::InvalidDescriptor(
                "depth-stencil usage needs a depth format",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "slate-serde", derive(Serialize, Deserialize))]
pub struct TextureViewDesc {
    /// `Unknown` reuses the texture's own format.
    pub format: PixelFormat,
    pub mip_levels: u16,
    #[cfg_attr(feature = "slate-serde", serde(skip))]
    pub texture: Handle<Texture>,
    pub sampler_desc: SamplerDesc,
}

#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "slate-serde", derive(Serialize, Deserialize))]
pub enum BufferUsage {
    Index,
    Vertex,
    #[default]
    Uniform,
    Storage,
    Indirect,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "slate-serde", derive(Serialize, Deserialize))]
pub struct BufferDesc {
    pub byte_size: u32,
    pub usage: BufferUsage,
    pub debug_name: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "slate-serde", derive(Serialize, Deserialize))]
pub struct DeviceDesc {
    /// Ask for the native validation layer. Best effort.
    pub enable_debug: bool,
    /// Ask for GPU-based validation on top of the debug layer.
    pub gpu_based_validation: bool,
    /// Shader resource view descriptors reserved for texture views.
    pub srv_heap_capacity: u32,
}

impl Default for DeviceDesc {
    fn default() -> Self {
        Self {
            enable_debug: false,
            gpu_based_validation: false,
            srv_heap_capacity: 4096,
        }
    }
}

impl DeviceDesc {
    /// Applies the `SLATE_VALIDATION=1` environment override.
    pub fn with_env_overrides(mut self) -> Self {
        let validation = std::env::var("SLATE_VALIDATION")
            .map(|v| v == "1")
            .unwrap_or(false);
        if validation {
            self.enable_debug = true;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_texture_is_valid() {
        assert!(TextureDesc::default().validate().is_ok());
    }

    #[test]
    fn shape_rules() {
        let one_d = TextureDesc {
            dimension: TextureDimension::Texture1D,
            height: 4,
            ..Default::default()
        };
        assert!(matches!(one_d.validate(), Err(RhiError::InvalidDescriptor(_))));

        let cube_array = TextureDesc {
            dimension: TextureDimension::TextureCube,
            depth_or_array_size: 12,
            ..Default::default()
        };
        assert!(cube_array.validate().is_ok());

        let depth = TextureDesc {
            usage: TextureUsage::DEPTH_STENCIL,
            format: PixelFormat::D24_Unorm_S8_Uint,
            ..Default::default()
        };
        assert!(depth.validate().is_ok());

        let both = TextureDesc {
            usage: TextureUsage::DEPTH_STENCIL | TextureUsage::RENDER_TARGET,
            ..depth
        };
        assert!(matches!(both.validate(), Err(RhiError::InvalidDescriptor(_))));
    }

    #[test]
    fn format_classes() {
        assert!(PixelFormat::D24_Unorm_S8_Uint.is_depth());
        assert!(!PixelFormat::R32_Float.is_depth());
        assert!(PixelFormat::B8G8R8A8_Srgb.is_srgb());
        assert!(!PixelFormat::R8G8B8A8_Unorm.is_srgb());
    }
}

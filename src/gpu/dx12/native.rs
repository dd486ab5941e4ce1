//! D3D12 and DXGI structures as the backend hands them to a driver.
//!
//! Numeric values match the Windows SDK so a driver can pass them straight
//! through to the real API.

use bitflags::bitflags;
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HResult(pub i32);

impl HResult {
    pub const S_OK: HResult = HResult(0);
    pub const E_FAIL: HResult = HResult(0x8000_4005_u32 as i32);
    pub const E_INVALIDARG: HResult = HResult(0x8007_0057_u32 as i32);
    pub const E_OUTOFMEMORY: HResult = HResult(0x8007_000E_u32 as i32);
    pub const E_NOINTERFACE: HResult = HResult(0x8000_4002_u32 as i32);
    pub const DXGI_ERROR_UNSUPPORTED: HResult = HResult(0x887A_0004_u32 as i32);
    pub const DXGI_ERROR_NOT_FOUND: HResult = HResult(0x887A_0002_u32 as i32);

    pub fn is_ok(self) -> bool {
        self.0 >= 0
    }

    pub fn is_err(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for HResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HRESULT 0x{:08X}", self.0 as u32)
    }
}

impl fmt::Debug for HResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// `DXGI_FORMAT`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct DxgiFormat(pub u32);

impl DxgiFormat {
    pub const UNKNOWN: DxgiFormat = DxgiFormat(0);
    pub const R32G32B32A32_FLOAT: DxgiFormat = DxgiFormat(2);
    pub const R32G32B32_FLOAT: DxgiFormat = DxgiFormat(6);
    pub const R16G16B16A16_FLOAT: DxgiFormat = DxgiFormat(10);
    pub const R16G16B16A16_UNORM: DxgiFormat = DxgiFormat(11);
    pub const R32G32_FLOAT: DxgiFormat = DxgiFormat(16);
    pub const R32G8X24_TYPELESS: DxgiFormat = DxgiFormat(19);
    pub const D32_FLOAT_S8X24_UINT: DxgiFormat = DxgiFormat(20);
    pub const R32_FLOAT_X8X24_TYPELESS: DxgiFormat = DxgiFormat(21);
    pub const R8G8B8A8_UNORM: DxgiFormat = DxgiFormat(28);
    pub const R8G8B8A8_UNORM_SRGB: DxgiFormat = DxgiFormat(29);
    pub const R16G16_FLOAT: DxgiFormat = DxgiFormat(34);
    pub const R32_TYPELESS: DxgiFormat = DxgiFormat(39);
    pub const D32_FLOAT: DxgiFormat = DxgiFormat(40);
    pub const R32_FLOAT: DxgiFormat = DxgiFormat(41);
    pub const R32_UINT: DxgiFormat = DxgiFormat(42);
    pub const R24G8_TYPELESS: DxgiFormat = DxgiFormat(44);
    pub const D24_UNORM_S8_UINT: DxgiFormat = DxgiFormat(45);
    pub const R24_UNORM_X8_TYPELESS: DxgiFormat = DxgiFormat(46);
    pub const R8G8_UNORM: DxgiFormat = DxgiFormat(49);
    pub const R16_FLOAT: DxgiFormat = DxgiFormat(54);
    pub const R16_UINT: DxgiFormat = DxgiFormat(57);
    pub const R8_UNORM: DxgiFormat = DxgiFormat(61);
    pub const B8G8R8A8_UNORM: DxgiFormat = DxgiFormat(87);
    pub const B8G8R8A8_UNORM_SRGB: DxgiFormat = DxgiFormat(91);

    pub fn is_depth(self) -> bool {
        matches!(
            self,
            DxgiFormat::D24_UNORM_S8_UINT | DxgiFormat::D32_FLOAT | DxgiFormat::D32_FLOAT_S8X24_UINT
        )
    }

    /// Depth formats and the typeless formats depth resources are created with.
    pub fn is_depth_family(self) -> bool {
        self.is_depth()
            || matches!(
                self,
                DxgiFormat::R24G8_TYPELESS | DxgiFormat::R32_TYPELESS | DxgiFormat::R32G8X24_TYPELESS
            )
    }

    /// Format depth resources are created with, so one resource can back
    /// both a depth-stencil view and a shader resource view. Other formats
    /// come back unchanged.
    pub fn typeless(self) -> DxgiFormat {
        match self {
            DxgiFormat::D24_UNORM_S8_UINT => DxgiFormat::R24G8_TYPELESS,
            DxgiFormat::D32_FLOAT => DxgiFormat::R32_TYPELESS,
            DxgiFormat::D32_FLOAT_S8X24_UINT => DxgiFormat::R32G8X24_TYPELESS,
            other => other,
        }
    }

    /// Format a shader resource view reads a depth resource through.
    pub fn shader_readable(self) -> DxgiFormat {
        match self {
            DxgiFormat::D24_UNORM_S8_UINT | DxgiFormat::R24G8_TYPELESS => {
                DxgiFormat::R24_UNORM_X8_TYPELESS
            }
            DxgiFormat::D32_FLOAT | DxgiFormat::R32_TYPELESS => DxgiFormat::R32_FLOAT,
            DxgiFormat::D32_FLOAT_S8X24_UINT | DxgiFormat::R32G8X24_TYPELESS => {
                DxgiFormat::R32_FLOAT_X8X24_TYPELESS
            }
            other => other,
        }
    }

    /// Bytes per texel, `None` for formats the backend never creates.
    pub fn texel_size(self) -> Option<u32> {
        let size = match self {
            DxgiFormat::R8_UNORM => 1,
            DxgiFormat::R16_FLOAT | DxgiFormat::R16_UINT | DxgiFormat::R8G8_UNORM => 2,
            DxgiFormat::R32_FLOAT
            | DxgiFormat::R32_UINT
            | DxgiFormat::R16G16_FLOAT
            | DxgiFormat::R8G8B8A8_UNORM
            | DxgiFormat::R8G8B8A8_UNORM_SRGB
            | DxgiFormat::B8G8R8A8_UNORM
            | DxgiFormat::B8G8R8A8_UNORM_SRGB
            | DxgiFormat::D24_UNORM_S8_UINT
            | DxgiFormat::R24G8_TYPELESS
            | DxgiFormat::R24_UNORM_X8_TYPELESS
            | DxgiFormat::D32_FLOAT
            | DxgiFormat::R32_TYPELESS => 4,
            DxgiFormat::R32G32_FLOAT
            | DxgiFormat::R16G16B16A16_FLOAT
            | DxgiFormat::R16G16B16A16_UNORM
            | DxgiFormat::D32_FLOAT_S8X24_UINT
            | DxgiFormat::R32G8X24_TYPELESS
            | DxgiFormat::R32_FLOAT_X8X24_TYPELESS => 8,
            DxgiFormat::R32G32B32_FLOAT => 12,
            DxgiFormat::R32G32B32A32_FLOAT => 16,
            _ => return None,
        };
        Some(size)
    }
}

/// `D3D12_RESOURCE_DIMENSION`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(i32)]
pub enum ResourceDimension {
    #[default]
    Unknown = 0,
    Buffer = 1,
    Texture1D = 2,
    Texture2D = 3,
    Texture3D = 4,
}

/// `D3D12_TEXTURE_LAYOUT`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(i32)]
pub enum TextureLayout {
    #[default]
    Unknown = 0,
    RowMajor = 1,
}

bitflags! {
    /// `D3D12_RESOURCE_FLAGS`.
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResourceFlags: i32 {
        const NONE                      = 0;
        const ALLOW_RENDER_TARGET       = 0x1;
        const ALLOW_DEPTH_STENCIL       = 0x2;
        const ALLOW_UNORDERED_ACCESS    = 0x4;
        const DENY_SHADER_RESOURCE      = 0x8;
    }
}

bitflags! {
    /// `D3D12_RESOURCE_STATES`.
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResourceStates: i32 {
        const COMMON    = 0;
        const COPY_DEST = 0x400;
    }
}

/// `D3D12_HEAP_TYPE`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(i32)]
pub enum HeapType {
    #[default]
    Default = 1,
    Upload = 2,
    Readback = 3,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SampleDesc {
    pub count: u32,
    pub quality: u32,
}

impl Default for SampleDesc {
    fn default() -> Self {
        Self {
            count: 1,
            quality: 0,
        }
    }
}

/// `D3D12_RESOURCE_DESC`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct ResourceDesc {
    pub dimension: ResourceDimension,
    pub alignment: u64,
    pub width: u64,
    pub height: u32,
    pub depth_or_array_size: u16,
    pub mip_levels: u16,
    pub format: DxgiFormat,
    pub sample_desc: SampleDesc,
    pub layout: TextureLayout,
    pub flags: ResourceFlags,
}

/// `D3D12_CLEAR_VALUE`; the union is split into its two arms.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ClearValue {
    Color { format: DxgiFormat, color: [f32; 4] },
    DepthStencil { format: DxgiFormat, depth: f32, stencil: u8 },
}

impl ClearValue {
    pub fn format(&self) -> DxgiFormat {
        match *self {
            ClearValue::Color { format, .. } | ClearValue::DepthStencil { format, .. } => format,
        }
    }
}

/// `D3D12MA::ALLOCATION_DESC`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct AllocationDesc {
    pub heap_type: HeapType,
}

/// `D3D12_SRV_DIMENSION`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(i32)]
pub enum SrvDimension {
    #[default]
    Unknown = 0,
    Buffer = 1,
    Texture1D = 2,
    Texture1DArray = 3,
    Texture2D = 4,
    Texture2DArray = 5,
    Texture3D = 8,
    TextureCube = 9,
    TextureCubeArray = 10,
}

pub const DEFAULT_SHADER_4_COMPONENT_MAPPING: u32 = 0x1688;

/// `D3D12_SHADER_RESOURCE_VIEW_DESC` for the texture cases the backend emits.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ShaderResourceViewDesc {
    pub format: DxgiFormat,
    pub view_dimension: SrvDimension,
    pub shader_4_component_mapping: u32,
    pub most_detailed_mip: u32,
    pub mip_levels: u32,
    pub first_array_slice: u32,
    pub array_size: u32,
    pub resource_min_lod_clamp: f32,
}

/// `D3D12_FILTER` subset: point or linear on every axis, optionally comparing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(i32)]
pub enum Filter {
    MinMagMipPoint = 0,
    MinMagMipLinear = 0x15,
    ComparisonMinMagMipPoint = 0x80,
    ComparisonMinMagMipLinear = 0x95,
}

/// `D3D12_TEXTURE_ADDRESS_MODE`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(i32)]
pub enum TextureAddressMode {
    Wrap = 1,
    Mirror = 2,
    Clamp = 3,
}

/// `D3D12_COMPARISON_FUNC`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(i32)]
pub enum ComparisonFunc {
    Never = 1,
    Less = 2,
    Equal = 3,
    LessEqual = 4,
    Greater = 5,
    NotEqual = 6,
    GreaterEqual = 7,
    Always = 8,
}

/// `D3D12_SAMPLER_DESC`.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SamplerDesc {
    pub filter: Filter,
    pub address_u: TextureAddressMode,
    pub address_v: TextureAddressMode,
    pub address_w: TextureAddressMode,
    pub mip_lod_bias: f32,
    pub max_anisotropy: u32,
    pub comparison_func: ComparisonFunc,
    pub border_color: [f32; 4],
    pub min_lod: f32,
    pub max_lod: f32,
}

/// `D3D12_CPU_DESCRIPTOR_HANDLE`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct CpuDescriptorHandle {
    pub ptr: usize,
}

impl CpuDescriptorHandle {
    pub fn offset(self, index: u32, increment: u32) -> Self {
        Self {
            ptr: self.ptr + index as usize * increment as usize,
        }
    }
}

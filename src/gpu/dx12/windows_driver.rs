use super::driver::{DescriptorHeapInfo, Dx12Context, Dx12Driver};
use super::native::{
    AllocationDesc, ClearValue, CpuDescriptorHandle, HResult, ResourceDesc, ResourceStates,
    ShaderResourceViewDesc, SrvDimension,
};
use crate::utils::{RefCountPtr, RefCounted};
use std::cell::RefCell;
use std::ffi::c_void;
use std::mem::ManuallyDrop;
use std::ptr::NonNull;
use windows::core::{ComInterface, IUnknown_Vtbl, Interface, HSTRING};
use windows::Win32::Foundation::BOOL;
use windows::Win32::Graphics::Direct3D::D3D_FEATURE_LEVEL_11_0;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT, DXGI_SAMPLE_DESC};
use windows::Win32::Graphics::Dxgi::{
    CreateDXGIFactory2, IDXGIAdapter1, IDXGIFactory4, DXGI_ADAPTER_FLAG_SOFTWARE,
    DXGI_CREATE_FACTORY_DEBUG,
};

fn hresult(err: windows::core::Error) -> HResult {
    HResult(err.code().0)
}

/// Any COM object, addressed through its `IUnknown` vtable.
#[repr(C)]
pub struct ComObject {
    vtable: *const IUnknown_Vtbl,
}

impl ComObject {
    fn as_raw(&self) -> *mut c_void {
        self as *const Self as *mut c_void
    }

    /// Borrows the object as the resource it was created as, without
    /// touching its reference count.
    fn with_resource<R>(&self, f: impl FnOnce(&ID3D12Resource) -> R) -> R {
        // SAFETY: only ever constructed from an `ID3D12Resource` pointer, and
        // `ManuallyDrop` keeps the borrowed reference from being released.
        let resource = ManuallyDrop::new(unsafe { ID3D12Resource::from_raw(self.as_raw()) });
        f(&resource)
    }
}

unsafe impl RefCounted for ComObject {
    fn add_ref(&self) -> u32 {
        unsafe { ((*self.vtable).AddRef)(self.as_raw()) }
    }

    unsafe fn release(this: NonNull<Self>) -> u32 {
        let vtable = this.as_ref().vtable;
        ((*vtable).Release)(this.as_ptr() as *mut c_void)
    }
}

/// Committed resources own their memory, so the allocation only records it.
#[derive(Debug, Clone, Copy)]
pub struct CommittedAllocation {
    pub size: u64,
}

#[derive(Default)]
pub struct WindowsDriver {
    debug: RefCell<Option<ID3D12Debug>>,
}

impl WindowsDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Dx12Driver for WindowsDriver {
    type Context = WindowsContext;

    fn enable_debug_layer(&self) -> Result<(), HResult> {
        let mut debug: Option<ID3D12Debug> = None;
        unsafe { D3D12GetDebugInterface(&mut debug) }.map_err(hresult)?;
        let debug = debug.ok_or(HResult::E_NOINTERFACE)?;
        unsafe { debug.EnableDebugLayer() };
        *self.debug.borrow_mut() = Some(debug);
        Ok(())
    }

    fn enable_gpu_based_validation(&self) -> Result<(), HResult> {
        let debug = self.debug.borrow();
        let debug = debug.as_ref().ok_or(HResult::E_FAIL)?;
        let debug1: ID3D12Debug1 = debug.cast().map_err(hresult)?;
        unsafe { debug1.SetEnableGPUBasedValidation(BOOL::from(true)) };
        Ok(())
    }

    fn create_context(&self, debug: bool) -> Result<WindowsContext, HResult> {
        let flags = if debug { DXGI_CREATE_FACTORY_DEBUG } else { 0 };
        let factory: IDXGIFactory4 = unsafe { CreateDXGIFactory2(flags) }.map_err(hresult)?;

        for index in 0.. {
            let Ok(adapter) = (unsafe { factory.EnumAdapters1(index) }) else {
                break;
            };
            let desc = unsafe { adapter.GetDesc1() }.map_err(hresult)?;
            if desc.Flags & DXGI_ADAPTER_FLAG_SOFTWARE.0 as u32 != 0 {
                continue;
            }

            let mut device: Option<ID3D12Device> = None;
            if unsafe { D3D12CreateDevice(&adapter, D3D_FEATURE_LEVEL_11_0, &mut device) }.is_err() {
                continue;
            }
            let Some(device) = device else { continue };

            let len = desc
                .Description
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(desc.Description.len());
            return Ok(WindowsContext {
                adapter_name: String::from_utf16_lossy(&desc.Description[..len]),
                device,
                _adapter: adapter,
                _factory: factory,
            });
        }

        Err(HResult::DXGI_ERROR_NOT_FOUND)
    }
}

pub struct WindowsContext {
    device: ID3D12Device,
    _adapter: IDXGIAdapter1,
    _factory: IDXGIFactory4,
    adapter_name: String,
}

impl WindowsContext {
    pub fn device(&self) -> &ID3D12Device {
        &self.device
    }
}

fn resource_desc(desc: &ResourceDesc) -> D3D12_RESOURCE_DESC {
    D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION(desc.dimension as _),
        Alignment: desc.alignment,
        Width: desc.width,
        Height: desc.height,
        DepthOrArraySize: desc.depth_or_array_size,
        MipLevels: desc.mip_levels,
        Format: DXGI_FORMAT(desc.format.0 as _),
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: desc.sample_desc.count,
            Quality: desc.sample_desc.quality,
        },
        Layout: D3D12_TEXTURE_LAYOUT(desc.layout as _),
        Flags: D3D12_RESOURCE_FLAGS(desc.flags.bits() as _),
    }
}

fn clear_value(value: &ClearValue) -> D3D12_CLEAR_VALUE {
    match *value {
        ClearValue::Color { format, color } => D3D12_CLEAR_VALUE {
            Format: DXGI_FORMAT(format.0 as _),
            Anonymous: D3D12_CLEAR_VALUE_0 { Color: color },
        },
        ClearValue::DepthStencil {
            format,
            depth,
            stencil,
        } => D3D12_CLEAR_VALUE {
            Format: DXGI_FORMAT(format.0 as _),
            Anonymous: D3D12_CLEAR_VALUE_0 {
                DepthStencil: D3D12_DEPTH_STENCIL_VALUE {
                    Depth: depth,
                    Stencil: stencil,
                },
            },
        },
    }
}

fn srv_desc(desc: &ShaderResourceViewDesc) -> D3D12_SHADER_RESOURCE_VIEW_DESC {
    let (most_detailed, mips, clamp) = (
        desc.most_detailed_mip,
        desc.mip_levels,
        desc.resource_min_lod_clamp,
    );
    let anonymous = match desc.view_dimension {
        SrvDimension::Texture1D => D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
            Texture1D: D3D12_TEX1D_SRV {
                MostDetailedMip: most_detailed,
                MipLevels: mips,
                ResourceMinLODClamp: clamp,
            },
        },
        SrvDimension::Texture1DArray => D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
            Texture1DArray: D3D12_TEX1D_ARRAY_SRV {
                MostDetailedMip: most_detailed,
                MipLevels: mips,
                FirstArraySlice: desc.first_array_slice,
                ArraySize: desc.array_size,
                ResourceMinLODClamp: clamp,
            },
        },
        SrvDimension::Texture2DArray => D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
            Texture2DArray: D3D12_TEX2D_ARRAY_SRV {
                MostDetailedMip: most_detailed,
                MipLevels: mips,
                FirstArraySlice: desc.first_array_slice,
                ArraySize: desc.array_size,
                PlaneSlice: 0,
                ResourceMinLODClamp: clamp,
            },
        },
        SrvDimension::Texture3D => D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
            Texture3D: D3D12_TEX3D_SRV {
                MostDetailedMip: most_detailed,
                MipLevels: mips,
                ResourceMinLODClamp: clamp,
            },
        },
        SrvDimension::TextureCube => D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
            TextureCube: D3D12_TEXCUBE_SRV {
                MostDetailedMip: most_detailed,
                MipLevels: mips,
                ResourceMinLODClamp: clamp,
            },
        },
        SrvDimension::TextureCubeArray => D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
            TextureCubeArray: D3D12_TEXCUBE_ARRAY_SRV {
                MostDetailedMip: most_detailed,
                MipLevels: mips,
                First2DArrayFace: desc.first_array_slice,
                NumCubes: desc.array_size,
                ResourceMinLODClamp: clamp,
            },
        },
        SrvDimension::Texture2D | SrvDimension::Buffer | SrvDimension::Unknown => {
            D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
                Texture2D: D3D12_TEX2D_SRV {
                    MostDetailedMip: most_detailed,
                    MipLevels: mips,
                    PlaneSlice: 0,
                    ResourceMinLODClamp: clamp,
                },
            }
        }
    };

    D3D12_SHADER_RESOURCE_VIEW_DESC {
        Format: DXGI_FORMAT(desc.format.0 as _),
        ViewDimension: D3D12_SRV_DIMENSION(desc.view_dimension as _),
        Shader4ComponentMapping: desc.shader_4_component_mapping,
        Anonymous: anonymous,
    }
}

impl Dx12Context for WindowsContext {
    type Resource = ComObject;
    type Allocation = CommittedAllocation;
    type DescriptorHeap = ID3D12DescriptorHeap;

    fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    fn create_resource(
        &self,
        allocation: &AllocationDesc,
        desc: &ResourceDesc,
        initial_state: ResourceStates,
        clear: Option<&ClearValue>,
    ) -> Result<(CommittedAllocation, RefCountPtr<ComObject>), HResult> {
        let heap = D3D12_HEAP_PROPERTIES {
            Type: D3D12_HEAP_TYPE(allocation.heap_type as _),
            ..Default::default()
        };
        let native = resource_desc(desc);
        let clear = clear.map(clear_value);

        let mut resource: Option<ID3D12Resource> = None;
        unsafe {
            self.device.CreateCommittedResource(
                &heap,
                D3D12_HEAP_FLAG_NONE,
                &native,
                D3D12_RESOURCE_STATES(initial_state.bits() as _),
                clear.as_ref().map(|c| c as *const D3D12_CLEAR_VALUE),
                &mut resource,
            )
        }
        .map_err(hresult)?;
        let resource = resource.ok_or(HResult::E_FAIL)?;

        let info = unsafe { self.device.GetResourceAllocationInfo(0, &[native]) };
        // SAFETY: `into_raw` hands over the reference created above.
        let ptr = unsafe { RefCountPtr::from_raw(resource.into_raw() as *mut ComObject, false) };
        Ok((
            CommittedAllocation {
                size: info.SizeInBytes,
            },
            ptr,
        ))
    }

    fn set_name(&self, resource: &ComObject, name: &str) {
        let result = resource.with_resource(|r| unsafe { r.SetName(&HSTRING::from(name)) });
        if let Err(err) = result {
            log::debug!("SetName({name}) failed: {err}");
        }
    }

    fn create_descriptor_heap(
        &self,
        capacity: u32,
    ) -> Result<DescriptorHeapInfo<ID3D12DescriptorHeap>, HResult> {
        let heap: ID3D12DescriptorHeap = unsafe {
            self.device
                .CreateDescriptorHeap(&D3D12_DESCRIPTOR_HEAP_DESC {
                    Type: D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV,
                    NumDescriptors: capacity,
                    Flags: D3D12_DESCRIPTOR_HEAP_FLAG_NONE,
                    NodeMask: 0,
                })
                .map_err(hresult)?
        };
        let start = unsafe { heap.GetCPUDescriptorHandleForHeapStart() };
        let increment = unsafe {
            self.device
                .GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV)
        };
        Ok(DescriptorHeapInfo {
            heap,
            cpu_start: CpuDescriptorHandle { ptr: start.ptr },
            increment,
        })
    }

    fn create_shader_resource_view(
        &self,
        resource: &ComObject,
        desc: &ShaderResourceViewDesc,
        dest: CpuDescriptorHandle,
    ) {
        let native = srv_desc(desc);
        resource.with_resource(|r| unsafe {
            self.device.CreateShaderResourceView(
                r,
                Some(&native as *const _),
                D3D12_CPU_DESCRIPTOR_HANDLE { ptr: dest.ptr },
            )
        });
    }
}

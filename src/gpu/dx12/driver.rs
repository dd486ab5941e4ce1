use super::native::{
    AllocationDesc, ClearValue, CpuDescriptorHandle, HResult, ResourceDesc, ResourceStates,
    ShaderResourceViewDesc,
};
use crate::utils::{RefCountPtr, RefCounted};

/// Entry points that exist before a device does: the debug interface and
/// factory/adapter/device creation.
pub trait Dx12Driver {
    type Context: Dx12Context;

    /// `D3D12GetDebugInterface` + `EnableDebugLayer`.
    fn enable_debug_layer(&self) -> Result<(), HResult>;

    /// `ID3D12Debug1::SetEnableGPUBasedValidation`. Only meaningful after
    /// [`Dx12Driver::enable_debug_layer`] succeeded.
    fn enable_gpu_based_validation(&self) -> Result<(), HResult>;

    /// Creates factory, adapter, device and allocator in one go.
    fn create_context(&self, debug: bool) -> Result<Self::Context, HResult>;
}

/// A CPU-only descriptor heap for shader resource views.
pub struct DescriptorHeapInfo<H> {
    pub heap: H,
    pub cpu_start: CpuDescriptorHandle,
    pub increment: u32,
}

/// The live native device plus its memory allocator.
pub trait Dx12Context {
    /// `ID3D12Resource`.
    type Resource: RefCounted;
    /// `D3D12MA::Allocation`; dropping it frees the memory.
    type Allocation;
    /// `ID3D12DescriptorHeap`.
    type DescriptorHeap;

    fn adapter_name(&self) -> &str;

    /// `D3D12MA::Allocator::CreateResource`.
    fn create_resource(
        &self,
        allocation: &AllocationDesc,
        desc: &ResourceDesc,
        initial_state: ResourceStates,
        clear_value: Option<&ClearValue>,
    ) -> Result<(Self::Allocation, RefCountPtr<Self::Resource>), HResult>;

    /// `ID3D12Object::SetName`.
    fn set_name(&self, resource: &Self::Resource, name: &str);

    fn create_descriptor_heap(
        &self,
        capacity: u32,
    ) -> Result<DescriptorHeapInfo<Self::DescriptorHeap>, HResult>;

    /// `ID3D12Device::CreateShaderResourceView`.
    fn create_shader_resource_view(
        &self,
        resource: &Self::Resource,
        desc: &ShaderResourceViewDesc,
        dest: CpuDescriptorHandle,
    );
}

use super::driver::Dx12Context;
use super::native::{
    AllocationDesc, DxgiFormat, HeapType, ResourceDesc, ResourceDimension, ResourceFlags,
    ResourceStates, SampleDesc, TextureLayout,
};
use crate::utils::RefCountPtr;
use crate::{BufferDesc, BufferUsage, Result, RhiError};

/// A committed D3D12 buffer and the allocation backing it.
///
/// Field order matters: the resource reference is released before its memory.
pub struct BufferDx12<C: Dx12Context> {
    resource: RefCountPtr<C::Resource>,
    allocation: C::Allocation,
    desc: ResourceDesc,
    byte_size: u32,
    usage: BufferUsage,
    name: Option<String>,
}

impl<C: Dx12Context> BufferDx12<C> {
    pub fn new(ctx: &C, desc: &BufferDesc) -> Result<Self> {
        if desc.byte_size == 0 {
            return Err(RhiError::InvalidDescriptor("buffer byte_size must be non-zero"));
        }

        let native = ResourceDesc {
            dimension: ResourceDimension::Buffer,
            alignment: 0,
            width: desc.byte_size as u64,
            height: 1,
            depth_or_array_size: 1,
            mip_levels: 1,
            format: DxgiFormat::UNKNOWN,
            sample_desc: SampleDesc::default(),
            layout: TextureLayout::RowMajor,
            flags: ResourceFlags::NONE,
        };

        let (allocation, resource) = ctx
            .create_resource(
                &AllocationDesc {
                    heap_type: HeapType::Default,
                },
                &native,
                ResourceStates::COPY_DEST,
                None,
            )
            .map_err(RhiError::native("CreateResource"))?;

        if let (Some(name), Some(object)) = (desc.debug_name.as_deref(), resource.get()) {
            ctx.set_name(object, name);
        }

        Ok(Self {
            resource,
            allocation,
            desc: native,
            byte_size: desc.byte_size,
            usage: desc.usage,
            name: desc.debug_name.clone(),
        })
    }

    pub fn byte_size(&self) -> u32 {
        self.byte_size
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn native_desc(&self) -> &ResourceDesc {
        &self.desc
    }

    pub fn resource(&self) -> &RefCountPtr<C::Resource> {
        &self.resource
    }

    pub fn allocation(&self) -> &C::Allocation {
        &self.allocation
    }
}

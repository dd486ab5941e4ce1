use super::conversions::{
    to_native_format, to_native_resource_dimension, to_native_resource_flags,
    to_native_sampler_desc, to_native_srv_desc,
};
use super::descriptor_heap::DescriptorSlot;
use super::driver::Dx12Context;
use super::native::{
    self, AllocationDesc, ClearValue, DxgiFormat, HeapType, ResourceDesc, ResourceStates,
    SampleDesc, ShaderResourceViewDesc, TextureLayout,
};
use crate::utils::RefCountPtr;
use crate::{Result, RhiError, TextureDesc, TextureUsage, TextureViewDesc};

/// A shader resource view living inside its texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureViewDx12 {
    pub desc: TextureViewDesc,
    pub srv: ShaderResourceViewDesc,
    pub sampler: native::SamplerDesc,
    pub descriptor: DescriptorSlot,
}

pub struct TextureDx12<C: Dx12Context> {
    resource: RefCountPtr<C::Resource>,
    allocation: C::Allocation,
    native: ResourceDesc,
    desc: TextureDesc,
    clear_value: Option<ClearValue>,
    views: Vec<TextureViewDx12>,
}

/// Optimized clear value for attachment textures.
fn clear_value(desc: &TextureDesc, format: DxgiFormat) -> Option<ClearValue> {
    if desc.usage.contains(TextureUsage::DEPTH_STENCIL) {
        Some(ClearValue::DepthStencil {
            format,
            depth: 1.0,
            stencil: 0,
        })
    } else if desc.usage.contains(TextureUsage::RENDER_TARGET) {
        Some(ClearValue::Color {
            format,
            color: [0.0; 4],
        })
    } else {
        None
    }
}

impl<C: Dx12Context> TextureDx12<C> {
    pub fn new(ctx: &C, desc: &TextureDesc) -> Result<Self> {
        desc.validate()?;
        let format = to_native_format(desc.format);
        if format == DxgiFormat::UNKNOWN {
            return Err(RhiError::UnsupportedFormat(desc.format));
        }

        let native = ResourceDesc {
            dimension: to_native_resource_dimension(desc.dimension),
            alignment: 0,
            width: desc.width as u64,
            height: desc.height,
            depth_or_array_size: desc.depth_or_array_size,
            mip_levels: desc.mip_levels,
            format: format.typeless(),
            sample_desc: SampleDesc::default(),
            layout: TextureLayout::Unknown,
            flags: to_native_resource_flags(desc.usage),
        };
        let clear_value = clear_value(desc, format);

        let (allocation, resource) = ctx
            .create_resource(
                &AllocationDesc {
                    heap_type: HeapType::Default,
                },
                &native,
                ResourceStates::COPY_DEST,
                clear_value.as_ref(),
            )
            .map_err(RhiError::native("CreateResource"))?;

        if let (Some(name), Some(object)) = (desc.debug_name.as_deref(), resource.get()) {
            ctx.set_name(object, name);
        }

        Ok(Self {
            resource,
            allocation,
            native,
            desc: desc.clone(),
            clear_value,
            views: Vec::new(),
        })
    }

    /// Writes a shader resource view for this texture into `slot` and keeps
    /// it alongside the texture.
    pub fn create_view(
        &mut self,
        ctx: &C,
        desc: &TextureViewDesc,
        slot: DescriptorSlot,
    ) -> Result<()> {
        let srv = to_native_srv_desc(desc, &self.desc);
        if srv.format == DxgiFormat::UNKNOWN {
            return Err(RhiError::UnsupportedFormat(desc.format));
        }
        let resource = self
            .resource
            .get()
            .ok_or(RhiError::InvalidDescriptor("texture has no native resource"))?;
        ctx.create_shader_resource_view(resource, &srv, slot.cpu);

        self.views.push(TextureViewDx12 {
            desc: *desc,
            srv,
            sampler: to_native_sampler_desc(&desc.sampler_desc),
            descriptor: slot,
        });
        Ok(())
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    pub fn native_desc(&self) -> &ResourceDesc {
        &self.native
    }

    pub fn clear_value(&self) -> Option<&ClearValue> {
        self.clear_value.as_ref()
    }

    pub fn views(&self) -> &[TextureViewDx12] {
        &self.views
    }

    pub fn resource(&self) -> &RefCountPtr<C::Resource> {
        &self.resource
    }

    pub fn allocation(&self) -> &C::Allocation {
        &self.allocation
    }
}

use ash::vk;
use std::rc::Rc;
use vk_mem::Alloc;

use super::VkCore;
use crate::{BufferDesc, BufferUsage, Result, RhiError};

/// A device-local buffer; destroys itself through the core's allocator.
pub struct BufferVk {
    core: Rc<VkCore>,
    pub(crate) buf: vk::Buffer,
    pub(crate) alloc: vk_mem::Allocation,
    byte_size: u32,
    usage: BufferUsage,
    name: Option<String>,
}

impl BufferVk {
    pub(super) fn new(core: &Rc<VkCore>, desc: &BufferDesc) -> Result<Self> {
        if desc.byte_size == 0 {
            return Err(RhiError::InvalidDescriptor("buffer byte_size must be non-zero"));
        }

        let (buf, alloc) = unsafe {
            core.allocator.create_buffer(
                &vk::BufferCreateInfo::builder()
                    .size(desc.byte_size as u64)
                    .usage(desc.usage.into())
                    .sharing_mode(vk::SharingMode::EXCLUSIVE)
                    .build(),
                &vk_mem::AllocationCreateInfo {
                    usage: vk_mem::MemoryUsage::AutoPreferDevice,
                    ..Default::default()
                },
            )
        }?;

        if let Some(name) = desc.debug_name.as_deref() {
            core.set_name(buf, name, vk::ObjectType::BUFFER);
        }

        Ok(Self {
            core: Rc::clone(core),
            buf,
            alloc,
            byte_size: desc.byte_size,
            usage: desc.usage,
            name: desc.debug_name.clone(),
        })
    }

    pub fn raw(&self) -> vk::Buffer {
        self.buf
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
}

impl Drop for BufferVk {
    fn drop(&mut self) {
        unsafe { self.core.allocator.destroy_buffer(self.buf, &mut self.alloc) };
    }
}

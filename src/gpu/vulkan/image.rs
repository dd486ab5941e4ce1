use ash::vk;
use std::rc::Rc;
use vk_mem::Alloc;

use super::conversions::{aspect_mask, image_kind, lib_to_vk_format};
use super::VkCore;
use crate::{PixelFormat, Result, RhiError, TextureDesc, TextureDimension, TextureViewDesc};

#[derive(Debug)]
pub struct TextureViewVk {
    pub desc: TextureViewDesc,
    pub view: vk::ImageView,
    pub sampler: vk::Sampler,
}

pub struct TextureVk {
    core: Rc<VkCore>,
    pub(crate) img: vk::Image,
    pub(crate) alloc: vk_mem::Allocation,
    desc: TextureDesc,
    views: Vec<TextureViewVk>,
}

impl TextureVk {
    pub(super) fn new(core: &Rc<VkCore>, desc: &TextureDesc) -> Result<Self> {
        desc.validate()?;
        if desc.format == PixelFormat::Unknown {
            return Err(RhiError::UnsupportedFormat(desc.format));
        }

        let layers = desc.depth_or_array_size as u32;
        let kind = image_kind(desc.dimension, layers, core.cube_array_enabled());
        let (depth, array_layers) = match desc.dimension {
            TextureDimension::Texture3D => (layers, 1),
            _ => (1, layers),
        };

        let (img, alloc) = unsafe {
            core.allocator.create_image(
                &vk::ImageCreateInfo::builder()
                    .image_type(kind.image_type)
                    .flags(kind.flags)
                    .extent(vk::Extent3D {
                        width: desc.width,
                        height: desc.height,
                        depth,
                    })
                    .array_layers(array_layers)
                    .mip_levels(desc.mip_levels as u32)
                    .format(lib_to_vk_format(desc.format))
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .usage(desc.usage.into())
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .tiling(vk::ImageTiling::OPTIMAL)
                    .sharing_mode(vk::SharingMode::EXCLUSIVE)
                    .build(),
                &vk_mem::AllocationCreateInfo {
                    usage: vk_mem::MemoryUsage::AutoPreferDevice,
                    ..Default::default()
                },
            )
        }?;

        if let Some(name) = desc.debug_name.as_deref() {
            core.set_name(img, name, vk::ObjectType::IMAGE);
        }

        Ok(Self {
            core: Rc::clone(core),
            img,
            alloc,
            desc: desc.clone(),
            views: Vec::new(),
        })
    }

    pub fn create_view(&mut self, desc: &TextureViewDesc) -> Result<()> {
        let format = if desc.format == PixelFormat::Unknown {
            self.desc.format
        } else {
            desc.format
        };
        let layers = self.desc.depth_or_array_size as u32;
        let kind = image_kind(self.desc.dimension, layers, self.core.cube_array_enabled());
        let layer_count = match self.desc.dimension {
            TextureDimension::Texture3D => 1,
            _ => layers,
        };
        let mips = desc.mip_levels.clamp(1, self.desc.mip_levels.max(1)) as u32;

        let device = &self.core.device;
        let view = unsafe {
            device.create_image_view(
                &vk::ImageViewCreateInfo::builder()
                    .image(self.img)
                    .view_type(kind.view_type)
                    .format(lib_to_vk_format(format))
                    .subresource_range(
                        vk::ImageSubresourceRange::builder()
                            .aspect_mask(aspect_mask(format))
                            .base_mip_level(0)
                            .level_count(mips)
                            .base_array_layer(0)
                            .layer_count(layer_count)
                            .build(),
                    )
                    .build(),
                None,
            )
        }?;

        let sampler_info: vk::SamplerCreateInfo = (&desc.sampler_desc).into();
        let sampler = match unsafe { device.create_sampler(&sampler_info, None) } {
            Ok(sampler) => sampler,
            Err(err) => {
                unsafe { device.destroy_image_view(view, None) };
                return Err(err.into());
            }
        };

        self.views.push(TextureViewVk {
            desc: *desc,
            view,
            sampler,
        });
        Ok(())
    }

    pub fn raw(&self) -> vk::Image {
        self.img
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    pub fn views(&self) -> &[TextureViewVk] {
        &self.views
    }
}

impl Drop for TextureVk {
    fn drop(&mut self) {
        let device = &self.core.device;
        for view in self.views.drain(..) {
            unsafe {
                device.destroy_sampler(view.sampler, None);
                device.destroy_image_view(view.view, None);
            }
        }
        unsafe { self.core.allocator.destroy_image(self.img, &mut self.alloc) };
    }
}

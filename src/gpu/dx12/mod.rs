//! Direct3D 12 style backend.
//!
//! [`DeviceDx12`] is generic over a [`Dx12Driver`], the thin layer that
//! actually talks to the runtime. [`SoftDriver`] runs everywhere and keeps a
//! ledger of native objects; `WindowsDriver` (Windows with the `slate-dx12`
//! feature) calls the real D3D12 API.

pub mod buffer;
pub mod conversions;
pub mod descriptor_heap;
pub mod driver;
pub mod native;
pub mod soft;
pub mod texture;
#[cfg(all(windows, feature = "slate-dx12"))]
pub mod windows_driver;

pub use buffer::BufferDx12;
pub use descriptor_heap::{DescriptorHeap, DescriptorSlot};
pub use driver::{DescriptorHeapInfo, Dx12Context, Dx12Driver};
pub use soft::{SoftContext, SoftDriver, SoftLedger, SoftStats};
pub use texture::{TextureDx12, TextureViewDx12};
#[cfg(all(windows, feature = "slate-dx12"))]
pub use windows_driver::WindowsDriver;

use crate::utils::{Handle, SlotPool};
use crate::{
    Buffer, BufferDesc, Device, DeviceDesc, Result, RhiError, Texture, TextureDesc,
    TextureViewDesc,
};

type Context<D> = <D as Dx12Driver>::Context;
type Heap<D> = <Context<D> as Dx12Context>::DescriptorHeap;

pub struct DeviceDx12<D: Dx12Driver> {
    // Declared first so resources are released before the device goes away.
    buffers: SlotPool<Buffer, BufferDx12<Context<D>>>,
    textures: SlotPool<Texture, TextureDx12<Context<D>>>,
    srv_heap: DescriptorHeap<Heap<D>>,
    context: Context<D>,
    debug_layer: bool,
    gpu_based_validation: bool,
}

impl<D: Dx12Driver> DeviceDx12<D> {
    pub fn new(driver: D, desc: &DeviceDesc) -> Result<Self> {
        let desc = desc.with_env_overrides();

        let mut debug_layer = false;
        let mut gpu_based_validation = false;
        if desc.enable_debug {
            match driver.enable_debug_layer() {
                Ok(()) => {
                    log::info!("D3D12 debug layer enabled");
                    debug_layer = true;
                }
                Err(result) => {
                    log::warn!("D3D12 debug layer unavailable ({result}), continuing without it")
                }
            }
        }
        if debug_layer && desc.gpu_based_validation {
            match driver.enable_gpu_based_validation() {
                Ok(()) => gpu_based_validation = true,
                Err(result) => log::warn!("GPU-based validation unavailable ({result})"),
            }
        }

        let context = driver
            .create_context(debug_layer)
            .map_err(RhiError::native("D3D12CreateDevice"))?;
        log::info!("created D3D12 device on {}", context.adapter_name());

        let info = context
            .create_descriptor_heap(desc.srv_heap_capacity)
            .map_err(RhiError::native("CreateDescriptorHeap"))?;

        Ok(Self {
            buffers: SlotPool::new(),
            textures: SlotPool::new(),
            srv_heap: DescriptorHeap::new(info, desc.srv_heap_capacity),
            context,
            debug_layer,
            gpu_based_validation,
        })
    }

    pub fn buffer(&self, handle: Handle<Buffer>) -> Option<&BufferDx12<Context<D>>> {
        self.buffers.get(handle)
    }

    pub fn texture(&self, handle: Handle<Texture>) -> Option<&TextureDx12<Context<D>>> {
        self.textures.get(handle)
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn debug_layer_enabled(&self) -> bool {
        self.debug_layer
    }

    pub fn gpu_based_validation_enabled(&self) -> bool {
        self.gpu_based_validation
    }

    pub fn context(&self) -> &Context<D> {
        &self.context
    }

    /// Descriptors currently handed out to texture views.
    pub fn srv_descriptors_in_use(&self) -> u32 {
        self.srv_heap.len()
    }

    fn add_texture_view(&mut self, desc: &TextureViewDesc) -> Result<()> {
        let texture = self
            .textures
            .get_mut(desc.texture)
            .ok_or(RhiError::InvalidDescriptor("stale texture handle"))?;
        let slot = self
            .srv_heap
            .allocate()
            .ok_or(RhiError::DescriptorHeapFull(self.srv_heap.capacity()))?;

        if let Err(err) = texture.create_view(&self.context, desc, slot) {
            self.srv_heap.free(slot);
            return Err(err);
        }
        Ok(())
    }
}

impl<D: Dx12Driver> Device for DeviceDx12<D> {
    fn create_buffer(&mut self, desc: &BufferDesc) -> Handle<Buffer> {
        match BufferDx12::new(&self.context, desc) {
            Ok(buffer) => self.buffers.insert(buffer),
            Err(err) => {
                log::error!("failed to create buffer {:?}: {err}", desc.debug_name);
                Handle::default()
            }
        }
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Handle<Texture> {
        match TextureDx12::new(&self.context, desc) {
            Ok(texture) => self.textures.insert(texture),
            Err(err) => {
                log::error!("failed to create texture {:?}: {err}", desc.debug_name);
                Handle::default()
            }
        }
    }

    fn create_texture_view(&mut self, desc: &TextureViewDesc) -> Handle<Texture> {
        match self.add_texture_view(desc) {
            Ok(()) => desc.texture,
            Err(err) => {
                log::error!("failed to create view on {:?}: {err}", desc.texture);
                Handle::default()
            }
        }
    }

    fn destroy_buffer(&mut self, handle: Handle<Buffer>) {
        if self.buffers.remove(handle).is_none() {
            log::debug!("destroy_buffer ignored stale handle {handle:?}");
        }
    }

    fn destroy_texture(&mut self, handle: Handle<Texture>) {
        match self.textures.remove(handle) {
            Some(texture) => {
                for view in texture.views() {
                    self.srv_heap.free(view.descriptor);
                }
            }
            None => log::debug!("destroy_texture ignored stale handle {handle:?}"),
        }
    }
}

impl<D: Dx12Driver> Drop for DeviceDx12<D> {
    fn drop(&mut self) {
        let (buffers, textures) = (self.buffers.len(), self.textures.len());
        if buffers + textures > 0 {
            log::debug!("releasing {buffers} buffers and {textures} textures with the device");
        }
    }
}

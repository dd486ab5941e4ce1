//! Vulkan backend built on `ash` and `vk-mem`.
//!
//! Resource wrappers keep an `Rc` to the [`VkCore`] that created them and
//! destroy their native objects on drop, so the instance and device outlive
//! every buffer and image regardless of the order things are released in.

pub mod conversions;
pub mod image;
pub mod memory;

pub use image::{TextureViewVk, TextureVk};
pub use memory::BufferVk;

use ash::{vk, Entry};
use std::ffi::{c_char, c_void, CStr, CString};
use std::mem::ManuallyDrop;
use std::rc::Rc;

use crate::utils::{Handle, SlotPool};
use crate::{
    Buffer, BufferDesc, Device, DeviceDesc, Result, RhiError, Texture, TextureDesc,
    TextureViewDesc,
};

pub const DEBUG_LAYER_NAMES: [*const c_char; 1] =
    [b"VK_LAYER_KHRONOS_validation\0".as_ptr() as *const c_char];

unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut c_void,
) -> vk::Bool32 {
    let message = unsafe { CStr::from_ptr((*p_callback_data).p_message) };
    let level = if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::Level::Error
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        log::Level::Warn
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        log::Level::Debug
    } else {
        log::Level::Trace
    };
    log::log!(level, "[{:?}] {}", message_type, message.to_string_lossy());
    vk::FALSE
}

struct DebugMessenger {
    utils: ash::extensions::ext::DebugUtils,
    messenger: vk::DebugUtilsMessengerEXT,
}

/// Instance, device and allocator shared by every resource of a [`DeviceVk`].
pub struct VkCore {
    _entry: Entry,
    instance: ash::Instance,
    debug: Option<DebugMessenger>,
    pdevice: vk::PhysicalDevice,
    pub(crate) device: ash::Device,
    pub(crate) allocator: ManuallyDrop<vk_mem::Allocator>,
    properties: vk::PhysicalDeviceProperties,
    queue_family: u32,
    cube_array: bool,
}

impl VkCore {
    fn new(enable_validation: bool, gpu_based_validation: bool) -> Result<Self> {
        let entry = unsafe { Entry::load() }?;

        let mut inst_layers = Vec::new();
        if enable_validation {
            let available_layers = entry.enumerate_instance_layer_properties()?;
            for &layer in &DEBUG_LAYER_NAMES {
                let name = unsafe { CStr::from_ptr(layer) };
                if available_layers
                    .iter()
                    .any(|prop| unsafe { CStr::from_ptr(prop.layer_name.as_ptr()) == name })
                {
                    inst_layers.push(layer);
                }
            }
            if inst_layers.is_empty() {
                log::warn!("Vulkan validation layer unavailable, continuing without it");
            }
        }
        let validation = !inst_layers.is_empty();

        let mut inst_exts = Vec::new();
        if validation {
            inst_exts.push(ash::extensions::ext::DebugUtils::name().as_ptr());
        }

        let app_info = vk::ApplicationInfo {
            api_version: vk::make_api_version(0, 1, 2, 0),
            ..Default::default()
        };
        let enabled_features = [vk::ValidationFeatureEnableEXT::GPU_ASSISTED];
        let mut validation_features =
            vk::ValidationFeaturesEXT::builder().enabled_validation_features(&enabled_features);

        let mut instance_ci = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&inst_exts)
            .enabled_layer_names(&inst_layers);
        if validation && gpu_based_validation {
            instance_ci = instance_ci.push_next(&mut validation_features);
        }
        let instance = unsafe { entry.create_instance(&instance_ci, None) }?;

        let debug = if validation {
            let utils = ash::extensions::ext::DebugUtils::new(&entry, &instance);
            let messenger_ci = vk::DebugUtilsMessengerCreateInfoEXT::builder()
                .message_severity(
                    vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                        | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                        | vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
                )
                .message_type(
                    vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                        | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                        | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                )
                .pfn_user_callback(Some(vulkan_debug_callback));
            match unsafe { utils.create_debug_utils_messenger(&messenger_ci, None) } {
                Ok(messenger) => Some(DebugMessenger { utils, messenger }),
                Err(err) => {
                    log::warn!("failed to create debug messenger: {err}");
                    None
                }
            }
        } else {
            None
        };

        match Self::open_device(&instance) {
            Ok((pdevice, properties, queue_family, cube_array, device, allocator)) => Ok(Self {
                _entry: entry,
                instance,
                debug,
                pdevice,
                device,
                allocator: ManuallyDrop::new(allocator),
                properties,
                queue_family,
                cube_array,
            }),
            Err(err) => {
                unsafe {
                    if let Some(debug) = debug {
                        debug.utils.destroy_debug_utils_messenger(debug.messenger, None);
                    }
                    instance.destroy_instance(None);
                }
                Err(err)
            }
        }
    }

    /// Picks an adapter, preferring discrete GPUs, and creates the logical
    /// device plus its allocator on it. `imageCubeArray` is enabled when the
    /// adapter has it.
    #[allow(clippy::type_complexity)]
    fn open_device(
        instance: &ash::Instance,
    ) -> Result<(
        vk::PhysicalDevice,
        vk::PhysicalDeviceProperties,
        u32,
        bool,
        ash::Device,
        vk_mem::Allocator,
    )> {
        let mut candidates = Vec::new();
        for pdevice in unsafe { instance.enumerate_physical_devices() }? {
            let properties = unsafe { instance.get_physical_device_properties(pdevice) };
            let families =
                unsafe { instance.get_physical_device_queue_family_properties(pdevice) };
            let Some(family) = families
                .iter()
                .position(|f| f.queue_flags.contains(vk::QueueFlags::GRAPHICS))
            else {
                continue;
            };
            candidates.push((pdevice, properties, family as u32));
        }
        candidates.sort_by_key(|(_, properties, _)| {
            properties.device_type != vk::PhysicalDeviceType::DISCRETE_GPU
        });
        let (pdevice, properties, queue_family) = candidates
            .into_iter()
            .next()
            .ok_or(RhiError::NoSuitableAdapter)?;

        let supported = unsafe { instance.get_physical_device_features(pdevice) };
        let cube_array = supported.image_cube_array == vk::TRUE;
        let features = vk::PhysicalDeviceFeatures {
            image_cube_array: supported.image_cube_array,
            ..Default::default()
        };

        let priorities = [1.0];
        let queue_infos = [vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(queue_family)
            .queue_priorities(&priorities)
            .build()];
        let device = unsafe {
            instance.create_device(
                pdevice,
                &vk::DeviceCreateInfo::builder()
                    .queue_create_infos(&queue_infos)
                    .enabled_features(&features)
                    .build(),
                None,
            )
        }?;

        match vk_mem::Allocator::new(vk_mem::AllocatorCreateInfo::new(instance, &device, pdevice)) {
            Ok(allocator) => Ok((pdevice, properties, queue_family, cube_array, device, allocator)),
            Err(err) => {
                unsafe { device.destroy_device(None) };
                Err(err.into())
            }
        }
    }

    pub fn adapter_name(&self) -> String {
        unsafe { CStr::from_ptr(self.properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.pdevice
    }

    pub fn queue_family(&self) -> u32 {
        self.queue_family
    }

    /// Whether multi-cube textures get `CUBE_ARRAY` views.
    pub fn cube_array_enabled(&self) -> bool {
        self.cube_array
    }

    pub fn validation_enabled(&self) -> bool {
        self.debug.is_some()
    }

    pub(crate) fn set_name<T>(&self, obj: T, name: &str, t: vk::ObjectType)
    where
        T: vk::Handle,
    {
        let Some(debug) = &self.debug else {
            return;
        };
        let Ok(name) = CString::new(name) else {
            return;
        };
        let result = unsafe {
            debug.utils.set_debug_utils_object_name(
                self.device.handle(),
                &vk::DebugUtilsObjectNameInfoEXT::builder()
                    .object_name(&name)
                    .object_type(t)
                    .object_handle(obj.as_raw())
                    .build(),
            )
        };
        if let Err(err) = result {
            log::debug!("failed to name Vulkan object: {err}");
        }
    }
}

impl Drop for VkCore {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            ManuallyDrop::drop(&mut self.allocator);
            self.device.destroy_device(None);
            if let Some(debug) = self.debug.take() {
                debug.utils.destroy_debug_utils_messenger(debug.messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

pub struct DeviceVk {
    buffers: SlotPool<Buffer, BufferVk>,
    textures: SlotPool<Texture, TextureVk>,
    core: Rc<VkCore>,
}

impl DeviceVk {
    pub fn new(desc: &DeviceDesc) -> Result<Self> {
        let desc = desc.with_env_overrides();
        let core = VkCore::new(desc.enable_debug, desc.gpu_based_validation)?;
        log::info!("created Vulkan device on {}", core.adapter_name());
        Ok(Self {
            buffers: SlotPool::new(),
            textures: SlotPool::new(),
            core: Rc::new(core),
        })
    }

    pub fn buffer(&self, handle: Handle<Buffer>) -> Option<&BufferVk> {
        self.buffers.get(handle)
    }

    pub fn texture(&self, handle: Handle<Texture>) -> Option<&TextureVk> {
        self.textures.get(handle)
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn debug_layer_enabled(&self) -> bool {
        self.core.validation_enabled()
    }

    pub fn context(&self) -> &VkCore {
        &self.core
    }
}

impl Device for DeviceVk {
    fn create_buffer(&mut self, desc: &BufferDesc) -> Handle<Buffer> {
        match BufferVk::new(&self.core, desc) {
            Ok(buffer) => self.buffers.insert(buffer),
            Err(err) => {
                log::error!("failed to create buffer {:?}: {err}", desc.debug_name);
                Handle::default()
            }
        }
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Handle<Texture> {
        match TextureVk::new(&self.core, desc) {
            Ok(texture) => self.textures.insert(texture),
            Err(err) => {
                log::error!("failed to create texture {:?}: {err}", desc.debug_name);
                Handle::default()
            }
        }
    }

    fn create_texture_view(&mut self, desc: &TextureViewDesc) -> Handle<Texture> {
        let Some(texture) = self.textures.get_mut(desc.texture) else {
            log::error!("failed to create view: stale texture {:?}", desc.texture);
            return Handle::default();
        };
        match texture.create_view(desc) {
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
        if self.textures.remove(handle).is_none() {
            log::debug!("destroy_texture ignored stale handle {handle:?}");
        }
    }
}

//! Backend-agnostic resource interface.
//!
//! Client code talks to a [`Device`] and receives generational [`Handle`]s in
//! return. Each backend owns its native context plus one [`SlotPool`] per
//! resource kind, and translates descriptors into native creation calls.
//!
//! # Examples
//! ```
//! use slate::{BufferDesc, BufferUsage, Device, DeviceDesc};
//! use slate::gpu::dx12::{DeviceDx12, SoftDriver};
//!
//! let mut device = DeviceDx12::new(SoftDriver::new(), &DeviceDesc::default()).unwrap();
//! let buffer = device.create_buffer(&BufferDesc {
//!     byte_size: 256,
//!     usage: BufferUsage::Uniform,
//!     ..Default::default()
//! });
//! assert!(buffer.is_valid());
//! device.destroy_buffer(buffer);
//! ```
//!
//! [`SlotPool`]: crate::utils::SlotPool

pub mod context;
pub mod dx12;
pub mod error;
pub mod structs;
#[cfg(feature = "slate-vulkan")]
pub mod vulkan;

pub use context::*;
pub use error::*;
pub use structs::*;

use crate::utils::Handle;

/// Resource lifecycle operations every backend provides.
///
/// Creation never fails loudly: a failed call logs the reason and returns an
/// invalid handle. Destroying a stale or invalid handle is a no-op.
pub trait Device {
    fn create_buffer(&mut self, desc: &BufferDesc) -> Handle<Buffer>;

    fn create_texture(&mut self, desc: &TextureDesc) -> Handle<Texture>;

    /// Adds a shader-visible view to `desc.texture` and hands back that same
    /// handle. Views live inside their texture and take no slot of their own.
    fn create_texture_view(&mut self, desc: &TextureViewDesc) -> Handle<Texture>;

    fn destroy_buffer(&mut self, handle: Handle<Buffer>);

    fn destroy_texture(&mut self, handle: Handle<Texture>);
}

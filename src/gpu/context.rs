use super::dx12::{DeviceDx12, SoftDriver};
use super::Device;
use crate::{DeviceDesc, Result};

/// Native API a [`Device`] is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendKind {
    /// The D3D12 backend running on the in-process soft driver.
    #[default]
    Soft,
    /// The D3D12 backend on the real runtime. Windows with `slate-dx12` only.
    Dx12,
    /// Vulkan through `ash` and `vk-mem`. Requires `slate-vulkan`.
    Vulkan,
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Soft => "soft",
            BackendKind::Dx12 => "dx12",
            BackendKind::Vulkan => "vulkan",
        }
    }

    /// Whether this backend was compiled into the crate.
    pub fn is_available(self) -> bool {
        match self {
            BackendKind::Soft => true,
            BackendKind::Dx12 => cfg!(all(windows, feature = "slate-dx12")),
            BackendKind::Vulkan => cfg!(feature = "slate-vulkan"),
        }
    }
}

/// Creates a device for `kind` behind the backend-agnostic interface.
pub fn make_device(kind: BackendKind, desc: &DeviceDesc) -> Result<Box<dyn Device>> {
    log::debug!("creating {} device", kind.name());
    match kind {
        BackendKind::Soft => Ok(Box::new(DeviceDx12::new(SoftDriver::new(), desc)?)),
        BackendKind::Dx12 => {
            #[cfg(all(windows, feature = "slate-dx12"))]
            {
                use super::dx12::WindowsDriver;
                return Ok(Box::new(DeviceDx12::new(WindowsDriver::new(), desc)?));
            }
            #[allow(unreachable_code)]
            Err(crate::RhiError::BackendUnavailable(kind.name()))
        }
        BackendKind::Vulkan => {
            #[cfg(feature = "slate-vulkan")]
            {
                return Ok(Box::new(super::vulkan::DeviceVk::new(desc)?));
            }
            #[allow(unreachable_code)]
            Err(crate::RhiError::BackendUnavailable(kind.name()))
        }
    }
}

use super::dx12::native::HResult;
use super::structs::PixelFormat;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RhiError {
    /// A D3D12-style native call returned a failure code.
    #[error("{call} failed: {result}")]
    Native {
        call: &'static str,
        result: HResult,
    },

    #[cfg(feature = "slate-vulkan")]
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] ash::vk::Result),

    #[cfg(feature = "slate-vulkan")]
    #[error("failed to load Vulkan: {0}")]
    Loading(#[from] ash::LoadingError),

    #[error("no suitable GPU adapter found")]
    NoSuitableAdapter,

    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(&'static str),

    #[error("pixel format {0:?} is not supported by this backend")]
    UnsupportedFormat(PixelFormat),

    #[error("shader resource view heap is full ({0} descriptors)")]
    DescriptorHeapFull(u32),

    #[error("backend {0} is not compiled in")]
    BackendUnavailable(&'static str),
}

impl RhiError {
    pub(crate) fn native(call: &'static str) -> impl FnOnce(HResult) -> RhiError {
        move |result| RhiError::Native { call, result }
    }
}

/// Convenient crate-wide result type.
pub type Result<T, E = RhiError> = std::result::Result<T, E>;

#![allow(dead_code)]

use slate::gpu::dx12::{DeviceDx12, SoftDriver, SoftLedger};
use slate::{DeviceDesc, PixelFormat, TextureDesc, TextureUsage};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A soft-driver device plus the ledger that outlives it.
pub fn soft_device() -> (DeviceDx12<SoftDriver>, SoftLedger) {
    soft_device_with(SoftDriver::new(), &DeviceDesc::default())
}

pub fn soft_device_with(
    driver: SoftDriver,
    desc: &DeviceDesc,
) -> (DeviceDx12<SoftDriver>, SoftLedger) {
    init_logging();
    let ledger = driver.ledger();
    let device = DeviceDx12::new(driver, desc).expect("soft device creation never fails");
    (device, ledger)
}

pub fn texture_desc(width: u32, height: u32, format: PixelFormat) -> TextureDesc {
    TextureDesc {
        width,
        height,
        format,
        ..Default::default()
    }
}

pub fn render_target_desc(width: u32, height: u32) -> TextureDesc {
    TextureDesc {
        usage: TextureUsage::RENDER_TARGET,
        ..texture_desc(width, height, PixelFormat::R8G8B8A8_Unorm)
    }
}

/// Restores an environment variable when dropped.
pub struct EnvGuard {
    key: &'static str,
    original: Option<String>,
}

impl EnvGuard {
    pub fn set(key: &'static str, value: &str) -> Self {
        let original = std::env::var(key).ok();
        std::env::set_var(key, value);
        Self { key, original }
    }

    pub fn unset(key: &'static str) -> Self {
        let original = std::env::var(key).ok();
        std::env::remove_var(key);
        Self { key, original }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.original {
            Some(value) => std::env::set_var(self.key, value),
            None => std::env::remove_var(self.key),
        }
    }
}

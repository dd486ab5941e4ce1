mod common;

use common::{init_logging, soft_device_with, EnvGuard};
use serial_test::serial;
use slate::gpu::dx12::native::HResult;
use slate::gpu::dx12::{DeviceDx12, Dx12Context, SoftDriver};
use slate::{make_device, BackendKind, BufferDesc, DeviceDesc, RhiError, TextureViewDesc};

const VALIDATION_ENV: &str = "SLATE_VALIDATION";

#[test]
#[serial]
fn debug_layer_is_enabled_on_request() {
    let _env = EnvGuard::unset(VALIDATION_ENV);
    let (device, ledger) = soft_device_with(
        SoftDriver::new(),
        &DeviceDesc {
            enable_debug: true,
            gpu_based_validation: true,
            ..Default::default()
        },
    );
    assert!(device.debug_layer_enabled());
    assert!(device.gpu_based_validation_enabled());
    assert!(device.context().is_debug());
    assert!(ledger.debug_layer_enabled());
}

#[test]
#[serial]
fn missing_debug_layer_does_not_stop_initialization() {
    let _env = EnvGuard::unset(VALIDATION_ENV);
    let (mut device, _ledger) = soft_device_with(
        SoftDriver::new().without_debug_layer(),
        &DeviceDesc {
            enable_debug: true,
            gpu_based_validation: true,
            ..Default::default()
        },
    );
    assert!(!device.debug_layer_enabled());
    assert!(!device.gpu_based_validation_enabled());

    use slate::Device;
    assert!(device
        .create_buffer(&BufferDesc {
            byte_size: 16,
            ..Default::default()
        })
        .is_valid());
}

#[test]
#[serial]
fn validation_can_be_forced_from_the_environment() {
    let _env = EnvGuard::set(VALIDATION_ENV, "1");
    let (device, _ledger) = soft_device_with(SoftDriver::new(), &DeviceDesc::default());
    assert!(device.debug_layer_enabled());
    assert!(DeviceDesc::default().with_env_overrides().enable_debug);
}

#[test]
#[serial]
fn environment_leaves_validation_off_by_default() {
    let _env = EnvGuard::set(VALIDATION_ENV, "0");
    assert!(!DeviceDesc::default().with_env_overrides().enable_debug);
    let (device, ledger) = soft_device_with(SoftDriver::new(), &DeviceDesc::default());
    assert!(!device.debug_layer_enabled());
    assert!(!ledger.debug_layer_enabled());
}

#[test]
#[serial]
fn device_creation_failure_is_an_error() {
    init_logging();
    let driver = SoftDriver::new().with_context_failure(HResult::DXGI_ERROR_UNSUPPORTED);
    let ledger = driver.ledger();

    match DeviceDx12::new(driver, &DeviceDesc::default()) {
        Err(RhiError::Native { call, result }) => {
            assert_eq!(call, "D3D12CreateDevice");
            assert_eq!(result, HResult::DXGI_ERROR_UNSUPPORTED);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("device creation should have failed"),
    }
    assert!(ledger.is_clean());
}

#[test]
#[serial]
fn empty_descriptor_heap_is_an_error() {
    init_logging();
    let result = DeviceDx12::new(
        SoftDriver::new(),
        &DeviceDesc {
            srv_heap_capacity: 0,
            ..Default::default()
        },
    );
    assert!(matches!(
        result,
        Err(RhiError::Native {
            call: "CreateDescriptorHeap",
            ..
        })
    ));
}

#[test]
#[serial]
fn soft_adapter_reports_its_name() {
    let (device, _ledger) = soft_device_with(SoftDriver::new(), &DeviceDesc::default());
    assert_eq!(device.context().adapter_name(), "Slate Soft Adapter");
}

#[test]
#[serial]
fn facade_dispatches_through_the_device_trait() {
    init_logging();
    let mut device = match make_device(BackendKind::Soft, &DeviceDesc::default()) {
        Ok(device) => device,
        Err(err) => panic!("soft backend failed: {err}"),
    };

    let buffer = device.create_buffer(&BufferDesc {
        byte_size: 256,
        ..Default::default()
    });
    assert!(buffer.is_valid());

    let texture = device.create_texture(&Default::default());
    assert!(texture.is_valid());
    assert_eq!(
        device.create_texture_view(&TextureViewDesc {
            texture,
            ..Default::default()
        }),
        texture
    );

    device.destroy_texture(texture);
    device.destroy_buffer(buffer);
    assert!(!device
        .create_texture_view(&TextureViewDesc {
            texture,
            ..Default::default()
        })
        .is_valid());
}

#[test]
#[serial]
fn unavailable_backends_are_reported() {
    init_logging();
    for kind in [BackendKind::Soft, BackendKind::Dx12, BackendKind::Vulkan] {
        if kind.is_available() {
            continue;
        }
        match make_device(kind, &DeviceDesc::default()) {
            Err(RhiError::BackendUnavailable(name)) => assert_eq!(name, kind.name()),
            Err(other) => panic!("unexpected error for {kind:?}: {other}"),
            Ok(_) => panic!("{kind:?} is not compiled in"),
        }
    }
    assert!(BackendKind::Soft.is_available());
}

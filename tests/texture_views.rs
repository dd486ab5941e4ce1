mod common;

use common::{render_target_desc, soft_device, soft_device_with, texture_desc};
use slate::gpu::dx12::native::{
    ComparisonFunc, DxgiFormat, Filter, SrvDimension, DEFAULT_SHADER_4_COMPONENT_MAPPING,
};
use slate::gpu::dx12::SoftDriver;
use slate::{
    CompareOp, Device, DeviceDesc, FilterMode, Handle, PixelFormat, SamplerDesc, TextureDesc,
    TextureUsage, TextureViewDesc,
};

#[test]
fn view_returns_the_texture_handle() {
    let (mut device, ledger) = soft_device();
    let texture = device.create_texture(&texture_desc(64, 64, PixelFormat::R8G8B8A8_Srgb));
    assert!(texture.is_valid());

    let view = device.create_texture_view(&TextureViewDesc {
        texture,
        format: PixelFormat::R8G8B8A8_Srgb,
        ..Default::default()
    });
    assert_eq!(view, texture);
    assert_eq!(device.texture_count(), 1);

    let views = device.texture(texture).unwrap().views();
    assert_eq!(views.len(), 1);
    let written = ledger
        .descriptor(views[0].descriptor.cpu)
        .expect("view written to its descriptor");
    assert_eq!(written.format, DxgiFormat::R8G8B8A8_UNORM_SRGB);
    assert_eq!(written.view_dimension, SrvDimension::Texture2D);
    assert_eq!(
        written.shader_4_component_mapping,
        DEFAULT_SHADER_4_COMPONENT_MAPPING
    );

    device.destroy_texture(texture);
    assert!(device.texture(texture).is_none());
    assert!(ledger.is_clean());
}

#[test]
fn several_views_share_one_texture() {
    let (mut device, _ledger) = soft_device();
    let texture = device.create_texture(&TextureDesc {
        mip_levels: 4,
        ..texture_desc(64, 64, PixelFormat::R16G16B16A16_Float)
    });

    for mips in 1..=3 {
        let view = device.create_texture_view(&TextureViewDesc {
            texture,
            mip_levels: mips,
            ..Default::default()
        });
        assert_eq!(view, texture);
    }

    let views = device.texture(texture).unwrap().views();
    assert_eq!(views.len(), 3);
    assert_eq!(device.srv_descriptors_in_use(), 3);
    let mips: Vec<u32> = views.iter().map(|v| v.srv.mip_levels).collect();
    assert_eq!(mips, [1, 2, 3]);
    assert!(views.windows(2).all(|w| w[0].descriptor != w[1].descriptor));
}

#[test]
fn view_on_stale_texture_is_invalid() {
    let (mut device, ledger) = soft_device();
    let texture = device.create_texture(&render_target_desc(16, 16));
    device.destroy_texture(texture);

    let view = device.create_texture_view(&TextureViewDesc {
        texture,
        ..Default::default()
    });
    assert!(!view.is_valid());

    let never_created = device.create_texture_view(&TextureViewDesc {
        texture: Handle::default(),
        ..Default::default()
    });
    assert!(!never_created.is_valid());
    assert_eq!(ledger.stats().views_created, 0);
    assert_eq!(device.srv_descriptors_in_use(), 0);
}

#[test]
fn full_descriptor_heap_rejects_views_until_textures_go_away() {
    let (mut device, _ledger) = soft_device_with(
        SoftDriver::new(),
        &DeviceDesc {
            srv_heap_capacity: 1,
            ..Default::default()
        },
    );
    let first = device.create_texture(&texture_desc(8, 8, PixelFormat::R8_Unorm));
    let second = device.create_texture(&texture_desc(8, 8, PixelFormat::R8_Unorm));

    let view = TextureViewDesc {
        texture: first,
        ..Default::default()
    };
    assert_eq!(device.create_texture_view(&view), first);
    assert!(!device.create_texture_view(&view).is_valid());
    assert_eq!(device.texture(first).unwrap().views().len(), 1);

    let other = TextureViewDesc {
        texture: second,
        ..Default::default()
    };
    assert!(!device.create_texture_view(&other).is_valid());
    assert!(device.texture(second).unwrap().views().is_empty());

    device.destroy_texture(first);
    assert_eq!(device.srv_descriptors_in_use(), 0);
    assert_eq!(device.create_texture_view(&other), second);
}

#[test]
fn view_format_and_sampler_are_translated() {
    let (mut device, ledger) = soft_device();
    let texture = device.create_texture(&TextureDesc {
        depth_or_array_size: 4,
        ..texture_desc(32, 32, PixelFormat::R32_Float)
    });

    device.create_texture_view(&TextureViewDesc {
        texture,
        sampler_desc: SamplerDesc {
            compare: CompareOp::Gequal,
            filter: FilterMode::Nearest,
            max_lod: 4.0,
            ..Default::default()
        },
        ..Default::default()
    });

    let view = device.texture(texture).unwrap().views()[0];
    assert_eq!(view.srv.format, DxgiFormat::R32_FLOAT);
    assert_eq!(view.srv.view_dimension, SrvDimension::Texture2DArray);
    assert_eq!(view.srv.array_size, 4);
    assert_eq!(view.sampler.filter, Filter::ComparisonMinMagMipPoint);
    assert_eq!(view.sampler.comparison_func, ComparisonFunc::GreaterEqual);
    assert_eq!(view.sampler.max_lod, 4.0);
    assert_eq!(ledger.descriptor(view.descriptor.cpu), Some(view.srv));
}

#[test]
fn depth_texture_view_reads_a_color_format() {
    let (mut device, ledger) = soft_device();
    let texture = device.create_texture(&TextureDesc {
        usage: TextureUsage::DEPTH_STENCIL,
        ..texture_desc(64, 64, PixelFormat::D32_Float)
    });
    assert!(texture.is_valid());
    assert_eq!(
        device.texture(texture).unwrap().native_desc().format,
        DxgiFormat::R32_TYPELESS
    );

    assert_eq!(
        device.create_texture_view(&TextureViewDesc {
            texture,
            ..Default::default()
        }),
        texture
    );
    let view = device.texture(texture).unwrap().views()[0];
    assert_eq!(view.srv.format, DxgiFormat::R32_FLOAT);
    assert_eq!(ledger.descriptor(view.descriptor.cpu), Some(view.srv));
}

#[test]
fn explicit_view_format_overrides_texture_format() {
    let (mut device, ledger) = soft_device();
    let texture = device.create_texture(&texture_desc(4, 4, PixelFormat::R8G8_Unorm));

    let view = device.create_texture_view(&TextureViewDesc {
        texture,
        format: PixelFormat::R16_Float,
        ..Default::default()
    });
    assert_eq!(view, texture);
    let srv = device.texture(texture).unwrap().views()[0].srv;
    assert_eq!(srv.format, DxgiFormat::R16_FLOAT);
    assert_eq!(ledger.stats().views_created, 1);
}

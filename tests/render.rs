use ray_tracing_lib::{
    config::Config,
    renderer::{unpack_rgba, FrameRenderer},
    settings::RenderSettings,
    snapshot,
};
use winit::event::VirtualKeyCode;

#[test]
fn snapshot_writes_shaded_png() {
    let path = std::env::temp_dir().join("ray_tracing_snapshot_test.png");
    let settings = RenderSettings::new(glam::Vec4::new(1.0, 0.0, 1.0, 1.0), glam::Vec3::NEG_Z);

    snapshot::render_to_file(&settings, 16, 8, &path).unwrap();

    let image = image::open(&path).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (16, 8));
    assert_eq!(image.get_pixel(8, 4).0, [255, 0, 255, 255]);
    assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn configured_controller_drives_a_frame() {
    let config = Config::parse(
        "[render]\ncolor = [0.0, 1.0, 0.0, 1.0]\nlight_direction = [0.0, 0.0, -1.0]",
        std::path::Path::new("inline.toml"),
    )
    .unwrap();
    let mut controller = config.controller();

    let mut renderer: FrameRenderer = FrameRenderer::new();
    renderer.resize(4, 4).unwrap();
    renderer.render(&controller.snapshot()).unwrap();

    // pixel (2, 2) is the screen center
    let center = unpack_rgba(renderer.image_data()[2 + 2 * 4]);
    assert_eq!(center, glam::Vec4::new(0.0, 1.0, 0.0, 1.0));

    // flipping the light to face away from the camera darkens the front
    for _ in 0..40 {
        controller.process_key(VirtualKeyCode::PageUp);
    }
    renderer.render(&controller.snapshot()).unwrap();
    let center = unpack_rgba(renderer.image_data()[2 + 2 * 4]);
    assert_eq!(center, glam::Vec4::new(0.0, 0.0, 0.0, 1.0));
}

#[test]
fn sphere_silhouette_is_round_and_centered() {
    let (width, height) = (64u32, 64u32);
    let mut renderer: FrameRenderer = FrameRenderer::new();
    renderer.resize(width, height).unwrap();
    renderer
        .render(&RenderSettings::new(glam::Vec4::ONE, glam::Vec3::NEG_Z))
        .unwrap();

    let lit = |x: u32, y: u32| renderer.image_data()[(x + y * width) as usize] != 0xff00_0000;

    assert!(lit(32, 32));
    assert!(!lit(0, 32));
    assert!(!lit(32, 0));
    // mirror pixels around the center agree
    for (x, y) in [(20, 32), (32, 20), (24, 24)] {
        assert_eq!(lit(x, y), lit(64 - x, 64 - y));
    }
}

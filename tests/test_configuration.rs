use rastex::{
    BlockProcessor, ChangeParams, FilterConfig, GlcmParams, NlMeansParams, PixelType, RasterError,
    RasterInfo, SpeckleFilterParams, TextureParams, WallisParams, WindowSpec,
};

fn info(bands: usize) -> RasterInfo {
    RasterInfo::new(bands, PixelType::U8)
}

fn expect_configuration_error(config: FilterConfig, info: RasterInfo) {
    match BlockProcessor::configure(config, info) {
        Err(RasterError::Configuration(_)) => {}
        Err(other) => panic!("expected configuration error, got {:?}", other),
        Ok(_) => panic!("expected configuration error, got a configured processor"),
    }
}

#[test]
fn test_window_size_coercion_is_stable() {
    // Even sizes move up to the next odd value; odd sizes are stable.
    for n in 1..=32 {
        let spec = WindowSpec::new(n);
        assert_eq!(spec.size() % 2, 1);
        assert!(spec.size() >= n);
        assert_eq!(WindowSpec::new(spec.size()).size(), spec.size());
    }
}

#[test]
fn test_band_count_constraints() {
    expect_configuration_error(FilterConfig::Glcm(GlcmParams::default()), info(2));
    expect_configuration_error(FilterConfig::Texture(TextureParams::default()), info(2));
    expect_configuration_error(
        FilterConfig::ChangeDetection(ChangeParams::default()),
        info(1),
    );

    assert!(BlockProcessor::configure(FilterConfig::Glcm(GlcmParams::default()), info(1)).is_ok());
    assert!(BlockProcessor::configure(
        FilterConfig::ChangeDetection(ChangeParams::default()),
        info(2)
    )
    .is_ok());
}

#[test]
fn test_numeric_parameter_domains() {
    expect_configuration_error(
        FilterConfig::Frost(SpeckleFilterParams {
            damping_factor: -0.5,
            ..Default::default()
        }),
        info(1),
    );
    expect_configuration_error(
        FilterConfig::Glcm(GlcmParams {
            levels: 100,
            ..Default::default()
        }),
        info(1),
    );
    expect_configuration_error(
        FilterConfig::Glcm(GlcmParams {
            displacement: 0,
            ..Default::default()
        }),
        info(1),
    );
    expect_configuration_error(
        FilterConfig::Wallis(WallisParams {
            desired_mean: 256.0,
            ..Default::default()
        }),
        info(1),
    );
    expect_configuration_error(
        FilterConfig::Wallis(WallisParams {
            alpha: -1.0,
            ..Default::default()
        }),
        info(1),
    );
    expect_configuration_error(
        FilterConfig::NlMeans(NlMeansParams {
            cutoff_distance: -0.1,
            ..Default::default()
        }),
        info(1),
    );
}

#[test]
fn test_change_detection_band_indices() {
    expect_configuration_error(
        FilterConfig::ChangeDetection(ChangeParams {
            source_band_a: 0,
            ..Default::default()
        }),
        info(2),
    );
    expect_configuration_error(
        FilterConfig::ChangeDetection(ChangeParams {
            source_band_b: 5,
            ..Default::default()
        }),
        info(2),
    );
}

#[test]
fn test_valid_defaults_configure_for_every_filter() {
    let configs = [
        FilterConfig::Lee(SpeckleFilterParams::default()),
        FilterConfig::Kuan(SpeckleFilterParams::default()),
        FilterConfig::Frost(SpeckleFilterParams::default()),
        FilterConfig::Median(SpeckleFilterParams::default()),
        FilterConfig::Wallis(WallisParams::default()),
        FilterConfig::NlMeans(NlMeansParams::default()),
    ];
    for config in configs {
        assert!(BlockProcessor::configure(config, info(2)).is_ok());
    }
}

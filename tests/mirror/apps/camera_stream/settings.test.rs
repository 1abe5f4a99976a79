// [tests/mirror/apps/camera_stream/settings.test.rs]
/**
 * =================================================================
 * APARATO: SETTINGS HYDRATION TEST
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L0-MIRROR
 * OBJETIVO: Certificar el recorte de rangos y la degradación ante
 *           variables sucias del entorno.
 * =================================================================
 */

use faceguard_camera_stream::config::Settings;

/// Un único punto de entrada: las mutaciones de entorno de este banco
/// viven en su propio binario de pruebas y se evalúan secuencialmente.
#[test]
fn certify_environment_hydration_clamping_and_degradation() {
    println!("\n📡 [PROVING_GROUNDS]: Settings hydration audit...");

    // 1. DEFAULTS: entorno virgen.
    let default_settings = Settings::from_env();
    assert_eq!(default_settings.service_port, 8003);
    assert_eq!(default_settings.camera_frame_rate, 2);
    assert_eq!(default_settings.camera_sources, vec!["0".to_string()]);
    assert_eq!(default_settings.max_concurrent_cameras, 4);
    assert!(default_settings.enable_event_publishing);

    // 2. LISTA DE FUENTES: separada por comas y sin fragmentos vacíos.
    std::env::set_var("CAMERA_SOURCES", "0, rtsp://cam.example.com/a ,, 2");
    let multi_source_settings = Settings::from_env();
    assert_eq!(
        multi_source_settings.camera_sources,
        vec!["0".to_string(), "rtsp://cam.example.com/a".to_string(), "2".to_string()]
    );

    // 3. RECORTE DE RANGOS: valores fuera de frontera se recortan.
    std::env::set_var("CAMERA_FRAME_RATE", "120");
    std::env::set_var("MAX_CONCURRENT_CAMERAS", "64");
    std::env::set_var("CAMERA_RECONNECT_DELAY", "0");
    std::env::set_var("FRAME_QUALITY_THRESHOLD", "1.7");
    let clamped_settings = Settings::from_env();
    assert_eq!(clamped_settings.camera_frame_rate, 30);
    assert_eq!(clamped_settings.max_concurrent_cameras, 16);
    assert_eq!(clamped_settings.camera_reconnect_delay_seconds, 1);
    assert!((clamped_settings.frame_quality_threshold - 1.0).abs() < f64::EPSILON);

    // 4. DEGRADACIÓN: basura imparseable cae al default.
    std::env::set_var("CAMERA_FRAME_RATE", "not-a-number");
    let degraded_settings = Settings::from_env();
    assert_eq!(degraded_settings.camera_frame_rate, 2);

    // 5. BANDERAS: formatos habituales de verdad.
    std::env::set_var("ENABLE_EVENT_PUBLISHING", "0");
    std::env::set_var("ENABLE_FRAME_QUALITY_CHECK", "yes");
    let flag_settings = Settings::from_env();
    assert!(!flag_settings.enable_event_publishing);
    assert!(flag_settings.enable_frame_quality_check);

    // 6. URL DERIVADA DEL BUS.
    std::env::set_var("REDIS_HOST", "cache.internal");
    std::env::set_var("REDIS_PORT", "6380");
    std::env::set_var("REDIS_DB", "2");
    let redis_settings = Settings::from_env();
    assert_eq!(redis_settings.redis_url(), "redis://cache.internal:6380/2");

    println!("✅ SETTINGS: Hydration, clamping and degradation certified.");
}

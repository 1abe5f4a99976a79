// [tests/mirror/apps/camera_stream/services/source_kind.test.rs]
/**
 * =================================================================
 * APARATO: SOURCE KIND DETECTION TEST
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-MIRROR
 * OBJETIVO: Certificar la clasificación de URIs fuente de cámara.
 * =================================================================
 */

use faceguard_camera_stream::services::frame_source::detect_source_kind;
use faceguard_domain_models::CameraSourceKind;

#[test]
fn certify_device_index_detection() {
    assert_eq!(detect_source_kind("0"), CameraSourceKind::Device);
    assert_eq!(detect_source_kind("12"), CameraSourceKind::Device);
    assert_eq!(detect_source_kind(" 3 "), CameraSourceKind::Device);
}

#[test]
fn certify_streaming_protocol_detection() {
    assert_eq!(detect_source_kind("rtsp://10.0.0.5:554/stream1"), CameraSourceKind::Rtsp);
    assert_eq!(detect_source_kind("rtmp://media.example.com/live"), CameraSourceKind::Rtsp);
}

#[test]
fn certify_network_camera_detection() {
    assert_eq!(detect_source_kind("http://cam.example.com/mjpeg"), CameraSourceKind::Ip);
    assert_eq!(detect_source_kind("https://cam.example.com/feed"), CameraSourceKind::Ip);
}

#[test]
fn certify_file_source_detection() {
    assert_eq!(detect_source_kind("file:///srv/footage/lobby.mp4"), CameraSourceKind::File);
    assert_eq!(detect_source_kind("/srv/footage/lobby.avi"), CameraSourceKind::File);
    assert_eq!(detect_source_kind("lobby.mov"), CameraSourceKind::File);
    assert_eq!(detect_source_kind("evidence.MP4"), CameraSourceKind::File);
}

#[test]
fn certify_ambiguous_source_degrades_to_device() {
    println!("\n📡 [PROVING_GROUNDS]: Ambiguous source fallback audit...");
    assert_eq!(detect_source_kind("mystery-source"), CameraSourceKind::Device);
    println!("   ✅ [SUCCESS]: Unknown URIs degrade to local device.");
}

// [tests/mirror/apps/camera_stream/services/frame_quality.test.rs]
/**
 * =================================================================
 * APARATO: FRAME QUALITY GATE TEST
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-MIRROR
 * OBJETIVO: Certificar la puntuación compuesta 0.40/0.30/0.30 y el
 *           recorte facial con límites y mínimo 50x50.
 * =================================================================
 */

use faceguard_camera_stream::services::frame_source::{
    assess_frame_quality, crop_face_region, encode_frame_jpeg, RawFrame,
};
use faceguard_domain_models::FrameQualityGrade;

fn uniform_frame(width: u32, height: u32, level: u8) -> RawFrame {
    RawFrame { pixels: vec![level; (width * height * 3) as usize], width, height }
}

fn checkerboard_frame(width: u32, height: u32) -> RawFrame {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for row in 0..height {
        for column in 0..width {
            let level = if (row + column) % 2 == 0 { 255u8 } else { 0u8 };
            pixels.extend_from_slice(&[level, level, level]);
        }
    }
    RawFrame { pixels, width, height }
}

#[test]
fn certify_flat_midgray_frame_scores_brightness_only() {
    println!("\n📡 [PROVING_GROUNDS]: Quality gate audit (flat mid-gray)...");
    let frame = uniform_frame(64, 64, 128);
    let (quality_score, quality_grade) = assess_frame_quality(&frame);

    // Sin nitidez ni contraste: solo sobrevive el término de brillo (~0.30).
    assert!(quality_score > 0.25 && quality_score < 0.35, "score {quality_score} out of band");
    assert_eq!(quality_grade, FrameQualityGrade::Poor);
    println!("   ✅ [SUCCESS]: Flat frame graded Poor with score {:.3}.", quality_score);
}

#[test]
fn certify_black_frame_is_unusable() {
    let frame = uniform_frame(64, 64, 0);
    let (quality_score, quality_grade) = assess_frame_quality(&frame);
    assert!(quality_score < 0.05);
    assert_eq!(quality_grade, FrameQualityGrade::Unusable);
}

#[test]
fn certify_checkerboard_maximizes_all_terms() {
    let frame = checkerboard_frame(64, 64);
    let (quality_score, quality_grade) = assess_frame_quality(&frame);

    // Nitidez y contraste saturados, brillo en el punto medio.
    assert!(quality_score > 0.95, "score {quality_score} below saturation band");
    assert_eq!(quality_grade, FrameQualityGrade::Excellent);
}

#[test]
fn certify_face_crop_clamping_and_minimum_size() {
    let frame = uniform_frame(200, 150, 90);

    // Recorte nominal dentro de límites.
    let nominal_crop = crop_face_region(&frame, &[10.0, 10.0, 110.0, 110.0]).expect("crop expected");
    assert_eq!(nominal_crop.width, 100);
    assert_eq!(nominal_crop.height, 100);

    // Caja desbordada: se recorta a los límites físicos del frame.
    let clamped_crop = crop_face_region(&frame, &[-50.0, -30.0, 500.0, 500.0]).expect("crop expected");
    assert_eq!(clamped_crop.width, 200);
    assert_eq!(clamped_crop.height, 150);

    // Región menor al mínimo forense de 50x50: descartada.
    assert!(crop_face_region(&frame, &[0.0, 0.0, 40.0, 40.0]).is_none());

    // Caja malformada: descartada.
    assert!(crop_face_region(&frame, &[1.0, 2.0, 3.0]).is_none());
}

#[test]
fn certify_jpeg_encoding_produces_magic_bytes() {
    let frame = checkerboard_frame(64, 64);
    let jpeg_bytes = encode_frame_jpeg(&frame, 85).expect("encode expected");
    assert!(jpeg_bytes.len() > 100);
    assert_eq!(&jpeg_bytes[0..2], &[0xFF, 0xD8], "JPEG SOI marker expected");
}

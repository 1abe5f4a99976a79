// [apps/camera-stream/src/main.rs]
/*!
 * =================================================================
 * APARATO: CAMERA STREAM ENTRY POINT (V2.1 - IGNITION SHELL)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE ENTORNO, TRAZAS Y RUNTIME
 * =================================================================
 */

use dotenvy::dotenv;
use faceguard_camera_stream::prelude::*;
use faceguard_shared_watchtower::init_tracing;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    // 1. CARGA DE ENTORNO SOBERANO.
    dotenv().ok();

    // 2. OBSERVABILIDAD NEURAL (WATCHTOWER).
    init_tracing("faceguard_camera_stream");

    // 3. RUNTIME MULTIHILO DEL PIPELINE.
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        info!("🛰️  [CAMERA_STREAM]: Ignition sequence starting...");

        let settings = Settings::from_env();
        info!(
            "⚙️  [CAMERA_STREAM]: {} sources, {} FPS target, pool size {}.",
            settings.camera_sources.len(),
            settings.camera_frame_rate,
            settings.max_concurrent_cameras
        );

        let kernel = match CameraStreamKernel::ignite(settings).await {
            Ok(kernel) => kernel,
            Err(ignition_fault) => {
                error!("💀 [CAMERA_STREAM]: Ignition collapsed: {}", ignition_fault);
                std::process::exit(1);
            }
        };

        kernel.launch_operations().await
    })
}

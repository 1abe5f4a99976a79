// INICIO DEL ARCHIVO [apps/camera-stream/src/kernel.rs]
/*!
 * =================================================================
 * APARATO: CAMERA STREAM KERNEL (V2.4 - COMPOSITION ROOT)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: IGNICIÓN DE SERVICIOS Y TRANSPORTE HTTP
 *
 * # Secuencia de apagado:
 * señal -> detener bucles de stream -> cancelar centinela -> drenar
 * cola de avistamientos (gracia) -> vaciar lote de eventos -> liberar
 * handles de cámara -> cerrar el transporte.
 * =================================================================
 */

use crate::config::Settings;
use crate::routes::create_camera_stream_router;
use crate::state::AppState;
use std::net::{IpAddr, SocketAddr};
use tracing::{error, info};

pub struct CameraStreamKernel {
    pub server_network_port: u16,
    pub application_shared_state: AppState,
}

impl CameraStreamKernel {
    /// Forja el estado neural completo del servicio de cámaras.
    pub async fn ignite(settings: Settings) -> anyhow::Result<Self> {
        let server_network_port = settings.service_port;
        let application_shared_state = AppState::ignite(settings).await?;

        Ok(Self { server_network_port, application_shared_state })
    }

    /// Lanza daemons, registra cámaras y abre el transporte Axum.
    pub async fn launch_operations(self) -> anyhow::Result<()> {
        let shared_application_state = self.application_shared_state.clone();

        // 1. REGISTRO DE CÁMARAS + CENTINELA DE SALUD.
        shared_application_state.camera_manager.initialize().await;

        // 2. IGNICIÓN DE STREAMS HABILITADOS.
        shared_application_state.camera_manager.start_all_streams().await;

        // 3. TRANSPORTE HTTP CON APAGADO ORDENADO.
        let bind_address = SocketAddr::new(
            shared_application_state
                .settings
                .service_host
                .parse::<IpAddr>()
                .unwrap_or_else(|_| "0.0.0.0".parse().expect("static address")),
            self.server_network_port,
        );

        let camera_stream_router = create_camera_stream_router(shared_application_state.clone());

        info!("🚀 [KERNEL_ONLINE]: Camera stream service listening at {}.", bind_address);

        let tcp_listener = tokio::net::TcpListener::bind(bind_address).await?;

        let state_for_shutdown = shared_application_state.clone();
        let serve_result = axum::serve(tcp_listener, camera_stream_router)
            .with_graceful_shutdown(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("🛑 [KERNEL]: Termination signal received. Draining pipeline...");
                    state_for_shutdown.camera_manager.shutdown().await;
                }
            })
            .await;

        if let Err(server_error) = serve_result {
            error!("💀 [KERNEL_COLLAPSE]: Transport runtime failure: {}", server_error);
            return Err(server_error.into());
        }

        Ok(())
    }
}
// FIN DEL ARCHIVO [apps/camera-stream/src/kernel.rs]

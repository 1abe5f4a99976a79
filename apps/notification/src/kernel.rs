// INICIO DEL ARCHIVO [apps/notification/src/kernel.rs]
/*!
 * =================================================================
 * APARATO: NOTIFICATION KERNEL (V2.3 - COMPOSITION ROOT)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: IGNICIÓN DE DAEMONS Y TRANSPORTE HTTP
 * =================================================================
 */

use crate::config::Settings;
use crate::routes::create_notification_router;
use crate::state::AppState;
use std::net::{IpAddr, SocketAddr};
use tracing::{error, info};

pub struct NotificationKernel {
    pub server_network_port: u16,
    pub application_shared_state: AppState,
}

impl NotificationKernel {
    pub fn ignite(settings: Settings) -> anyhow::Result<Self> {
        let server_network_port = settings.service_port;
        let application_shared_state = AppState::ignite(settings)?;

        Ok(Self { server_network_port, application_shared_state })
    }

    /// Enciende el centinela de escalamiento y abre el transporte Axum.
    pub async fn launch_operations(self) -> anyhow::Result<()> {
        let shared_application_state = self.application_shared_state.clone();

        // 1. CENTINELA DE ESCALAMIENTO Y AUTO-RESOLUCIÓN.
        shared_application_state
            .escalation_sentinel
            .spawn_sentinel(shared_application_state.settings.escalation_check_interval_seconds);

        // 2. TRANSPORTE HTTP.
        let bind_address = SocketAddr::new(
            shared_application_state
                .settings
                .service_host
                .parse::<IpAddr>()
                .unwrap_or_else(|_| "0.0.0.0".parse().expect("static address")),
            self.server_network_port,
        );

        let notification_router = create_notification_router(shared_application_state);

        info!("🚀 [KERNEL_ONLINE]: Notification service listening at {}.", bind_address);

        let tcp_listener = tokio::net::TcpListener::bind(bind_address).await?;

        let serve_result = axum::serve(tcp_listener, notification_router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("🛑 [KERNEL]: Termination signal received. Closing transport...");
            })
            .await;

        if let Err(server_error) = serve_result {
            error!("💀 [KERNEL_COLLAPSE]: Transport runtime failure: {}", server_error);
            return Err(server_error.into());
        }

        Ok(())
    }
}
// FIN DEL ARCHIVO [apps/notification/src/kernel.rs]

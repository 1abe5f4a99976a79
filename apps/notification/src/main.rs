// [apps/notification/src/main.rs]
/*!
 * =================================================================
 * APARATO: NOTIFICATION ENTRY POINT (V2.1 - IGNITION SHELL)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE ENTORNO, TRAZAS Y RUNTIME
 * =================================================================
 */

use dotenvy::dotenv;
use faceguard_notification::prelude::*;
use faceguard_shared_watchtower::init_tracing;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    // 1. CARGA DE ENTORNO SOBERANO.
    dotenv().ok();

    // 2. OBSERVABILIDAD NEURAL (WATCHTOWER).
    init_tracing("faceguard_notification");

    // 3. RUNTIME MULTIHILO DEL SERVICIO.
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        info!("🛰️  [NOTIFICATION]: Ignition sequence starting...");

        let settings = Settings::from_env();

        let kernel = match NotificationKernel::ignite(settings) {
            Ok(kernel) => kernel,
            Err(ignition_fault) => {
                error!("💀 [NOTIFICATION]: Ignition collapsed: {}", ignition_fault);
                std::process::exit(1);
            }
        };

        kernel.launch_operations().await
    })
}

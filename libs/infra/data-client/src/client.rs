// [libs/infra/data-client/src/client.rs]
/*!
 * =================================================================
 * APARATO: CORE DATA UPLINK (V6.4 - GOLD MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE AVISTAMIENTOS Y PERFILES VIP
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SESSION LONGEVITY: Un único cliente reqwest endurecido por
 *    servicio, compartido entre todas las tareas del pipeline.
 * 2. RESULT DISCIPLINE: Todo fallo de red o rechazo remoto viaja
 *    como valor; el hot path decide absorberlo y contarlo.
 *
 * # Mathematical Proof (Non-Blocking Persistence):
 * Las subidas de avistamiento se ejecutan en tareas desprendidas;
 * el timeout de 30s acota el peor caso sin tocar el bucle de stream.
 * =================================================================
 */

use faceguard_domain_models::{
    AlertInstance, DeliveryRecord, PersonContactLink, PersonPriorityProfile, Sighting,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::errors::DataClientError;

/// Timeout de las subidas de avistamiento hacia el servicio de datos.
const SIGHTING_UPLOAD_TIMEOUT_SECONDS: u64 = 30;

#[derive(Deserialize)]
struct SightingUploadReceipt {
    #[serde(default)]
    id: Option<String>,
}

/// Respuesta flexible del endpoint de contactos: lista plana o envuelta.
#[derive(Deserialize)]
#[serde(untagged)]
enum ContactsEnvelope {
    Flat(Vec<PersonContactLink>),
    Wrapped { contacts: Vec<PersonContactLink> },
}

/// Cliente del servicio de datos central (persistencia autoritativa).
pub struct CoreDataClient {
    network_session_client: Client,
    data_service_base_endpoint: String,
}

impl CoreDataClient {
    /// # Errors:
    /// `Configuration` si la URL base llega vacía.
    pub fn new(base_url: &str) -> Result<Self, DataClientError> {
        if base_url.trim().is_empty() {
            return Err(DataClientError::Configuration(
                "core_data_service_url not defined".to_string(),
            ));
        }

        let network_client = Client::builder()
            .timeout(Duration::from_secs(SIGHTING_UPLOAD_TIMEOUT_SECONDS))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .user_agent("FaceGuard-CameraStream/2.0")
            .build()?;

        Ok(Self {
            network_session_client: network_client,
            data_service_base_endpoint: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Sube un avistamiento con su recorte facial en multipart.
    /// HTTP 201 certifica la persistencia y devuelve el id asignado.
    #[instrument(skip(self, sighting), fields(person = %sighting.person_id, camera = %sighting.camera_id))]
    pub async fn upload_sighting(&self, sighting: &Sighting) -> Result<Option<String>, DataClientError> {
        let target_url = format!("{}/sightings/with-image", self.data_service_base_endpoint);

        let mut multipart_form = Form::new()
            .text("person_id", sighting.person_id.clone())
            .text("camera_id", sighting.camera_id.clone())
            .text("confidence_score", sighting.confidence.to_string())
            .text("source_type", "camera_stream".to_string())
            .text("face_bbox", serde_json::to_string(&sighting.face_bbox).unwrap_or_default());

        if let Some(crop_bytes) = &sighting.face_crop_jpeg {
            let image_part = Part::bytes(crop_bytes.clone())
                .file_name(format!("sighting_{}.jpg", sighting.timestamp.timestamp()))
                .mime_str("image/jpeg")
                .map_err(|mime_fault| DataClientError::Decode(mime_fault.to_string()))?;
            multipart_form = multipart_form.part("image", image_part);
        }

        let network_response = self
            .network_session_client
            .post(&target_url)
            .multipart(multipart_form)
            .send()
            .await?;

        if network_response.status() == StatusCode::CREATED {
            let receipt: SightingUploadReceipt = network_response
                .json()
                .await
                .unwrap_or(SightingUploadReceipt { id: None });
            debug!("📦 [DATA_UPLINK]: Sighting crystallized. Assigned id: {:?}", receipt.id);
            Ok(receipt.id)
        } else {
            let status_code = network_response.status().as_u16();
            let diagnostic_body = network_response.text().await.unwrap_or_default();
            Err(DataClientError::Rejected { status: status_code, detail: diagnostic_body })
        }
    }

    /// Consulta el estatus de prioridad de una persona reconocida.
    /// El evaluador degrada a alerta básica cuando este enlace colapsa.
    #[instrument(skip(self))]
    pub async fn check_person_priority(
        &self,
        person_id: &str,
    ) -> Result<PersonPriorityProfile, DataClientError> {
        let target_url = format!(
            "{}/high-priority-persons/check/{}",
            self.data_service_base_endpoint, person_id
        );

        let network_response = self.network_session_client.get(&target_url).send().await?;

        if network_response.status().is_success() {
            network_response
                .json::<PersonPriorityProfile>()
                .await
                .map_err(|decode_fault| DataClientError::Decode(decode_fault.to_string()))
        } else {
            Err(DataClientError::Rejected {
                status: network_response.status().as_u16(),
                detail: network_response.text().await.unwrap_or_default(),
            })
        }
    }

    /// Recupera la tabla de enlace persona-prioritaria <-> contactos.
    #[instrument(skip(self))]
    pub async fn fetch_person_contacts(
        &self,
        person_id: &str,
    ) -> Result<Vec<PersonContactLink>, DataClientError> {
        let target_url = format!(
            "{}/high-priority-persons/{}/notification-contacts",
            self.data_service_base_endpoint, person_id
        );

        let network_response = self.network_session_client.get(&target_url).send().await?;

        if !network_response.status().is_success() {
            return Err(DataClientError::Rejected {
                status: network_response.status().as_u16(),
                detail: network_response.text().await.unwrap_or_default(),
            });
        }

        let envelope: ContactsEnvelope = network_response
            .json()
            .await
            .map_err(|decode_fault| DataClientError::Decode(decode_fault.to_string()))?;

        Ok(match envelope {
            ContactsEnvelope::Flat(contacts) => contacts,
            ContactsEnvelope::Wrapped { contacts } => contacts,
        })
    }

    /// Registra el desenlace de una entrega en el rastro autoritativo.
    /// Fallo tolerado: el registro en memoria del motor sigue siendo la
    /// fuente caliente para la superficie de logs.
    pub async fn record_delivery(&self, delivery_record: &DeliveryRecord) -> Result<(), DataClientError> {
        let target_url = format!("{}/notifications/logs", self.data_service_base_endpoint);

        let network_response = self
            .network_session_client
            .post(&target_url)
            .json(delivery_record)
            .send()
            .await?;

        if network_response.status().is_success() {
            Ok(())
        } else {
            let status_code = network_response.status().as_u16();
            warn!("⚠️ [DATA_UPLINK]: Delivery log rejected with HTTP {}.", status_code);
            Err(DataClientError::Rejected {
                status: status_code,
                detail: network_response.text().await.unwrap_or_default(),
            })
        }
    }

    /// Persiste una instancia de alerta disparada.
    pub async fn persist_alert_instance(
        &self,
        alert_instance: &AlertInstance,
    ) -> Result<(), DataClientError> {
        let target_url = format!("{}/alerts/instances", self.data_service_base_endpoint);

        let network_response = self
            .network_session_client
            .post(&target_url)
            .json(alert_instance)
            .send()
            .await?;

        if network_response.status().is_success() {
            Ok(())
        } else {
            Err(DataClientError::Rejected {
                status: network_response.status().as_u16(),
                detail: network_response.text().await.unwrap_or_default(),
            })
        }
    }
}

/// Cliente del servicio de notificaciones (disparo de evaluación de alertas).
pub struct NotificationClient {
    network_session_client: Client,
    notification_base_endpoint: String,
}

impl NotificationClient {
    pub fn new(base_url: &str) -> Result<Self, DataClientError> {
        if base_url.trim().is_empty() {
            return Err(DataClientError::Configuration(
                "notification_service_url not defined".to_string(),
            ));
        }

        let network_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("FaceGuard-CameraStream/2.0")
            .build()?;

        Ok(Self {
            network_session_client: network_client,
            notification_base_endpoint: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Construye el sobre JSON del disparador de evaluación.
    /// Expuesto para la certificación de contrato en el espejo de pruebas.
    pub fn build_evaluation_payload(sighting: &Sighting, assigned_sighting_id: Option<&str>) -> serde_json::Value {
        serde_json::json!({
            "sighting_id": assigned_sighting_id.unwrap_or(&sighting.sighting_id),
            "person_id": sighting.person_id,
            "camera_id": sighting.camera_id,
            "confidence_score": sighting.confidence,
            "timestamp": sighting.timestamp.to_rfc3339(),
            "source_type": "camera_stream",
            "face_bbox": sighting.face_bbox,
            "metadata": sighting.frame_metadata.clone().unwrap_or(serde_json::json!({})),
        })
    }

    /// Somete el avistamiento al pipeline de alertas. El servicio
    /// remoto responde 'queued' en ~10ms; aquí solo validamos el estado.
    #[instrument(skip(self, sighting), fields(person = %sighting.person_id))]
    pub async fn trigger_alert_evaluation(
        &self,
        sighting: &Sighting,
        assigned_sighting_id: Option<&str>,
    ) -> Result<(), DataClientError> {
        let target_url = format!(
            "{}/alert-evaluation/evaluate-sighting",
            self.notification_base_endpoint
        );

        let evaluation_payload = Self::build_evaluation_payload(sighting, assigned_sighting_id);

        let network_response = self
            .network_session_client
            .post(&target_url)
            .json(&evaluation_payload)
            .send()
            .await?;

        if network_response.status().is_success() {
            Ok(())
        } else {
            Err(DataClientError::Rejected {
                status: network_response.status().as_u16(),
                detail: network_response.text().await.unwrap_or_default(),
            })
        }
    }
}

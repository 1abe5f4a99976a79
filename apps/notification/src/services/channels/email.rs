// [apps/notification/src/services/channels/email.rs]
/*!
 * =================================================================
 * APARATO: SMTP EMAIL ENGINE (V2.6 - MULTIPART MASTER)
 * CLASIFICACIÓN: DELIVERY ADAPTER (ESTRATO L4-APP)
 * RESPONSABILIDAD: CORREO MULTIPART/ALTERNATIVE CON CROMÁTICA DE PRIORIDAD
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DUAL VARIANT: Toda alerta viaja con variante HTML y texto plano;
 *    el recorte facial se adjunta cuando está disponible.
 * 2. PRIORITY CHROMATICS: Encabezado coloreado por prioridad
 *    (low=verde, medium=ámbar, high=naranja, critical=rojo).
 * 3. TLS DOCTRINE: STARTTLS sobre el puerto de envío o TLS directo;
 *    autenticación solo cuando el canal declara credenciales.
 * =================================================================
 */

use std::time::Duration;

use chrono::Utc;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, instrument};

use super::DeliveryError;

/// Contexto de composición de un correo de alerta.
#[derive(Debug, Clone)]
pub struct AlertEmailContext {
    pub alert_id: String,
    pub priority_label: String,
    pub priority_color: String,
    pub person_id: String,
    pub camera_id: String,
    pub confidence: f64,
    pub triggered_at: String,
    pub rule_name: String,
    pub body_override: Option<String>,
    pub face_crop_jpeg: Option<Vec<u8>>,
}

/// Variante HTML con encabezado cromático por prioridad.
pub fn render_alert_html(context: &AlertEmailContext) -> String {
    if let Some(custom_body) = &context.body_override {
        if custom_body.trim_start().starts_with('<') {
            return custom_body.clone();
        }
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>FaceGuard Alert</title></head>
<body style="font-family: 'Segoe UI', Tahoma, sans-serif; margin: 0; padding: 20px; background-color: #f8f9fa;">
  <div style="max-width: 600px; margin: 0 auto; background-color: white; border-radius: 12px; overflow: hidden;">
    <div style="background-color: {color}; color: white; padding: 30px 20px; text-align: center;">
      <h1 style="margin: 0;">🚨 FaceGuard Alert</h1>
      <p style="margin: 10px 0 0 0;"><span style="padding: 6px 12px; border-radius: 20px; background-color: rgba(0,0,0,0.2); font-weight: bold;">{priority} PRIORITY</span></p>
    </div>
    <div style="padding: 30px;">
      <h2 style="color: #333;">Person Detection Alert</h2>
      <table style="width: 100%; border-collapse: collapse;">
        <tr><td style="padding: 12px 0; border-bottom: 1px solid #eee; font-weight: 600; width: 30%;">Person:</td><td><strong>{person}</strong></td></tr>
        <tr><td style="padding: 12px 0; border-bottom: 1px solid #eee; font-weight: 600;">Camera:</td><td>{camera}</td></tr>
        <tr><td style="padding: 12px 0; border-bottom: 1px solid #eee; font-weight: 600;">Confidence:</td><td><strong>{confidence:.1}%</strong></td></tr>
        <tr><td style="padding: 12px 0; border-bottom: 1px solid #eee; font-weight: 600;">Detection Time:</td><td>{triggered}</td></tr>
        <tr><td style="padding: 12px 0; border-bottom: 1px solid #eee; font-weight: 600;">Alert Rule:</td><td>{rule}</td></tr>
        <tr><td style="padding: 12px 0; font-weight: 600;">Alert ID:</td><td>{alert_id}</td></tr>
      </table>
    </div>
    <div style="background-color: #f8f9fa; padding: 25px; text-align: center; border-top: 1px solid #dee2e6;">
      <p style="margin: 0; color: #6c757d; font-size: 12px;">
        <strong>FaceGuard V2 Security System</strong><br>
        Automated Alert • Generated at {generated} UTC<br>
        This is an automated message. Please do not reply to this email.
      </p>
    </div>
  </div>
</body>
</html>"#,
        color = context.priority_color,
        priority = context.priority_label.to_uppercase(),
        person = context.person_id,
        camera = context.camera_id,
        confidence = context.confidence * 100.0,
        triggered = context.triggered_at,
        rule = context.rule_name,
        alert_id = context.alert_id,
        generated = Utc::now().format("%Y-%m-%d %H:%M:%S"),
    )
}

/// Variante de texto plano (fallback multipart/alternative).
pub fn render_alert_text(context: &AlertEmailContext) -> String {
    if let Some(custom_body) = &context.body_override {
        if !custom_body.trim_start().starts_with('<') {
            return custom_body.clone();
        }
    }

    format!(
        "FACEGUARD ALERT - {priority} PRIORITY\n\n\
         Person Detected: {person}\n\
         Camera: {camera}\n\
         Confidence: {confidence:.1}%\n\
         Detection Time: {triggered}\n\
         Alert Rule: {rule}\n\
         Alert ID: {alert_id}\n\n\
         This is an automated alert from FaceGuard V2 Security System.\n\
         Generated at {generated} UTC",
        priority = context.priority_label.to_uppercase(),
        person = context.person_id,
        camera = context.camera_id,
        confidence = context.confidence * 100.0,
        triggered = context.triggered_at,
        rule = context.rule_name,
        alert_id = context.alert_id,
        generated = Utc::now().format("%Y-%m-%d %H:%M:%S"),
    )
}

/// Ensambla el mensaje multipart/alternative con adjunto opcional.
pub fn build_alert_email(
    from_email: &str,
    to_email: &str,
    subject: &str,
    context: &AlertEmailContext,
) -> Result<Message, DeliveryError> {
    let from_mailbox: Mailbox = from_email
        .parse()
        .map_err(|parse_fault| DeliveryError::Configuration(format!("from address invalid: {parse_fault}")))?;
    let to_mailbox: Mailbox = to_email
        .parse()
        .map_err(|parse_fault| DeliveryError::Configuration(format!("recipient address invalid: {parse_fault}")))?;

    let alternative_body =
        MultiPart::alternative_plain_html(render_alert_text(context), render_alert_html(context));

    let message_builder = Message::builder().from(from_mailbox).to(to_mailbox).subject(subject);

    let assembled_message = match &context.face_crop_jpeg {
        Some(crop_bytes) => {
            let jpeg_content_type = ContentType::parse("image/jpeg")
                .map_err(|mime_fault| DeliveryError::Configuration(mime_fault.to_string()))?;
            let face_attachment =
                Attachment::new("detected_face.jpg".to_string()).body(crop_bytes.clone(), jpeg_content_type);

            message_builder.multipart(MultiPart::mixed().multipart(alternative_body).singlepart(face_attachment))
        }
        None => message_builder.multipart(alternative_body),
    }
    .map_err(|assembly_fault| DeliveryError::Configuration(assembly_fault.to_string()))?;

    Ok(assembled_message)
}

/// Motor SMTP asíncrono con STARTTLS o TLS directo.
pub struct SmtpEmailEngine;

impl SmtpEmailEngine {
    /// Despacha el mensaje; las credenciales son opcionales.
    #[instrument(skip_all, fields(host = %smtp_host))]
    pub async fn send_email(
        smtp_host: &str,
        smtp_port: u16,
        use_tls: bool,
        use_ssl: bool,
        username: Option<&str>,
        password: Option<&str>,
        message: Message,
        attempt_timeout: Duration,
    ) -> Result<(), DeliveryError> {
        let mut transport_builder = if use_ssl {
            // TLS directo (wrapper) sobre el puerto declarado.
            AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)
                .map_err(|relay_fault| DeliveryError::Smtp(relay_fault.to_string()))?
        } else if use_tls {
            // STARTTLS sobre el puerto de envío estándar.
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)
                .map_err(|relay_fault| DeliveryError::Smtp(relay_fault.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host)
        };

        transport_builder = transport_builder.port(smtp_port).timeout(Some(attempt_timeout));

        if let (Some(auth_username), Some(auth_password)) = (username, password) {
            transport_builder = transport_builder
                .credentials(Credentials::new(auth_username.to_string(), auth_password.to_string()));
        }

        let smtp_transport = transport_builder.build();

        smtp_transport
            .send(message)
            .await
            .map_err(|send_fault| DeliveryError::Smtp(send_fault.to_string()))?;

        debug!("📧 [EMAIL_ENGINE]: Message accepted by SMTP relay {}.", smtp_host);
        Ok(())
    }
}

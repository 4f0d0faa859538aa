//! Package records: the canonical shape every other module works with.
//!
//! Raw input (legacy spreadsheet rows, web form payloads) is decoded once
//! through [`PackageRecord::from_raw`] / [`PackageDraft::from_raw`]; after
//! that nothing downstream cares which key spelling the input used.

pub mod code;
pub mod fields;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use fields::{Field, RawRecord};

// ── Enumerations ──────────────────────────────────────────────────────────────

/// Kind of document received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentType {
    Guide,
    Invoice,
    Check,
    WorkOrder,
    Other,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::Guide,
        DocumentType::Invoice,
        DocumentType::Check,
        DocumentType::WorkOrder,
        DocumentType::Other,
    ];

    /// Display label used on the desk and in stored rows.
    pub fn label(self) -> &'static str {
        match self {
            DocumentType::Guide => "Guía",
            DocumentType::Invoice => "Factura",
            DocumentType::Check => "Cheque",
            DocumentType::WorkOrder => "OT",
            DocumentType::Other => "Otro",
        }
    }

    /// Lenient parse; anything unrecognised is `Other`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "guía" | "guia" | "guide" => DocumentType::Guide,
            "factura" | "invoice" => DocumentType::Invoice,
            "cheque" | "check" => DocumentType::Check,
            "ot" | "orden de trabajo" | "work-order" | "work order" => DocumentType::WorkOrder,
            _ => DocumentType::Other,
        }
    }
}

impl From<String> for DocumentType {
    fn from(s: String) -> Self {
        DocumentType::parse(&s)
    }
}

impl From<DocumentType> for String {
    fn from(t: DocumentType) -> Self {
        t.label().to_string()
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the recipient wants to be told.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NotifyChannel {
    Email,
    Chat,
    Both,
}

impl NotifyChannel {
    pub fn label(self) -> &'static str {
        match self {
            NotifyChannel::Email => "Correo",
            NotifyChannel::Chat => "Teams",
            NotifyChannel::Both => "Ambos",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s.trim().to_lowercase().as_str() {
            "correo" | "email" => Ok(NotifyChannel::Email),
            "teams" | "chat" => Ok(NotifyChannel::Chat),
            "ambos" | "both" => Ok(NotifyChannel::Both),
            other => Err(AppError::Validation(format!("unknown notification channel: '{other}'"))),
        }
    }

    pub fn wants_email(self) -> bool {
        matches!(self, NotifyChannel::Email | NotifyChannel::Both)
    }

    pub fn wants_chat(self) -> bool {
        matches!(self, NotifyChannel::Chat | NotifyChannel::Both)
    }
}

impl TryFrom<String> for NotifyChannel {
    type Error = AppError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        NotifyChannel::parse(&s)
    }
}

impl From<NotifyChannel> for String {
    fn from(c: NotifyChannel) -> Self {
        c.label().to_string()
    }
}

impl fmt::Display for NotifyChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle: `Pending → Notified → Collected`. Never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Status {
    Pending,
    Notified,
    Collected,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "Pendiente",
            Status::Notified => "Notificado",
            Status::Collected => "Retirado",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s.trim().to_lowercase().as_str() {
            "pendiente" | "pending" => Ok(Status::Pending),
            "notificado" | "notified" => Ok(Status::Notified),
            "retirado" | "entregado" | "collected" => Ok(Status::Collected),
            other => Err(AppError::Validation(format!("unknown status: '{other}'"))),
        }
    }

    /// `true` when moving to `next` is a forward step.
    pub fn can_advance_to(self, next: Status) -> bool {
        next > self
    }
}

impl TryFrom<String> for Status {
    type Error = AppError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Status::parse(&s)
    }
}

impl From<Status> for String {
    fn from(s: Status) -> Self {
        s.label().to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── PackageRecord ─────────────────────────────────────────────────────────────

/// One physical item received at the desk.
///
/// Serialised with the camelCase keys the web form uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    #[serde(rename = "codigoRetiro")]
    pub pickup_code: String,
    #[serde(rename = "sucursal")]
    pub branch: String,
    #[serde(rename = "recepcionista")]
    pub receptionist: String,
    #[serde(rename = "proveedor")]
    pub provider: String,
    #[serde(rename = "tipoDocumento")]
    pub document_type: DocumentType,
    #[serde(rename = "numeroDocumento")]
    pub document_number: String,
    #[serde(rename = "fechaRecepcion")]
    pub received_date: String,
    #[serde(rename = "horaRecepcion")]
    pub received_time: String,
    #[serde(rename = "destinatarioNombre")]
    pub recipient_name: String,
    #[serde(rename = "destinatarioEmail")]
    pub recipient_email: String,
    #[serde(rename = "medioNotificacion")]
    pub channel: NotifyChannel,
    #[serde(rename = "observaciones", default)]
    pub remarks: Option<String>,
    #[serde(rename = "adjuntoUrl", default)]
    pub attachment_url: Option<String>,
    #[serde(rename = "montoCheque", default)]
    pub check_amount: Option<String>,
    #[serde(rename = "fechaVencimientoCheque", default)]
    pub check_due_date: Option<String>,
    #[serde(rename = "estado")]
    pub status: Status,
    #[serde(rename = "fechaNotificacion", default)]
    pub notified_at: Option<String>,
    #[serde(rename = "fechaRetiro", default)]
    pub collected_at: Option<String>,
    #[serde(rename = "entregadoA", default)]
    pub collected_by: Option<String>,
}

impl PackageRecord {
    /// Build a pending record from a validated draft and its pickup code.
    pub fn from_draft(draft: PackageDraft, pickup_code: String, received_date: String, received_time: String) -> Self {
        Self {
            pickup_code,
            branch: draft.branch,
            receptionist: draft.receptionist,
            provider: draft.provider,
            document_type: draft.document_type,
            document_number: draft.document_number,
            received_date,
            received_time,
            recipient_name: draft.recipient_name,
            recipient_email: draft.recipient_email,
            channel: draft.channel,
            remarks: draft.remarks,
            attachment_url: draft.attachment_url,
            check_amount: draft.check_amount,
            check_due_date: draft.check_due_date,
            status: Status::Pending,
            notified_at: None,
            collected_at: None,
            collected_by: None,
        }
    }

    /// Decode a raw row holding either key spelling.
    ///
    /// Legacy rows are accepted leniently: an unknown channel falls back to
    /// email and a missing status means pending. Only the pickup code is
    /// mandatory.
    pub fn from_raw(raw: &RawRecord) -> Result<Self, AppError> {
        let pickup_code = fields::get(raw, Field::PickupCode, "").trim().to_string();
        if pickup_code.is_empty() {
            return Err(AppError::Validation("record has no pickup code".into()));
        }
        let status = match fields::get(raw, Field::Status, "").trim() {
            "" => Status::Pending,
            s => Status::parse(s)?,
        };
        Ok(Self {
            pickup_code,
            branch: fields::get(raw, Field::Branch, ""),
            receptionist: fields::get(raw, Field::Receptionist, ""),
            provider: fields::get(raw, Field::Provider, ""),
            document_type: DocumentType::parse(&fields::get(raw, Field::DocumentType, "")),
            document_number: fields::get(raw, Field::DocumentNumber, ""),
            received_date: fields::get(raw, Field::ReceivedDate, ""),
            received_time: fields::get(raw, Field::ReceivedTime, ""),
            recipient_name: fields::get(raw, Field::RecipientName, ""),
            recipient_email: fields::get(raw, Field::RecipientEmail, ""),
            channel: NotifyChannel::parse(&fields::get(raw, Field::Channel, ""))
                .unwrap_or(NotifyChannel::Email),
            remarks: optional(raw, Field::Remarks),
            attachment_url: optional(raw, Field::AttachmentUrl),
            check_amount: optional(raw, Field::CheckAmount),
            check_due_date: optional(raw, Field::CheckDueDate),
            status,
            notified_at: optional(raw, Field::NotifiedAt),
            collected_at: optional(raw, Field::CollectedAt),
            collected_by: optional(raw, Field::CollectedBy),
        })
    }

    /// Read a logical field as text; absent optionals read as `""`.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::PickupCode => &self.pickup_code,
            Field::RecipientName => &self.recipient_name,
            Field::RecipientEmail => &self.recipient_email,
            Field::Branch => &self.branch,
            Field::Provider => &self.provider,
            Field::DocumentType => self.document_type.label(),
            Field::DocumentNumber => &self.document_number,
            Field::ReceivedDate => &self.received_date,
            Field::ReceivedTime => &self.received_time,
            Field::Channel => self.channel.label(),
            Field::Receptionist => &self.receptionist,
            Field::Remarks => self.remarks.as_deref().unwrap_or(""),
            Field::AttachmentUrl => self.attachment_url.as_deref().unwrap_or(""),
            Field::CheckAmount => self.check_amount.as_deref().unwrap_or(""),
            Field::CheckDueDate => self.check_due_date.as_deref().unwrap_or(""),
            Field::Status => self.status.label(),
            Field::NotifiedAt => self.notified_at.as_deref().unwrap_or(""),
            Field::CollectedAt => self.collected_at.as_deref().unwrap_or(""),
            Field::CollectedBy => self.collected_by.as_deref().unwrap_or(""),
        }
    }
}

// ── PackageDraft ──────────────────────────────────────────────────────────────

/// What the desk submits when registering a package. Code, date and time
/// may be left empty and are filled in at registration.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageDraft {
    pub pickup_code: Option<String>,
    pub branch: String,
    pub receptionist: String,
    pub provider: String,
    pub document_type: DocumentType,
    pub document_number: String,
    pub received_date: Option<String>,
    pub received_time: Option<String>,
    pub recipient_name: String,
    pub recipient_email: String,
    pub channel: NotifyChannel,
    pub remarks: Option<String>,
    pub attachment_url: Option<String>,
    pub check_amount: Option<String>,
    pub check_due_date: Option<String>,
}

impl PackageDraft {
    /// Decode a form payload. Strict: every required field must be present
    /// and the channel must be one of the known values.
    pub fn from_raw(raw: &RawRecord) -> Result<Self, AppError> {
        let required = |field: Field| -> Result<String, AppError> {
            let v = fields::get(raw, field, "").trim().to_string();
            if v.is_empty() {
                Err(AppError::Validation(format!("missing field '{}'", field.camel())))
            } else {
                Ok(v)
            }
        };

        Ok(Self {
            pickup_code: optional(raw, Field::PickupCode),
            branch: required(Field::Branch)?,
            receptionist: required(Field::Receptionist)?,
            provider: required(Field::Provider)?,
            document_type: DocumentType::parse(&required(Field::DocumentType)?),
            document_number: required(Field::DocumentNumber)?,
            received_date: optional(raw, Field::ReceivedDate),
            received_time: optional(raw, Field::ReceivedTime),
            recipient_name: required(Field::RecipientName)?,
            recipient_email: required(Field::RecipientEmail)?,
            channel: NotifyChannel::parse(&required(Field::Channel)?)?,
            remarks: optional(raw, Field::Remarks),
            attachment_url: optional(raw, Field::AttachmentUrl),
            check_amount: optional(raw, Field::CheckAmount),
            check_due_date: optional(raw, Field::CheckDueDate),
        })
    }
}

/// Trimmed, non-empty value of `field`, if any.
fn optional(raw: &RawRecord, field: Field) -> Option<String> {
    let v = fields::get(raw, field, "");
    let v = v.trim();
    if v.is_empty() { None } else { Some(v.to_string()) }
}

// ── test helpers ──────────────────────────────────────────────────────────────

#[cfg(test)]
impl PackageRecord {
    /// Minimal pending record for unit tests.
    pub fn sample(code: &str, recipient: &str, branch: &str, document_type: DocumentType) -> Self {
        let email = format!(
            "{}@example.cl",
            recipient.to_lowercase().split_whitespace().collect::<Vec<_>>().join(".")
        );
        Self {
            pickup_code: code.into(),
            branch: branch.into(),
            receptionist: "Recepción".into(),
            provider: "Chilexpress".into(),
            document_type,
            document_number: "1001".into(),
            received_date: "2025-12-01".into(),
            received_time: "09:30:00".into(),
            recipient_name: recipient.into(),
            recipient_email: email,
            channel: NotifyChannel::Email,
            remarks: None,
            attachment_url: None,
            check_amount: None,
            check_due_date: None,
            status: Status::Pending,
            notified_at: None,
            collected_at: None,
            collected_by: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: serde_json::Value) -> RawRecord {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn decodes_legacy_pascal_row() {
        let r = raw(json!({
            "CodigoRetiro": "PK-251201-QW12",
            "Sucursal": "Santiago",
            "TipoDocumento": "Factura",
            "DestinatarioNombre": "Ana Soto",
            "DestinatarioEmail": "ana@example.cl",
            "MedioNotificacion": "Teams",
            "Estado": "Notificado",
            "FechaRecepcion": "2025-12-01",
        }));
        let rec = PackageRecord::from_raw(&r).unwrap();
        assert_eq!(rec.pickup_code, "PK-251201-QW12");
        assert_eq!(rec.document_type, DocumentType::Invoice);
        assert_eq!(rec.channel, NotifyChannel::Chat);
        assert_eq!(rec.status, Status::Notified);
        assert_eq!(rec.get(Field::ReceivedDate), "2025-12-01");
    }

    #[test]
    fn decodes_mixed_spellings() {
        let r = raw(json!({
            "codigoRetiro": "PK-251201-QW12",
            "Sucursal": "Temuco",
            "destinatarioNombre": "Ana Soto",
        }));
        let rec = PackageRecord::from_raw(&r).unwrap();
        assert_eq!(rec.branch, "Temuco");
        assert_eq!(rec.recipient_name, "Ana Soto");
        assert_eq!(rec.status, Status::Pending);
        assert_eq!(rec.channel, NotifyChannel::Email);
    }

    #[test]
    fn row_without_code_is_rejected() {
        let r = raw(json!({ "Sucursal": "Santiago" }));
        assert!(PackageRecord::from_raw(&r).is_err());
    }

    #[test]
    fn check_fields_default_for_non_checks() {
        for t in [DocumentType::Guide, DocumentType::Invoice, DocumentType::WorkOrder, DocumentType::Other] {
            let rec = PackageRecord::sample("PK-251201-AAAA", "Ana Soto", "Santiago", t);
            assert_eq!(rec.get(Field::CheckAmount), "");
            assert_eq!(rec.get(Field::CheckDueDate), "");
            let raw = serde_json::to_value(&rec).unwrap();
            let raw = raw.as_object().unwrap();
            assert_eq!(fields::get(raw, Field::CheckAmount, "-"), "-");
            assert_eq!(fields::get(raw, Field::CheckDueDate, "-"), "-");
        }
    }

    #[test]
    fn status_only_moves_forward() {
        assert!(Status::Pending.can_advance_to(Status::Notified));
        assert!(Status::Pending.can_advance_to(Status::Collected));
        assert!(Status::Notified.can_advance_to(Status::Collected));
        assert!(!Status::Collected.can_advance_to(Status::Notified));
        assert!(!Status::Notified.can_advance_to(Status::Pending));
        assert!(!Status::Notified.can_advance_to(Status::Notified));
    }

    #[test]
    fn document_type_parse_is_lenient() {
        assert_eq!(DocumentType::parse("GUIA"), DocumentType::Guide);
        assert_eq!(DocumentType::parse(" cheque "), DocumentType::Check);
        assert_eq!(DocumentType::parse("ot"), DocumentType::WorkOrder);
        assert_eq!(DocumentType::parse("Carta"), DocumentType::Other);
    }

    #[test]
    fn draft_requires_channel_and_fields() {
        let mut r = raw(json!({
            "sucursal": "Santiago",
            "recepcionista": "Rosa",
            "proveedor": "Starken",
            "tipoDocumento": "Cheque",
            "numeroDocumento": "778",
            "destinatarioNombre": "Juan Perez",
            "destinatarioEmail": "juan@example.cl",
            "medioNotificacion": "Ambos",
            "montoCheque": "$10.000",
        }));
        let draft = PackageDraft::from_raw(&r).unwrap();
        assert_eq!(draft.channel, NotifyChannel::Both);
        assert_eq!(draft.check_amount.as_deref(), Some("$10.000"));
        assert_eq!(draft.pickup_code, None);

        r.insert("medioNotificacion".into(), json!("Fax"));
        assert!(PackageDraft::from_raw(&r).is_err());

        r.remove("proveedor");
        let err = PackageDraft::from_raw(&r).unwrap_err();
        assert!(err.to_string().contains("proveedor"));
    }

    #[test]
    fn serialises_with_form_keys() {
        let rec = PackageRecord::sample("PK-251201-AAAA", "Ana Soto", "Santiago", DocumentType::Check);
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["codigoRetiro"], "PK-251201-AAAA");
        assert_eq!(v["tipoDocumento"], "Cheque");
        assert_eq!(v["estado"], "Pendiente");
        let back: PackageRecord = serde_json::from_value(v).unwrap();
        assert_eq!(back, rec);
    }
}

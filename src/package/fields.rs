//! Logical record fields and the dual-spelling accessor.
//!
//! Legacy rows (spreadsheet exports) carry PascalCase keys such as
//! `CodigoRetiro`; the web form sends camelCase keys such as
//! `codigoRetiro`. [`get`] resolves a logical [`Field`] against a raw JSON
//! object holding either spelling. It is used once, when raw input is
//! decoded into a [`PackageRecord`](super::PackageRecord); business logic
//! reads the canonical record instead.

use serde_json::{Map, Value};

/// A raw, not yet decoded record as received at the store or HTTP boundary.
pub type RawRecord = Map<String, Value>;

/// Every logical field of a package record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    PickupCode,
    RecipientName,
    RecipientEmail,
    Branch,
    Provider,
    DocumentType,
    DocumentNumber,
    ReceivedDate,
    ReceivedTime,
    Channel,
    Receptionist,
    Remarks,
    AttachmentUrl,
    CheckAmount,
    CheckDueDate,
    Status,
    NotifiedAt,
    CollectedAt,
    CollectedBy,
}

impl Field {
    pub const ALL: [Field; 19] = [
        Field::PickupCode,
        Field::RecipientName,
        Field::RecipientEmail,
        Field::Branch,
        Field::Provider,
        Field::DocumentType,
        Field::DocumentNumber,
        Field::ReceivedDate,
        Field::ReceivedTime,
        Field::Channel,
        Field::Receptionist,
        Field::Remarks,
        Field::AttachmentUrl,
        Field::CheckAmount,
        Field::CheckDueDate,
        Field::Status,
        Field::NotifiedAt,
        Field::CollectedAt,
        Field::CollectedBy,
    ];

    /// Current (camelCase) key.
    pub fn camel(self) -> &'static str {
        match self {
            Field::PickupCode => "codigoRetiro",
            Field::RecipientName => "destinatarioNombre",
            Field::RecipientEmail => "destinatarioEmail",
            Field::Branch => "sucursal",
            Field::Provider => "proveedor",
            Field::DocumentType => "tipoDocumento",
            Field::DocumentNumber => "numeroDocumento",
            Field::ReceivedDate => "fechaRecepcion",
            Field::ReceivedTime => "horaRecepcion",
            Field::Channel => "medioNotificacion",
            Field::Receptionist => "recepcionista",
            Field::Remarks => "observaciones",
            Field::AttachmentUrl => "adjuntoUrl",
            Field::CheckAmount => "montoCheque",
            Field::CheckDueDate => "fechaVencimientoCheque",
            Field::Status => "estado",
            Field::NotifiedAt => "fechaNotificacion",
            Field::CollectedAt => "fechaRetiro",
            Field::CollectedBy => "entregadoA",
        }
    }

    /// Legacy (PascalCase) key.
    pub fn pascal(self) -> &'static str {
        match self {
            Field::PickupCode => "CodigoRetiro",
            Field::RecipientName => "DestinatarioNombre",
            Field::RecipientEmail => "DestinatarioEmail",
            Field::Branch => "Sucursal",
            Field::Provider => "Proveedor",
            Field::DocumentType => "TipoDocumento",
            Field::DocumentNumber => "NumeroDocumento",
            Field::ReceivedDate => "FechaRecepcion",
            Field::ReceivedTime => "HoraRecepcion",
            Field::Channel => "MedioNotificacion",
            Field::Receptionist => "Recepcionista",
            Field::Remarks => "Observaciones",
            Field::AttachmentUrl => "AdjuntoUrl",
            Field::CheckAmount => "MontoCheque",
            Field::CheckDueDate => "FechaVencimientoCheque",
            Field::Status => "Estado",
            Field::NotifiedAt => "FechaNotificacion",
            Field::CollectedAt => "FechaRetiro",
            Field::CollectedBy => "EntregadoA",
        }
    }

    /// Look a field up by either spelling.
    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|f| f.camel() == key || f.pascal() == key)
    }
}

/// Resolve `field` on `raw`: the PascalCase key wins when present and
/// non-null, then the camelCase key, then `default`.
pub fn get(raw: &RawRecord, field: Field, default: &str) -> String {
    lookup(raw, field.pascal())
        .or_else(|| lookup(raw, field.camel()))
        .unwrap_or_else(|| default.to_string())
}

/// Same as [`get`] but keyed by a field name in either spelling. Unknown
/// names are looked up verbatim.
pub fn get_by_name(raw: &RawRecord, name: &str, default: &str) -> String {
    match Field::from_key(name) {
        Some(field) => get(raw, field, default),
        None => lookup(raw, name).unwrap_or_else(|| default.to_string()),
    }
}

fn lookup(raw: &RawRecord, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
